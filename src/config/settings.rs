//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Cache capacity: models resident at once
    #[serde(default = "default_max_models")]
    pub max_models_in_memory: usize,
    /// Idle eviction threshold in seconds
    #[serde(default = "default_model_timeout")]
    pub model_timeout_secs: u64,
}

fn default_max_models() -> usize {
    2
}

fn default_model_timeout() -> u64 {
    300
}

/// Inference parameter defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    #[serde(default = "default_inference_steps")]
    pub default_inference_steps: u32,
    #[serde(default = "default_guidance_scale")]
    pub default_guidance_scale: f32,
    /// Default square dimension for width and height
    #[serde(default = "default_image_size")]
    pub image_size: u32,
    #[serde(default = "default_negative_prompt")]
    pub default_negative_prompt: String,
}

fn default_inference_steps() -> u32 {
    20
}

fn default_guidance_scale() -> f32 {
    7.5
}

fn default_image_size() -> u32 {
    1024
}

fn default_negative_prompt() -> String {
    "blurry, low quality, distorted, deformed, ugly, bad anatomy".to_string()
}

/// Artifact storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
    /// Retention count for the cleanup sweep
    #[serde(default = "default_max_images_to_keep")]
    pub max_images_to_keep: usize,
}

fn default_images_dir() -> String {
    "./images".to_string()
}

fn default_max_images_to_keep() -> usize {
    1000
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .set_default("models.max_models_in_memory", 2)?
            .set_default("models.model_timeout_secs", 300)?
            .set_default("generation.default_inference_steps", 20)?
            .set_default("generation.default_guidance_scale", 7.5)?
            .set_default("generation.image_size", 1024)?
            .set_default(
                "generation.default_negative_prompt",
                default_negative_prompt(),
            )?
            .set_default("storage.images_dir", "./images")?
            .set_default("storage.max_images_to_keep", 1000)?
            .add_source(
                File::with_name(path.as_ref().to_str().unwrap_or("config/default"))
                    .required(false),
            )
            // Override with environment variables (prefixed with IMG_GEN_)
            .add_source(
                Environment::with_prefix("IMG_GEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.models.max_models_in_memory == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "max_models_in_memory must be at least 1".to_string(),
            )));
        }
        if self.generation.default_inference_steps == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "default_inference_steps must be at least 1".to_string(),
            )));
        }
        if self.generation.image_size == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "image_size cannot be 0".to_string(),
            )));
        }
        if self.storage.images_dir.is_empty() {
            return Err(AppError::Config(config::ConfigError::Message(
                "images_dir cannot be empty".to_string(),
            )));
        }
        Ok(())
    }

    /// Install the global tracing subscriber per the logging config.
    /// Call once at process startup.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.logging.level.clone()));

        let registry = tracing_subscriber::registry().with(filter);
        if self.logging.format == "json" {
            registry.with(fmt::layer().json()).init();
        } else {
            registry.with(fmt::layer()).init();
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            models: ModelConfig::default(),
            generation: GenerationConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_models_in_memory: default_max_models(),
            model_timeout_secs: default_model_timeout(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_inference_steps: default_inference_steps(),
            default_guidance_scale: default_guidance_scale(),
            image_size: default_image_size(),
            default_negative_prompt: default_negative_prompt(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            max_images_to_keep: default_max_images_to_keep(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
