//! Generation orchestrator
//!
//! Public entry point coordinating the classifier, the model cache, device
//! placement, statistics, and artifact persistence. Generations are full
//! single-flight: one process-wide lock is held across acquire, device move,
//! inference, and save, so the shared accelerator is never touched by two
//! calls at once. Concurrent callers block until the lock frees.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::cache::ModelCache;
use crate::classifier::{self, Style};
use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::registry::{Device, InferenceParams, ModelRegistry};
use crate::stats::{GenerationStats, StatsTracker};
use crate::store::ArtifactStore;

/// Caller-facing generation request; unset fields fall back to configured
/// defaults
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Explicit style; classified from the prompt when absent
    pub style: Option<Style>,
    pub negative_prompt: Option<String>,
    pub num_inference_steps: Option<u32>,
    pub guidance_scale: Option<f32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl GenerateRequest {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

/// Successful generation outcome
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub filename: String,
    pub filepath: String,
    pub style: Style,
    pub generation_time_secs: f64,
    pub metadata: GenerationMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationMetadata {
    pub model: Style,
    pub steps: u32,
    pub guidance_scale: f32,
    pub size: String,
    pub device: String,
    pub file_size: u64,
    pub prompt_length: usize,
}

/// Resident-model and counter summary for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub models_loaded: usize,
    pub resident_styles: Vec<String>,
    pub stats: GenerationStats,
}

/// Orchestrator owning the model cache, stats, and artifact store
pub struct ImageService {
    registry: Arc<dyn ModelRegistry>,
    cache: Mutex<ModelCache>,
    generation_lock: Mutex<()>,
    stats: StatsTracker,
    store: ArtifactStore,
    settings: Settings,
}

impl ImageService {
    pub fn new(settings: Settings, registry: Arc<dyn ModelRegistry>) -> Self {
        let cache = ModelCache::new(
            registry.clone(),
            settings.models.max_models_in_memory,
            Duration::from_secs(settings.models.model_timeout_secs),
        );
        Self::with_cache(settings, registry, cache)
    }

    /// Build the service around a pre-constructed cache, letting tests
    /// inject a manual clock
    pub fn with_cache(
        settings: Settings,
        registry: Arc<dyn ModelRegistry>,
        cache: ModelCache,
    ) -> Self {
        let store = ArtifactStore::new(&settings.storage.images_dir);
        Self {
            registry,
            cache: Mutex::new(cache),
            generation_lock: Mutex::new(()),
            stats: StatsTracker::new(),
            store,
            settings,
        }
    }

    /// Generate one image for `request`.
    ///
    /// Empty prompts are rejected before any cache, registry, or stats
    /// interaction. Every attempt that reaches the generation stage is
    /// recorded in the stats, success or failure. Load and inference
    /// failures additionally unload every cached model to reset to a
    /// known-clean state.
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerationOutcome> {
        let prompt = request.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(AppError::InvalidRequest("Prompt is required".to_string()));
        }

        let style = match request.style {
            Some(style) => style,
            None => {
                let detection = classifier::classify(&prompt);
                info!(
                    style = %detection.style,
                    dreamshaper = detection.dreamshaper_score,
                    realistic = detection.realistic_score,
                    "Auto-detected style"
                );
                detection.style
            }
        };

        let _guard = self.generation_lock.lock().await;
        let started = Instant::now();
        info!(style = %style, prompt_length = prompt.len(), "Starting image generation");

        let result = self.run_generation(&request, &prompt, style).await;
        let elapsed = started.elapsed();

        match result {
            Ok(mut outcome) => {
                self.stats.record(elapsed, true);
                outcome.generation_time_secs = elapsed.as_secs_f64();
                info!(
                    style = %style,
                    filename = %outcome.filename,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "Image generation completed"
                );
                Ok(outcome)
            }
            Err(err) => {
                self.stats.record(elapsed, false);
                Err(self.recover_from(err).await)
            }
        }
    }

    /// Generate images for several prompts sequentially; one prompt failing
    /// does not abort the rest
    pub async fn generate_batch(
        &self,
        prompts: &[String],
        style: Option<Style>,
    ) -> Vec<Result<GenerationOutcome>> {
        let mut results = Vec::with_capacity(prompts.len());
        for (index, prompt) in prompts.iter().enumerate() {
            info!(index = index + 1, total = prompts.len(), "Batch generation");
            let mut request = GenerateRequest::from_prompt(prompt.clone());
            request.style = style;
            results.push(self.generate(request).await);
        }
        results
    }

    /// Current residency and counters, for the system status surface
    pub async fn status(&self) -> ServiceStatus {
        let cache = self.cache.lock().await;
        ServiceStatus {
            models_loaded: cache.len(),
            resident_styles: cache.resident_styles(),
            stats: self.stats.snapshot(),
        }
    }

    pub fn stats(&self) -> GenerationStats {
        self.stats.snapshot()
    }

    /// Unload every resident model and hint reclamation
    pub async fn unload_all_models(&self) {
        self.cache.lock().await.unload_all().await;
    }

    /// Retention sweep over the images directory
    pub async fn cleanup_old_images(&self) -> Result<usize> {
        self.store
            .cleanup(self.settings.storage.max_images_to_keep)
            .await
    }

    async fn run_generation(
        &self,
        request: &GenerateRequest,
        prompt: &str,
        style: Style,
    ) -> Result<GenerationOutcome> {
        let pipeline = self.cache.lock().await.acquire(style.id()).await?;

        let device = Device::preferred(self.registry.accelerator_count());
        if pipeline.device() != device {
            info!(device = %device, "Moving model to device");
            pipeline.move_to(device).await.map_err(AppError::inference)?;
        }

        let params = self.resolve_params(request, prompt);
        info!(
            steps = params.num_inference_steps,
            guidance_scale = params.guidance_scale,
            width = params.width,
            height = params.height,
            "Generating image"
        );

        let images = pipeline.infer(&params).await.map_err(AppError::inference)?;
        let Some(image) = images.into_iter().next() else {
            return Err(AppError::EmptyResult);
        };

        let artifact = self.store.save_png(&image, style.id()).await?;

        Ok(GenerationOutcome {
            filename: artifact.filename,
            filepath: artifact.path.display().to_string(),
            style,
            generation_time_secs: 0.0,
            metadata: GenerationMetadata {
                model: style,
                steps: params.num_inference_steps,
                guidance_scale: params.guidance_scale,
                size: format!("{}x{}", params.width, params.height),
                device: device.to_string(),
                file_size: artifact.size_bytes,
                prompt_length: prompt.len(),
            },
        })
    }

    fn resolve_params(&self, request: &GenerateRequest, prompt: &str) -> InferenceParams {
        let defaults = &self.settings.generation;
        InferenceParams {
            prompt: prompt.to_string(),
            negative_prompt: request
                .negative_prompt
                .clone()
                .unwrap_or_else(|| defaults.default_negative_prompt.clone()),
            num_inference_steps: request
                .num_inference_steps
                .unwrap_or(defaults.default_inference_steps),
            guidance_scale: request
                .guidance_scale
                .unwrap_or(defaults.default_guidance_scale),
            width: request.width.unwrap_or(defaults.image_size),
            height: request.height.unwrap_or(defaults.image_size),
        }
    }

    /// Error-path cleanup: load and inference failures reset the model pool;
    /// resource-class messages are replaced with a vaguer user-facing error
    async fn recover_from(&self, err: AppError) -> AppError {
        match &err {
            AppError::ModelLoad { .. } | AppError::Inference(_) => {
                error!(error = %err, "Generation failed; unloading all models");
                self.cache.lock().await.unload_all().await;
                self.registry.reclaim();
            }
            _ => error!(error = %err, "Generation failed"),
        }

        if err.to_string().to_lowercase().contains("meta tensor") {
            AppError::ModelResource
        } else {
            err
        }
    }
}
