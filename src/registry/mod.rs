//! Contracts for the external model registry and the pipelines it loads
//!
//! Loading and unloading are synchronous from the model's point of view but
//! slow (seconds) and memory-heavy, so the contracts are async and callers
//! are expected to serialize access through the cache.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// Compute device a pipeline can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Device {
    Cpu,
    Cuda(u32),
}

impl Device {
    /// Placement policy: prefer the secondary accelerator when more than one
    /// is available, else the sole accelerator, else general-purpose compute.
    pub fn preferred(accelerator_count: u32) -> Self {
        match accelerator_count {
            0 => Device::Cpu,
            1 => Device::Cuda(0),
            _ => Device::Cuda(1),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(index) => write!(f, "cuda:{index}"),
        }
    }
}

/// Fully resolved parameters for one inference call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceParams {
    pub prompt: String,
    pub negative_prompt: String,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub width: u32,
    pub height: u32,
}

/// PNG-encoded image bytes produced by a pipeline
pub type ImageData = Vec<u8>;

/// A loaded model instance
#[async_trait]
pub trait ModelPipeline: Send + Sync {
    /// Registry key this pipeline was loaded under
    fn model_key(&self) -> &str;

    /// Device the pipeline is currently bound to
    fn device(&self) -> Device;

    /// Relocate the pipeline to another device
    async fn move_to(&self, device: Device) -> Result<()>;

    /// Run inference; may be slow and cannot be aborted once started
    async fn infer(&self, params: &InferenceParams) -> Result<Vec<ImageData>>;
}

impl fmt::Debug for dyn ModelPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelPipeline")
            .field("model_key", &self.model_key())
            .field("device", &self.device())
            .finish()
    }
}

/// Loader and unloader for named models
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    /// Load the model identified by `model_key` into memory
    async fn load(&self, model_key: &str) -> Result<Arc<dyn ModelPipeline>>;

    /// Release a previously loaded pipeline
    async fn unload(&self, pipeline: Arc<dyn ModelPipeline>);

    /// Number of accelerator devices visible to this registry
    fn accelerator_count(&self) -> u32 {
        0
    }

    /// Best-effort memory reclamation hint, invoked after unloads.
    /// Must never fail; a no-op is a valid implementation.
    fn reclaim(&self) {}
}
