//! Shared mock registry, pipeline, and clock for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use img_gen_orchestrator::cache::Clock;
use img_gen_orchestrator::error::{AppError, Result};
use img_gen_orchestrator::registry::{
    Device, ImageData, InferenceParams, ModelPipeline, ModelRegistry,
};

/// What mock pipelines do when asked to infer
#[derive(Clone)]
pub enum InferBehavior {
    Succeed,
    Empty,
    Fail(String),
}

/// Observable call history shared between the registry and its pipelines
pub struct RegistryState {
    pub load_calls: Vec<String>,
    pub unload_calls: Vec<String>,
    pub reclaim_calls: usize,
    pub fail_loads: bool,
    pub infer_behavior: InferBehavior,
    pub last_params: Option<InferenceParams>,
    pub last_device: Option<Device>,
}

pub struct MockRegistry {
    pub state: Arc<Mutex<RegistryState>>,
    accelerators: u32,
}

impl MockRegistry {
    pub fn new() -> Arc<Self> {
        Self::with_accelerators(0)
    }

    pub fn with_accelerators(accelerators: u32) -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(Mutex::new(RegistryState {
                load_calls: Vec::new(),
                unload_calls: Vec::new(),
                reclaim_calls: 0,
                fail_loads: false,
                infer_behavior: InferBehavior::Succeed,
                last_params: None,
                last_device: None,
            })),
            accelerators,
        })
    }

    pub fn set_infer_behavior(&self, behavior: InferBehavior) {
        self.state.lock().infer_behavior = behavior;
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.state.lock().fail_loads = fail;
    }
}

struct MockPipeline {
    key: String,
    device: Mutex<Device>,
    state: Arc<Mutex<RegistryState>>,
}

#[async_trait]
impl ModelPipeline for MockPipeline {
    fn model_key(&self) -> &str {
        &self.key
    }

    fn device(&self) -> Device {
        *self.device.lock()
    }

    async fn move_to(&self, device: Device) -> Result<()> {
        *self.device.lock() = device;
        Ok(())
    }

    async fn infer(&self, params: &InferenceParams) -> Result<Vec<ImageData>> {
        let device = *self.device.lock();
        let mut state = self.state.lock();
        state.last_params = Some(params.clone());
        state.last_device = Some(device);
        match state.infer_behavior.clone() {
            InferBehavior::Succeed => Ok(vec![b"fake-png-bytes".to_vec()]),
            InferBehavior::Empty => Ok(Vec::new()),
            InferBehavior::Fail(message) => Err(AppError::Inference(message)),
        }
    }
}

#[async_trait]
impl ModelRegistry for MockRegistry {
    async fn load(&self, model_key: &str) -> Result<Arc<dyn ModelPipeline>> {
        let mut state = self.state.lock();
        state.load_calls.push(model_key.to_string());
        if state.fail_loads {
            return Err(AppError::Internal(format!(
                "weights unavailable for {model_key}"
            )));
        }
        Ok(Arc::new(MockPipeline {
            key: model_key.to_string(),
            device: Mutex::new(Device::Cpu),
            state: self.state.clone(),
        }))
    }

    async fn unload(&self, pipeline: Arc<dyn ModelPipeline>) {
        self.state
            .lock()
            .unload_calls
            .push(pipeline.model_key().to_string());
    }

    fn accelerator_count(&self) -> u32 {
        self.accelerators
    }

    fn reclaim(&self) {
        self.state.lock().reclaim_calls += 1;
    }
}

/// Clock advanced by hand, so eviction tests never sleep
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Instant::now()),
        })
    }

    pub fn advance(&self, delta: Duration) {
        *self.now.lock() += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}
