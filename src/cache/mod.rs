//! Bounded model cache with LRU capacity eviction and idle-timeout sweep
//!
//! At most `capacity` models stay resident, each style mapping to exactly one
//! loaded pipeline. The full acquisition sequence (sweep, evict, load, touch)
//! must run under one lock; the owning service keeps the cache behind a
//! `tokio::sync::Mutex` since loads are awaited.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::error::{AppError, Result};
use crate::registry::{ModelPipeline, ModelRegistry};

/// Time source for recency bookkeeping; injected so tests can advance time
/// without sleeping
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Monotonic wall clock used outside tests
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Map a public style name to the registry's internal model key
pub fn model_key_for(style: &str) -> &str {
    match style {
        "realistic" => "realistic_vision",
        other => other,
    }
}

struct ModelEntry {
    pipeline: Arc<dyn ModelPipeline>,
    last_used: Instant,
}

/// Bounded mapping from style id to loaded pipeline
pub struct ModelCache {
    registry: Arc<dyn ModelRegistry>,
    entries: HashMap<String, ModelEntry>,
    capacity: usize,
    idle_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl ModelCache {
    pub fn new(
        registry: Arc<dyn ModelRegistry>,
        capacity: usize,
        idle_timeout: Duration,
    ) -> Self {
        Self::with_clock(registry, capacity, idle_timeout, Arc::new(SystemClock))
    }

    pub fn with_clock(
        registry: Arc<dyn ModelRegistry>,
        capacity: usize,
        idle_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            entries: HashMap::new(),
            capacity,
            idle_timeout,
            clock,
        }
    }

    /// Acquire the pipeline for `style`, loading it on a miss.
    ///
    /// Runs the full sequence: idle sweep, LRU eviction when at capacity and
    /// the style is absent, registry load on miss, recency touch. A failed
    /// load inserts nothing and surfaces as [`AppError::ModelLoad`].
    pub async fn acquire(&mut self, style: &str) -> Result<Arc<dyn ModelPipeline>> {
        self.sweep_idle().await;

        if !self.entries.contains_key(style) && self.entries.len() >= self.capacity {
            if let Some(lru) = self.lru_style() {
                info!(style = %lru, "Unloading LRU model");
                self.evict(&lru).await;
            }
        }

        let now = self.clock.now();
        if let Some(entry) = self.entries.get_mut(style) {
            entry.last_used = now;
            return Ok(entry.pipeline.clone());
        }

        let model_key = model_key_for(style);
        info!(style = %style, model_key = %model_key, "Loading model");
        let pipeline = self
            .registry
            .load(model_key)
            .await
            .map_err(|e| AppError::ModelLoad {
                style: style.to_string(),
                message: e.to_string(),
            })?;
        info!(style = %style, "Model loaded successfully");

        self.entries.insert(
            style.to_string(),
            ModelEntry {
                pipeline: pipeline.clone(),
                last_used: now,
            },
        );

        Ok(pipeline)
    }

    /// Evict every entry idle for at least the configured timeout
    pub async fn sweep_idle(&mut self) {
        let now = self.clock.now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_used) >= self.idle_timeout)
            .map(|(style, _)| style.clone())
            .collect();

        for style in expired {
            info!(style = %style, "Unloading unused model");
            self.evict(&style).await;
        }
    }

    /// Unload every resident model; the error-recovery reset path
    pub async fn unload_all(&mut self) {
        let resident: Vec<String> = self.entries.keys().cloned().collect();
        for style in resident {
            info!(style = %style, "Unloading model");
            self.evict(&style).await;
        }
    }

    async fn evict(&mut self, style: &str) {
        if let Some(entry) = self.entries.remove(style) {
            self.registry.unload(entry.pipeline).await;
            self.registry.reclaim();
            info!(style = %style, "Model unloaded successfully");
        }
    }

    fn lru_style(&self) -> Option<String> {
        self.entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(style, _)| style.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_resident(&self, style: &str) -> bool {
        self.entries.contains_key(style)
    }

    pub fn resident_styles(&self) -> Vec<String> {
        let mut styles: Vec<String> = self.entries.keys().cloned().collect();
        styles.sort();
        styles
    }
}
