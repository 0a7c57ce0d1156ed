//! Running generation statistics

use parking_lot::RwLock;
use serde::Serialize;
use std::time::Duration;

/// Process-lifetime counters; reset only when the process restarts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationStats {
    pub total_generations: u64,
    pub successful_generations: u64,
    pub failed_generations: u64,
    /// Cumulative wall-clock seconds spent generating
    pub total_generation_time: f64,
    pub average_generation_time: f64,
}

/// Tracker owning the stats singleton
#[derive(Debug, Default)]
pub struct StatsTracker {
    inner: RwLock<GenerationStats>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed generation attempt
    pub fn record(&self, duration: Duration, success: bool) {
        let mut stats = self.inner.write();
        stats.total_generations += 1;
        stats.total_generation_time += duration.as_secs_f64();

        if success {
            stats.successful_generations += 1;
        } else {
            stats.failed_generations += 1;
        }

        stats.average_generation_time =
            stats.total_generation_time / stats.total_generations as f64;
    }

    pub fn snapshot(&self) -> GenerationStats {
        self.inner.read().clone()
    }
}
