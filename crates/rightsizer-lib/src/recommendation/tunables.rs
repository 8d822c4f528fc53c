//! Percentile tunables for a recommendation run

use serde::{Deserialize, Serialize};
use std::fmt;

/// Percentiles (0-100) applied to CPU, memory and accelerator samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationTunables {
    pub cpu_percentile: f64,
    pub memory_percentile: f64,
    pub accelerator_percentile: f64,
}

impl RecommendationTunables {
    pub fn new(cpu_percentile: f64, memory_percentile: f64, accelerator_percentile: f64) -> Self {
        Self {
            cpu_percentile,
            memory_percentile,
            accelerator_percentile,
        }
    }

    /// Defaults for the cost strategy
    pub fn cost() -> Self {
        Self::new(60.0, 100.0, 60.0)
    }

    /// Defaults for the performance strategy
    pub fn performance() -> Self {
        Self::new(98.0, 100.0, 98.0)
    }
}

impl fmt::Display for RecommendationTunables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cpu={}, memory={}, accelerator={}",
            self.cpu_percentile, self.memory_percentile, self.accelerator_percentile
        )
    }
}
