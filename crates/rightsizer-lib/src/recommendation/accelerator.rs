//! Accelerator (GPU) sample collection
//!
//! Accelerator usage arrives in one of two shapes per interval: tagged
//! entries among the generic metrics, or a dedicated per-device map keyed by
//! metric kind. Both are reduced here to lists of core and memory
//! percentages for the percentile step.

use crate::models::{
    IntervalMap, IntervalResults, MetricAggregationInfo, MetricName, RecommendationConfigItem,
    RecommendationItem,
};
use std::collections::HashMap;
use tracing::debug;

/// Accelerator recommendation keyed by resource
pub type AcceleratorRecommendation = HashMap<RecommendationItem, RecommendationConfigItem>;

/// Frame-buffer readings above this are absolute (MiB) rather than percentages
const FRAME_BUFFER_PERCENT_CEILING: f64 = 100.0;

const ACCELERATOR_METRICS: [MetricName; 3] = [
    MetricName::AcceleratorCoreUsage,
    MetricName::AcceleratorMemoryUsage,
    MetricName::AcceleratorFrameBufferUsage,
];

/// Lookup of supported accelerator models and their partition profiles
pub trait AcceleratorProfileMatcher: Send + Sync {
    /// Canonical model id for a reported device name, if supported
    fn resolve_model(&self, raw_name: &str) -> Option<String>;

    /// Frame-buffer capacity of a model in MiB, if known
    fn frame_buffer_capacity(&self, model: &str) -> Option<f64>;

    /// Smallest profile covering both fractions, or `None` if nothing fits
    fn optimal_profile(
        &self,
        model: &str,
        core_fraction: f64,
        memory_fraction: f64,
    ) -> Option<AcceleratorRecommendation>;
}

/// Core and memory percentages gathered across all intervals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcceleratorSamples {
    pub is_gpu_workload: bool,
    pub model: Option<String>,
    pub core_max_values: Vec<f64>,
    pub memory_max_values: Vec<f64>,
}

impl AcceleratorSamples {
    pub fn collect(intervals: &IntervalMap, matcher: &dyn AcceleratorProfileMatcher) -> Self {
        let mut samples = Self::default();
        for interval in intervals.values() {
            if interval.accelerator_metrics.is_empty() {
                samples.collect_tagged(interval, matcher);
            } else {
                samples.collect_per_device(interval, matcher);
            }
        }
        samples
    }

    pub fn is_empty(&self) -> bool {
        self.core_max_values.is_empty() && self.memory_max_values.is_empty()
    }

    fn resolve_model(&mut self, raw_name: Option<&str>, matcher: &dyn AcceleratorProfileMatcher) -> bool {
        let Some(name) = raw_name.map(str::trim).filter(|n| !n.is_empty()) else {
            return false;
        };
        match matcher.resolve_model(name) {
            Some(model) => {
                debug!(reported = %name, model = %model, "Resolved accelerator model");
                self.model = Some(model);
                true
            }
            None => false,
        }
    }

    /// Accelerator metrics tagged with device metadata among the generic metrics
    fn collect_tagged(&mut self, interval: &IntervalResults, matcher: &dyn AcceleratorProfileMatcher) {
        for metric in ACCELERATOR_METRICS {
            let Some(results) = interval.metrics.get(&metric) else {
                continue;
            };
            let Some(info) = results.aggregation_info.as_ref() else {
                continue;
            };

            if self.model.is_none() {
                let raw = results.metadata.as_ref().and_then(|m| m.model_name.as_deref());
                if self.resolve_model(raw, matcher) {
                    self.is_gpu_workload = true;
                }
            }

            let Some(max) = positive_max(info) else {
                continue;
            };

            match metric {
                MetricName::AcceleratorCoreUsage => self.core_max_values.push(max),
                MetricName::AcceleratorMemoryUsage => self.memory_max_values.push(max),
                _ => {
                    if max > FRAME_BUFFER_PERCENT_CEILING {
                        let capacity = self
                            .model
                            .as_deref()
                            .and_then(|m| matcher.frame_buffer_capacity(m));
                        match capacity {
                            Some(capacity) if capacity > 0.0 => {
                                self.memory_max_values.push(max / capacity * 100.0)
                            }
                            _ => debug!(value = max, "Dropping frame-buffer sample, capacity unknown"),
                        }
                    }
                }
            }
        }
    }

    /// Dedicated per-device accelerator map
    fn collect_per_device(&mut self, interval: &IntervalResults, matcher: &dyn AcceleratorProfileMatcher) {
        self.is_gpu_workload = true;

        let mut entries: Vec<_> = interval
            .accelerator_metrics
            .iter()
            .filter(|(name, _)| name.is_accelerator())
            .collect();
        entries.sort_by_key(|(name, _)| **name);

        for (metric, result) in entries {
            if self.model.is_none() {
                self.resolve_model(result.device.model_name.as_deref(), matcher);
            }

            let Some(info) = result.metric_results.aggregation_info.as_ref() else {
                continue;
            };
            let Some(max) = positive_max(info) else {
                continue;
            };

            match metric {
                MetricName::AcceleratorCoreUsage => self.core_max_values.push(max),
                MetricName::AcceleratorMemoryUsage | MetricName::AcceleratorFrameBufferUsage => {
                    self.memory_max_values.push(max)
                }
                _ => {}
            }
        }
    }
}

fn positive_max(info: &MetricAggregationInfo) -> Option<f64> {
    info.max.filter(|max| *max > 0.0)
}
