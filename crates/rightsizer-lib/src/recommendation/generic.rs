//! Shared sizing algorithm behind every named strategy

use super::accelerator::{AcceleratorProfileMatcher, AcceleratorRecommendation, AcceleratorSamples};
use super::catalog::MigProfileCatalog;
use super::constants::{
    CPU_ONE_CORE, CPU_ONE_MILLICORE, CPU_ZERO, MEM_SPIKE_BUFFER_DECIMAL, MEM_USAGE_BUFFER_DECIMAL,
};
use super::notification::{NotificationCode, RecommendationNotification};
use super::tunables::RecommendationTunables;
use super::usage::{self, UsageBounds};
use super::RecommendationModel;
use crate::error::ModelError;
use crate::models::{IntervalMap, IntervalResults, MetricName, RecommendationConfigItem};
use crate::units::percentile;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Push a notification if the caller supplied a sink
fn notify(sink: &mut Option<&mut Vec<RecommendationNotification>>, code: NotificationCode) {
    match sink {
        Some(notifications) => notifications.push(code.into()),
        None => debug!(
            code = code.code(),
            message = code.message(),
            "No notification sink, notification dropped"
        ),
    }
}

/// Percentile-based recommendation model
///
/// Holds only its name, the percentiles copied at construction and the
/// accelerator matcher. Nothing is mutated after construction, so one
/// instance can serve concurrent callers without locking.
#[derive(Clone)]
pub struct GenericRecommendationModel {
    name: String,
    cpu_percentile: f64,
    memory_percentile: f64,
    accelerator_percentile: f64,
    matcher: Arc<dyn AcceleratorProfileMatcher>,
}

impl fmt::Debug for GenericRecommendationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericRecommendationModel")
            .field("name", &self.name)
            .field("cpu_percentile", &self.cpu_percentile)
            .field("memory_percentile", &self.memory_percentile)
            .field("accelerator_percentile", &self.accelerator_percentile)
            .finish_non_exhaustive()
    }
}

impl GenericRecommendationModel {
    /// Build with the built-in MIG catalog
    pub fn new(name: impl Into<String>, tunables: RecommendationTunables) -> Result<Self, ModelError> {
        Self::with_matcher(name, tunables, Arc::new(MigProfileCatalog::default()))
    }

    pub fn with_matcher(
        name: impl Into<String>,
        tunables: RecommendationTunables,
        matcher: Arc<dyn AcceleratorProfileMatcher>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::EmptyModelName);
        }
        Ok(Self::from_parts(name, tunables, matcher))
    }

    /// Construct without validating the name; callers guarantee it is non-empty
    pub(crate) fn from_parts(
        name: String,
        tunables: RecommendationTunables,
        matcher: Arc<dyn AcceleratorProfileMatcher>,
    ) -> Self {
        Self {
            name,
            cpu_percentile: tunables.cpu_percentile,
            memory_percentile: tunables.memory_percentile,
            accelerator_percentile: tunables.accelerator_percentile,
            matcher,
        }
    }

    pub fn tunables(&self) -> RecommendationTunables {
        RecommendationTunables::new(
            self.cpu_percentile,
            self.memory_percentile,
            self.accelerator_percentile,
        )
    }

    /// Shared CPU path for container and namespace bounds
    fn cpu_request(
        &self,
        intervals: &IntervalMap,
        bounds: fn(&IntervalResults) -> UsageBounds,
        format_metric: MetricName,
        mut notifications: Option<&mut Vec<RecommendationNotification>>,
    ) -> Option<RecommendationConfigItem> {
        let maxima: Vec<f64> = intervals
            .values()
            .map(|interval| {
                let b = bounds(interval);
                debug!(min = b.min, max = b.max, "cpu request interval");
                b.max
            })
            .collect();

        let overall_max = maxima.iter().copied().reduce(f64::max);
        let cpu_request = match overall_max {
            Some(max) if max < CPU_ONE_CORE => Some(max),
            _ => percentile(self.cpu_percentile, &maxima),
        }
        .unwrap_or(CPU_ZERO);

        if cpu_request == CPU_ZERO {
            notify(&mut notifications, NotificationCode::CpuRecordsAreZero);
            return None;
        }
        if cpu_request <= CPU_ONE_MILLICORE {
            notify(&mut notifications, NotificationCode::CpuRecordsAreIdle);
            return None;
        }

        let format = usage::first_format(intervals, format_metric);
        Some(RecommendationConfigItem::new(cpu_request, format))
    }

    /// Shared memory path for container and namespace bounds
    fn memory_request(
        &self,
        intervals: &IntervalMap,
        bounds: fn(&IntervalResults) -> UsageBounds,
        spike: fn(&IntervalResults) -> f64,
        format_metric: MetricName,
        mut notifications: Option<&mut Vec<RecommendationNotification>>,
    ) -> Option<RecommendationConfigItem> {
        let usage_maxima: Vec<f64> = intervals
            .values()
            .map(|interval| {
                let b = bounds(interval);
                debug!(min = b.min, max = b.max, "memory request interval");
                b.max
            })
            .collect();
        let spikes: Vec<f64> = intervals.values().map(spike).collect();

        let usage = percentile(self.memory_percentile, &usage_maxima).unwrap_or(0.0);
        let usage_buffered = usage + usage * MEM_USAGE_BUFFER_DECIMAL;

        let spike = percentile(self.memory_percentile, &spikes).unwrap_or(0.0);
        let spike_buffered = usage + (spike + spike * MEM_SPIKE_BUFFER_DECIMAL);

        let memory_request = usage_buffered.min(spike_buffered);

        if memory_request == 0.0 {
            notify(&mut notifications, NotificationCode::MemoryRecordsAreZero);
            return None;
        }

        let format = usage::first_format(intervals, format_metric);
        Some(RecommendationConfigItem::new(memory_request, format))
    }

    fn clamp_fraction(fraction: f64, resource: &str) -> f64 {
        if fraction > 1.0 {
            warn!(
                resource = resource,
                fraction = fraction,
                "Data irregularity detected, accelerator fraction above 1.0 clamped"
            );
            1.0
        } else {
            fraction
        }
    }
}

impl RecommendationModel for GenericRecommendationModel {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn cpu_request_recommendation(
        &self,
        intervals: &IntervalMap,
        notifications: Option<&mut Vec<RecommendationNotification>>,
    ) -> Option<RecommendationConfigItem> {
        self.cpu_request(intervals, usage::cpu_bounds, MetricName::CpuUsage, notifications)
    }

    fn memory_request_recommendation(
        &self,
        intervals: &IntervalMap,
        notifications: Option<&mut Vec<RecommendationNotification>>,
    ) -> Option<RecommendationConfigItem> {
        self.memory_request(
            intervals,
            usage::memory_bounds,
            usage::memory_spike,
            MetricName::MemoryUsage,
            notifications,
        )
    }

    fn namespace_cpu_request_recommendation(
        &self,
        intervals: &IntervalMap,
        notifications: Option<&mut Vec<RecommendationNotification>>,
    ) -> Option<RecommendationConfigItem> {
        self.cpu_request(
            intervals,
            usage::namespace_cpu_bounds,
            MetricName::NamespaceCpuUsage,
            notifications,
        )
    }

    fn namespace_memory_request_recommendation(
        &self,
        intervals: &IntervalMap,
        notifications: Option<&mut Vec<RecommendationNotification>>,
    ) -> Option<RecommendationConfigItem> {
        self.memory_request(
            intervals,
            usage::namespace_memory_bounds,
            usage::namespace_memory_spike,
            MetricName::NamespaceMemoryUsage,
            notifications,
        )
    }

    fn accelerator_request_recommendation(
        &self,
        intervals: &IntervalMap,
        mut notifications: Option<&mut Vec<RecommendationNotification>>,
    ) -> Option<AcceleratorRecommendation> {
        let samples = AcceleratorSamples::collect(intervals, self.matcher.as_ref());

        if !samples.is_gpu_workload {
            return None;
        }
        if samples.is_empty() {
            notify(&mut notifications, NotificationCode::AcceleratorRecordsAreZero);
            return None;
        }

        let core = percentile(self.accelerator_percentile, &samples.core_max_values).unwrap_or(0.0);
        let memory =
            percentile(self.accelerator_percentile, &samples.memory_max_values).unwrap_or(0.0);

        let core_fraction = Self::clamp_fraction(core / 100.0, "core");
        let memory_fraction = Self::clamp_fraction(memory / 100.0, "memory");

        let Some(model) = samples.model.as_deref() else {
            debug!("No supported accelerator model reported, skipping profile match");
            return None;
        };

        debug!(
            model = %model,
            core_fraction = core_fraction,
            memory_fraction = memory_fraction,
            "Matching accelerator profile"
        );
        self.matcher
            .optimal_profile(model, core_fraction, memory_fraction)
    }
}
