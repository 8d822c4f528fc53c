//! Recommendation model
//!
//! Turns a series of per-interval aggregated usage samples into a single
//! request value per resource:
//! - CPU and memory for a container (pod-count normalized)
//! - CPU and memory for a namespace (aggregates used as-is)
//! - An accelerator partition profile for GPU workloads
//!
//! Computation is synchronous and side-effect free apart from the
//! caller-supplied notification sink.

mod accelerator;
mod catalog;
mod generic;
mod notification;
mod strategy;
mod tunables;
pub mod usage;


pub use accelerator::{AcceleratorProfileMatcher, AcceleratorRecommendation, AcceleratorSamples};
pub use catalog::{AcceleratorModel, MigProfile, MigProfileCatalog};
pub use generic::GenericRecommendationModel;
pub use notification::{NotificationCode, NotificationSeverity, RecommendationNotification};
pub use strategy::{
    CostBasedRecommendationModel, ModelKind, PerformanceBasedRecommendationModel,
    RecommendationModelBuilder,
};
pub use tunables::RecommendationTunables;

use crate::models::{IntervalMap, RecommendationConfigItem};

/// Fixed sizing constants
pub mod constants {
    pub const CPU_ZERO: f64 = 0.0;
    /// At or below this a CPU request counts as idle
    pub const CPU_ONE_MILLICORE: f64 = 0.001;
    pub const CPU_ONE_CORE: f64 = 1.0;
    /// Buffer added on top of the usage percentile
    pub const MEM_USAGE_BUFFER_DECIMAL: f64 = 0.20;
    /// Buffer added on top of the spike percentile
    pub const MEM_SPIKE_BUFFER_DECIMAL: f64 = 0.05;
}

/// Capability set shared by every recommendation strategy
///
/// Each method returns `None` when no recommendation can be made. When a
/// notification sink is given, the reason is appended to it; without one the
/// recommendation is still withheld.
pub trait RecommendationModel: Send + Sync {
    /// Strategy name, e.g. `cost`
    fn model_name(&self) -> &str;

    fn cpu_request_recommendation(
        &self,
        intervals: &IntervalMap,
        notifications: Option<&mut Vec<RecommendationNotification>>,
    ) -> Option<RecommendationConfigItem>;

    fn memory_request_recommendation(
        &self,
        intervals: &IntervalMap,
        notifications: Option<&mut Vec<RecommendationNotification>>,
    ) -> Option<RecommendationConfigItem>;

    fn namespace_cpu_request_recommendation(
        &self,
        intervals: &IntervalMap,
        notifications: Option<&mut Vec<RecommendationNotification>>,
    ) -> Option<RecommendationConfigItem>;

    fn namespace_memory_request_recommendation(
        &self,
        intervals: &IntervalMap,
        notifications: Option<&mut Vec<RecommendationNotification>>,
    ) -> Option<RecommendationConfigItem>;

    /// Partition profile for GPU workloads; `None` without any accelerator data
    fn accelerator_request_recommendation(
        &self,
        intervals: &IntervalMap,
        notifications: Option<&mut Vec<RecommendationNotification>>,
    ) -> Option<AcceleratorRecommendation>;
}
