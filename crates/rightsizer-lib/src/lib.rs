//! Resource request recommendation library
//!
//! This crate provides the core functionality for:
//! - Percentile-based CPU and memory request sizing for containers and namespaces
//! - Accelerator partition (MIG profile) selection for GPU workloads
//! - Unit conversion for Kubernetes resource quantities
//! - Notifications, metrics and structured logging around each run

pub mod engine;
pub mod error;
pub mod models;
pub mod observability;
pub mod recommendation;
pub mod units;

pub use engine::{RecommendationEngine, RecommendationTarget, WorkloadRecommendation};
pub use error::{ModelError, UnitError};
pub use models::*;
pub use observability::{EngineMetrics, StructuredLogger};
pub use recommendation::{
    CostBasedRecommendationModel, GenericRecommendationModel, ModelKind,
    PerformanceBasedRecommendationModel, RecommendationModel, RecommendationModelBuilder,
    RecommendationNotification, RecommendationTunables,
};
