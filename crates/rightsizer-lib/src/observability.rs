//! Observability infrastructure for the recommendation engine
//!
//! Provides:
//! - Prometheus metrics (computation latency, produced/withheld requests, notifications)
//! - Structured JSON logging with tracing

use crate::recommendation::{NotificationSeverity, RecommendationNotification};
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for computation latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

struct EngineMetricsInner {
    computation_latency_seconds: Histogram,
    recommendations_generated: IntCounterVec,
    recommendations_withheld: IntCounterVec,
    notifications: IntCounterVec,
    intervals_analyzed: IntCounter,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            computation_latency_seconds: register_histogram!(
                "rightsizer_computation_latency_seconds",
                "Time spent computing a workload recommendation",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register computation_latency_seconds"),

            recommendations_generated: register_int_counter_vec!(
                "rightsizer_recommendations_generated_total",
                "Resource requests recommended",
                &["resource"]
            )
            .expect("Failed to register recommendations_generated_total"),

            recommendations_withheld: register_int_counter_vec!(
                "rightsizer_recommendations_withheld_total",
                "Resource requests withheld for lack of usable data",
                &["resource"]
            )
            .expect("Failed to register recommendations_withheld_total"),

            notifications: register_int_counter_vec!(
                "rightsizer_notifications_total",
                "Notifications attached to recommendations, by code",
                &["code"]
            )
            .expect("Failed to register notifications_total"),

            intervals_analyzed: register_int_counter!(
                "rightsizer_intervals_analyzed_total",
                "Usage intervals fed into the recommendation model"
            )
            .expect("Failed to register intervals_analyzed_total"),
        }
    }
}

/// Engine metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying counters.
#[derive(Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_computation_latency(&self, duration_secs: f64) {
        self.inner().computation_latency_seconds.observe(duration_secs);
    }

    pub fn inc_generated(&self, resource: &str) {
        self.inner()
            .recommendations_generated
            .with_label_values(&[resource])
            .inc();
    }

    pub fn inc_withheld(&self, resource: &str) {
        self.inner()
            .recommendations_withheld
            .with_label_values(&[resource])
            .inc();
    }

    pub fn inc_notification(&self, code: u32) {
        self.inner()
            .notifications
            .with_label_values(&[&code.to_string()])
            .inc();
    }

    pub fn add_intervals_analyzed(&self, count: usize) {
        self.inner().intervals_analyzed.inc_by(count as u64);
    }

    pub fn generated_count(&self, resource: &str) -> u64 {
        self.inner()
            .recommendations_generated
            .with_label_values(&[resource])
            .get()
    }

    pub fn withheld_count(&self, resource: &str) -> u64 {
        self.inner()
            .recommendations_withheld
            .with_label_values(&[resource])
            .get()
    }

    /// Render the default registry in the Prometheus text format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Structured logger for recommendation events
///
/// Emits one JSON record per significant event, tagged with `event`.
#[derive(Clone)]
pub struct StructuredLogger {
    source: String,
}

impl StructuredLogger {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Log a produced resource request
    pub fn log_recommendation(
        &self,
        target: &str,
        model: &str,
        resource: &str,
        amount: f64,
        format: &str,
    ) {
        info!(
            event = "recommendation_generated",
            source = %self.source,
            subject = %target,
            model = %model,
            resource = %resource,
            amount = amount,
            format = %format,
            "Generated resource recommendation"
        );
    }

    /// Log a notification explaining why a request was withheld
    pub fn log_withheld(&self, target: &str, model: &str, notification: &RecommendationNotification) {
        match notification.severity {
            NotificationSeverity::Critical | NotificationSeverity::Error => {
                warn!(
                    event = "recommendation_withheld",
                    source = %self.source,
                    subject = %target,
                    model = %model,
                    code = notification.code,
                    severity = %notification.severity,
                    details = %notification.message,
                    "Recommendation withheld"
                );
            }
            _ => {
                info!(
                    event = "recommendation_withheld",
                    source = %self.source,
                    subject = %target,
                    model = %model,
                    code = notification.code,
                    severity = %notification.severity,
                    details = %notification.message,
                    "Recommendation withheld"
                );
            }
        }
    }

    pub fn log_startup(&self, version: &str, model: &str, tunables: &str) {
        info!(
            event = "engine_started",
            source = %self.source,
            version = %version,
            model = %model,
            tunables = %tunables,
            "Recommendation engine started"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::NotificationCode;

    #[test]
    fn test_engine_metrics_counters() {
        let metrics = EngineMetrics::new();
        let before = metrics.generated_count("observability-test");

        metrics.observe_computation_latency(0.0002);
        metrics.inc_generated("observability-test");
        metrics.inc_withheld("observability-test");
        metrics.inc_notification(323001);
        metrics.add_intervals_analyzed(3);

        assert_eq!(metrics.generated_count("observability-test"), before + 1);
        assert!(metrics.withheld_count("observability-test") >= 1);
    }

    #[test]
    fn test_render_contains_metric_names() {
        let metrics = EngineMetrics::new();
        metrics.inc_generated("cpu");
        let text = metrics.render().unwrap();
        assert!(text.contains("rightsizer_recommendations_generated_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-source");
        assert_eq!(logger.source, "test-source");
        logger.log_withheld(
            "default/web",
            "cost",
            &NotificationCode::CpuRecordsAreIdle.into(),
        );
    }
}
