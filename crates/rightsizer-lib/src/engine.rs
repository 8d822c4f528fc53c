//! Workload-level recommendation engine
//!
//! Runs the per-resource model methods for a target and gathers their
//! results and notifications into a single [`WorkloadRecommendation`].

use crate::models::{IntervalMap, RecommendationConfigItem, RecommendationItem};
use crate::observability::{EngineMetrics, StructuredLogger};
use crate::recommendation::{
    NotificationCode, NotificationSeverity, RecommendationModel, RecommendationNotification,
};
use crate::units::{format_accelerator_units, format_cpu_units, format_memory_units};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// What a recommendation is computed for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecommendationTarget {
    Container {
        namespace: String,
        workload: String,
        container: String,
    },
    Namespace {
        namespace: String,
    },
}

impl RecommendationTarget {
    pub fn namespace(&self) -> &str {
        match self {
            RecommendationTarget::Container { namespace, .. } => namespace,
            RecommendationTarget::Namespace { namespace } => namespace,
        }
    }
}

impl fmt::Display for RecommendationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationTarget::Container {
                namespace,
                workload,
                container,
            } => write!(f, "{}/{}/{}", namespace, workload, container),
            RecommendationTarget::Namespace { namespace } => write!(f, "{}", namespace),
        }
    }
}

/// Requests and notifications produced for one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadRecommendation {
    pub target: RecommendationTarget,
    pub model_name: String,
    pub requests: BTreeMap<RecommendationItem, RecommendationConfigItem>,
    pub notifications: Vec<RecommendationNotification>,
    pub generated_at: DateTime<Utc>,
    pub intervals_analyzed: usize,
}

impl WorkloadRecommendation {
    /// Requests re-expressed in Kubernetes units
    ///
    /// CPU becomes millicores, memory binary units and accelerators a bare
    /// count. Items the unit helpers reject carry their error message.
    pub fn formatted_requests(&self) -> BTreeMap<RecommendationItem, RecommendationConfigItem> {
        self.requests
            .iter()
            .map(|(item, config)| {
                let formatted = match item {
                    RecommendationItem::Cpu => format_cpu_units(config),
                    RecommendationItem::Memory => format_memory_units(config),
                    RecommendationItem::NvidiaGpu | RecommendationItem::NvidiaMig(_) => {
                        format_accelerator_units(config)
                    }
                };
                (item.clone(), formatted)
            })
            .collect()
    }

    pub fn has_requests(&self) -> bool {
        !self.requests.is_empty()
    }

    /// Highest severity among the notifications, if any
    pub fn most_severe(&self) -> Option<NotificationSeverity> {
        self.notifications
            .iter()
            .map(|n| n.severity)
            .min_by_key(|s| severity_rank(*s))
    }
}

fn severity_rank(severity: NotificationSeverity) -> u8 {
    match severity {
        NotificationSeverity::Critical => 0,
        NotificationSeverity::Error => 1,
        NotificationSeverity::Warning => 2,
        NotificationSeverity::Notice => 3,
        NotificationSeverity::Info => 4,
    }
}

/// Shared, stateless front end over a recommendation model
#[derive(Clone)]
pub struct RecommendationEngine {
    model: Arc<dyn RecommendationModel>,
    metrics: Option<EngineMetrics>,
    logger: StructuredLogger,
}

impl RecommendationEngine {
    pub fn new(model: Arc<dyn RecommendationModel>) -> Self {
        Self {
            model,
            metrics: None,
            logger: StructuredLogger::new("rightsizer"),
        }
    }

    /// Record Prometheus metrics for every generated recommendation
    pub fn with_metrics(mut self, metrics: EngineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Compute every applicable request for the target
    pub fn generate(
        &self,
        target: &RecommendationTarget,
        intervals: &IntervalMap,
    ) -> WorkloadRecommendation {
        let start = Instant::now();
        let mut notifications = Vec::new();
        let mut requests = BTreeMap::new();
        let mut withheld = Vec::new();

        let (cpu, memory) = match target {
            RecommendationTarget::Container { .. } => (
                self.model
                    .cpu_request_recommendation(intervals, Some(&mut notifications)),
                self.model
                    .memory_request_recommendation(intervals, Some(&mut notifications)),
            ),
            RecommendationTarget::Namespace { .. } => (
                self.model
                    .namespace_cpu_request_recommendation(intervals, Some(&mut notifications)),
                self.model
                    .namespace_memory_request_recommendation(intervals, Some(&mut notifications)),
            ),
        };

        match cpu {
            Some(item) => {
                requests.insert(RecommendationItem::Cpu, item);
            }
            None => withheld.push("cpu"),
        }
        match memory {
            Some(item) => {
                requests.insert(RecommendationItem::Memory, item);
            }
            None => withheld.push("memory"),
        }

        if matches!(target, RecommendationTarget::Container { .. }) {
            let before = notifications.len();
            match self
                .model
                .accelerator_request_recommendation(intervals, Some(&mut notifications))
            {
                Some(profile) => requests.extend(profile),
                None if notifications.len() > before => withheld.push("accelerator"),
                None => debug!(subject = %target, "No accelerator recommendation"),
            }
        }

        if !requests.is_empty() {
            notifications.insert(0, NotificationCode::RecommendationsAvailable.into());
        }

        let recommendation = WorkloadRecommendation {
            target: target.clone(),
            model_name: self.model.model_name().to_string(),
            requests,
            notifications,
            generated_at: Utc::now(),
            intervals_analyzed: intervals.len(),
        };

        self.record(&recommendation, &withheld, start.elapsed().as_secs_f64());
        recommendation
    }

    fn record(&self, recommendation: &WorkloadRecommendation, withheld: &[&str], elapsed: f64) {
        let target = recommendation.target.to_string();

        for (item, config) in &recommendation.requests {
            self.logger.log_recommendation(
                &target,
                &recommendation.model_name,
                &item.to_string(),
                config.amount().unwrap_or_default(),
                config.format(),
            );
        }
        for notification in &recommendation.notifications {
            if !notification.is(NotificationCode::RecommendationsAvailable) {
                self.logger
                    .log_withheld(&target, &recommendation.model_name, notification);
            }
        }

        let Some(metrics) = &self.metrics else {
            return;
        };
        metrics.observe_computation_latency(elapsed);
        metrics.add_intervals_analyzed(recommendation.intervals_analyzed);
        for item in recommendation.requests.keys() {
            let resource = if item.is_accelerator() {
                "accelerator".to_string()
            } else {
                item.to_string()
            };
            metrics.inc_generated(&resource);
        }
        for resource in withheld {
            metrics.inc_withheld(resource);
        }
        for notification in &recommendation.notifications {
            metrics.inc_notification(notification.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AcceleratorDeviceData, AcceleratorMetricResult, IntervalResults, MetricAggregationInfo,
        MetricName, MetricResults,
    };
    use crate::recommendation::CostBasedRecommendationModel;
    use chrono::TimeZone;

    fn info(avg: f64, max: f64, min: f64, sum: f64, format: &str) -> MetricAggregationInfo {
        MetricAggregationInfo {
            avg: Some(avg),
            max: Some(max),
            min: Some(min),
            sum: Some(sum),
            format: Some(format.to_string()),
        }
    }

    fn container() -> RecommendationTarget {
        RecommendationTarget::Container {
            namespace: "default".to_string(),
            workload: "web".to_string(),
            container: "app".to_string(),
        }
    }

    fn sample_intervals() -> IntervalMap {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        (0..4)
            .map(|i| {
                let interval = IntervalResults::new()
                    .with_metric(
                        MetricName::CpuUsage,
                        info(0.25, 0.5, 0.1, 0.25, "cores"),
                    )
                    .with_metric(
                        MetricName::MemoryUsage,
                        info(
                            64.0 * 1024.0 * 1024.0,
                            80.0 * 1024.0 * 1024.0,
                            60.0 * 1024.0 * 1024.0,
                            64.0 * 1024.0 * 1024.0,
                            "bytes",
                        ),
                    )
                    .with_metric(
                        MetricName::NamespaceCpuUsage,
                        info(1.0, 1.5, 0.5, 1.0, "cores"),
                    );
                (start + chrono::Duration::minutes(15 * i), interval)
            })
            .collect()
    }

    fn engine() -> RecommendationEngine {
        RecommendationEngine::new(Arc::new(CostBasedRecommendationModel::default()))
    }

    #[test]
    fn test_container_recommendation() {
        let rec = engine().generate(&container(), &sample_intervals());

        assert_eq!(rec.model_name, "cost");
        assert_eq!(rec.intervals_analyzed, 4);
        assert_eq!(rec.requests.len(), 2);
        assert_eq!(rec.requests[&RecommendationItem::Cpu].amount(), Some(0.5));
        assert!(rec.notifications[0].is(NotificationCode::RecommendationsAvailable));
        assert_eq!(rec.notifications.len(), 1);
    }

    #[test]
    fn test_namespace_recommendation_withholds_memory() {
        let target = RecommendationTarget::Namespace {
            namespace: "default".to_string(),
        };
        let rec = engine().generate(&target, &sample_intervals());

        assert_eq!(rec.requests[&RecommendationItem::Cpu].amount(), Some(1.5));
        assert!(!rec.requests.contains_key(&RecommendationItem::Memory));
        assert!(rec
            .notifications
            .iter()
            .any(|n| n.is(NotificationCode::MemoryRecordsAreZero)));
    }

    #[test]
    fn test_no_data_has_no_available_notification() {
        let rec = engine().generate(&container(), &IntervalMap::new());

        assert!(!rec.has_requests());
        assert!(!rec
            .notifications
            .iter()
            .any(|n| n.is(NotificationCode::RecommendationsAvailable)));
        assert_eq!(rec.most_severe(), Some(NotificationSeverity::Notice));
    }

    #[test]
    fn test_formatted_requests() {
        let rec = engine().generate(&container(), &sample_intervals());
        let formatted = rec.formatted_requests();

        let cpu = &formatted[&RecommendationItem::Cpu];
        assert_eq!(cpu.amount(), Some(500.0));
        assert_eq!(cpu.format(), "m");

        let memory = &formatted[&RecommendationItem::Memory];
        assert_eq!(memory.format(), "Mi");
        assert!(memory.amount().unwrap() > 80.0);
    }

    #[test]
    fn test_accelerator_profile_in_requests() {
        let mut intervals = sample_intervals();
        for interval in intervals.values_mut() {
            interval.accelerator_metrics.insert(
                MetricName::AcceleratorCoreUsage,
                AcceleratorMetricResult {
                    device: AcceleratorDeviceData {
                        model_name: Some("NVIDIA H100 80GB HBM3".to_string()),
                        ..Default::default()
                    },
                    metric_results: MetricResults::from_aggregation(info(
                        10.0, 12.0, 8.0, 10.0, "percent",
                    )),
                },
            );
        }

        let rec = engine().generate(&container(), &intervals);
        let key = RecommendationItem::NvidiaMig("1g.10gb".to_string());
        assert_eq!(rec.requests[&key].amount(), Some(1.0));

        let formatted = rec.formatted_requests();
        assert_eq!(formatted[&key].format(), "");
    }

    #[test]
    fn test_engine_with_metrics() {
        let metrics = EngineMetrics::new();
        let before = metrics.generated_count("cpu");
        let engine = engine().with_metrics(metrics.clone());

        engine.generate(&container(), &sample_intervals());
        assert!(metrics.generated_count("cpu") > before);
    }

    #[test]
    fn test_target_serialization() {
        let json = serde_json::to_value(container()).unwrap();
        assert_eq!(json["kind"], "container");
        assert_eq!(json["workload"], "web");
        assert_eq!(container().to_string(), "default/web/app");

        let target: RecommendationTarget =
            serde_json::from_str(r#"{"kind":"namespace","namespace":"prod"}"#).unwrap();
        assert_eq!(target.namespace(), "prod");
    }
}
