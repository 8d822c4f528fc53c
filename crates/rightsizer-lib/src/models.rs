//! Core data models for the recommendation engine
//!
//! Interval samples arrive pre-aggregated from the ingestion layer. Every
//! aggregate is optional on the wire; arithmetic goes through the accessors
//! on [`IntervalResults`], which read an absent value as `0.0`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Interval samples keyed by interval end time
pub type IntervalMap = BTreeMap<DateTime<Utc>, IntervalResults>;

/// Metric identifiers emitted by the ingestion layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricName {
    CpuRequest,
    CpuLimit,
    CpuUsage,
    CpuThrottle,
    MemoryRequest,
    MemoryLimit,
    MemoryUsage,
    #[serde(rename = "memoryRSS")]
    MemoryRss,
    NamespaceCpuUsage,
    NamespaceCpuThrottle,
    NamespaceMemoryUsage,
    #[serde(rename = "namespaceMemoryRSS")]
    NamespaceMemoryRss,
    AcceleratorCoreUsage,
    AcceleratorMemoryUsage,
    AcceleratorFrameBufferUsage,
}

impl MetricName {
    pub fn is_accelerator(&self) -> bool {
        matches!(
            self,
            MetricName::AcceleratorCoreUsage
                | MetricName::AcceleratorMemoryUsage
                | MetricName::AcceleratorFrameBufferUsage
        )
    }
}

/// Per-interval aggregates of a single metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricAggregationInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl MetricAggregationInfo {
    pub fn avg(&self) -> f64 {
        self.avg.unwrap_or(0.0)
    }

    pub fn max(&self) -> f64 {
        self.max.unwrap_or(0.0)
    }

    pub fn min(&self) -> f64 {
        self.min.unwrap_or(0.0)
    }

    pub fn sum(&self) -> f64 {
        self.sum.unwrap_or(0.0)
    }

    /// Unit string if present and non-empty
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref().filter(|f| !f.is_empty())
    }
}

/// Accelerator descriptor attached to a generic metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcceleratorMetricMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

/// A metric's aggregates plus optional accelerator metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_info: Option<MetricAggregationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AcceleratorMetricMetadata>,
}

impl MetricResults {
    pub fn from_aggregation(aggregation_info: MetricAggregationInfo) -> Self {
        Self {
            aggregation_info: Some(aggregation_info),
            metadata: None,
        }
    }
}

/// Device identity reported with per-device accelerator metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcceleratorDeviceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// Accelerator metric bound to the device that produced it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcceleratorMetricResult {
    #[serde(default)]
    pub device: AcceleratorDeviceData,
    #[serde(default)]
    pub metric_results: MetricResults,
}

/// One observation window's aggregates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntervalResults {
    #[serde(default)]
    pub metrics: HashMap<MetricName, MetricResults>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub accelerator_metrics: HashMap<MetricName, AcceleratorMetricResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_in_minutes: Option<f64>,
}

impl IntervalResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add aggregates for a metric (builder style)
    pub fn with_metric(mut self, name: MetricName, info: MetricAggregationInfo) -> Self {
        self.metrics.insert(name, MetricResults::from_aggregation(info));
        self
    }

    /// Aggregates for a metric, if the metric and its aggregates are present
    pub fn aggregation(&self, name: MetricName) -> Option<&MetricAggregationInfo> {
        self.metrics
            .get(&name)
            .and_then(|m| m.aggregation_info.as_ref())
    }

    /// Snapshot of a metric with absent values read as zero
    pub fn values(&self, name: MetricName) -> MetricValues {
        self.aggregation(name)
            .map(|a| MetricValues {
                avg: a.avg(),
                max: a.max(),
                min: a.min(),
                sum: a.sum(),
            })
            .unwrap_or_default()
    }
}

/// Zero-defaulted view of a metric's aggregates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricValues {
    pub avg: f64,
    pub max: f64,
    pub min: f64,
    pub sum: f64,
}

impl MetricValues {
    /// Max when positive, otherwise avg
    pub fn peak(&self) -> f64 {
        if self.max > 0.0 {
            self.max
        } else {
            self.avg
        }
    }
}

/// Resource a recommendation is issued for
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RecommendationItem {
    Cpu,
    Memory,
    NvidiaGpu,
    /// MIG partition, e.g. `3g.20gb`
    NvidiaMig(String),
}

const NVIDIA_GPU_RESOURCE: &str = "nvidia.com/gpu";
const NVIDIA_MIG_PREFIX: &str = "nvidia.com/mig-";

impl fmt::Display for RecommendationItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationItem::Cpu => write!(f, "cpu"),
            RecommendationItem::Memory => write!(f, "memory"),
            RecommendationItem::NvidiaGpu => write!(f, "{}", NVIDIA_GPU_RESOURCE),
            RecommendationItem::NvidiaMig(profile) => write!(f, "{}{}", NVIDIA_MIG_PREFIX, profile),
        }
    }
}

impl FromStr for RecommendationItem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(RecommendationItem::Cpu),
            "memory" => Ok(RecommendationItem::Memory),
            NVIDIA_GPU_RESOURCE => Ok(RecommendationItem::NvidiaGpu),
            other => match other.strip_prefix(NVIDIA_MIG_PREFIX) {
                Some(profile) if !profile.is_empty() => {
                    Ok(RecommendationItem::NvidiaMig(profile.to_string()))
                }
                _ => Err(format!("unknown recommendation item: {}", other)),
            },
        }
    }
}

impl From<RecommendationItem> for String {
    fn from(item: RecommendationItem) -> Self {
        item.to_string()
    }
}

impl TryFrom<String> for RecommendationItem {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl RecommendationItem {
    pub fn is_accelerator(&self) -> bool {
        matches!(
            self,
            RecommendationItem::NvidiaGpu | RecommendationItem::NvidiaMig(_)
        )
    }
}

/// A recommended amount and its unit
///
/// An item without an amount never carries a usable value: it is either an
/// empty placeholder or an error annotation produced by the unit helpers.
/// Check [`RecommendationConfigItem::is_usable`] before reading the amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationConfigItem {
    amount: Option<f64>,
    format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_msg: Option<String>,
}

impl RecommendationConfigItem {
    pub fn new(amount: f64, format: impl Into<String>) -> Self {
        Self {
            amount: Some(amount),
            format: format.into(),
            error_msg: None,
        }
    }

    /// Item that only carries an error description
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            amount: None,
            format: String::new(),
            error_msg: Some(message.into()),
        }
    }

    pub fn amount(&self) -> Option<f64> {
        self.amount
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn error_msg(&self) -> Option<&str> {
        self.error_msg.as_deref()
    }

    pub fn is_usable(&self) -> bool {
        self.error_msg.is_none() && self.amount.map(f64::is_finite).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_aggregates_read_as_zero() {
        let interval = IntervalResults::new().with_metric(
            MetricName::CpuUsage,
            MetricAggregationInfo {
                max: Some(1.5),
                ..Default::default()
            },
        );

        let cpu = interval.values(MetricName::CpuUsage);
        assert_eq!(cpu.max, 1.5);
        assert_eq!(cpu.avg, 0.0);
        assert_eq!(cpu.sum, 0.0);

        let missing = interval.values(MetricName::MemoryUsage);
        assert_eq!(missing, MetricValues::default());
    }

    #[test]
    fn test_peak_falls_back_to_avg() {
        let v = MetricValues {
            avg: 0.4,
            max: 0.0,
            ..Default::default()
        };
        assert_eq!(v.peak(), 0.4);

        let v = MetricValues {
            avg: 0.4,
            max: 0.9,
            ..Default::default()
        };
        assert_eq!(v.peak(), 0.9);
    }

    #[test]
    fn test_empty_format_is_ignored() {
        let info = MetricAggregationInfo {
            format: Some(String::new()),
            ..Default::default()
        };
        assert!(info.format().is_none());
    }

    #[test]
    fn test_metric_name_wire_names() {
        let json = serde_json::to_string(&MetricName::MemoryRss).unwrap();
        assert_eq!(json, "\"memoryRSS\"");
        let name: MetricName = serde_json::from_str("\"namespaceCpuThrottle\"").unwrap();
        assert_eq!(name, MetricName::NamespaceCpuThrottle);
    }

    #[test]
    fn test_accelerator_metric_names() {
        assert!(MetricName::AcceleratorCoreUsage.is_accelerator());
        assert!(MetricName::AcceleratorFrameBufferUsage.is_accelerator());
        assert!(!MetricName::NamespaceMemoryUsage.is_accelerator());
        assert!(!MetricName::CpuUsage.is_accelerator());
    }

    #[test]
    fn test_recommendation_item_resource_names() {
        assert_eq!(RecommendationItem::Cpu.to_string(), "cpu");
        assert_eq!(RecommendationItem::NvidiaGpu.to_string(), "nvidia.com/gpu");
        assert_eq!(
            "nvidia.com/mig-3g.20gb".parse::<RecommendationItem>().unwrap(),
            RecommendationItem::NvidiaMig("3g.20gb".to_string())
        );
        assert!("nvidia.com/mig-".parse::<RecommendationItem>().is_err());
    }

    #[test]
    fn test_recommendation_item_as_map_key() {
        let mut map = BTreeMap::new();
        map.insert(
            RecommendationItem::NvidiaMig("1g.5gb".to_string()),
            RecommendationConfigItem::new(1.0, "cores"),
        );
        let json = serde_json::to_string(&map).unwrap();
        assert!(json.contains("\"nvidia.com/mig-1g.5gb\""));

        let back: BTreeMap<RecommendationItem, RecommendationConfigItem> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_error_item_is_not_usable() {
        let item = RecommendationConfigItem::error("bad unit");
        assert!(item.amount().is_none());
        assert_eq!(item.error_msg(), Some("bad unit"));
        assert!(!item.is_usable());
        assert!(RecommendationConfigItem::new(2.0, "cores").is_usable());
    }

    #[test]
    fn test_interval_map_deserializes_from_timestamps() {
        let json = r#"{
            "2024-01-01T00:15:00Z": {
                "metrics": {
                    "cpuUsage": { "aggregation_info": { "max": 0.5, "format": "cores" } }
                }
            }
        }"#;
        let map: IntervalMap = serde_json::from_str(json).unwrap();
        assert_eq!(map.len(), 1);
        let interval = map.values().next().unwrap();
        assert_eq!(interval.values(MetricName::CpuUsage).max, 0.5);
    }
}
