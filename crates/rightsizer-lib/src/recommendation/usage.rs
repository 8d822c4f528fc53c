//! Per-interval usage bounds
//!
//! Each function reduces one interval to the representative min/max pair
//! the sizing algorithms take percentiles over.

use super::constants::CPU_ONE_CORE;
use crate::models::{IntervalMap, IntervalResults, MetricName};

/// Representative min and max usage of one interval
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsageBounds {
    pub min: f64,
    pub max: f64,
}

/// Smallest strictly positive value, or 0.0 if none is positive
fn min_positive<const N: usize>(values: [f64; N]) -> f64 {
    values
        .into_iter()
        .filter(|v| *v > 0.0)
        .min_by(|a, b| a.total_cmp(b))
        .unwrap_or(0.0)
}

/// Number of pods behind an aggregate, inferred as sum/avg
///
/// CPU usage is tried first, then memory usage. Returns 0.0 when neither
/// ratio is available.
pub fn infer_pod_count(interval: &IntervalResults) -> f64 {
    let cpu = interval.values(MetricName::CpuUsage);
    let mem = interval.values(MetricName::MemoryUsage);

    let mut num_pods = 0.0;
    if cpu.avg != 0.0 {
        num_pods = cpu.sum / cpu.avg;
    }
    if num_pods == 0.0 && mem.avg != 0.0 {
        num_pods = mem.sum / mem.avg;
    }
    num_pods
}

/// CPU bounds for a container, normalized to a single pod
pub fn cpu_bounds(interval: &IntervalResults) -> UsageBounds {
    let usage = interval.values(MetricName::CpuUsage);
    let throttle = interval.values(MetricName::CpuThrottle);

    let total = usage.peak() + throttle.peak();
    let mut per_pod = 0.0;

    let max = if total < CPU_ONE_CORE {
        total
    } else {
        let num_pods = infer_pod_count(interval);
        if num_pods > 0.0 {
            per_pod = (usage.sum + throttle.sum) / num_pods;
        }
        per_pod.max(total)
    };

    let min = min_positive([per_pod, total, usage.min + throttle.min]);
    UsageBounds { min, max }
}

/// CPU bounds for a namespace aggregate, used as-is
pub fn namespace_cpu_bounds(interval: &IntervalResults) -> UsageBounds {
    let usage = interval.values(MetricName::NamespaceCpuUsage);
    let throttle = interval.values(MetricName::NamespaceCpuThrottle);

    let total = usage.peak() + throttle.peak();
    let min = min_positive([total, usage.min + throttle.min]);
    UsageBounds { min, max: total }
}

/// Memory bounds for a container, normalized to a single pod
pub fn memory_bounds(interval: &IntervalResults) -> UsageBounds {
    let mem = interval.values(MetricName::MemoryUsage);

    let num_pods = infer_pod_count(interval);
    let per_pod = if num_pods > 0.0 {
        mem.sum / num_pods
    } else {
        0.0
    };

    let max = per_pod.max(mem.max);
    let min = min_positive([per_pod, max, mem.min]);
    UsageBounds { min, max }
}

/// Memory bounds for a namespace aggregate
pub fn namespace_memory_bounds(interval: &IntervalResults) -> UsageBounds {
    let mem = interval.values(MetricName::NamespaceMemoryUsage);
    UsageBounds {
        min: min_positive([mem.max, mem.min]),
        max: mem.max,
    }
}

fn spike_of(interval: &IntervalResults, usage: MetricName, rss: MetricName) -> f64 {
    let usage = interval.values(usage);
    let rss = interval.values(rss);
    (usage.max - usage.min).ceil().max((rss.max - rss.min).ceil())
}

/// Larger of the usage and RSS ranges within the interval, rounded up
pub fn memory_spike(interval: &IntervalResults) -> f64 {
    spike_of(interval, MetricName::MemoryUsage, MetricName::MemoryRss)
}

pub fn namespace_memory_spike(interval: &IntervalResults) -> f64 {
    spike_of(
        interval,
        MetricName::NamespaceMemoryUsage,
        MetricName::NamespaceMemoryRss,
    )
}

/// First non-empty unit string reported for a metric across the intervals
pub fn first_format(intervals: &IntervalMap, metric: MetricName) -> String {
    intervals
        .values()
        .filter_map(|interval| interval.aggregation(metric))
        .find_map(|info| info.format())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricAggregationInfo;

    fn agg(avg: f64, max: f64, min: f64, sum: f64) -> MetricAggregationInfo {
        MetricAggregationInfo {
            avg: Some(avg),
            max: Some(max),
            min: Some(min),
            sum: Some(sum),
            format: None,
        }
    }

    #[test]
    fn test_sub_core_usage_is_trusted() {
        let interval = IntervalResults::new()
            .with_metric(MetricName::CpuUsage, agg(0.3, 0.6, 0.1, 1.2))
            .with_metric(MetricName::CpuThrottle, agg(0.0, 0.1, 0.0, 0.0));

        let bounds = cpu_bounds(&interval);
        assert!((bounds.max - 0.7).abs() < 1e-12);
        // per-pod estimate is skipped below one core, min comes from min totals
        assert!((bounds.min - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_multi_pod_aggregate_is_normalized() {
        // 4 pods: sum 8, avg 2 -> per-pod usage 8/4 = 2 plus throttle 4/4 = 1
        let interval = IntervalResults::new()
            .with_metric(MetricName::CpuUsage, agg(2.0, 1.5, 0.5, 8.0))
            .with_metric(MetricName::CpuThrottle, agg(0.5, 0.0, 0.0, 4.0));

        let bounds = cpu_bounds(&interval);
        assert_eq!(bounds.max, 3.0);
        // positive values: per_pod 3.0, total 1.5 + 0.5 = 2.0, min total 0.5
        assert_eq!(bounds.min, 0.5);
    }

    #[test]
    fn test_pod_count_falls_back_to_memory() {
        let interval = IntervalResults::new()
            .with_metric(MetricName::CpuUsage, agg(0.0, 2.0, 0.0, 6.0))
            .with_metric(MetricName::MemoryUsage, agg(100.0, 150.0, 50.0, 300.0));

        assert_eq!(infer_pod_count(&interval), 3.0);
        assert_eq!(cpu_bounds(&interval).max, 2.0);
    }

    #[test]
    fn test_all_zero_interval() {
        let interval = IntervalResults::new();
        assert_eq!(cpu_bounds(&interval), UsageBounds::default());
        assert_eq!(memory_bounds(&interval), UsageBounds::default());
        assert_eq!(memory_spike(&interval), 0.0);
    }

    #[test]
    fn test_memory_bounds_use_per_pod_average() {
        // 2 pods sharing 400 bytes, container max 150
        let interval = IntervalResults::new()
            .with_metric(MetricName::CpuUsage, agg(0.5, 0.6, 0.4, 1.0))
            .with_metric(MetricName::MemoryUsage, agg(200.0, 150.0, 90.0, 400.0));

        let bounds = memory_bounds(&interval);
        assert_eq!(bounds.max, 200.0);
        assert_eq!(bounds.min, 90.0);
    }

    #[test]
    fn test_inverted_aggregates_do_not_fail() {
        // min > max from faulty telemetry
        let interval = IntervalResults::new()
            .with_metric(MetricName::MemoryUsage, agg(10.0, 5.0, 20.0, 10.0))
            .with_metric(MetricName::MemoryRss, agg(0.0, 0.0, 3.0, 0.0));

        // ceil(5 - 20) = -15 vs ceil(0 - 3) = -3
        assert_eq!(memory_spike(&interval), -3.0);
        let bounds = memory_bounds(&interval);
        assert_eq!(bounds.max, 10.0);
        assert_eq!(bounds.min, 10.0);
    }

    #[test]
    fn test_spike_takes_larger_range() {
        let interval = IntervalResults::new()
            .with_metric(MetricName::MemoryUsage, agg(0.0, 100.2, 50.0, 0.0))
            .with_metric(MetricName::MemoryRss, agg(0.0, 90.0, 10.0, 0.0));

        // ceil(50.2) = 51 vs ceil(80) = 80
        assert_eq!(memory_spike(&interval), 80.0);
    }

    #[test]
    fn test_namespace_bounds_skip_normalization() {
        let interval = IntervalResults::new()
            .with_metric(MetricName::NamespaceCpuUsage, agg(2.0, 3.0, 1.0, 40.0))
            .with_metric(MetricName::NamespaceCpuThrottle, agg(0.2, 0.0, 0.0, 4.0))
            .with_metric(MetricName::NamespaceMemoryUsage, agg(0.0, 500.0, 0.0, 0.0));

        let cpu = namespace_cpu_bounds(&interval);
        assert!((cpu.max - 3.2).abs() < 1e-12);
        assert_eq!(cpu.min, 1.0);

        let mem = namespace_memory_bounds(&interval);
        assert_eq!(mem.max, 500.0);
        assert_eq!(mem.min, 500.0);
    }
}
