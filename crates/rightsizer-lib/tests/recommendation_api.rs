//! Public API tests: building models, running the engine and the unit helpers

use rightsizer_lib::recommendation::{MigProfileCatalog, NotificationCode};
use rightsizer_lib::units::{format_cpu_units, format_memory_units, percentile};
use rightsizer_lib::{
    IntervalMap, ModelError, ModelKind, RecommendationConfigItem, RecommendationEngine,
    RecommendationItem, RecommendationModelBuilder, RecommendationTarget, RecommendationTunables,
};
use std::sync::Arc;
use std::thread;

const INTERVALS: &str = r#"{
    "2024-05-01T10:15:00Z": {
        "metrics": {
            "cpuUsage": {"aggregation_info": {"avg": 0.5, "max": 0.5, "sum": 0.5, "format": "cores"}},
            "memoryUsage": {"aggregation_info": {"avg": 268435456, "max": 268435456, "min": 268435456, "sum": 268435456, "format": "bytes"}}
        }
    },
    "2024-05-01T10:30:00Z": {
        "metrics": {
            "cpuUsage": {"aggregation_info": {"avg": 1.5, "max": 1.5, "sum": 1.5, "format": "cores"}},
            "memoryUsage": {"aggregation_info": {"avg": 268435456, "max": 268435456, "min": 268435456, "sum": 268435456, "format": "bytes"}}
        }
    },
    "2024-05-01T10:45:00Z": {
        "metrics": {
            "cpuUsage": {"aggregation_info": {"avg": 2.5, "max": 2.5, "sum": 2.5, "format": "cores"}},
            "memoryUsage": {"aggregation_info": {"avg": 268435456, "max": 268435456, "min": 268435456, "sum": 268435456, "format": "bytes"}}
        },
        "accelerator_metrics": {
            "acceleratorCoreUsage": {
                "device": {"model_name": "NVIDIA A100-SXM4-80GB", "uuid": "GPU-1"},
                "metric_results": {"aggregation_info": {"max": 35.0, "format": "percent"}}
            },
            "acceleratorMemoryUsage": {
                "device": {"model_name": "NVIDIA A100-SXM4-80GB", "uuid": "GPU-1"},
                "metric_results": {"aggregation_info": {"max": 40.0, "format": "percent"}}
            }
        }
    }
}"#;

fn intervals() -> IntervalMap {
    serde_json::from_str(INTERVALS).unwrap()
}

fn target() -> RecommendationTarget {
    RecommendationTarget::Container {
        namespace: "ml".to_string(),
        workload: "trainer".to_string(),
        container: "main".to_string(),
    }
}

#[test]
fn test_end_to_end_container_recommendation() {
    let model = RecommendationModelBuilder::new()
        .kind(ModelKind::Cost)
        .tunables(RecommendationTunables::new(90.0, 100.0, 100.0))
        .build()
        .unwrap();
    let engine = RecommendationEngine::new(model);

    let rec = engine.generate(&target(), &intervals());

    assert_eq!(rec.model_name, "cost");
    assert_eq!(rec.requests[&RecommendationItem::Cpu].amount(), Some(2.5));
    assert_eq!(rec.requests[&RecommendationItem::Cpu].format(), "cores");

    // flat 256Mi usage: the spike buffer adds nothing and undercuts the 20% buffer
    let memory = &rec.formatted_requests()[&RecommendationItem::Memory];
    assert_eq!(memory.format(), "Mi");
    assert!((memory.amount().unwrap() - 256.0).abs() < 1e-6);

    // 35% core and 40% memory of an 80GB A100 fit 3g.40gb
    let mig = RecommendationItem::NvidiaMig("3g.40gb".to_string());
    assert_eq!(rec.requests[&mig].amount(), Some(1.0));

    assert!(rec.notifications[0].is(NotificationCode::RecommendationsAvailable));
}

#[test]
fn test_builder_errors() {
    let err = RecommendationModelBuilder::new()
        .tunables(RecommendationTunables::cost())
        .build()
        .err()
        .unwrap();
    assert_eq!(err, ModelError::EmptyModelName);

    let err = RecommendationModelBuilder::new()
        .name("cost")
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, ModelError::MissingTunables(_)));
    assert!(err.to_string().contains("cost"));
}

#[test]
fn test_builder_with_explicit_catalog() {
    let model = RecommendationModelBuilder::new()
        .kind(ModelKind::Performance)
        .tunables(ModelKind::Performance.default_tunables())
        .matcher(Arc::new(MigProfileCatalog::nvidia()))
        .build()
        .unwrap();
    assert_eq!(model.model_name(), "performance");
}

#[test]
fn test_engine_shared_across_threads() {
    let model = RecommendationModelBuilder::new()
        .kind(ModelKind::Cost)
        .tunables(RecommendationTunables::cost())
        .build()
        .unwrap();
    let engine = Arc::new(RecommendationEngine::new(model));
    let data = Arc::new(intervals());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let data = Arc::clone(&data);
            thread::spawn(move || engine.generate(&target(), &data).requests)
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(results[0][&RecommendationItem::Cpu].amount(), Some(1.5));
}

#[test]
fn test_unit_helpers() {
    assert_eq!(percentile(50.0, &[1.0, 2.0, 3.0, 4.0]), Some(3.0));
    assert_eq!(percentile(50.0, &[]), None);

    let memory = format_memory_units(&RecommendationConfigItem::new(1048576.0, "bytes"));
    assert_eq!(memory.amount(), Some(1.0));
    assert_eq!(memory.format(), "Mi");

    let cpu = format_cpu_units(&RecommendationConfigItem::new(0.25, "cores"));
    assert_eq!(cpu.amount(), Some(250.0));
    assert_eq!(cpu.format(), "m");

    let rejected = format_cpu_units(&RecommendationConfigItem::new(1.0, "bytes"));
    assert!(!rejected.is_usable());
    assert!(rejected.error_msg().unwrap().contains("bytes"));
}
