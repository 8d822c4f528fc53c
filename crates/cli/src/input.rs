//! Experiment input files

use anyhow::{Context, Result};
use rightsizer_lib::{IntervalMap, RecommendationTarget};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One experiment: a target and its interval samples
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentInput {
    pub experiment_name: String,
    pub target: RecommendationTarget,
    #[serde(default)]
    pub intervals: IntervalMap,
}

impl ExperimentInput {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read experiment file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse experiment file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_experiment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "experiment_name": "web-app",
                "target": {{"kind": "container", "namespace": "default", "workload": "web", "container": "app"}},
                "intervals": {{
                    "2024-01-01T00:15:00Z": {{
                        "metrics": {{ "cpuUsage": {{ "aggregation_info": {{ "max": 0.4, "format": "cores" }} }} }}
                    }}
                }}
            }}"#
        )
        .unwrap();

        let input = ExperimentInput::load(file.path()).unwrap();
        assert_eq!(input.experiment_name, "web-app");
        assert_eq!(input.intervals.len(), 1);
        assert_eq!(input.target.namespace(), "default");
    }

    #[test]
    fn test_load_reports_path() {
        let err = ExperimentInput::load(Path::new("/nonexistent/exp.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/exp.json"));
    }
}
