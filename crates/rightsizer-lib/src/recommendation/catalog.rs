//! Built-in NVIDIA MIG profile catalog

use super::accelerator::{AcceleratorProfileMatcher, AcceleratorRecommendation};
use crate::models::{RecommendationConfigItem, RecommendationItem};
use crate::units::CORES;
use serde::Serialize;
use std::collections::HashMap;

const COMPUTE_SLICES: f64 = 7.0;
const MEMORY_SLICES: f64 = 8.0;

/// One partition of a device, sized in fractions of the whole
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigProfile {
    pub name: String,
    pub core_fraction: f64,
    pub memory_fraction: f64,
    pub whole_device: bool,
}

impl MigProfile {
    fn sliced(name: &str, compute: f64, memory: f64) -> Self {
        Self {
            name: name.to_string(),
            core_fraction: compute / COMPUTE_SLICES,
            memory_fraction: memory / MEMORY_SLICES,
            whole_device: compute == COMPUTE_SLICES && memory == MEMORY_SLICES,
        }
    }

    pub fn covers(&self, core_fraction: f64, memory_fraction: f64) -> bool {
        self.core_fraction >= core_fraction && self.memory_fraction >= memory_fraction
    }

    /// Resource a workload requests to get this profile
    pub fn item(&self) -> RecommendationItem {
        if self.whole_device {
            RecommendationItem::NvidiaGpu
        } else {
            RecommendationItem::NvidiaMig(self.name.clone())
        }
    }
}

/// A supported accelerator model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceleratorModel {
    pub name: String,
    /// Substrings that must all appear in the reported device name
    pub match_tokens: Vec<String>,
    pub frame_buffer_mib: f64,
    pub profiles: Vec<MigProfile>,
}

impl AcceleratorModel {
    fn matches(&self, raw_name: &str) -> bool {
        let upper = raw_name.trim().to_uppercase();
        self.match_tokens.iter().all(|t| upper.contains(t.as_str()))
    }
}

/// Static table of MIG-capable models and their profiles
#[derive(Debug, Clone)]
pub struct MigProfileCatalog {
    models: Vec<AcceleratorModel>,
}

impl MigProfileCatalog {
    pub fn new(models: Vec<AcceleratorModel>) -> Self {
        Self { models }
    }

    /// A100 40GB/80GB and H100 80GB
    pub fn nvidia() -> Self {
        let gb80_profiles = || {
            vec![
                MigProfile::sliced("1g.10gb", 1.0, 1.0),
                MigProfile::sliced("1g.20gb", 1.0, 2.0),
                MigProfile::sliced("2g.20gb", 2.0, 2.0),
                MigProfile::sliced("3g.40gb", 3.0, 4.0),
                MigProfile::sliced("4g.40gb", 4.0, 4.0),
                MigProfile::sliced("7g.80gb", 7.0, 8.0),
            ]
        };

        Self::new(vec![
            AcceleratorModel {
                name: "A100-40GB".to_string(),
                match_tokens: vec!["A100".to_string(), "40GB".to_string()],
                frame_buffer_mib: 40.0 * 1024.0,
                profiles: vec![
                    MigProfile::sliced("1g.5gb", 1.0, 1.0),
                    MigProfile::sliced("1g.10gb", 1.0, 2.0),
                    MigProfile::sliced("2g.10gb", 2.0, 2.0),
                    MigProfile::sliced("3g.20gb", 3.0, 4.0),
                    MigProfile::sliced("4g.20gb", 4.0, 4.0),
                    MigProfile::sliced("7g.40gb", 7.0, 8.0),
                ],
            },
            AcceleratorModel {
                name: "A100-80GB".to_string(),
                match_tokens: vec!["A100".to_string(), "80GB".to_string()],
                frame_buffer_mib: 80.0 * 1024.0,
                profiles: gb80_profiles(),
            },
            AcceleratorModel {
                name: "H100-80GB".to_string(),
                match_tokens: vec!["H100".to_string(), "80GB".to_string()],
                frame_buffer_mib: 80.0 * 1024.0,
                profiles: gb80_profiles(),
            },
        ])
    }

    pub fn models(&self) -> &[AcceleratorModel] {
        &self.models
    }

    pub fn model(&self, name: &str) -> Option<&AcceleratorModel> {
        self.models.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }
}

impl Default for MigProfileCatalog {
    fn default() -> Self {
        Self::nvidia()
    }
}

impl AcceleratorProfileMatcher for MigProfileCatalog {
    fn resolve_model(&self, raw_name: &str) -> Option<String> {
        self.models
            .iter()
            .find(|m| m.matches(raw_name))
            .map(|m| m.name.clone())
    }

    fn frame_buffer_capacity(&self, model: &str) -> Option<f64> {
        self.model(model).map(|m| m.frame_buffer_mib)
    }

    fn optimal_profile(
        &self,
        model: &str,
        core_fraction: f64,
        memory_fraction: f64,
    ) -> Option<AcceleratorRecommendation> {
        let profile = self
            .model(model)?
            .profiles
            .iter()
            .filter(|p| p.covers(core_fraction, memory_fraction))
            .min_by(|a, b| {
                a.core_fraction
                    .total_cmp(&b.core_fraction)
                    .then(a.memory_fraction.total_cmp(&b.memory_fraction))
            })?;

        Some(HashMap::from([(
            profile.item(),
            RecommendationConfigItem::new(1.0, CORES),
        )]))
    }
}
