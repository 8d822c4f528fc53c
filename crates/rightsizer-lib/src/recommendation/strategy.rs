//! Named recommendation strategies
//!
//! Strategies currently share the generic algorithm and differ only in
//! name and default tunables.

use super::accelerator::{AcceleratorProfileMatcher, AcceleratorRecommendation};
use super::catalog::MigProfileCatalog;
use super::generic::GenericRecommendationModel;
use super::notification::RecommendationNotification;
use super::tunables::RecommendationTunables;
use super::RecommendationModel;
use crate::error::ModelError;
use crate::models::{IntervalMap, RecommendationConfigItem};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Selectable strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    #[default]
    Cost,
    Performance,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Cost => "cost",
            ModelKind::Performance => "performance",
        }
    }

    pub fn default_tunables(&self) -> RecommendationTunables {
        match self {
            ModelKind::Cost => RecommendationTunables::cost(),
            ModelKind::Performance => RecommendationTunables::performance(),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cost" => Ok(ModelKind::Cost),
            "performance" => Ok(ModelKind::Performance),
            other => Err(format!("unknown recommendation model: {}", other)),
        }
    }
}

macro_rules! delegate_to_generic {
    ($model:ty) => {
        impl RecommendationModel for $model {
            fn model_name(&self) -> &str {
                self.inner.model_name()
            }

            fn cpu_request_recommendation(
                &self,
                intervals: &IntervalMap,
                notifications: Option<&mut Vec<RecommendationNotification>>,
            ) -> Option<RecommendationConfigItem> {
                self.inner.cpu_request_recommendation(intervals, notifications)
            }

            fn memory_request_recommendation(
                &self,
                intervals: &IntervalMap,
                notifications: Option<&mut Vec<RecommendationNotification>>,
            ) -> Option<RecommendationConfigItem> {
                self.inner.memory_request_recommendation(intervals, notifications)
            }

            fn namespace_cpu_request_recommendation(
                &self,
                intervals: &IntervalMap,
                notifications: Option<&mut Vec<RecommendationNotification>>,
            ) -> Option<RecommendationConfigItem> {
                self.inner
                    .namespace_cpu_request_recommendation(intervals, notifications)
            }

            fn namespace_memory_request_recommendation(
                &self,
                intervals: &IntervalMap,
                notifications: Option<&mut Vec<RecommendationNotification>>,
            ) -> Option<RecommendationConfigItem> {
                self.inner
                    .namespace_memory_request_recommendation(intervals, notifications)
            }

            fn accelerator_request_recommendation(
                &self,
                intervals: &IntervalMap,
                notifications: Option<&mut Vec<RecommendationNotification>>,
            ) -> Option<AcceleratorRecommendation> {
                self.inner
                    .accelerator_request_recommendation(intervals, notifications)
            }
        }
    };
}

/// Cost-oriented strategy, named `cost`
#[derive(Debug, Clone)]
pub struct CostBasedRecommendationModel {
    inner: GenericRecommendationModel,
}

impl CostBasedRecommendationModel {
    pub fn new(tunables: RecommendationTunables) -> Self {
        Self::with_matcher(tunables, Arc::new(MigProfileCatalog::default()))
    }

    pub fn with_matcher(
        tunables: RecommendationTunables,
        matcher: Arc<dyn AcceleratorProfileMatcher>,
    ) -> Self {
        Self {
            inner: GenericRecommendationModel::from_parts(
                ModelKind::Cost.name().to_string(),
                tunables,
                matcher,
            ),
        }
    }

    pub fn tunables(&self) -> RecommendationTunables {
        self.inner.tunables()
    }
}

impl Default for CostBasedRecommendationModel {
    fn default() -> Self {
        Self::new(ModelKind::Cost.default_tunables())
    }
}

/// Performance-oriented strategy, named `performance`
#[derive(Debug, Clone)]
pub struct PerformanceBasedRecommendationModel {
    inner: GenericRecommendationModel,
}

impl PerformanceBasedRecommendationModel {
    pub fn new(tunables: RecommendationTunables) -> Self {
        Self::with_matcher(tunables, Arc::new(MigProfileCatalog::default()))
    }

    pub fn with_matcher(
        tunables: RecommendationTunables,
        matcher: Arc<dyn AcceleratorProfileMatcher>,
    ) -> Self {
        Self {
            inner: GenericRecommendationModel::from_parts(
                ModelKind::Performance.name().to_string(),
                tunables,
                matcher,
            ),
        }
    }

    pub fn tunables(&self) -> RecommendationTunables {
        self.inner.tunables()
    }
}

impl Default for PerformanceBasedRecommendationModel {
    fn default() -> Self {
        Self::new(ModelKind::Performance.default_tunables())
    }
}

delegate_to_generic!(CostBasedRecommendationModel);
delegate_to_generic!(PerformanceBasedRecommendationModel);

/// Builder for a shareable recommendation model
///
/// Name and tunables are mandatory; the accelerator matcher defaults to the
/// built-in MIG catalog.
#[derive(Default)]
pub struct RecommendationModelBuilder {
    name: Option<String>,
    tunables: Option<RecommendationTunables>,
    matcher: Option<Arc<dyn AcceleratorProfileMatcher>>,
}

impl RecommendationModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strategy name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the strategy name from a known kind
    pub fn kind(self, kind: ModelKind) -> Self {
        self.name(kind.name())
    }

    pub fn tunables(mut self, tunables: RecommendationTunables) -> Self {
        self.tunables = Some(tunables);
        self
    }

    pub fn matcher(mut self, matcher: Arc<dyn AcceleratorProfileMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Build the model
    ///
    /// Known names produce their strategy type, any other non-empty name a
    /// generic model under that name.
    pub fn build(self) -> Result<Arc<dyn RecommendationModel>, ModelError> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or(ModelError::EmptyModelName)?;
        let tunables = self
            .tunables
            .ok_or_else(|| ModelError::MissingTunables(name.clone()))?;
        let matcher = self
            .matcher
            .unwrap_or_else(|| Arc::new(MigProfileCatalog::default()));

        let model: Arc<dyn RecommendationModel> = match name.parse::<ModelKind>() {
            Ok(ModelKind::Cost) => Arc::new(CostBasedRecommendationModel::with_matcher(
                tunables, matcher,
            )),
            Ok(ModelKind::Performance) => Arc::new(
                PerformanceBasedRecommendationModel::with_matcher(tunables, matcher),
            ),
            Err(_) => Arc::new(GenericRecommendationModel::with_matcher(
                name, tunables, matcher,
            )?),
        };
        Ok(model)
    }
}
