//! Configuration management for the CLI

use anyhow::{bail, Context, Result};
use config::{Environment, File, FileFormat};
use rightsizer_lib::{ModelKind, RecommendationTunables};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Recommender configuration
///
/// Layered as: config file, then `RIGHTSIZER_*` environment variables, then
/// command-line flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Strategy to run
    #[serde(default)]
    pub model: ModelKind,

    /// Percentile overrides; the strategy default applies when unset
    #[serde(default)]
    pub cpu_percentile: Option<f64>,
    #[serde(default)]
    pub memory_percentile: Option<f64>,
    #[serde(default)]
    pub accelerator_percentile: Option<f64>,

    /// Experiments processed at once by `batch`
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
}

fn default_batch_concurrency() -> usize {
    4
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            cpu_percentile: None,
            memory_percentile: None,
            accelerator_percentile: None,
            batch_concurrency: default_batch_concurrency(),
        }
    }
}

impl RecommenderConfig {
    /// Load configuration from a file and the environment
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Json).required(true),
            None => match Self::config_path() {
                Some(default) => File::from(default).format(FileFormat::Json).required(false),
                None => return Self::from_env(),
            },
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("RIGHTSIZER"))
            .build()
            .context("Failed to load configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    fn from_env() -> Result<Self> {
        config::Config::builder()
            .add_source(Environment::with_prefix("RIGHTSIZER"))
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Default configuration file path
    pub fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("rightsizer").join("config.json"))
    }

    /// Apply command-line overrides
    pub fn apply_overrides(
        &mut self,
        model: Option<ModelKind>,
        cpu_percentile: Option<f64>,
        memory_percentile: Option<f64>,
        accelerator_percentile: Option<f64>,
    ) {
        if let Some(model) = model {
            self.model = model;
        }
        self.cpu_percentile = cpu_percentile.or(self.cpu_percentile);
        self.memory_percentile = memory_percentile.or(self.memory_percentile);
        self.accelerator_percentile = accelerator_percentile.or(self.accelerator_percentile);
    }

    /// Strategy defaults with any configured overrides applied
    pub fn tunables(&self) -> RecommendationTunables {
        let defaults = self.model.default_tunables();
        RecommendationTunables::new(
            self.cpu_percentile.unwrap_or(defaults.cpu_percentile),
            self.memory_percentile.unwrap_or(defaults.memory_percentile),
            self.accelerator_percentile
                .unwrap_or(defaults.accelerator_percentile),
        )
    }

    pub fn validate(&self) -> Result<()> {
        let tunables = self.tunables();
        for (name, value) in [
            ("cpu_percentile", tunables.cpu_percentile),
            ("memory_percentile", tunables.memory_percentile),
            ("accelerator_percentile", tunables.accelerator_percentile),
        ] {
            if !(0.0..=100.0).contains(&value) {
                bail!("{} must be between 0 and 100, got {}", name, value);
            }
        }
        if self.batch_concurrency == 0 {
            bail!("batch_concurrency must be at least 1");
        }
        Ok(())
    }
}
