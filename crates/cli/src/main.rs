//! Rightsizer CLI
//!
//! Computes container and namespace resource request recommendations from
//! aggregated usage samples stored in experiment files.

mod commands;
mod config;
mod input;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::format::FormatCommands;
use commands::{batch, format, profiles, recommend};
use rightsizer_lib::{
    EngineMetrics, ModelKind, RecommendationEngine, RecommendationModelBuilder, StructuredLogger,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Rightsizer CLI
#[derive(Parser)]
#[command(name = "rightsizer")]
#[command(author, version, about = "Resource request recommendations for Kubernetes workloads", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ~/.config/rightsizer/config.json)
    #[arg(long, env = "RIGHTSIZER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Recommendation strategy (cost, performance)
    #[arg(long)]
    pub model: Option<ModelKind>,

    /// CPU percentile (0-100)
    #[arg(long)]
    pub cpu_percentile: Option<f64>,

    /// Memory percentile (0-100)
    #[arg(long)]
    pub memory_percentile: Option<f64>,

    /// Accelerator percentile (0-100)
    #[arg(long)]
    pub accelerator_percentile: Option<f64>,

    /// Print Prometheus metrics after the command
    #[arg(long)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recommend requests for one experiment file
    Recommend {
        /// Experiment JSON file
        input: PathBuf,
    },

    /// Recommend requests for many experiment files concurrently
    Batch {
        /// Experiment JSON files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Convert resource amounts to Kubernetes units
    #[command(subcommand)]
    Format(FormatCommands),

    /// List the built-in accelerator partition profiles
    Profiles {
        /// Show only this model (e.g. A100-40GB)
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = config::RecommenderConfig::load(cli.config.as_deref())?;
    config.apply_overrides(
        cli.model,
        cli.cpu_percentile,
        cli.memory_percentile,
        cli.accelerator_percentile,
    );
    config.validate()?;

    let tunables = config.tunables();
    let model = RecommendationModelBuilder::new()
        .kind(config.model)
        .tunables(tunables)
        .build()
        .context("Failed to build recommendation model")?;

    let logger = StructuredLogger::new("rightsizer-cli");
    let mut engine = RecommendationEngine::new(model).with_logger(logger.clone());
    let metrics = cli.metrics.then(EngineMetrics::new);
    if let Some(metrics) = &metrics {
        engine = engine.with_metrics(metrics.clone());
    }

    match cli.command {
        Commands::Recommend { input } => {
            logger.log_startup(env!("CARGO_PKG_VERSION"), engine.model_name(), &tunables.to_string());
            recommend::run(&engine, &input, cli.format)?;
        }
        Commands::Batch { inputs } => {
            logger.log_startup(env!("CARGO_PKG_VERSION"), engine.model_name(), &tunables.to_string());
            info!(files = inputs.len(), concurrency = config.batch_concurrency, "Starting batch");
            batch::run(Arc::new(engine), inputs, config.batch_concurrency, cli.format).await?;
        }
        Commands::Format(command) => {
            format::run(command, cli.format)?;
        }
        Commands::Profiles { model } => {
            profiles::run(model, cli.format)?;
        }
    }

    if let Some(metrics) = metrics {
        print!("{}", metrics.render()?);
    }

    Ok(())
}
