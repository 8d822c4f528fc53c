//! Concurrent recommendation over many experiment files

use anyhow::{bail, Result};
use rightsizer_lib::{RecommendationEngine, WorkloadRecommendation};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::Tabled;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::recommend::{print_recommendation, RecommendationReport};
use crate::input::ExperimentInput;
use crate::output::{print_error, print_json, print_table, OutputFormat};

/// Result of processing one experiment file
struct Outcome {
    path: PathBuf,
    result: Result<(String, WorkloadRecommendation)>,
}

/// Row for the batch summary table
#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Experiment")]
    experiment: String,
    #[tabled(rename = "Requests")]
    requests: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Serialize)]
struct BatchEntry<'a> {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<RecommendationReport<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn process(engine: &RecommendationEngine, path: &Path) -> Result<(String, WorkloadRecommendation)> {
    let input = ExperimentInput::load(path)?;
    debug!(file = %path.display(), intervals = input.intervals.len(), "Processing experiment");
    let recommendation = engine.generate(&input.target, &input.intervals);
    Ok((input.experiment_name, recommendation))
}

async fn process_blocking(
    engine: Arc<RecommendationEngine>,
    permits: Arc<Semaphore>,
    path: PathBuf,
) -> Result<(String, WorkloadRecommendation)> {
    let _permit = permits.acquire_owned().await?;
    tokio::task::spawn_blocking(move || process(&engine, &path)).await?
}

/// Run every experiment, at most `concurrency` at a time
///
/// A failing file does not stop the others; the command fails at the end if
/// any file failed.
pub async fn run(
    engine: Arc<RecommendationEngine>,
    paths: Vec<PathBuf>,
    concurrency: usize,
    format: OutputFormat,
) -> Result<()> {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (index, path) in paths.into_iter().enumerate() {
        let engine = Arc::clone(&engine);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let result = process_blocking(engine, permits, path.clone()).await;
            (index, Outcome { path, result })
        });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        outcomes.push(joined?);
    }
    outcomes.sort_by_key(|(index, _)| *index);
    let outcomes: Vec<Outcome> = outcomes.into_iter().map(|(_, outcome)| outcome).collect();

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    for outcome in &outcomes {
        if let Err(e) = &outcome.result {
            warn!(file = %outcome.path.display(), error = %e, "Experiment failed");
        }
    }

    match format {
        OutputFormat::Json => {
            let entries: Vec<BatchEntry> = outcomes
                .iter()
                .map(|o| match &o.result {
                    Ok((name, recommendation)) => BatchEntry {
                        file: o.path.display().to_string(),
                        report: Some(RecommendationReport::new(name, recommendation)),
                        error: None,
                    },
                    Err(e) => BatchEntry {
                        file: o.path.display().to_string(),
                        report: None,
                        error: Some(format!("{:#}", e)),
                    },
                })
                .collect();
            print_json(&entries)?;
        }
        OutputFormat::Table => {
            for outcome in &outcomes {
                match &outcome.result {
                    Ok((name, recommendation)) => {
                        print_recommendation(name, recommendation);
                        println!();
                    }
                    Err(e) => print_error(&format!("{}: {:#}", outcome.path.display(), e)),
                }
            }

            let rows: Vec<SummaryRow> = outcomes
                .iter()
                .map(|o| match &o.result {
                    Ok((name, recommendation)) => SummaryRow {
                        file: o.path.display().to_string(),
                        experiment: name.clone(),
                        requests: recommendation.requests.len().to_string(),
                        status: "ok".to_string(),
                    },
                    Err(_) => SummaryRow {
                        file: o.path.display().to_string(),
                        experiment: "-".to_string(),
                        requests: "-".to_string(),
                        status: "failed".to_string(),
                    },
                })
                .collect();
            print_table(rows);
        }
    }

    if failed > 0 {
        bail!("{} of {} experiments failed", failed, outcomes.len());
    }
    Ok(())
}
