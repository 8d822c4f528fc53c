//! Single-experiment recommendation command

use anyhow::Result;
use rightsizer_lib::{
    RecommendationConfigItem, RecommendationEngine, RecommendationItem, WorkloadRecommendation,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tabled::Tabled;

use crate::input::ExperimentInput;
use crate::output::{
    format_quantity, print_info, print_json, print_notifications, print_success, print_table,
    print_warning, OutputFormat,
};

/// Row for the requests table
#[derive(Tabled)]
struct RequestRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Request")]
    request: String,
    #[tabled(rename = "Computed")]
    computed: String,
}

/// JSON document for one experiment
#[derive(Serialize)]
pub struct RecommendationReport<'a> {
    pub experiment_name: &'a str,
    #[serde(flatten)]
    pub recommendation: &'a WorkloadRecommendation,
    pub formatted_requests: BTreeMap<RecommendationItem, RecommendationConfigItem>,
}

impl<'a> RecommendationReport<'a> {
    pub fn new(experiment_name: &'a str, recommendation: &'a WorkloadRecommendation) -> Self {
        Self {
            experiment_name,
            recommendation,
            formatted_requests: recommendation.formatted_requests(),
        }
    }
}

/// Compute and print the recommendation for one experiment file
pub fn run(engine: &RecommendationEngine, path: &Path, format: OutputFormat) -> Result<()> {
    let input = ExperimentInput::load(path)?;
    let recommendation = engine.generate(&input.target, &input.intervals);

    match format {
        OutputFormat::Json => print_json(&RecommendationReport::new(
            &input.experiment_name,
            &recommendation,
        )),
        OutputFormat::Table => {
            print_recommendation(&input.experiment_name, &recommendation);
            Ok(())
        }
    }
}

/// Human-readable rendering of one recommendation
pub fn print_recommendation(experiment_name: &str, recommendation: &WorkloadRecommendation) {
    print_info(&format!(
        "{} ({}), model '{}', {} intervals",
        experiment_name,
        recommendation.target,
        recommendation.model_name,
        recommendation.intervals_analyzed
    ));

    if recommendation.has_requests() {
        let formatted = recommendation.formatted_requests();
        let rows: Vec<RequestRow> = recommendation
            .requests
            .iter()
            .map(|(item, raw)| RequestRow {
                resource: item.to_string(),
                request: formatted
                    .get(item)
                    .map(format_quantity)
                    .unwrap_or_else(|| "-".to_string()),
                computed: format_quantity(raw),
            })
            .collect();
        print_table(rows);
        print_success("Recommendations are available");
    } else {
        print_warning("No recommendations could be generated");
    }

    if !recommendation.notifications.is_empty() {
        println!("Notifications:");
        print_notifications(&recommendation.notifications);
    }
}
