//! Accelerator profile catalog listing

use anyhow::{bail, Result};
use rightsizer_lib::recommendation::{AcceleratorModel, MigProfileCatalog};
use tabled::Tabled;

use crate::output::{print_json, print_table, OutputFormat};

/// Row for the profiles table
#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Frame Buffer")]
    frame_buffer: String,
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Cores")]
    core_fraction: String,
    #[tabled(rename = "Memory")]
    memory_fraction: String,
}

fn rows(model: &AcceleratorModel) -> impl Iterator<Item = ProfileRow> + '_ {
    model.profiles.iter().map(move |profile| ProfileRow {
        model: model.name.clone(),
        frame_buffer: format!("{}Mi", model.frame_buffer_mib),
        profile: profile.name.clone(),
        resource: profile.item().to_string(),
        core_fraction: format!("{:.0}%", profile.core_fraction * 100.0),
        memory_fraction: format!("{:.1}%", profile.memory_fraction * 100.0),
    })
}

/// List the built-in catalog, optionally for one model
pub fn run(model: Option<String>, format: OutputFormat) -> Result<()> {
    let catalog = MigProfileCatalog::default();

    let models: Vec<&AcceleratorModel> = match &model {
        Some(name) => match catalog.model(name) {
            Some(m) => vec![m],
            None => {
                let known: Vec<&str> = catalog.models().iter().map(|m| m.name.as_str()).collect();
                bail!("unknown accelerator model '{}', known: {}", name, known.join(", "));
            }
        },
        None => catalog.models().iter().collect(),
    };

    match format {
        OutputFormat::Json => print_json(&models)?,
        OutputFormat::Table => print_table(models.into_iter().flat_map(rows).collect()),
    }
    Ok(())
}
