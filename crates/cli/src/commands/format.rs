//! Unit conversion commands

use anyhow::{bail, Result};
use clap::Subcommand;
use rightsizer_lib::units::{format_accelerator_units, format_cpu_units, format_memory_units};
use rightsizer_lib::RecommendationConfigItem;
use tabled::Tabled;

use crate::output::{format_quantity, print_json, print_table, OutputFormat};

#[derive(Subcommand)]
pub enum FormatCommands {
    /// Express a memory amount in the largest fitting binary unit
    Memory {
        /// Amount to convert
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        /// Unit of the amount (bytes, KiB, MB, GiB, ...)
        unit: String,
    },

    /// Convert cores to millicores
    Cpu {
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        /// Must be `cores`
        #[arg(default_value = "cores")]
        unit: String,
    },

    /// Convert an accelerator amount in cores to a bare count
    Accelerator {
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        #[arg(default_value = "cores")]
        unit: String,
    },
}

#[derive(Tabled)]
struct ConversionRow {
    #[tabled(rename = "Input")]
    input: String,
    #[tabled(rename = "Output")]
    output: String,
}

pub fn run(command: FormatCommands, format: OutputFormat) -> Result<()> {
    let (input, converted) = match command {
        FormatCommands::Memory { amount, unit } => {
            let input = RecommendationConfigItem::new(amount, unit);
            let converted = format_memory_units(&input);
            (input, converted)
        }
        FormatCommands::Cpu { amount, unit } => {
            let input = RecommendationConfigItem::new(amount, unit);
            let converted = format_cpu_units(&input);
            (input, converted)
        }
        FormatCommands::Accelerator { amount, unit } => {
            let input = RecommendationConfigItem::new(amount, unit);
            let converted = format_accelerator_units(&input);
            (input, converted)
        }
    };

    if let Some(error) = converted.error_msg() {
        bail!("{}", error);
    }

    match format {
        OutputFormat::Json => print_json(&converted)?,
        OutputFormat::Table => print_table(vec![ConversionRow {
            input: format!("{} {}", input.amount().unwrap_or_default(), input.format()),
            output: format_quantity(&converted),
        }]),
    }
    Ok(())
}
