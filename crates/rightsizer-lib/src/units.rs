//! Unit conversion and percentile helpers
//!
//! The `format_*` helpers never fail: rejected input comes back as a
//! [`RecommendationConfigItem`] carrying the error text instead of an amount.

use crate::error::UnitError;
use crate::models::RecommendationConfigItem;

const BINARY_STEP: f64 = 1024.0;
const DECIMAL_STEP: f64 = 1000.0;

/// Binary units used when re-expressing a byte count
const MEMORY_UNITS: [&str; 6] = ["bytes", "Ki", "Mi", "Gi", "Ti", "Pi"];

/// Unit label for CPU millicores
pub const MILLICORES: &str = "m";

/// Only accepted input format for CPU and accelerator amounts
pub const CORES: &str = "cores";

/// Value at index `round(p/100 * (n-1))` of the ascending-sorted values
///
/// Sorts a private copy. Returns `None` for an empty slice. The index is
/// clamped to the slice, so out-of-range percentiles select an end element.
pub fn percentile(p: f64, values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let idx = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    Some(sorted[idx.min(sorted.len() - 1)])
}

/// Convert an amount in the given unit to bytes
pub fn convert_to_bytes(amount: f64, format: &str) -> Result<f64, UnitError> {
    let factor = match format.trim().to_lowercase().as_str() {
        "bytes" | "byte" => 1.0,
        "kb" | "kilobyte" | "kilobytes" => DECIMAL_STEP,
        "kib" | "kibibyte" | "kibibytes" => BINARY_STEP,
        "mb" | "megabyte" | "megabytes" => DECIMAL_STEP.powi(2),
        "mib" | "mebibyte" | "mebibytes" => BINARY_STEP.powi(2),
        "gb" | "gigabyte" | "gigabytes" => DECIMAL_STEP.powi(3),
        "gib" | "gibibyte" | "gibibytes" => BINARY_STEP.powi(3),
        "tb" | "terabyte" | "terabytes" => DECIMAL_STEP.powi(4),
        "tib" | "tebibyte" | "tebibytes" => BINARY_STEP.powi(4),
        _ => return Err(UnitError::UnsupportedMemoryFormat(format.to_string())),
    };
    Ok(amount * factor)
}

fn amount_and_format(item: &RecommendationConfigItem) -> Result<(f64, &str), UnitError> {
    match item.amount() {
        Some(amount) if !item.format().is_empty() => Ok((amount, item.format())),
        _ => Err(UnitError::MissingAmountOrFormat),
    }
}

fn memory_units(item: &RecommendationConfigItem) -> Result<RecommendationConfigItem, UnitError> {
    let (amount, format) = amount_and_format(item)?;
    if amount < 0.0 {
        return Err(UnitError::NegativeValue(amount));
    }

    let mut value = convert_to_bytes(amount, format)?;
    let mut unit = 0;
    while value >= BINARY_STEP && unit < MEMORY_UNITS.len() - 1 {
        value /= BINARY_STEP;
        unit += 1;
    }

    Ok(RecommendationConfigItem::new(value, MEMORY_UNITS[unit]))
}

fn cpu_units(item: &RecommendationConfigItem) -> Result<RecommendationConfigItem, UnitError> {
    let (amount, format) = amount_and_format(item)?;
    let format = format.to_lowercase();
    if format != CORES {
        return Err(UnitError::UnsupportedCpuFormat(format));
    }
    Ok(RecommendationConfigItem::new(
        (amount * 1000.0).round(),
        MILLICORES,
    ))
}

fn accelerator_units(
    item: &RecommendationConfigItem,
) -> Result<RecommendationConfigItem, UnitError> {
    let (amount, format) = amount_and_format(item)?;
    let format = format.to_lowercase();
    if format != CORES {
        return Err(UnitError::UnsupportedAcceleratorFormat(format));
    }
    Ok(RecommendationConfigItem::new(amount, ""))
}

/// Re-express a memory amount in the largest binary unit that keeps it >= 1
pub fn format_memory_units(item: &RecommendationConfigItem) -> RecommendationConfigItem {
    memory_units(item).unwrap_or_else(|e| RecommendationConfigItem::error(e.to_string()))
}

/// Convert cores to whole millicores
pub fn format_cpu_units(item: &RecommendationConfigItem) -> RecommendationConfigItem {
    cpu_units(item).unwrap_or_else(|e| RecommendationConfigItem::error(e.to_string()))
}

/// Pass accelerator fractions through with an empty unit label
pub fn format_accelerator_units(item: &RecommendationConfigItem) -> RecommendationConfigItem {
    accelerator_units(item).unwrap_or_else(|e| RecommendationConfigItem::error(e.to_string()))
}
