//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use rightsizer_lib::recommendation::NotificationSeverity;
use rightsizer_lib::{RecommendationConfigItem, RecommendationNotification};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a rounded table
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    if rows.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format an amount without trailing zeros
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{}", amount as i64)
    } else {
        let formatted = format!("{:.3}", amount);
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Kubernetes-style quantity, e.g. `250m` or `1.5Gi`
pub fn format_quantity(item: &RecommendationConfigItem) -> String {
    match (item.amount(), item.error_msg()) {
        (_, Some(error)) => error.red().to_string(),
        (Some(amount), None) => format!("{}{}", format_amount(amount), item.format()),
        (None, None) => "-".to_string(),
    }
}

/// Color severity based on level
pub fn color_severity(severity: NotificationSeverity) -> String {
    let label = severity.to_string();
    match severity {
        NotificationSeverity::Critical | NotificationSeverity::Error => label.red().to_string(),
        NotificationSeverity::Warning => label.yellow().to_string(),
        NotificationSeverity::Notice => label.blue().to_string(),
        NotificationSeverity::Info => label.green().to_string(),
    }
}

/// Print notifications one per line
pub fn print_notifications(notifications: &[RecommendationNotification]) {
    for notification in notifications {
        println!(
            "  [{}] {} {}",
            color_severity(notification.severity),
            notification.code,
            notification.message
        );
    }
}
