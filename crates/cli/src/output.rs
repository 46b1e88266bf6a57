//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "running" | "ready" | "available" | "yes" => status.green().to_string(),
        "degraded" | "pending" => status.yellow().to_string(),
        "unhealthy" | "failed" | "notready" | "unavailable" | "no" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Answers the agent could not produce from cluster data
pub fn is_sentinel(answer: &str) -> bool {
    matches!(answer, "not found" | "unable to determine")
}

/// Format a unix timestamp as seconds ago
pub fn format_age(timestamp: i64, now: i64) -> String {
    let age = (now - timestamp).max(0);
    match age {
        0..=59 => format!("{}s ago", age),
        60..=3599 => format!("{}m ago", age / 60),
        _ => format!("{}h ago", age / 3600),
    }
}

/// Age of a unix timestamp relative to the current time
pub fn age_since(timestamp: i64) -> String {
    format_age(timestamp, chrono::Utc::now().timestamp())
}
