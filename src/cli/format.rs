//! Output formatting utilities for CLI commands.
//!
//! Provides a unified `OutputFormat` enum for consistent output formatting
//! across all CLI commands, plus small helpers for aligned text tables.

use clap::ValueEnum;

/// Output format options for CLI commands.
///
/// - `Text` for human-readable terminal output (default)
/// - `Json` for machine-readable output and scripting
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default).
    #[default]
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Truncates a string to fit within `max_width` characters.
///
/// Longer strings are cut and end with "...".
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        ".".repeat(max_width)
    } else {
        let kept: String = s.chars().take(max_width - 3).collect();
        format!("{kept}...")
    }
}

/// Renders `fraction` (0.0 to 1.0) as a fixed-width bar like `[####------]`.
pub fn progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}
