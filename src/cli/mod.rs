//! Command-line interface for questlog.
//!
//! Provides the CLI commands for managing goals, daily tasks and journal
//! summaries, plus the foreground mode that runs the daily reset.

/// Individual CLI command implementations.
pub mod commands;

/// Output format options shared by listing commands.
pub mod format;

use anyhow::Result;
use std::sync::Arc;

use questlog::events::Notifier;
use questlog::tracker::Tracker;

pub use format::OutputFormat;

/// Opens the tracker against the default data directory.
///
/// One-shot commands have nobody listening, so the notifier starts empty.
pub fn open_tracker() -> Result<Tracker> {
    Tracker::open_default(Arc::new(Notifier::new()))
}
