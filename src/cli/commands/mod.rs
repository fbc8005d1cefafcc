//! CLI commands for questlog.
//!
//! Each submodule implements a single CLI command with its argument
//! parsing and execution logic.

/// Shell completion scripts.
pub mod completions;

/// Configuration viewing.
pub mod config;

/// Administrative database reset.
pub mod db;

/// Create, edit, complete and list goals.
pub mod goal;

/// Manual daily reset.
pub mod reset;

/// Foreground mode with the daily reset scheduler.
pub mod run;

/// Level, goal and daily task overview.
pub mod status;

/// Journal summaries.
pub mod summary;

/// Create, edit, complete and list daily tasks.
pub mod task;

use anyhow::Result;
use questlog::tracker::parse_date_input;

/// Parses an optional `--date`-style argument.
pub(crate) fn parse_optional_date(value: Option<&str>) -> Result<Option<chrono::NaiveDate>> {
    Ok(value.map(parse_date_input).transpose()?)
}
