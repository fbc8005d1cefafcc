//! Run command - stay in the foreground and perform the daily reset.

use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

use questlog::config::Config;
use questlog::events::Notifier;

/// Arguments for the run command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    questlog run          Reset completed tasks at the configured hour\n    \
    questlog -v run       Same, with debug logging\n\n\
Logs are also written to <data_dir>/questlog.log. Stop with Ctrl+C.")]
pub struct Args {}

/// Executes the run command.
pub fn run(_args: Args, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let log_path = Config::log_path()?;
    let _guard = questlog::daemon::setup_logging(&log_path, verbose)?;

    println!(
        "{} (reset at {:02}:00, Ctrl+C to stop)",
        "Running questlog in the foreground".green(),
        config.reset_hour
    );

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    rt.block_on(questlog::daemon::run_foreground(
        config,
        Arc::new(Notifier::new()),
    ))
}
