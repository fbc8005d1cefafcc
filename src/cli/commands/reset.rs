//! Reset-now command - run the daily reset immediately.

use anyhow::Result;
use colored::Colorize;

use crate::cli::open_tracker;

/// Arguments for the reset-now command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    questlog reset-now    Mark every completed task incomplete")]
pub struct Args {}

/// Executes the reset-now command.
pub fn run(_args: Args) -> Result<()> {
    let tracker = open_tracker()?;
    let count = tracker.reset_daily_tasks_now()?;

    println!(
        "{} {} {}",
        "Reset".green(),
        count,
        if count == 1 { "task" } else { "tasks" }
    );
    Ok(())
}
