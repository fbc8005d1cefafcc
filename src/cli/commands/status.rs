//! Status command - level and progress overview.
//!
//! Displays the current level with progress to the next one, goal counts
//! per type, and today's daily tasks.

use anyhow::Result;
use colored::Colorize;

use questlog::storage::completion_rate;

use crate::cli::format::progress_bar;
use crate::cli::{open_tracker, OutputFormat};

/// Arguments for the status command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    questlog status                Show level and today's progress\n    \
    questlog status --format json  Output as JSON")]
pub struct Args {
    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Executes the status command.
pub fn run(args: Args) -> Result<()> {
    let tracker = open_tracker()?;
    let report = tracker.status()?;

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "questlog Status".bold());
    println!();
    println!(
        "  {}  {}",
        "Tracking since:".dimmed(),
        report.start_date.format("%Y-%m-%d")
    );
    println!(
        "  {}           {}",
        "Level:".dimmed(),
        report.level.level.to_string().cyan().bold()
    );
    println!(
        "  {}      {} {}/{} {}",
        "Experience:".dimmed(),
        progress_bar(report.level.progress, 20),
        report.level.experience,
        report.level.experience + report.level.exp_to_next,
        format!("({} to next level)", report.level.exp_to_next).dimmed()
    );

    println!();
    println!("{}", "Goals".bold());
    if report.goals.is_empty() {
        println!("  {}", "No goals yet".dimmed());
    }
    for stats in &report.goals {
        println!(
            "  {}  {} total, {} completed, {} in progress ({:.1}%)",
            format!("{:>8}:", stats.goal_type.as_str()).dimmed(),
            stats.total,
            stats.completed.to_string().green(),
            stats.in_progress,
            completion_rate(stats.completed, stats.total)
        );
    }

    println!();
    println!(
        "{} {}",
        "Today's Tasks".bold(),
        report.today.format("%Y-%m-%d").to_string().dimmed()
    );
    let today = &report.today_tasks;
    if today.total == 0 {
        println!("  {}", "No tasks for today".dimmed());
    } else {
        println!(
            "  {} {}/{} done ({:.1}%)",
            progress_bar(completion_rate(today.completed, today.total) / 100.0, 20),
            today.completed,
            today.total,
            completion_rate(today.completed, today.total)
        );
    }

    Ok(())
}
