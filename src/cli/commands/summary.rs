//! Summary command - write and read journal entries.

use anyhow::Result;
use chrono::{Datelike, Local};
use clap::Subcommand;
use colored::Colorize;

use super::parse_optional_date;
use crate::cli::open_tracker;

/// Arguments for the summary command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    questlog summary add \"Finished the draft, went running\"\n    \
    questlog summary add \"Late entry\" --date 2026.10.18\n    \
    questlog summary show                 This year's journal\n    \
    questlog summary show --year 2025")]
pub struct Args {
    #[command(subcommand)]
    pub command: SummaryCommand,
}

#[derive(Subcommand)]
pub enum SummaryCommand {
    /// Prepend a summary to the journal and earn experience
    #[command(long_about = "Writes the summary at the top of <data_dir>/journal/<year>.md,\n\
        newest entry first, and awards the summary reward (5 exp by default).")]
    Add {
        /// Summary text (up to 10000 characters)
        content: String,

        /// Date of the entry (YYYY-MM-DD or YYYY.MM.DD, default today)
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
    },

    /// Print a year's journal
    Show {
        /// Year to print (default this year)
        #[arg(long)]
        year: Option<i32>,
    },
}

/// Executes the summary command.
pub fn run(args: Args) -> Result<()> {
    match args.command {
        SummaryCommand::Add { content, date } => run_add(&content, date.as_deref()),
        SummaryCommand::Show { year } => run_show(year),
    }
}

fn run_add(content: &str, date: Option<&str>) -> Result<()> {
    let tracker = open_tracker()?;
    let date = parse_optional_date(date)?.unwrap_or_else(|| Local::now().date_naive());

    let outcome = tracker.add_summary(date, content)?;
    println!(
        "{} summary for {} to {}",
        "Saved".green(),
        date.format("%Y-%m-%d").to_string().cyan(),
        outcome.path.display()
    );
    println!(
        "  {}",
        format!("+{} exp", outcome.experience_awarded).green().bold()
    );
    Ok(())
}

fn run_show(year: Option<i32>) -> Result<()> {
    let tracker = open_tracker()?;
    let year = year.unwrap_or_else(|| Local::now().year());

    let content = tracker.journal().read_year(year)?;
    if content.trim().is_empty() {
        println!("{}", format!("No journal entries for {year}.").dimmed());
        return Ok(());
    }
    print!("{content}");
    Ok(())
}
