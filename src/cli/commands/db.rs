//! Database management command - administrative reset and stats.

use std::io::{self, Write};

use anyhow::Result;
use colored::Colorize;

use crate::cli::open_tracker;

/// Arguments for the db command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    questlog db stats            Show record counts and experience\n    \
    questlog db reset            Wipe goals, tasks and experience (asks first)\n    \
    questlog db reset --force    Same, without the prompt\n    \
    questlog db reset --experience-only  Zero experience, keep goals and tasks")]
pub struct Args {
    /// Database subcommand to run
    #[command(subcommand)]
    pub command: DbCommand,
}

/// Database management subcommands.
#[derive(clap::Subcommand)]
pub enum DbCommand {
    /// Drop all goals, tasks and experience and start over
    #[command(
        long_about = "Recreates the database schema and reseeds the progress record\n\
        with zero experience. Journal files are not touched.\n\
        This cannot be undone."
    )]
    Reset {
        /// Only set experience back to zero
        #[arg(long)]
        experience_only: bool,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Show database statistics
    Stats,
}

/// Executes the db command.
pub fn run(args: Args) -> Result<()> {
    match args.command {
        DbCommand::Reset {
            experience_only,
            force,
        } => run_reset(experience_only, force),
        DbCommand::Stats => run_stats(),
    }
}

fn run_reset(experience_only: bool, force: bool) -> Result<()> {
    let tracker = open_tracker()?;

    let prompt = if experience_only {
        let info = tracker.db().basic_info()?;
        format!("Reset {} experience to 0?", info.experience)
    } else {
        let goals = tracker.db().goal_count()?;
        let tasks = tracker.db().task_count()?;
        format!(
            "Delete {} {} and {} {} and reset experience to 0?",
            goals,
            if goals == 1 { "goal" } else { "goals" },
            tasks,
            if tasks == 1 { "task" } else { "tasks" }
        )
    };

    if !force {
        print!("{prompt} [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("{}", "Cancelled".dimmed());
            return Ok(());
        }
    }

    if experience_only {
        tracker.reset_progress()?;
        println!("{} Experience reset", "Done.".green().bold());
    } else {
        tracker.wipe_all()?;
        println!("{} Database reset", "Done.".green().bold());
    }
    Ok(())
}

fn run_stats() -> Result<()> {
    let tracker = open_tracker()?;
    let info = tracker.db().basic_info()?;

    println!("{}", "Database Statistics".bold());
    println!();
    println!("  {}       {}", "Goals:".dimmed(), tracker.db().goal_count()?);
    println!("  {}       {}", "Tasks:".dimmed(), tracker.db().task_count()?);
    println!("  {}  {}", "Experience:".dimmed(), info.experience);
    println!(
        "  {}       {}",
        "Level:".dimmed(),
        tracker.level_calculator().level_for(info.experience)
    );
    println!(
        "  {}     {}",
        "Started:".dimmed(),
        info.start_date.format("%Y-%m-%d")
    );

    Ok(())
}
