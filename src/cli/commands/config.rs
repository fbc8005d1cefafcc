//! Config command - show configuration

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use questlog::config::Config;

/// Arguments for the config command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    questlog config          Show settings and file locations\n    \
    questlog config show     Same as above\n    \
    questlog config yaml     Print the effective settings as YAML")]
pub struct Args {
    /// Config subcommand to run (defaults to show)
    #[command(subcommand)]
    pub command: Option<ConfigCommand>,
}

/// Configuration subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration and file locations
    Show,
    /// Print the effective configuration as YAML
    Yaml,
}

/// Executes the config command.
pub fn run(args: Args) -> Result<()> {
    match args.command {
        Some(ConfigCommand::Show) | None => show_config(),
        Some(ConfigCommand::Yaml) => print_yaml(),
    }
}

fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("{}", "questlog Configuration".bold());
    println!();
    println!("  {}  {}", "Config file:".dimmed(), Config::config_path()?.display());
    println!("  {}     {}", "Database:".dimmed(), Config::db_path()?.display());
    println!("  {}      {}", "Journal:".dimmed(), Config::journal_dir()?.display());
    println!("  {}     {}", "Log file:".dimmed(), Config::log_path()?.display());

    println!();
    println!("{}", "Experience".bold());
    println!("  {}  {}", "Per level:".dimmed(), config.exp_per_level);
    println!(
        "  {}      high {}, medium {}, low {}",
        "Goals:".dimmed(),
        config.goal_rewards.high,
        config.goal_rewards.medium,
        config.goal_rewards.low
    );
    println!(
        "  {}      high {}, medium {}, low {}",
        "Tasks:".dimmed(),
        config.task_rewards.high,
        config.task_rewards.medium,
        config.task_rewards.low
    );
    println!("  {}    {}", "Summary:".dimmed(), config.summary_reward);

    println!();
    println!("{}", "Daily Reset".bold());
    let enabled = if config.enable_daily_reset {
        "enabled".green()
    } else {
        "disabled".yellow()
    };
    println!("  {}    {}", "Status:".dimmed(), enabled);
    println!("  {}      {:02}:00", "Hour:".dimmed(), config.reset_hour);
    println!(
        "  {}     every {}s",
        "Check:".dimmed(),
        config.reset_check_interval_secs
    );

    Ok(())
}

/// Missing keys are filled with defaults, so this is the config in effect.
fn print_yaml() -> Result<()> {
    let config = Config::load()?;
    print!("{}", serde_saphyr::to_string(&config)?);
    Ok(())
}
