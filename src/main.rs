use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::commands;

/// The main CLI command line interface.
#[derive(Parser)]
#[command(name = "questlog")]
#[command(version)]
#[command(about = "Goals, daily tasks and a journal that earn you experience")]
#[command(long_about = "questlog tracks monthly and yearly goals, daily tasks and journal\n\
    summaries. Completing them earns experience and levels.\n\n\
    Completed daily tasks are reset once a day at the configured hour\n\
    while 'questlog run' is active.")]
#[command(after_help = "EXAMPLES:\n    \
    questlog status                     Level and today's progress\n    \
    questlog goal add \"Run a 10k\"       Add a monthly goal\n    \
    questlog task add \"Stretch\" -p high Add a task for today\n    \
    questlog task done 4                Complete a task\n    \
    questlog summary add \"Good day\"     Write a journal entry\n    \
    questlog run                        Run the daily reset in the foreground\n\n\
    For more information about a command, run 'questlog <command> --help'.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Show level, goal statistics and today's tasks
    Status(commands::status::Args),

    /// Manage goals
    #[command(long_about = "Adds, edits, lists and completes monthly and yearly goals.\n\
        Completing a goal awards experience based on its priority.")]
    Goal(commands::goal::Args),

    /// Manage daily tasks
    #[command(long_about = "Adds, edits, lists and completes tasks for a given day.\n\
        Each task's reward is fixed from its priority when it is created.")]
    Task(commands::task::Args),

    /// Write or read journal summaries
    Summary(commands::summary::Args),

    /// Mark every completed daily task incomplete right now
    ResetNow(commands::reset::Args),

    /// Run in the foreground with the daily reset scheduler
    #[command(long_about = "Keeps running until Ctrl+C. Once per day, during the configured\n\
        reset hour, completed daily tasks are marked incomplete again.")]
    Run(commands::run::Args),

    /// View configuration settings
    #[command(long_about = "Shows configuration values and file locations.\n\
        Configuration is stored in ~/.questlog/config.yaml\n\
        (or $QUESTLOG_HOME/config.yaml).")]
    Config(commands::config::Args),

    /// Database management
    Db(commands::db::Args),

    /// Generate shell completion scripts
    Completions(commands::completions::Args),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The run command installs its own subscriber with a file layer
    if !matches!(cli.command, Commands::Run(_)) {
        let filter = if cli.verbose {
            "questlog=debug"
        } else {
            "questlog=warn"
        };

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| filter.into()),
            )
            .with(tracing_subscriber::fmt::layer().without_time())
            .init();
    }

    match cli.command {
        Commands::Status(args) => commands::status::run(args),
        Commands::Goal(args) => commands::goal::run(args),
        Commands::Task(args) => commands::task::run(args),
        Commands::Summary(args) => commands::summary::run(args),
        Commands::ResetNow(args) => commands::reset::run(args),
        Commands::Run(args) => commands::run::run(args, cli.verbose),
        Commands::Config(args) => commands::config::run(args),
        Commands::Db(args) => commands::db::run(args),
        Commands::Completions(args) => {
            commands::completions::generate_completions(&mut Cli::command(), args.shell);
            Ok(())
        }
    }
}
