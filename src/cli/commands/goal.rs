//! Goal command - manage monthly and yearly goals.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use questlog::storage::{Goal, GoalDraft, GoalStatus, GoalType, Priority};

use super::parse_optional_date;
use crate::cli::format::truncate_to_width;
use crate::cli::{open_tracker, OutputFormat};

/// Arguments for the goal command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    questlog goal add \"Read 12 books\" --type yearly --priority high\n    \
    questlog goal list                     List all goals\n    \
    questlog goal list --type monthly      Only monthly goals\n    \
    questlog goal complete 3               Complete goal 3 and earn its reward\n    \
    questlog goal edit 3 --deadline 2026.12.31")]
pub struct Args {
    #[command(subcommand)]
    pub command: GoalCommand,
}

#[derive(Subcommand)]
pub enum GoalCommand {
    /// Add a new goal
    Add(AddArgs),

    /// List goals, highest priority first
    List(ListArgs),

    /// Change a goal's title, type, description, priority or deadline
    Edit(EditArgs),

    /// Mark a goal completed and award its experience
    #[command(long_about = "Marks a goal completed. The first completion awards experience\n\
        based on the goal's priority (high 1000, medium 300, low 100 by\n\
        default). Completing an already-completed goal does nothing.")]
    Complete { id: i64 },

    /// Pause a goal
    Pause { id: i64 },

    /// Move a paused or completed goal back to in progress
    Resume { id: i64 },

    /// Delete a goal
    Delete { id: i64 },
}

#[derive(clap::Args)]
pub struct AddArgs {
    /// Goal title
    pub title: String,

    /// Goal horizon: monthly or yearly
    #[arg(short = 't', long = "type", default_value = "monthly")]
    pub goal_type: GoalType,

    /// Longer description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// high, medium or low (anything else counts as medium)
    #[arg(short, long, default_value = "medium")]
    pub priority: String,

    /// Due date (YYYY-MM-DD or YYYY.MM.DD)
    #[arg(long, value_name = "DATE")]
    pub deadline: Option<String>,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Only goals of this type
    #[arg(short = 't', long = "type")]
    pub goal_type: Option<GoalType>,

    /// Hide completed goals
    #[arg(long)]
    pub active: bool,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(clap::Args)]
pub struct EditArgs {
    pub id: i64,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(short = 't', long = "type")]
    pub goal_type: Option<GoalType>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(short, long)]
    pub priority: Option<String>,

    #[arg(long, value_name = "DATE", conflicts_with = "clear_deadline")]
    pub deadline: Option<String>,

    /// Remove the deadline
    #[arg(long)]
    pub clear_deadline: bool,
}

/// Executes the goal command.
pub fn run(args: Args) -> Result<()> {
    match args.command {
        GoalCommand::Add(add) => run_add(add),
        GoalCommand::List(list) => run_list(list),
        GoalCommand::Edit(edit) => run_edit(edit),
        GoalCommand::Complete { id } => run_set_status(id, GoalStatus::Completed),
        GoalCommand::Pause { id } => run_set_status(id, GoalStatus::Paused),
        GoalCommand::Resume { id } => run_set_status(id, GoalStatus::InProgress),
        GoalCommand::Delete { id } => run_delete(id),
    }
}

fn run_add(args: AddArgs) -> Result<()> {
    let tracker = open_tracker()?;
    let draft = GoalDraft {
        title: args.title,
        goal_type: args.goal_type,
        description: args.description,
        priority: Priority::parse_lenient(&args.priority),
        deadline: parse_optional_date(args.deadline.as_deref())?,
    };

    let goal = tracker.add_goal(draft)?;
    println!(
        "{} goal {} {}",
        "Added".green(),
        goal.id.to_string().cyan(),
        goal.title.bold()
    );
    Ok(())
}

fn run_list(args: ListArgs) -> Result<()> {
    let tracker = open_tracker()?;
    let goals = tracker.list_goals(args.goal_type, !args.active)?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&goals)?;
            println!("{json}");
        }
        OutputFormat::Text => {
            if goals.is_empty() {
                println!("{}", "No goals found.".dimmed());
                println!();
                println!("Run 'questlog goal add <title>' to create one.");
                return Ok(());
            }
            print_goal_table(&goals);
        }
    }

    Ok(())
}

fn print_goal_table(goals: &[Goal]) {
    const ID_WIDTH: usize = 5;
    const TYPE_WIDTH: usize = 8;
    const PRIORITY_WIDTH: usize = 8;
    const STATUS_WIDTH: usize = 11;
    const DEADLINE_WIDTH: usize = 10;
    const TITLE_WIDTH: usize = 40;

    println!(
        "{}",
        format!(
            "{:>ID_WIDTH$}  {:<TYPE_WIDTH$}  {:<PRIORITY_WIDTH$}  {:<STATUS_WIDTH$}  {:<DEADLINE_WIDTH$}  {}",
            "ID", "TYPE", "PRIORITY", "STATUS", "DEADLINE", "TITLE"
        )
        .bold()
    );

    for goal in goals {
        let status = format!("{:<STATUS_WIDTH$}", goal.status.as_str());
        let status = match goal.status {
            GoalStatus::Completed => status.green(),
            GoalStatus::Paused => status.yellow(),
            GoalStatus::InProgress => status.normal(),
        };
        let deadline = goal
            .deadline
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:>ID_WIDTH$}  {:<TYPE_WIDTH$}  {:<PRIORITY_WIDTH$}  {}  {:<DEADLINE_WIDTH$}  {}",
            goal.id.to_string().cyan(),
            goal.goal_type.as_str(),
            goal.priority.as_str(),
            status,
            deadline.dimmed(),
            truncate_to_width(&goal.title, TITLE_WIDTH)
        );
    }
}

fn run_edit(args: EditArgs) -> Result<()> {
    let tracker = open_tracker()?;
    let current = tracker.get_goal(args.id)?;

    let deadline = if args.clear_deadline {
        None
    } else {
        parse_optional_date(args.deadline.as_deref())?.or(current.deadline)
    };
    let draft = GoalDraft {
        title: args.title.unwrap_or(current.title),
        goal_type: args.goal_type.unwrap_or(current.goal_type),
        description: args.description.unwrap_or(current.description),
        priority: args
            .priority
            .map(|p| Priority::parse_lenient(&p))
            .unwrap_or(current.priority),
        deadline,
    };

    let goal = tracker.edit_goal(args.id, draft)?;
    println!("{} goal {}", "Updated".green(), goal.id.to_string().cyan());
    Ok(())
}

fn run_set_status(id: i64, status: GoalStatus) -> Result<()> {
    let tracker = open_tracker()?;
    let change = tracker.set_goal_status(id, status)?;

    if !change.changed() {
        println!(
            "{}",
            format!("Goal {id} is already {}", change.current).dimmed()
        );
        return Ok(());
    }

    println!(
        "Goal {} {} -> {}",
        id.to_string().cyan(),
        change.previous,
        change.current.to_string().bold()
    );
    if change.experience_awarded > 0 {
        let info = tracker.db().basic_info()?;
        println!(
            "  {} {}",
            format!("+{} exp", change.experience_awarded).green().bold(),
            tracker.level_calculator().info(info.experience)
        );
    }
    Ok(())
}

fn run_delete(id: i64) -> Result<()> {
    let tracker = open_tracker()?;
    tracker.delete_goal(id)?;
    println!("{} goal {}", "Deleted".green(), id.to_string().cyan());
    Ok(())
}
