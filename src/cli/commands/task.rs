//! Task command - manage daily tasks.
//!
//! Tasks belong to a single day. Completing one awards the experience fixed
//! from its priority when it was created; the daily reset turns completed
//! tasks back to incomplete.

use anyhow::Result;
use chrono::Local;
use clap::Subcommand;
use colored::Colorize;

use questlog::storage::{DailyTask, DailyTaskDraft, Priority, StatusChange, TaskStatus};
use questlog::tracker::Tracker;

use super::parse_optional_date;
use crate::cli::format::truncate_to_width;
use crate::cli::{open_tracker, OutputFormat};

/// Arguments for the task command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    questlog task add \"Stretch\" --priority high\n    \
    questlog task list                    Today's tasks\n    \
    questlog task list --all-dates        Every task\n    \
    questlog task done 4                  Complete task 4\n    \
    questlog task undo 4                  Mark task 4 incomplete again")]
pub struct Args {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Add a task for today or another day
    Add(AddArgs),

    /// List tasks for one day (today by default)
    List(ListArgs),

    /// Mark a task completed and award its experience
    Done { id: i64 },

    /// Mark a task incomplete (experience already earned is kept)
    Undo { id: i64 },

    /// Flip a task between completed and incomplete
    Toggle { id: i64 },

    /// Change a task; the reward is recomputed from the priority
    Edit(EditArgs),

    /// Delete a task
    Delete { id: i64 },
}

#[derive(clap::Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,

    #[arg(short, long, default_value = "")]
    pub description: String,

    /// high, medium or low (anything else counts as medium)
    #[arg(short, long, default_value = "medium")]
    pub priority: String,

    /// Day the task belongs to (YYYY-MM-DD or YYYY.MM.DD, default today)
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Day to list (default today)
    #[arg(long, value_name = "DATE", conflicts_with = "all_dates")]
    pub date: Option<String>,

    /// List tasks from every day
    #[arg(long)]
    pub all_dates: bool,

    /// Hide completed tasks
    #[arg(long)]
    pub pending: bool,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(clap::Args)]
pub struct EditArgs {
    pub id: i64,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(short, long)]
    pub priority: Option<String>,

    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,
}

/// Executes the task command.
pub fn run(args: Args) -> Result<()> {
    match args.command {
        TaskCommand::Add(add) => run_add(add),
        TaskCommand::List(list) => run_list(list),
        TaskCommand::Done { id } => {
            let tracker = open_tracker()?;
            let change = tracker.set_task_status(id, TaskStatus::Completed)?;
            report_change(&tracker, id, change)
        }
        TaskCommand::Undo { id } => {
            let tracker = open_tracker()?;
            let change = tracker.set_task_status(id, TaskStatus::Incomplete)?;
            report_change(&tracker, id, change)
        }
        TaskCommand::Toggle { id } => {
            let tracker = open_tracker()?;
            let change = tracker.toggle_task(id)?;
            report_change(&tracker, id, change)
        }
        TaskCommand::Edit(edit) => run_edit(edit),
        TaskCommand::Delete { id } => {
            let tracker = open_tracker()?;
            tracker.delete_task(id)?;
            println!("{} task {}", "Deleted".green(), id.to_string().cyan());
            Ok(())
        }
    }
}

fn run_add(args: AddArgs) -> Result<()> {
    let tracker = open_tracker()?;
    let task_date =
        parse_optional_date(args.date.as_deref())?.unwrap_or_else(|| Local::now().date_naive());
    let draft = DailyTaskDraft {
        title: args.title,
        description: args.description,
        priority: Priority::parse_lenient(&args.priority),
        task_date,
    };

    let task = tracker.add_task(draft)?;
    println!(
        "{} task {} {} {}",
        "Added".green(),
        task.id.to_string().cyan(),
        task.title.bold(),
        format!("(+{} exp on completion)", task.experience_reward).dimmed()
    );
    Ok(())
}

fn run_list(args: ListArgs) -> Result<()> {
    let tracker = open_tracker()?;
    let date = if args.all_dates {
        None
    } else {
        let date = parse_optional_date(args.date.as_deref())?;
        Some(date.unwrap_or_else(|| Local::now().date_naive()))
    };
    let tasks = tracker.list_tasks(date, !args.pending)?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&tasks)?;
            println!("{json}");
        }
        OutputFormat::Text => {
            if tasks.is_empty() {
                println!("{}", "No tasks found.".dimmed());
                println!();
                println!("Run 'questlog task add <title>' to create one.");
                return Ok(());
            }
            print_task_table(&tasks);
        }
    }

    Ok(())
}

fn print_task_table(tasks: &[DailyTask]) {
    const ID_WIDTH: usize = 5;
    const DATE_WIDTH: usize = 10;
    const PRIORITY_WIDTH: usize = 8;
    const EXP_WIDTH: usize = 4;
    const TITLE_WIDTH: usize = 44;

    println!(
        "{}",
        format!(
            "{:>ID_WIDTH$}  {}  {:<DATE_WIDTH$}  {:<PRIORITY_WIDTH$}  {:>EXP_WIDTH$}  {}",
            "ID", "   ", "DATE", "PRIORITY", "EXP", "TITLE"
        )
        .bold()
    );

    for task in tasks {
        let check = match task.status {
            TaskStatus::Completed => "[x]".green(),
            TaskStatus::Incomplete => "[ ]".normal(),
        };
        let title = truncate_to_width(&task.title, TITLE_WIDTH);
        let title = match task.status {
            TaskStatus::Completed => title.dimmed(),
            TaskStatus::Incomplete => title.normal(),
        };

        println!(
            "{:>ID_WIDTH$}  {}  {:<DATE_WIDTH$}  {:<PRIORITY_WIDTH$}  {:>EXP_WIDTH$}  {}",
            task.id.to_string().cyan(),
            check,
            task.task_date.format("%Y-%m-%d").to_string(),
            task.priority.as_str(),
            task.experience_reward,
            title
        );
    }
}

fn run_edit(args: EditArgs) -> Result<()> {
    let tracker = open_tracker()?;
    let current = tracker.get_task(args.id)?;

    let draft = DailyTaskDraft {
        title: args.title.unwrap_or(current.title),
        description: args.description.unwrap_or(current.description),
        priority: args
            .priority
            .map(|p| Priority::parse_lenient(&p))
            .unwrap_or(current.priority),
        task_date: parse_optional_date(args.date.as_deref())?.unwrap_or(current.task_date),
    };

    let task = tracker.edit_task(args.id, draft)?;
    println!(
        "{} task {} {}",
        "Updated".green(),
        task.id.to_string().cyan(),
        format!("(+{} exp on completion)", task.experience_reward).dimmed()
    );
    Ok(())
}

fn report_change(tracker: &Tracker, id: i64, change: StatusChange<TaskStatus>) -> Result<()> {
    if !change.changed() {
        println!(
            "{}",
            format!("Task {id} is already {}", change.current).dimmed()
        );
        return Ok(());
    }

    println!(
        "Task {} {} -> {}",
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
