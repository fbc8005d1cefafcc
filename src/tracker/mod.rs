//! Use-case layer over the store.
//!
//! A [`Tracker`] is the context object built once at startup. It owns the
//! store connection and configuration and shares the [`Notifier`] with the
//! reset scheduler. Every user-initiated change goes through it in the same
//! order: validate, write, award experience, publish.

pub mod goals;
pub mod journal;
pub mod tasks;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::events::{DataEvent, Notifier};
use crate::level::{LevelCalculator, LevelInfo};
use crate::storage::{Database, GoalStats, TaskStats};

pub use journal::Journal;

/// Longest journal summary accepted, in characters.
pub const MAX_SUMMARY_CHARS: usize = 10_000;

/// Errors surfaced to the user by tracker operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Input rejected before touching the store.
    #[error("{0}")]
    Validation(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Journal write failed: {0:#}")]
    Journal(anyhow::Error),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Snapshot shown by the status view.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub start_date: NaiveDate,
    pub level: LevelInfo,
    pub goals: Vec<GoalStats>,
    pub today: NaiveDate,
    pub today_tasks: TaskStats,
}

/// Result of saving a journal summary.
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub path: PathBuf,
    pub experience_awarded: u64,
}

pub struct Tracker {
    db: Database,
    config: Config,
    calc: LevelCalculator,
    notifier: Arc<Notifier>,
    journal: Journal,
}

impl Tracker {
    pub fn new(db: Database, config: Config, notifier: Arc<Notifier>, journal: Journal) -> Self {
        let calc = config.level_calculator();
        Self {
            db,
            config,
            calc,
            notifier,
            journal,
        }
    }

    /// Builds a tracker from the default config, database and journal paths.
    pub fn open_default(notifier: Arc<Notifier>) -> anyhow::Result<Self> {
        let config = Config::load()?;
        let db_path = crate::storage::db::default_db_path()?;
        let start_date = config
            .start_date
            .unwrap_or_else(|| Local::now().date_naive());
        let db = Database::open_with_start_date(&db_path, start_date)
            .context("Failed to open questlog database")?;
        let journal = Journal::new(Config::journal_dir()?);
        Ok(Self::new(db, config, notifier, journal))
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn level_calculator(&self) -> &LevelCalculator {
        &self.calc
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Level, goal and today's task statistics.
    pub fn status(&self) -> TrackerResult<StatusReport> {
        let info = self.db.basic_info()?;
        let today = Local::now().date_naive();
        Ok(StatusReport {
            start_date: info.start_date,
            level: self.calc.info(info.experience),
            goals: self.db.goal_stats()?,
            today,
            today_tasks: self.db.task_stats(today)?,
        })
    }

    /// Grants the summary reward and writes the summary to the journal.
    ///
    /// The award is only committed once the journal entry is on disk.
    pub fn add_summary(&self, date: NaiveDate, content: &str) -> TrackerResult<SummaryOutcome> {
        let content = content.trim();
        if content.is_empty() {
            return Err(TrackerError::Validation(
                "Summary content is required".to_string(),
            ));
        }
        let length = content.chars().count();
        if length > MAX_SUMMARY_CHARS {
            return Err(TrackerError::Validation(format!(
                "Summary is {length} characters; the limit is {MAX_SUMMARY_CHARS}"
            )));
        }

        let reward = self.config.summary_reward;
        let path = self
            .db
            .add_experience_with(reward, &self.calc, || {
                self.journal.prepend_entry(date, content)
            })?
            .map_err(TrackerError::Journal)?;
        self.notifier.publish(DataEvent::SummaryAdded);

        Ok(SummaryOutcome {
            path,
            experience_awarded: reward,
        })
    }

    /// Runs the daily reset immediately, regardless of the configured hour.
    pub fn reset_daily_tasks_now(&self) -> TrackerResult<usize> {
        let count = self.db.reset_completed_tasks(Local::now())?;
        tracing::info!("Manual daily reset: {} tasks reset", count);
        self.notifier.publish(DataEvent::DailyReset);
        Ok(count)
    }

    /// Sets experience back to zero, keeping goals and tasks.
    pub fn reset_progress(&self) -> TrackerResult<()> {
        self.db.reset_progress(&self.calc)?;
        tracing::warn!("Experience reset to 0");
        self.notifier.publish(DataEvent::DataChanged);
        Ok(())
    }

    /// Drops all goals, tasks and experience and starts tracking today.
    pub fn wipe_all(&self) -> TrackerResult<()> {
        let start_date = self
            .config
            .start_date
            .unwrap_or_else(|| Local::now().date_naive());
        self.db.recreate(start_date)?;
        self.notifier.publish(DataEvent::DataChanged);
        Ok(())
    }
}

/// Requires a non-blank value, returning it trimmed.
pub(crate) fn require_text(value: &str, field: &str) -> TrackerResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Parses `YYYY-MM-DD` or `YYYY.MM.DD`; month and day may be unpadded.
pub fn parse_date_input(value: &str) -> TrackerResult<NaiveDate> {
    let normalized = value.trim().replace('.', "-");
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").map_err(|_| {
        TrackerError::Validation(format!(
            "Invalid date '{}'; use YYYY-MM-DD or YYYY.MM.DD",
            value.trim()
        ))
    })
}
