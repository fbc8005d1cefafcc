//! Core data models for questlog
//!
//! These mirror the three stored record kinds: the singleton progress row,
//! goals, and daily tasks.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Row id used for the singleton `basic_info` record.
pub const BASIC_INFO_ID: i64 = 1;

/// Progress record for the single user of this installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicInfo {
    /// When tracking started
    pub start_date: NaiveDate,

    /// Accumulated experience points
    pub experience: u64,

    /// Level derived from `experience`
    pub level: u64,

    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

/// A longer-horizon objective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub title: String,
    pub goal_type: GoalType,
    pub description: String,
    pub status: GoalStatus,
    pub priority: Priority,

    /// Optional due date
    pub deadline: Option<NaiveDate>,

    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

/// A to-do item scoped to a single calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTask {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,

    /// Experience granted on completion, fixed when the task is created
    pub experience_reward: u64,

    /// The day this task belongs to
    pub task_date: NaiveDate,

    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

/// Fields accepted when creating or editing a goal.
#[derive(Debug, Clone)]
pub struct GoalDraft {
    pub title: String,
    pub goal_type: GoalType,
    pub description: String,
    pub priority: Priority,
    pub deadline: Option<NaiveDate>,
}

/// Fields accepted when creating or editing a daily task.
#[derive(Debug, Clone)]
pub struct DailyTaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub task_date: NaiveDate,
}

/// Goal horizon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    #[default]
    Monthly,
    Yearly,
}

/// Goal lifecycle state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    InProgress,
    Completed,
    Paused,
}

/// Daily task state. Transitions are binary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Incomplete,
    Completed,
}

/// Priority shared by goals and daily tasks. Drives experience rewards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Parses user input, falling back to `Medium` for anything unrecognized.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

/// Error returned when a stored or typed enum name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Name used in the database and on the command line.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum!(GoalType, "goal type", {
    Monthly => "monthly",
    Yearly => "yearly",
});

text_enum!(GoalStatus, "goal status", {
    InProgress => "in_progress",
    Completed => "completed",
    Paused => "paused",
});

text_enum!(TaskStatus, "task status", {
    Incomplete => "incomplete",
    Completed => "completed",
});

text_enum!(Priority, "priority", {
    High => "high",
    Medium => "medium",
    Low => "low",
});

/// Aggregate counts for one goal type.
#[derive(Debug, Clone, Serialize)]
pub struct GoalStats {
    pub goal_type: GoalType,
    pub total: u64,
    pub completed: u64,
    pub in_progress: u64,
}

/// Aggregate counts for the tasks of one day.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskStats {
    pub total: u64,
    pub completed: u64,
    pub incomplete: u64,
}

/// Share of completed items, as a percentage.
pub fn completion_rate(completed: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}
