//! SQLite storage layer for questlog

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

use super::models::{
    BasicInfo, DailyTask, DailyTaskDraft, Goal, GoalDraft, GoalStats, GoalStatus, GoalType,
    TaskStats, TaskStatus, BASIC_INFO_ID,
};
use crate::config::Config;
use crate::level::LevelCalculator;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Get the default database path, creating the data directory if needed
pub fn default_db_path() -> Result<std::path::PathBuf> {
    let path = Config::db_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(path)
}

/// Result of a status change request on a goal or task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange<S> {
    pub previous: S,
    pub current: S,
    /// Experience granted by this change (0 unless it entered `completed`)
    pub experience_awarded: u64,
}

impl<S: PartialEq> StatusChange<S> {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database. A new database starts tracking today.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_start_date(path, Local::now().date_naive())
    }

    /// Open or create the database, seeding `basic_info` with `start_date`
    /// if it does not exist yet.
    pub fn open_with_start_date(path: &Path, start_date: NaiveDate) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let db = Self { conn };
        db.migrate()?;
        db.seed_basic_info(start_date)?;
        Ok(db)
    }

    /// Open the default database
    pub fn open_default() -> Result<Self> {
        let path = default_db_path()?;
        Self::open(&path)
    }

    /// Create tables if they are missing. Safe to run on every startup.
    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS basic_info (
                id INTEGER PRIMARY KEY,
                start_date TEXT NOT NULL,
                experience INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 1,
                last_reset_date TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS goals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                goal_type TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'in_progress',
                priority TEXT NOT NULL DEFAULT 'medium',
                deadline TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS daily_tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                priority TEXT NOT NULL DEFAULT 'medium',
                status TEXT NOT NULL DEFAULT 'incomplete',
                experience_reward INTEGER NOT NULL DEFAULT 20,
                task_date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Indexes for common queries
            CREATE INDEX IF NOT EXISTS idx_goals_type_status ON goals(goal_type, status);
            CREATE INDEX IF NOT EXISTS idx_daily_tasks_task_date ON daily_tasks(task_date);
            CREATE INDEX IF NOT EXISTS idx_daily_tasks_status ON daily_tasks(status);
            "#,
        )?;

        // Databases created before the reset marker existed
        if !table_has_column(&self.conn, "basic_info", "last_reset_date")? {
            self.conn
                .execute("ALTER TABLE basic_info ADD COLUMN last_reset_date TEXT", [])
                .context("Failed to add last_reset_date column")?;
        }
        Ok(())
    }

    fn seed_basic_info(&self, start_date: NaiveDate) -> Result<()> {
        let now = now_text();
        let inserted = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO basic_info (id, start_date, experience, level, created_at, updated_at)
            VALUES (?1, ?2, 0, ?3, ?4, ?4)
            "#,
            params![
                BASIC_INFO_ID,
                start_date.format(DATE_FORMAT).to_string(),
                LevelCalculator::default().level_for(0) as i64,
                now,
            ],
        )?;
        if inserted > 0 {
            tracing::info!("Initialized progress record starting {}", start_date);
        }
        Ok(())
    }

    /// Drop every table and recreate an empty schema with a fresh progress
    /// record.
    pub fn recreate(&self, start_date: NaiveDate) -> Result<()> {
        self.conn.execute_batch(
            r#"
            DROP TABLE IF EXISTS basic_info;
            DROP TABLE IF EXISTS goals;
            DROP TABLE IF EXISTS daily_tasks;
            "#,
        )?;
        self.migrate()?;
        self.seed_basic_info(start_date)?;
        tracing::warn!("Database recreated");
        Ok(())
    }

    // ==================== Basic Info ====================

    /// Get the singleton progress record
    pub fn basic_info(&self) -> Result<BasicInfo> {
        self.conn
            .query_row(
                "SELECT start_date, experience, level, created_at, updated_at FROM basic_info WHERE id = ?1",
                params![BASIC_INFO_ID],
                |row| {
                    Ok(BasicInfo {
                        start_date: parse_date(0, &row.get::<_, String>(0)?)?,
                        experience: row.get::<_, i64>(1)?.max(0) as u64,
                        level: row.get::<_, i64>(2)?.max(0) as u64,
                        created_at: parse_timestamp(3, &row.get::<_, String>(3)?)?,
                        updated_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
                    })
                },
            )
            .context("Failed to read progress record")
    }

    /// Add experience and recompute the level in one transaction
    pub fn add_experience(&self, amount: u64, calc: &LevelCalculator) -> Result<BasicInfo> {
        let tx = self.conn.unchecked_transaction()?;
        award_experience(&tx, amount, calc)?;
        tx.commit()?;
        self.basic_info()
    }

    /// Add experience, then run `then` before committing. The award is
    /// rolled back if `then` fails, and its error is returned in the inner
    /// result.
    pub fn add_experience_with<T, E>(
        &self,
        amount: u64,
        calc: &LevelCalculator,
        then: impl FnOnce() -> std::result::Result<T, E>,
    ) -> Result<std::result::Result<T, E>> {
        let tx = self.conn.unchecked_transaction()?;
        award_experience(&tx, amount, calc)?;
        let value = match then() {
            Ok(value) => value,
            Err(e) => return Ok(Err(e)),
        };
        tx.commit().context("Failed to commit experience award")?;
        Ok(Ok(value))
    }

    /// Administrative reset of experience back to zero
    pub fn reset_progress(&self, calc: &LevelCalculator) -> Result<()> {
        self.conn.execute(
            "UPDATE basic_info SET experience = 0, level = ?1, updated_at = ?2 WHERE id = ?3",
            params![calc.level_for(0) as i64, now_text(), BASIC_INFO_ID],
        )?;
        Ok(())
    }

    // ==================== Goals ====================

    /// Insert a new goal with status `in_progress`
    pub fn insert_goal(&self, draft: &GoalDraft) -> Result<i64> {
        let now = now_text();
        self.conn.execute(
            r#"
            INSERT INTO goals (title, goal_type, description, status, priority, deadline, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
            params![
                draft.title,
                draft.goal_type.as_str(),
                draft.description,
                GoalStatus::InProgress.as_str(),
                draft.priority.as_str(),
                draft.deadline.map(|d| d.format(DATE_FORMAT).to_string()),
                now,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a goal by ID
    pub fn get_goal(&self, id: i64) -> Result<Option<Goal>> {
        self.conn
            .query_row(
                "SELECT id, title, goal_type, description, status, priority, deadline, created_at, updated_at FROM goals WHERE id = ?1",
                params![id],
                Self::row_to_goal,
            )
            .optional()
            .context("Failed to get goal")
    }

    /// List goals, newest first within each priority, optionally filtered by type
    pub fn list_goals(
        &self,
        goal_type: Option<GoalType>,
        include_completed: bool,
    ) -> Result<Vec<Goal>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, goal_type, description, status, priority, deadline, created_at, updated_at
             FROM goals
             WHERE (?1 IS NULL OR goal_type = ?1)
               AND (?2 = 1 OR status != 'completed')
             ORDER BY CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END,
                      created_at DESC, id DESC",
        )?;

        let rows = stmt.query_map(
            params![goal_type.map(|t| t.as_str()), include_completed as i64],
            Self::row_to_goal,
        )?;

        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list goals")
    }

    /// Replace the editable fields of a goal. Returns false if it does not exist.
    pub fn update_goal(&self, id: i64, draft: &GoalDraft) -> Result<bool> {
        let changed = self.conn.execute(
            r#"
            UPDATE goals
            SET title = ?1, goal_type = ?2, description = ?3, priority = ?4, deadline = ?5, updated_at = ?6
            WHERE id = ?7
            "#,
            params![
                draft.title,
                draft.goal_type.as_str(),
                draft.description,
                draft.priority.as_str(),
                draft.deadline.map(|d| d.format(DATE_FORMAT).to_string()),
                now_text(),
                id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Move a goal to `status`.
    ///
    /// Entering `completed` from any other state grants `completion_reward`
    /// in the same transaction. Requesting the current status changes nothing.
    pub fn update_goal_status(
        &self,
        id: i64,
        status: GoalStatus,
        completion_reward: u64,
        calc: &LevelCalculator,
    ) -> Result<Option<StatusChange<GoalStatus>>> {
        let tx = self.conn.unchecked_transaction()?;

        let previous: Option<String> = tx
            .query_row(
                "SELECT status FROM goals WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(previous) = previous else {
            return Ok(None);
        };
        let previous = previous.parse::<GoalStatus>().unwrap_or_default();

        let mut change = StatusChange {
            previous,
            current: status,
            experience_awarded: 0,
        };
        if change.changed() {
            tx.execute(
                "UPDATE goals SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now_text(), id],
            )?;
            if status == GoalStatus::Completed {
                award_experience(&tx, completion_reward, calc)?;
                change.experience_awarded = completion_reward;
            }
        }

        tx.commit()?;
        Ok(Some(change))
    }

    /// Delete a goal. Returns false if it does not exist.
    pub fn delete_goal(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM goals WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn row_to_goal(row: &rusqlite::Row) -> rusqlite::Result<Goal> {
        Ok(Goal {
            id: row.get(0)?,
            title: row.get(1)?,
            goal_type: row.get::<_, String>(2)?.parse().unwrap_or_default(),
            description: row.get(3)?,
            status: row.get::<_, String>(4)?.parse().unwrap_or_default(),
            priority: row.get::<_, String>(5)?.parse().unwrap_or_default(),
            deadline: row
                .get::<_, Option<String>>(6)?
                .map(|s| parse_date(6, &s))
                .transpose()?,
            created_at: parse_timestamp(7, &row.get::<_, String>(7)?)?,
            updated_at: parse_timestamp(8, &row.get::<_, String>(8)?)?,
        })
    }

    // ==================== Daily Tasks ====================

    /// Insert a new incomplete daily task with a fixed experience reward
    pub fn insert_task(&self, draft: &DailyTaskDraft, experience_reward: u64) -> Result<i64> {
        let now = now_text();
        self.conn.execute(
            r#"
            INSERT INTO daily_tasks (title, description, priority, status, experience_reward, task_date, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
            params![
                draft.title,
                draft.description,
                draft.priority.as_str(),
                TaskStatus::Incomplete.as_str(),
                experience_reward as i64,
                draft.task_date.format(DATE_FORMAT).to_string(),
                now,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a daily task by ID
    pub fn get_task(&self, id: i64) -> Result<Option<DailyTask>> {
        self.conn
            .query_row(
                "SELECT id, title, description, priority, status, experience_reward, task_date, created_at, updated_at FROM daily_tasks WHERE id = ?1",
                params![id],
                Self::row_to_task,
            )
            .optional()
            .context("Failed to get daily task")
    }

    /// List daily tasks, newest first, optionally for one day only
    pub fn list_tasks(
        &self,
        task_date: Option<NaiveDate>,
        include_completed: bool,
    ) -> Result<Vec<DailyTask>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, priority, status, experience_reward, task_date, created_at, updated_at
             FROM daily_tasks
             WHERE (?1 IS NULL OR task_date = ?1)
               AND (?2 = 1 OR status != 'completed')
             ORDER BY created_at DESC, id DESC",
        )?;

        let rows = stmt.query_map(
            params![
                task_date.map(|d| d.format(DATE_FORMAT).to_string()),
                include_completed as i64
            ],
            Self::row_to_task,
        )?;

        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list daily tasks")
    }

    /// Replace the editable fields of a task, including its reward.
    /// Returns false if it does not exist.
    pub fn update_task(
        &self,
        id: i64,
        draft: &DailyTaskDraft,
        experience_reward: u64,
    ) -> Result<bool> {
        let changed = self.conn.execute(
            r#"
            UPDATE daily_tasks
            SET title = ?1, description = ?2, priority = ?3, experience_reward = ?4, task_date = ?5, updated_at = ?6
            WHERE id = ?7
            "#,
            params![
                draft.title,
                draft.description,
                draft.priority.as_str(),
                experience_reward as i64,
                draft.task_date.format(DATE_FORMAT).to_string(),
                now_text(),
                id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Move a task to `status`. Entering `completed` grants the task's
    /// stored reward in the same transaction.
    pub fn update_task_status(
        &self,
        id: i64,
        status: TaskStatus,
        calc: &LevelCalculator,
    ) -> Result<Option<StatusChange<TaskStatus>>> {
        let tx = self.conn.unchecked_transaction()?;

        let row: Option<(String, i64)> = tx
            .query_row(
                "SELECT status, experience_reward FROM daily_tasks WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((previous, reward)) = row else {
            return Ok(None);
        };
        let previous = previous.parse::<TaskStatus>().unwrap_or_default();

        let mut change = StatusChange {
            previous,
            current: status,
            experience_awarded: 0,
        };
        if change.changed() {
            tx.execute(
                "UPDATE daily_tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now_text(), id],
            )?;
            if status == TaskStatus::Completed {
                let reward = reward.max(0) as u64;
                award_experience(&tx, reward, calc)?;
                change.experience_awarded = reward;
            }
        }

        tx.commit()?;
        Ok(Some(change))
    }

    /// Delete a daily task. Returns false if it does not exist.
    pub fn delete_task(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM daily_tasks WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Flip every completed task back to incomplete, whatever its date.
    /// Returns the number of rows changed.
    pub fn reset_completed_tasks(&self, now: DateTime<Local>) -> Result<usize> {
        let changed = self
            .conn
            .execute(
                "UPDATE daily_tasks SET status = ?1, updated_at = ?2 WHERE status = ?3",
                params![
                    TaskStatus::Incomplete.as_str(),
                    now.to_rfc3339(),
                    TaskStatus::Completed.as_str(),
                ],
            )
            .context("Failed to reset completed daily tasks")?;
        Ok(changed)
    }

    /// Scheduled daily reset, at most once per `today` across every
    /// connection to this file. The marker is read and written in the same
    /// immediate transaction as the bulk update.
    ///
    /// Returns `None` if the reset for `today` was already recorded.
    pub fn reset_completed_tasks_once(
        &self,
        today: NaiveDate,
        now: DateTime<Local>,
    ) -> Result<Option<usize>> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let today_text = today.format(DATE_FORMAT).to_string();

        let last: Option<String> = tx.query_row(
            "SELECT last_reset_date FROM basic_info WHERE id = ?1",
            params![BASIC_INFO_ID],
            |row| row.get(0),
        )?;
        if last.as_deref() == Some(today_text.as_str()) {
            return Ok(None);
        }

        let changed = tx
            .execute(
                "UPDATE daily_tasks SET status = ?1, updated_at = ?2 WHERE status = ?3",
                params![
                    TaskStatus::Incomplete.as_str(),
                    now.to_rfc3339(),
                    TaskStatus::Completed.as_str(),
                ],
            )
            .context("Failed to reset completed daily tasks")?;
        tx.execute(
            "UPDATE basic_info SET last_reset_date = ?1 WHERE id = ?2",
            params![today_text, BASIC_INFO_ID],
        )?;
        tx.commit()?;
        Ok(Some(changed))
    }

    /// Day of the last recorded scheduled reset
    pub fn last_reset_date(&self) -> Result<Option<NaiveDate>> {
        let value: Option<String> = self.conn.query_row(
            "SELECT last_reset_date FROM basic_info WHERE id = ?1",
            params![BASIC_INFO_ID],
            |row| row.get(0),
        )?;
        value
            .map(|v| parse_date(0, &v))
            .transpose()
            .context("Failed to read last reset date")
    }

    fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<DailyTask> {
        Ok(DailyTask {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            priority: row.get::<_, String>(3)?.parse().unwrap_or_default(),
            status: row.get::<_, String>(4)?.parse().unwrap_or_default(),
            experience_reward: row.get::<_, i64>(5)?.max(0) as u64,
            task_date: parse_date(6, &row.get::<_, String>(6)?)?,
            created_at: parse_timestamp(7, &row.get::<_, String>(7)?)?,
            updated_at: parse_timestamp(8, &row.get::<_, String>(8)?)?,
        })
    }

    // ==================== Stats ====================

    /// Goal counts grouped by goal type
    pub fn goal_stats(&self) -> Result<Vec<GoalStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT goal_type,
                    COUNT(*),
                    SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END)
             FROM goals
             GROUP BY goal_type
             ORDER BY goal_type",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(GoalStats {
                goal_type: row.get::<_, String>(0)?.parse().unwrap_or_default(),
                total: row.get::<_, i64>(1)?.max(0) as u64,
                completed: row.get::<_, Option<i64>>(2)?.unwrap_or(0).max(0) as u64,
                in_progress: row.get::<_, Option<i64>>(3)?.unwrap_or(0).max(0) as u64,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to compute goal stats")
    }

    /// Task counts for one day
    pub fn task_stats(&self, task_date: NaiveDate) -> Result<TaskStats> {
        self.conn
            .query_row(
                "SELECT COUNT(*),
                        SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END),
                        SUM(CASE WHEN status = 'incomplete' THEN 1 ELSE 0 END)
                 FROM daily_tasks
                 WHERE task_date = ?1",
                params![task_date.format(DATE_FORMAT).to_string()],
                |row| {
                    Ok(TaskStats {
                        total: row.get::<_, i64>(0)?.max(0) as u64,
                        completed: row.get::<_, Option<i64>>(1)?.unwrap_or(0).max(0) as u64,
                        incomplete: row.get::<_, Option<i64>>(2)?.unwrap_or(0).max(0) as u64,
                    })
                },
            )
            .context("Failed to compute task stats")
    }

    /// Get total goal count
    pub fn goal_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM goals", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get total daily task count
    pub fn task_count(&self) -> Result<i64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM daily_tasks", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Add experience to the progress row and store the recomputed level.
fn award_experience(conn: &Connection, amount: u64, calc: &LevelCalculator) -> Result<()> {
    let current: i64 = conn.query_row(
        "SELECT experience FROM basic_info WHERE id = ?1",
        params![BASIC_INFO_ID],
        |row| row.get(0),
    )?;
    let experience = (current.max(0) as u64).saturating_add(amount);
    let level = calc.level_for(experience);

    conn.execute(
        "UPDATE basic_info SET experience = ?1, level = ?2, updated_at = ?3 WHERE id = ?4",
        params![experience as i64, level as i64, now_text(), BASIC_INFO_ID],
    )?;
    tracing::debug!(
        "Experience {} -> {} (level {})",
        current,
        experience,
        level
    );
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn now_text() -> String {
    Local::now().to_rfc3339()
}

fn parse_date(idx: usize, value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Local>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Local))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::Priority;
    use chrono::Duration;
    use tempfile::tempdir;

    /// Creates a test database in a temporary directory.
    /// Returns the Database instance and the temp directory (which must be kept alive).
    fn create_test_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().expect("Failed to create temp directory");
        let db_path = dir.path().join("test.db");
        let db = Database::open(&db_path).expect("Failed to open test database");
        (db, dir)
    }

    fn goal_draft(title: &str, goal_type: GoalType, priority: Priority) -> GoalDraft {
        GoalDraft {
            title: title.to_string(),
            goal_type,
            description: String::new(),
            priority,
            deadline: None,
        }
    }

    fn task_draft(title: &str, task_date: NaiveDate) -> DailyTaskDraft {
        DailyTaskDraft {
            title: title.to_string(),
            description: "desc".to_string(),
            priority: Priority::Medium,
            task_date,
        }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    // ==================== Basic Info Tests ====================

    #[test]
    fn test_database_creation_seeds_basic_info() {
        let dir = tempdir().expect("Failed to create temp directory");
        let db_path = dir.path().join("new_test.db");
        let start = NaiveDate::from_ymd_opt(2025, 7, 30).unwrap();

        let db = Database::open_with_start_date(&db_path, start).expect("Failed to open");
        assert!(db_path.exists(), "Database file should exist after creation");

        let info = db.basic_info().expect("Failed to read basic info");
        assert_eq!(info.start_date, start);
        assert_eq!(info.experience, 0);
        assert_eq!(info.level, 1);
        assert_eq!(db.goal_count().unwrap(), 0);
        assert_eq!(db.task_count().unwrap(), 0);
    }

    #[test]
    fn test_reopen_keeps_existing_progress() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let calc = LevelCalculator::default();

        {
            let db = Database::open(&db_path).unwrap();
            db.add_experience(150, &calc).unwrap();
        }

        let db = Database::open(&db_path).unwrap();
        let info = db.basic_info().unwrap();
        assert_eq!(info.experience, 150, "Schema creation must be idempotent");
        assert_eq!(info.level, 2);
    }

    #[test]
    fn test_add_experience_recomputes_level() {
        let (db, _dir) = create_test_db();
        let calc = LevelCalculator::default();

        let info = db.add_experience(99, &calc).unwrap();
        assert_eq!(info.level, 1);
        let info = db.add_experience(1, &calc).unwrap();
        assert_eq!(info.experience, 100);
        assert_eq!(info.level, 2);
    }

    #[test]
    fn test_reset_progress() {
        let (db, _dir) = create_test_db();
        let calc = LevelCalculator::default();
        db.add_experience(420, &calc).unwrap();

        db.reset_progress(&calc).unwrap();
        let info = db.basic_info().unwrap();
        assert_eq!(info.experience, 0);
        assert_eq!(info.level, 1);
    }

    // ==================== Goal Tests ====================

    #[test]
    fn test_insert_and_get_goal() {
        let (db, _dir) = create_test_db();
        let mut draft = goal_draft("Read 4 books", GoalType::Monthly, Priority::High);
        draft.deadline = NaiveDate::from_ymd_opt(2026, 12, 31);

        let id = db.insert_goal(&draft).unwrap();
        let goal = db.get_goal(id).unwrap().expect("Goal should exist");

        assert_eq!(goal.title, "Read 4 books");
        assert_eq!(goal.goal_type, GoalType::Monthly);
        assert_eq!(goal.status, GoalStatus::InProgress);
        assert_eq!(goal.priority, Priority::High);
        assert_eq!(goal.deadline, NaiveDate::from_ymd_opt(2026, 12, 31));
    }

    #[test]
    fn test_get_nonexistent_goal() {
        let (db, _dir) = create_test_db();
        assert!(db.get_goal(42).unwrap().is_none());
    }

    #[test]
    fn test_list_goals_filters_type_and_completed() {
        let (db, _dir) = create_test_db();
        let calc = LevelCalculator::default();
        let monthly = db
            .insert_goal(&goal_draft("m", GoalType::Monthly, Priority::Low))
            .unwrap();
        let done = db
            .insert_goal(&goal_draft("m2", GoalType::Monthly, Priority::Low))
            .unwrap();
        db.insert_goal(&goal_draft("y", GoalType::Yearly, Priority::Low))
            .unwrap();
        db.update_goal_status(done, GoalStatus::Completed, 100, &calc)
            .unwrap();

        let open_monthly = db.list_goals(Some(GoalType::Monthly), false).unwrap();
        assert_eq!(open_monthly.len(), 1);
        assert_eq!(open_monthly[0].id, monthly);

        let all_monthly = db.list_goals(Some(GoalType::Monthly), true).unwrap();
        assert_eq!(all_monthly.len(), 2);

        let everything = db.list_goals(None, true).unwrap();
        assert_eq!(everything.len(), 3);
    }

    #[test]
    fn test_list_goals_orders_by_priority() {
        let (db, _dir) = create_test_db();
        db.insert_goal(&goal_draft("low", GoalType::Yearly, Priority::Low))
            .unwrap();
        db.insert_goal(&goal_draft("high", GoalType::Yearly, Priority::High))
            .unwrap();
        db.insert_goal(&goal_draft("medium", GoalType::Yearly, Priority::Medium))
            .unwrap();

        let titles: Vec<String> = db
            .list_goals(None, false)
            .unwrap()
            .into_iter()
            .map(|g| g.title)
            .collect();
        assert_eq!(titles, vec!["high", "medium", "low"]);
    }

    #[test]
    fn test_goal_completion_awards_once() {
        let (db, _dir) = create_test_db();
        let calc = LevelCalculator::default();
        let id = db
            .insert_goal(&goal_draft("g", GoalType::Monthly, Priority::Medium))
            .unwrap();

        let first = db
            .update_goal_status(id, GoalStatus::Completed, 300, &calc)
            .unwrap()
            .unwrap();
        assert!(first.changed());
        assert_eq!(first.experience_awarded, 300);

        let second = db
            .update_goal_status(id, GoalStatus::Completed, 300, &calc)
            .unwrap()
            .unwrap();
        assert!(!second.changed());
        assert_eq!(second.experience_awarded, 0);

        assert_eq!(db.basic_info().unwrap().experience, 300);
        assert_eq!(db.basic_info().unwrap().level, 4);
    }

    #[test]
    fn test_goal_pause_does_not_award() {
        let (db, _dir) = create_test_db();
        let calc = LevelCalculator::default();
        let id = db
            .insert_goal(&goal_draft("g", GoalType::Monthly, Priority::High))
            .unwrap();

        let change = db
            .update_goal_status(id, GoalStatus::Paused, 1000, &calc)
            .unwrap()
            .unwrap();
        assert_eq!(change.previous, GoalStatus::InProgress);
        assert_eq!(change.experience_awarded, 0);
        assert_eq!(db.basic_info().unwrap().experience, 0);
    }

    #[test]
    fn test_update_and_delete_goal() {
        let (db, _dir) = create_test_db();
        let id = db
            .insert_goal(&goal_draft("old", GoalType::Monthly, Priority::Low))
            .unwrap();

        let updated = db
            .update_goal(id, &goal_draft("new", GoalType::Yearly, Priority::High))
            .unwrap();
        assert!(updated);
        let goal = db.get_goal(id).unwrap().unwrap();
        assert_eq!(goal.title, "new");
        assert_eq!(goal.goal_type, GoalType::Yearly);

        assert!(db.delete_goal(id).unwrap());
        assert!(!db.delete_goal(id).unwrap(), "Second delete finds nothing");
        assert!(!db
            .update_goal(id, &goal_draft("x", GoalType::Monthly, Priority::Low))
            .unwrap());
    }

    // ==================== Daily Task Tests ====================

    #[test]
    fn test_insert_and_list_tasks_by_date() {
        let (db, _dir) = create_test_db();
        let today = today();
        let yesterday = today - Duration::days(1);

        db.insert_task(&task_draft("today", today), 20).unwrap();
        db.insert_task(&task_draft("yesterday", yesterday), 20)
            .unwrap();

        let todays = db.list_tasks(Some(today), false).unwrap();
        assert_eq!(todays.len(), 1);
        assert_eq!(todays[0].title, "today");
        assert_eq!(todays[0].status, TaskStatus::Incomplete);
        assert_eq!(todays[0].experience_reward, 20);

        assert_eq!(db.list_tasks(None, true).unwrap().len(), 2);
    }

    #[test]
    fn test_task_completion_awards_stored_reward() {
        let (db, _dir) = create_test_db();
        let calc = LevelCalculator::default();
        let id = db.insert_task(&task_draft("t", today()), 30).unwrap();

        let change = db
            .update_task_status(id, TaskStatus::Completed, &calc)
            .unwrap()
            .unwrap();
        assert_eq!(change.experience_awarded, 30);

        let again = db
            .update_task_status(id, TaskStatus::Completed, &calc)
            .unwrap()
            .unwrap();
        assert_eq!(again.experience_awarded, 0);

        let undo = db
            .update_task_status(id, TaskStatus::Incomplete, &calc)
            .unwrap()
            .unwrap();
        assert!(undo.changed());
        assert_eq!(undo.experience_awarded, 0);

        assert_eq!(db.basic_info().unwrap().experience, 30);
    }

    #[test]
    fn test_update_task_status_missing_row() {
        let (db, _dir) = create_test_db();
        let calc = LevelCalculator::default();
        assert!(db
            .update_task_status(7, TaskStatus::Completed, &calc)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_reset_completed_tasks_ignores_date() {
        let (db, _dir) = create_test_db();
        let calc = LevelCalculator::default();
        let today = today();
        let old = db
            .insert_task(&task_draft("old", today - Duration::days(3)), 20)
            .unwrap();
        let current = db.insert_task(&task_draft("current", today), 20).unwrap();
        db.insert_task(&task_draft("open", today), 20).unwrap();
        db.update_task_status(old, TaskStatus::Completed, &calc)
            .unwrap();
        db.update_task_status(current, TaskStatus::Completed, &calc)
            .unwrap();

        let changed = db.reset_completed_tasks(Local::now()).unwrap();
        assert_eq!(changed, 2);
        assert!(db
            .list_tasks(None, true)
            .unwrap()
            .iter()
            .all(|t| t.status == TaskStatus::Incomplete));
    }

    #[test]
    fn test_reset_once_is_shared_across_connections() {
        let (db, dir) = create_test_db();
        let other = Database::open(&dir.path().join("test.db")).unwrap();
        let calc = LevelCalculator::default();
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let id = db.insert_task(&task_draft("t", day), 20).unwrap();
        db.update_task_status(id, TaskStatus::Completed, &calc)
            .unwrap();
        assert_eq!(db.last_reset_date().unwrap(), None);

        assert_eq!(
            db.reset_completed_tasks_once(day, Local::now()).unwrap(),
            Some(1)
        );
        assert_eq!(other.last_reset_date().unwrap(), Some(day));

        db.update_task_status(id, TaskStatus::Completed, &calc)
            .unwrap();
        assert_eq!(
            other.reset_completed_tasks_once(day, Local::now()).unwrap(),
            None
        );
        assert_eq!(
            db.get_task(id).unwrap().unwrap().status,
            TaskStatus::Completed
        );

        let next_day = day.succ_opt().unwrap();
        assert_eq!(
            other
                .reset_completed_tasks_once(next_day, Local::now())
                .unwrap(),
            Some(1)
        );
    }

    #[test]
    fn test_open_adds_reset_marker_to_old_schema() {
        let dir = tempdir().expect("Failed to create temp directory");
        let db_path = dir.path().join("old.db");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE basic_info (
                id INTEGER PRIMARY KEY,
                start_date TEXT NOT NULL,
                experience INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            INSERT INTO basic_info VALUES
                (1, '2025-01-01', 150, 2, '2025-01-01T00:00:00+00:00', '2025-01-01T00:00:00+00:00');
            "#,
        )
        .unwrap();
        drop(conn);

        let db = Database::open(&db_path).unwrap();
        assert_eq!(db.basic_info().unwrap().experience, 150);
        assert_eq!(db.last_reset_date().unwrap(), None);
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(
            db.reset_completed_tasks_once(day, Local::now()).unwrap(),
            Some(0)
        );
        assert_eq!(db.last_reset_date().unwrap(), Some(day));
    }

    #[test]
    fn test_update_task_changes_reward() {
        let (db, _dir) = create_test_db();
        let id = db.insert_task(&task_draft("t", today()), 20).unwrap();

        let mut draft = task_draft("t2", today());
        draft.priority = Priority::High;
        assert!(db.update_task(id, &draft, 30).unwrap());

        let task = db.get_task(id).unwrap().unwrap();
        assert_eq!(task.title, "t2");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.experience_reward, 30);

        assert!(db.delete_task(id).unwrap());
        assert!(db.get_task(id).unwrap().is_none());
    }

    // ==================== Stats Tests ====================

    #[test]
    fn test_goal_and_task_stats() {
        let (db, _dir) = create_test_db();
        let calc = LevelCalculator::default();
        let g1 = db
            .insert_goal(&goal_draft("a", GoalType::Monthly, Priority::Low))
            .unwrap();
        db.insert_goal(&goal_draft("b", GoalType::Monthly, Priority::Low))
            .unwrap();
        db.insert_goal(&goal_draft("c", GoalType::Yearly, Priority::Low))
            .unwrap();
        db.update_goal_status(g1, GoalStatus::Completed, 100, &calc)
            .unwrap();

        let stats = db.goal_stats().unwrap();
        let monthly = stats
            .iter()
            .find(|s| s.goal_type == GoalType::Monthly)
            .expect("monthly stats");
        assert_eq!(monthly.total, 2);
        assert_eq!(monthly.completed, 1);
        assert_eq!(monthly.in_progress, 1);

        let today = today();
        let t = db.insert_task(&task_draft("t", today), 10).unwrap();
        db.insert_task(&task_draft("u", today), 10).unwrap();
        db.update_task_status(t, TaskStatus::Completed, &calc)
            .unwrap();

        let task_stats = db.task_stats(today).unwrap();
        assert_eq!(task_stats.total, 2);
        assert_eq!(task_stats.completed, 1);
        assert_eq!(task_stats.incomplete, 1);

        let empty = db.task_stats(today - Duration::days(10)).unwrap();
        assert_eq!(empty.total, 0);
    }

    #[test]
    fn test_recreate_wipes_data() {
        let (db, _dir) = create_test_db();
        let calc = LevelCalculator::default();
        db.insert_goal(&goal_draft("a", GoalType::Monthly, Priority::Low))
            .unwrap();
        db.add_experience(500, &calc).unwrap();

        db.recreate(today()).unwrap();
        assert_eq!(db.goal_count().unwrap(), 0);
        assert_eq!(db.basic_info().unwrap().experience, 0);
    }
}
