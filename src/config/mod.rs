//! Configuration management
//!
//! Settings live in `<data_dir>/config.yaml`. Every key is optional; missing
//! keys take the defaults below. The data directory is `~/.questlog` unless
//! `QUESTLOG_HOME` points somewhere else.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::level::{LevelCalculator, DEFAULT_EXP_PER_LEVEL};
use crate::storage::models::Priority;

/// Environment variable overriding the data directory.
pub const HOME_ENV_VAR: &str = "QUESTLOG_HOME";

const CONFIG_FILE_NAME: &str = "config.yaml";
const DB_FILE_NAME: &str = "questlog.db";
const LOG_FILE_NAME: &str = "questlog.log";
const JOURNAL_DIR_NAME: &str = "journal";

const DEFAULT_GOAL_REWARDS: RewardTable = RewardTable {
    high: 1000,
    medium: 300,
    low: 100,
};
const DEFAULT_TASK_REWARDS: RewardTable = RewardTable {
    high: 30,
    medium: 20,
    low: 10,
};

/// Errors raised while locating, reading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not find home directory")]
    NoHomeDir,

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Experience granted per priority level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewardTable {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

impl RewardTable {
    pub fn for_priority(&self, priority: Priority) -> u64 {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }
}

/// A reward table as written in the file, where any level may be omitted.
#[derive(Debug, Default, Deserialize)]
struct RewardOverrides {
    high: Option<u64>,
    medium: Option<u64>,
    low: Option<u64>,
}

impl RewardOverrides {
    fn over(self, defaults: RewardTable) -> RewardTable {
        RewardTable {
            high: self.high.unwrap_or(defaults.high),
            medium: self.medium.unwrap_or(defaults.medium),
            low: self.low.unwrap_or(defaults.low),
        }
    }
}

fn deserialize_goal_rewards<'de, D: Deserializer<'de>>(d: D) -> Result<RewardTable, D::Error> {
    RewardOverrides::deserialize(d).map(|o| o.over(DEFAULT_GOAL_REWARDS))
}

fn deserialize_task_rewards<'de, D: Deserializer<'de>>(d: D) -> Result<RewardTable, D::Error> {
    RewardOverrides::deserialize(d).map(|o| o.over(DEFAULT_TASK_REWARDS))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Experience required for each level
    pub exp_per_level: u64,

    /// Reward for completing a goal, by priority
    #[serde(deserialize_with = "deserialize_goal_rewards")]
    pub goal_rewards: RewardTable,

    /// Reward for completing a daily task, by priority (fixed at creation)
    #[serde(deserialize_with = "deserialize_task_rewards")]
    pub task_rewards: RewardTable,

    /// Reward for writing a journal summary
    pub summary_reward: u64,

    /// Local hour (0-23) at which completed daily tasks are reset
    pub reset_hour: u32,
    pub enable_daily_reset: bool,

    /// How often the reset scheduler wakes up to check the clock
    pub reset_check_interval_secs: u64,

    /// Tracking start date recorded on first run (today when unset)
    pub start_date: Option<NaiveDate>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exp_per_level: DEFAULT_EXP_PER_LEVEL,
            goal_rewards: DEFAULT_GOAL_REWARDS,
            task_rewards: DEFAULT_TASK_REWARDS,
            summary_reward: 5,
            reset_hour: 0,
            enable_daily_reset: true,
            reset_check_interval_secs: 60,
            start_date: None,
        }
    }
}

impl Config {
    /// Loads `config.yaml` from the data directory, or defaults if absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Loads configuration from an explicit path, or defaults if absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_saphyr::from_str(content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exp_per_level == 0 {
            return Err(ConfigError::Invalid(
                "exp_per_level must be greater than 0".to_string(),
            ));
        }
        if self.reset_hour > 23 {
            return Err(ConfigError::Invalid(format!(
                "reset_hour must be between 0 and 23, got {}",
                self.reset_hour
            )));
        }
        if self.reset_check_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "reset_check_interval_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn level_calculator(&self) -> LevelCalculator {
        LevelCalculator::new(self.exp_per_level)
    }

    /// Root directory for the database, config, journal and logs.
    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        if let Some(dir) = std::env::var_os(HOME_ENV_VAR).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        Ok(dirs::home_dir()
            .ok_or(ConfigError::NoHomeDir)?
            .join(".questlog"))
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::data_dir()?.join(CONFIG_FILE_NAME))
    }

    pub fn db_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::data_dir()?.join(DB_FILE_NAME))
    }

    pub fn log_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::data_dir()?.join(LOG_FILE_NAME))
    }

    pub fn journal_dir() -> Result<PathBuf, ConfigError> {
        Ok(Self::data_dir()?.join(JOURNAL_DIR_NAME))
    }
}
