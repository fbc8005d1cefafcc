//! Experience to level arithmetic.
//!
//! Levels grow linearly: every `exp_per_level` points is one level, with no
//! upper bound.

use serde::Serialize;
use std::fmt;

/// Level reported for an experience total of zero.
///
/// A fresh installation starts at level 1, not level 0.
pub const LEVEL_AT_ZERO_EXPERIENCE: u64 = 1;

/// Experience needed per level in the default configuration.
pub const DEFAULT_EXP_PER_LEVEL: u64 = 100;

/// Maps experience totals to levels and progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCalculator {
    exp_per_level: u64,
}

impl Default for LevelCalculator {
    fn default() -> Self {
        Self {
            exp_per_level: DEFAULT_EXP_PER_LEVEL,
        }
    }
}

impl LevelCalculator {
    /// Creates a calculator. A zero threshold is clamped to 1.
    pub fn new(exp_per_level: u64) -> Self {
        Self {
            exp_per_level: exp_per_level.max(1),
        }
    }

    pub fn exp_per_level(&self) -> u64 {
        self.exp_per_level
    }

    /// `experience / exp_per_level`, offset so zero experience is level 1.
    pub fn level_for(&self, experience: u64) -> u64 {
        experience / self.exp_per_level + LEVEL_AT_ZERO_EXPERIENCE
    }

    /// Progress through the current level in `[0.0, 1.0)`.
    pub fn progress_fraction(&self, experience: u64) -> f64 {
        let into_level = experience % self.exp_per_level;
        (into_level as f64 / self.exp_per_level as f64).clamp(0.0, 1.0)
    }

    /// Points still needed to reach the next level. Always at least 1.
    pub fn exp_to_next_level(&self, experience: u64) -> u64 {
        self.exp_per_level - experience % self.exp_per_level
    }

    pub fn info(&self, experience: u64) -> LevelInfo {
        LevelInfo {
            level: self.level_for(experience),
            experience,
            exp_to_next: self.exp_to_next_level(experience),
            progress: self.progress_fraction(experience),
        }
    }
}

/// Snapshot of level progress for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelInfo {
    pub level: u64,
    pub experience: u64,
    pub exp_to_next: u64,
    pub progress: f64,
}

impl fmt::Display for LevelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Level {} | {}/{} exp | {:.1}%",
            self.level,
            self.experience,
            self.experience + self.exp_to_next,
            self.progress * 100.0
        )
    }
}
