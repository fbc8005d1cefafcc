//! Markdown journal files, one per year, newest entry first.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes summaries into `<dir>/<year>.md`.
#[derive(Debug, Clone)]
pub struct Journal {
    dir: PathBuf,
}

impl Journal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that holds entries for `year`.
    pub fn path_for_year(&self, year: i32) -> PathBuf {
        self.dir.join(format!("{year}.md"))
    }

    /// Prepends an entry for `date` to that year's file and returns its path.
    ///
    /// Entries are the date line, the content, then blank lines separating
    /// them from the previous (older) entry.
    pub fn prepend_entry(&self, date: NaiveDate, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create journal directory {}", self.dir.display()))?;

        let path = self.path_for_year(date.year());
        let existing = self.read_path(&path)?;

        let mut entry = format!("{}\n{}\n\n\n\n", date.format("%Y-%m-%d"), content.trim_end());
        if !existing.ends_with('\n') {
            entry.push('\n');
        }
        entry.push_str(&existing);

        // Write to a temp file first, then rename for atomicity
        let temp_path = path.with_extension("md.tmp");
        fs::write(&temp_path, &entry)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        tracing::info!("Journal entry for {} written to {}", date, path.display());
        Ok(path)
    }

    /// Full contents of a year's file, empty if it does not exist.
    pub fn read_year(&self, year: i32) -> Result<String> {
        self.read_path(&self.path_for_year(year))
    }

    fn read_path(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Ok(String::new());
        }
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}
