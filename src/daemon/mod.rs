//! Foreground mode: the daily reset scheduler plus change logging.
//!
//! `questlog run` keeps the process alive so the reset happens at the
//! configured hour even when no other command is being run. It provides:
//!
//! - The daily reset scheduler on its own database connection
//! - A listener that logs every published change
//! - File logging to `<data_dir>/questlog.log`
//! - Graceful shutdown on Ctrl+C

pub mod reset;

use anyhow::{Context, Result};
use chrono::Local;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::Config;
use crate::events::{DataEvent, DataListener, ListenerError, Notifier};
use crate::storage::Database;

pub use reset::{
    Clock, CycleOutcome, DailyResetScheduler, ResetStore, SchedulerHandle, SchedulerState,
    SystemClock,
};

/// Logs each event with the views it would refresh.
#[derive(Debug, Default)]
pub struct LoggingListener;

impl DataListener for LoggingListener {
    fn on_data_changed(&self, event: DataEvent) -> Result<(), ListenerError> {
        let scope = event.refresh_scope();
        tracing::info!(
            "Data changed: {} (goals: {}, tasks: {}, stats: {})",
            event,
            scope.goals,
            scope.daily_tasks,
            scope.stats
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Runs until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the scheduler task
/// fails to join.
pub async fn run_foreground(config: Config, notifier: Arc<Notifier>) -> Result<()> {
    tracing::info!("Starting questlog in the foreground...");

    let logger = Arc::new(LoggingListener);
    notifier.subscribe(&logger);

    let scheduler = if config.enable_daily_reset {
        let db_path = crate::storage::db::default_db_path()?;
        let start_date = config
            .start_date
            .unwrap_or_else(|| Local::now().date_naive());
        let db = Database::open_with_start_date(&db_path, start_date)
            .context("Failed to open database for the reset scheduler")?;
        Some(DailyResetScheduler::new(db, SystemClock, notifier.clone(), &config).spawn())
    } else {
        tracing::info!("Daily reset is disabled in config");
        None
    };

    signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    tracing::info!("Received Ctrl+C, shutting down...");

    if let Some(handle) = scheduler {
        handle.shutdown().await?;
    }
    notifier.unsubscribe(&logger);

    tracing::info!("Stopped");
    Ok(())
}

/// Sets up logging to stderr and to `log_path`.
///
/// Returns a guard that must be kept alive while the process runs. Uses
/// `try_init`, so an already installed subscriber wins.
pub fn setup_logging(log_path: &Path, verbose: bool) -> Result<WorkerGuard> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let dir = log_path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let file_appender =
        tracing_appender::rolling::never(dir, log_path.file_name().unwrap_or_default());
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let default_filter = if verbose { "questlog=debug" } else { "questlog=info" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    Ok(guard)
}
