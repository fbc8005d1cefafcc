//! Daily reset of completed tasks.
//!
//! The scheduler wakes on a fixed interval. During the configured local hour
//! it flips every completed daily task back to incomplete, once per calendar
//! day, then publishes [`DataEvent::DailyReset`]. The day of the last reset is
//! recorded in the store, so a restart or a second scheduler on the same
//! database does not reset again.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Timelike};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::config::Config;
use crate::events::{DataEvent, Notifier};
use crate::storage::Database;

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Local> {
        (**self).now()
    }
}

/// Store operations needed by the scheduler.
pub trait ResetStore: Send {
    /// Reverts all completed daily tasks unless `today` was already
    /// recorded as reset. Returns how many changed, or `None` if skipped.
    fn reset_once(&self, today: NaiveDate, now: DateTime<Local>) -> Result<Option<usize>>;
}

impl ResetStore for Database {
    fn reset_once(&self, today: NaiveDate, now: DateTime<Local>) -> Result<Option<usize>> {
        self.reset_completed_tasks_once(today, now)
    }
}

/// What the scheduler is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    #[default]
    Idle,
    Checking,
    Resetting,
}

/// Result of one wake-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Outside the reset hour.
    NotDue,
    AlreadyResetToday,
    Reset { tasks_reset: usize },
}

pub struct DailyResetScheduler<S, C> {
    store: S,
    clock: C,
    notifier: Arc<Notifier>,
    reset_hour: u32,
    check_interval: Duration,
    last_reset_date: Option<NaiveDate>,
    state_tx: watch::Sender<SchedulerState>,
}

impl<S: ResetStore + 'static, C: Clock + 'static> DailyResetScheduler<S, C> {
    pub fn new(store: S, clock: C, notifier: Arc<Notifier>, config: &Config) -> Self {
        let (state_tx, _) = watch::channel(SchedulerState::Idle);
        Self {
            store,
            clock,
            notifier,
            reset_hour: config.reset_hour,
            check_interval: Duration::from_secs(config.reset_check_interval_secs.max(1)),
            last_reset_date: None,
            state_tx,
        }
    }

    pub fn with_check_interval(mut self, check_interval: Duration) -> Self {
        self.check_interval = check_interval;
        self
    }

    pub fn last_reset_date(&self) -> Option<NaiveDate> {
        self.last_reset_date
    }

    pub fn state(&self) -> SchedulerState {
        *self.state_tx.borrow()
    }

    /// One check of the clock, resetting tasks if due.
    ///
    /// On error `last_reset_date` is left alone so the next wake-up within
    /// the same hour retries.
    pub fn run_cycle(&mut self) -> Result<CycleOutcome> {
        self.state_tx.send_replace(SchedulerState::Checking);
        let result = self.check_and_reset();
        self.state_tx.send_replace(SchedulerState::Idle);
        result
    }

    fn check_and_reset(&mut self) -> Result<CycleOutcome> {
        let now = self.clock.now();
        let today = now.date_naive();

        if now.hour() != self.reset_hour {
            return Ok(CycleOutcome::NotDue);
        }
        if self.last_reset_date == Some(today) {
            return Ok(CycleOutcome::AlreadyResetToday);
        }

        self.state_tx.send_replace(SchedulerState::Resetting);
        let reset = self
            .store
            .reset_once(today, now)
            .context("Daily reset failed")?;

        self.last_reset_date = Some(today);
        let Some(tasks_reset) = reset else {
            tracing::debug!("Daily reset for {} already recorded", today);
            return Ok(CycleOutcome::AlreadyResetToday);
        };
        tracing::info!("Daily reset for {}: {} tasks reset", today, tasks_reset);
        self.notifier.publish(DataEvent::DailyReset);

        Ok(CycleOutcome::Reset { tasks_reset })
    }

    /// Starts the loop on the tokio runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let state_rx = self.state_tx.subscribe();
        let task = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle {
            shutdown_tx,
            state_rx,
            task,
        }
    }

    async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        tracing::info!(
            "Daily reset scheduled at {:02}:00, checking every {:?}",
            self.reset_hour,
            self.check_interval
        );

        let mut ticker = interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_cycle() {
                        Ok(outcome) => tracing::debug!("Reset check: {:?}", outcome),
                        Err(e) => tracing::error!("{:#}", e),
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Daily reset scheduler shutting down");
                    break;
                }
            }
        }

        self.state_tx.send_replace(SchedulerState::Idle);
    }
}

/// Control handle for a running scheduler.
pub struct SchedulerHandle {
    shutdown_tx: broadcast::Sender<()>,
    state_rx: watch::Receiver<SchedulerState>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signals the loop to stop. Does not wait for it.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }

    pub fn state(&self) -> SchedulerState {
        *self.state_rx.borrow()
    }

    /// Stops the loop and waits for it to exit.
    pub async fn shutdown(self) -> Result<()> {
        self.stop();
        self.task
            .await
            .context("Daily reset scheduler task failed")
    }
}
