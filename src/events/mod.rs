//! Change notification between data writers and open views.
//!
//! Writers publish a [`DataEvent`] after committing a change; every
//! subscribed [`DataListener`] is called in subscription order and decides
//! from the event which of its own views to reload.
//!
//! # Invariants
//!
//! - A listener is registered at most once, by pointer identity.
//! - One failing listener never blocks delivery to the others. A listener
//!   that errors, panics, or whose owner has been dropped is removed.
//! - The registry lock is released before callbacks run, so listeners may
//!   publish or subscribe from inside `on_data_changed`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Kinds of data change announced through the [`Notifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataEvent {
    GoalAdded,
    GoalChanged,
    GoalDeleted,
    GoalEdited,
    DailyTaskAdded,
    DailyTaskChanged,
    DailyTaskDeleted,
    DailyTaskEdited,
    DailyReset,
    SummaryAdded,
    /// Wildcard: something changed, refresh everything.
    #[default]
    DataChanged,
}

/// Which views a listener should reload for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshScope {
    pub goals: bool,
    pub daily_tasks: bool,
    pub stats: bool,
}

impl RefreshScope {
    pub const ALL: RefreshScope = RefreshScope {
        goals: true,
        daily_tasks: true,
        stats: true,
    };
}

impl DataEvent {
    pub const ALL: [DataEvent; 11] = [
        DataEvent::GoalAdded,
        DataEvent::GoalChanged,
        DataEvent::GoalDeleted,
        DataEvent::GoalEdited,
        DataEvent::DailyTaskAdded,
        DataEvent::DailyTaskChanged,
        DataEvent::DailyTaskDeleted,
        DataEvent::DailyTaskEdited,
        DataEvent::DailyReset,
        DataEvent::SummaryAdded,
        DataEvent::DataChanged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataEvent::GoalAdded => "goal_added",
            DataEvent::GoalChanged => "goal_changed",
            DataEvent::GoalDeleted => "goal_deleted",
            DataEvent::GoalEdited => "goal_edited",
            DataEvent::DailyTaskAdded => "daily_task_added",
            DataEvent::DailyTaskChanged => "daily_task_changed",
            DataEvent::DailyTaskDeleted => "daily_task_deleted",
            DataEvent::DailyTaskEdited => "daily_task_edited",
            DataEvent::DailyReset => "daily_reset",
            DataEvent::SummaryAdded => "summary_added",
            DataEvent::DataChanged => "data_changed",
        }
    }

    /// Views affected by this event. Every event touches the stats view.
    pub fn refresh_scope(&self) -> RefreshScope {
        match self {
            DataEvent::GoalAdded
            | DataEvent::GoalChanged
            | DataEvent::GoalDeleted
            | DataEvent::GoalEdited => RefreshScope {
                goals: true,
                daily_tasks: false,
                stats: true,
            },
            DataEvent::DailyTaskAdded
            | DataEvent::DailyTaskChanged
            | DataEvent::DailyTaskDeleted
            | DataEvent::DailyTaskEdited
            | DataEvent::DailyReset => RefreshScope {
                goals: false,
                daily_tasks: true,
                stats: true,
            },
            DataEvent::SummaryAdded => RefreshScope {
                goals: false,
                daily_tasks: false,
                stats: true,
            },
            DataEvent::DataChanged => RefreshScope::ALL,
        }
    }
}

impl fmt::Display for DataEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for event names outside the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type `{0}`")]
pub struct UnknownEvent(pub String);

impl FromStr for DataEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataEvent::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

/// Why a listener could not take a delivery.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// The view behind the listener has gone away.
    #[error("listener is closed")]
    Closed,

    #[error("listener failed: {0}")]
    Failed(String),
}

/// Receiver of change notifications, typically one open view.
pub trait DataListener: Send + Sync {
    fn on_data_changed(&self, event: DataEvent) -> Result<(), ListenerError>;

    /// Name used in log lines.
    fn name(&self) -> &str {
        "listener"
    }
}

/// Outcome of one [`Notifier::publish`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishReport {
    pub delivered: usize,
    pub removed: usize,
}

/// Publish/subscribe registry of [`DataListener`]s.
///
/// Holds weak handles: dropping the last `Arc` to a listener is enough to
/// stop deliveries, and the stale entry is pruned on the next publish.
#[derive(Default)]
pub struct Notifier {
    listeners: Mutex<Vec<Weak<dyn DataListener>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener`. Returns false if it was already registered.
    pub fn subscribe<L: DataListener + 'static>(&self, listener: &Arc<L>) -> bool {
        let weak = downgrade(listener);
        let mut listeners = self.lock();
        if listeners.iter().any(|existing| Weak::ptr_eq(existing, &weak)) {
            return false;
        }
        listeners.push(weak);
        true
    }

    /// Removes `listener`. Returns false if it was not registered.
    pub fn unsubscribe<L: DataListener + 'static>(&self, listener: &Arc<L>) -> bool {
        let weak = downgrade(listener);
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|existing| !Weak::ptr_eq(existing, &weak));
        listeners.len() != before
    }

    /// Delivers `event` to every listener in subscription order.
    pub fn publish(&self, event: DataEvent) -> PublishReport {
        tracing::debug!("Publishing {}", event);
        let snapshot: Vec<Weak<dyn DataListener>> = self.lock().clone();

        let mut report = PublishReport::default();
        let mut broken: Vec<Weak<dyn DataListener>> = Vec::new();

        for weak in &snapshot {
            let Some(listener) = weak.upgrade() else {
                tracing::warn!("Dropping closed listener while publishing {}", event);
                broken.push(weak.clone());
                continue;
            };

            match catch_unwind(AssertUnwindSafe(|| listener.on_data_changed(event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    tracing::warn!(
                        "Failed to notify {} of {}: {}; unsubscribing",
                        listener.name(),
                        event,
                        e
                    );
                    broken.push(weak.clone());
                }
                Err(_) => {
                    tracing::error!(
                        "{} panicked handling {}; unsubscribing",
                        listener.name(),
                        event
                    );
                    broken.push(weak.clone());
                }
            }
        }

        if !broken.is_empty() {
            let mut listeners = self.lock();
            let before = listeners.len();
            listeners.retain(|existing| !broken.iter().any(|b| Weak::ptr_eq(existing, b)));
            report.removed = before - listeners.len();
        }

        report
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Weak<dyn DataListener>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Weak handle to a concrete listener, unsized to the trait object.
fn downgrade<L: DataListener + 'static>(listener: &Arc<L>) -> Weak<dyn DataListener> {
    let weak: Weak<L> = Arc::downgrade(listener);
    weak
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.len())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingListener;
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingListener {
        calls: AtomicUsize,
    }

    impl DataListener for FailingListener {
        fn on_data_changed(&self, _event: DataEvent) -> Result<(), ListenerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ListenerError::Closed)
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct PanickingListener;

    impl DataListener for PanickingListener {
        fn on_data_changed(&self, _event: DataEvent) -> Result<(), ListenerError> {
            panic!("window destroyed");
        }
    }

    /// Appends its tag to a shared log, to observe delivery order.
    struct OrderListener {
        tag: usize,
        log: Arc<Mutex<Vec<usize>>>,
    }

    impl DataListener for OrderListener {
        fn on_data_changed(&self, _event: DataEvent) -> Result<(), ListenerError> {
            self.log.lock().unwrap().push(self.tag);
            Ok(())
        }
    }

    #[test]
    fn test_event_names_round_trip() {
        for event in DataEvent::ALL {
            assert_eq!(event.as_str().parse::<DataEvent>().unwrap(), event);
            assert_eq!(event.to_string(), event.as_str());
        }
        assert_eq!(DataEvent::default(), DataEvent::DataChanged);
    }

    #[test]
    fn test_unknown_event_name() {
        let err = "goal_exploded".parse::<DataEvent>().unwrap_err();
        assert_eq!(err, UnknownEvent("goal_exploded".to_string()));
    }

    #[test]
    fn test_refresh_scope() {
        assert_eq!(DataEvent::DataChanged.refresh_scope(), RefreshScope::ALL);

        let goal = DataEvent::GoalEdited.refresh_scope();
        assert!(goal.goals && !goal.daily_tasks);

        let reset = DataEvent::DailyReset.refresh_scope();
        assert!(reset.daily_tasks && !reset.goals);

        for event in DataEvent::ALL {
            assert!(event.refresh_scope().stats, "{event} should refresh stats");
        }
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let notifier = Notifier::new();
        let listener = Arc::new(RecordingListener::default());

        assert!(notifier.subscribe(&listener));
        assert!(!notifier.subscribe(&listener));
        assert_eq!(notifier.len(), 1);

        let report = notifier.publish(DataEvent::GoalAdded);
        assert_eq!(report.delivered, 1);
        assert_eq!(listener.events(), vec![DataEvent::GoalAdded]);
    }

    #[test]
    fn test_unsubscribe() {
        let notifier = Notifier::new();
        let listener = Arc::new(RecordingListener::default());
        let other = Arc::new(RecordingListener::default());

        assert!(!notifier.unsubscribe(&listener), "Absent listener is a no-op");
        notifier.subscribe(&listener);
        assert!(notifier.unsubscribe(&listener));
        assert!(notifier.is_empty());

        notifier.subscribe(&other);
        notifier.publish(DataEvent::DataChanged);
        assert!(listener.events().is_empty());
        assert_eq!(other.events().len(), 1);
    }

    #[test]
    fn test_identity_is_per_instance_not_per_type() {
        let notifier = Notifier::new();
        let first = Arc::new(RecordingListener::default());
        let second = Arc::new(RecordingListener::default());
        let alias = Arc::clone(&first);

        assert!(notifier.subscribe(&first));
        assert!(notifier.subscribe(&second));
        assert!(!notifier.subscribe(&alias), "Clone of a registered Arc is the same listener");
        assert_eq!(notifier.len(), 2);

        assert!(notifier.unsubscribe(&alias));
        notifier.publish(DataEvent::GoalDeleted);
        assert!(first.events().is_empty());
        assert_eq!(second.events(), vec![DataEvent::GoalDeleted]);
    }

    #[test]
    fn test_delivery_in_subscription_order() {
        let notifier = Notifier::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let listeners: Vec<_> = (0..4)
            .map(|tag| {
                Arc::new(OrderListener {
                    tag,
                    log: log.clone(),
                })
            })
            .collect();
        for listener in &listeners {
            notifier.subscribe(listener);
        }

        notifier.publish(DataEvent::DailyReset);
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_failing_listener_is_isolated_and_removed() {
        let notifier = Notifier::new();
        let first = Arc::new(RecordingListener::default());
        let second = Arc::new(FailingListener {
            calls: AtomicUsize::new(0),
        });
        let third = Arc::new(RecordingListener::default());
        notifier.subscribe(&first);
        notifier.subscribe(&second);
        notifier.subscribe(&third);

        let report = notifier.publish(DataEvent::GoalChanged);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.removed, 1);
        assert_eq!(first.events(), vec![DataEvent::GoalChanged]);
        assert_eq!(third.events(), vec![DataEvent::GoalChanged]);
        assert_eq!(notifier.len(), 2);

        notifier.publish(DataEvent::GoalDeleted);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1, "Removed listener gets nothing");
        assert_eq!(third.events().len(), 2);
    }

    #[test]
    fn test_panicking_listener_is_removed() {
        let notifier = Notifier::new();
        let panicking = Arc::new(PanickingListener);
        let after = Arc::new(RecordingListener::default());
        notifier.subscribe(&panicking);
        notifier.subscribe(&after);

        let report = notifier.publish(DataEvent::SummaryAdded);
        assert_eq!(report.removed, 1);
        assert_eq!(after.events(), vec![DataEvent::SummaryAdded]);
        assert_eq!(notifier.len(), 1);
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let notifier = Notifier::new();
        let kept = Arc::new(RecordingListener::default());
        {
            let closed = Arc::new(RecordingListener::default());
            notifier.subscribe(&closed);
        }
        notifier.subscribe(&kept);
        assert_eq!(notifier.len(), 2);

        let report = notifier.publish(DataEvent::DataChanged);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(notifier.len(), 1);
    }

    #[test]
    fn test_listener_can_publish_reentrantly() {
        struct Chained {
            notifier: Arc<Notifier>,
            seen: Mutex<Vec<DataEvent>>,
        }

        impl DataListener for Chained {
            fn on_data_changed(&self, event: DataEvent) -> Result<(), ListenerError> {
                self.seen.lock().unwrap().push(event);
                if event == DataEvent::GoalAdded {
                    self.notifier.publish(DataEvent::DataChanged);
                }
                Ok(())
            }
        }

        let notifier = Arc::new(Notifier::new());
        let chained = Arc::new(Chained {
            notifier: notifier.clone(),
            seen: Mutex::new(Vec::new()),
        });
        notifier.subscribe(&chained);

        notifier.publish(DataEvent::GoalAdded);
        assert_eq!(
            *chained.seen.lock().unwrap(),
            vec![DataEvent::GoalAdded, DataEvent::DataChanged]
        );
    }
}
