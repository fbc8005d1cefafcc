//! Daily task operations.

use chrono::NaiveDate;

use crate::events::DataEvent;
use crate::storage::{DailyTask, DailyTaskDraft, StatusChange, TaskStatus};

use super::{require_text, Tracker, TrackerError, TrackerResult};

const KIND: &str = "task";

impl Tracker {
    /// Creates a task. Its reward is fixed from the priority now.
    pub fn add_task(&self, draft: DailyTaskDraft) -> TrackerResult<DailyTask> {
        let draft = normalize(draft)?;
        let reward = self.config.task_rewards.for_priority(draft.priority);
        let id = self.db.insert_task(&draft, reward)?;
        tracing::info!("Added task {} for {}: {}", id, draft.task_date, draft.title);
        self.notifier.publish(DataEvent::DailyTaskAdded);
        self.get_task(id)
    }

    pub fn get_task(&self, id: i64) -> TrackerResult<DailyTask> {
        self.db
            .get_task(id)?
            .ok_or(TrackerError::NotFound { kind: KIND, id })
    }

    pub fn list_tasks(
        &self,
        task_date: Option<NaiveDate>,
        include_completed: bool,
    ) -> TrackerResult<Vec<DailyTask>> {
        Ok(self.db.list_tasks(task_date, include_completed)?)
    }

    /// Replaces the editable fields and recomputes the reward from the new
    /// priority.
    pub fn edit_task(&self, id: i64, draft: DailyTaskDraft) -> TrackerResult<DailyTask> {
        let draft = normalize(draft)?;
        let reward = self.config.task_rewards.for_priority(draft.priority);
        if !self.db.update_task(id, &draft, reward)? {
            return Err(TrackerError::NotFound { kind: KIND, id });
        }
        self.notifier.publish(DataEvent::DailyTaskEdited);
        self.get_task(id)
    }

    /// Moves a task to `status`. Completing grants the stored reward;
    /// un-completing keeps the experience already earned.
    pub fn set_task_status(
        &self,
        id: i64,
        status: TaskStatus,
    ) -> TrackerResult<StatusChange<TaskStatus>> {
        let change = self
            .db
            .update_task_status(id, status, &self.calc)?
            .ok_or(TrackerError::NotFound { kind: KIND, id })?;

        if change.changed() {
            tracing::info!(
                "Task {} {} -> {} (+{} exp)",
                id,
                change.previous,
                change.current,
                change.experience_awarded
            );
            self.notifier.publish(DataEvent::DailyTaskChanged);
        } else {
            tracing::debug!("Task {} already {}", id, status);
        }
        Ok(change)
    }

    /// Flips a task between incomplete and completed.
    pub fn toggle_task(&self, id: i64) -> TrackerResult<StatusChange<TaskStatus>> {
        let task = self.get_task(id)?;
        let next = match task.status {
            TaskStatus::Incomplete => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Incomplete,
        };
        self.set_task_status(id, next)
    }

    pub fn delete_task(&self, id: i64) -> TrackerResult<()> {
        if !self.db.delete_task(id)? {
            return Err(TrackerError::NotFound { kind: KIND, id });
        }
        tracing::info!("Deleted task {}", id);
        self.notifier.publish(DataEvent::DailyTaskDeleted);
        Ok(())
    }
}

fn normalize(draft: DailyTaskDraft) -> TrackerResult<DailyTaskDraft> {
    Ok(DailyTaskDraft {
        title: require_text(&draft.title, "Task title")?,
        description: draft.description.trim().to_string(),
        ..draft
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::testing::RecordingListener;
    use crate::storage::Priority;
    use crate::tracker::test_support::create_test_tracker;
    use std::sync::Arc;

    fn draft(title: &str, priority: Priority) -> DailyTaskDraft {
        DailyTaskDraft {
            title: title.to_string(),
            description: String::new(),
            priority,
            task_date: NaiveDate::from_ymd_opt(2026, 4, 10).unwrap(),
        }
    }

    #[test]
    fn test_reward_fixed_from_priority() {
        let (tracker, _dir) = create_test_tracker();
        let high = tracker.add_task(draft("a", Priority::High)).unwrap();
        let medium = tracker.add_task(draft("b", Priority::Medium)).unwrap();
        let low = tracker.add_task(draft("c", Priority::Low)).unwrap();
        assert_eq!(high.experience_reward, 30);
        assert_eq!(medium.experience_reward, 20);
        assert_eq!(low.experience_reward, 10);
    }

    #[test]
    fn test_unknown_priority_gets_medium_reward() {
        let (tracker, _dir) = create_test_tracker();
        let task = tracker
            .add_task(draft("x", Priority::parse_lenient("urgent")))
            .unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.experience_reward, 20);
    }

    #[test]
    fn test_complete_awards_once_and_undo_keeps_experience() {
        let (tracker, _dir) = create_test_tracker();
        let task = tracker.add_task(draft("Stretch", Priority::High)).unwrap();
        let listener = Arc::new(RecordingListener::default());
        tracker.notifier().subscribe(&listener);

        let done = tracker.set_task_status(task.id, TaskStatus::Completed).unwrap();
        assert_eq!(done.experience_awarded, 30);
        let again = tracker.set_task_status(task.id, TaskStatus::Completed).unwrap();
        assert!(!again.changed());

        tracker
            .set_task_status(task.id, TaskStatus::Incomplete)
            .unwrap();
        assert_eq!(tracker.db().basic_info().unwrap().experience, 30);
        assert_eq!(
            listener.events(),
            vec![DataEvent::DailyTaskChanged, DataEvent::DailyTaskChanged]
        );
    }

    #[test]
    fn test_toggle_flips_status() {
        let (tracker, _dir) = create_test_tracker();
        let task = tracker.add_task(draft("Walk", Priority::Low)).unwrap();

        let change = tracker.toggle_task(task.id).unwrap();
        assert_eq!(change.current, TaskStatus::Completed);
        let change = tracker.toggle_task(task.id).unwrap();
        assert_eq!(change.current, TaskStatus::Incomplete);
        assert_eq!(tracker.db().basic_info().unwrap().experience, 10);
    }

    #[test]
    fn test_edit_recomputes_reward() {
        let (tracker, _dir) = create_test_tracker();
        let task = tracker.add_task(draft("Plan", Priority::Low)).unwrap();
        let listener = Arc::new(RecordingListener::default());
        tracker.notifier().subscribe(&listener);

        let edited = tracker.edit_task(task.id, draft("Plan", Priority::High)).unwrap();
        assert_eq!(edited.experience_reward, 30);
        assert_eq!(listener.events(), vec![DataEvent::DailyTaskEdited]);
    }

    #[test]
    fn test_blank_title_rejected() {
        let (tracker, _dir) = create_test_tracker();
        assert!(matches!(
            tracker.add_task(draft(" ", Priority::Low)),
            Err(TrackerError::Validation(_))
        ));
        assert_eq!(tracker.db().task_count().unwrap(), 0);
    }

    #[test]
    fn test_delete_missing_task() {
        let (tracker, _dir) = create_test_tracker();
        assert!(matches!(
            tracker.delete_task(7),
            Err(TrackerError::NotFound { kind: "task", id: 7 })
        ));
        assert!(matches!(
            tracker.toggle_task(7),
            Err(TrackerError::NotFound { .. })
        ));
    }

    #[test]
    fn test_list_tasks_for_day() {
        let (tracker, _dir) = create_test_tracker();
        tracker.add_task(draft("today", Priority::Low)).unwrap();
        let mut other = draft("other day", Priority::Low);
        other.task_date = NaiveDate::from_ymd_opt(2026, 4, 11).unwrap();
        tracker.add_task(other).unwrap();

        let day = NaiveDate::from_ymd_opt(2026, 4, 10).unwrap();
        let tasks = tracker.list_tasks(Some(day), true).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "today");
        assert_eq!(tracker.list_tasks(None, true).unwrap().len(), 2);
    }
}
