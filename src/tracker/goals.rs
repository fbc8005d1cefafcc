//! Goal operations.

use crate::events::DataEvent;
use crate::storage::{Goal, GoalDraft, GoalStatus, GoalType, StatusChange};

use super::{require_text, Tracker, TrackerError, TrackerResult};

const KIND: &str = "goal";

impl Tracker {
    pub fn add_goal(&self, draft: GoalDraft) -> TrackerResult<Goal> {
        let draft = normalize(draft)?;
        let id = self.db.insert_goal(&draft)?;
        tracing::info!("Added goal {}: {}", id, draft.title);
        self.notifier.publish(DataEvent::GoalAdded);
        self.get_goal(id)
    }

    pub fn get_goal(&self, id: i64) -> TrackerResult<Goal> {
        self.db
            .get_goal(id)?
            .ok_or(TrackerError::NotFound { kind: KIND, id })
    }

    pub fn list_goals(
        &self,
        goal_type: Option<GoalType>,
        include_completed: bool,
    ) -> TrackerResult<Vec<Goal>> {
        Ok(self.db.list_goals(goal_type, include_completed)?)
    }

    /// Replaces the editable fields. Status and rewards are untouched.
    pub fn edit_goal(&self, id: i64, draft: GoalDraft) -> TrackerResult<Goal> {
        let draft = normalize(draft)?;
        if !self.db.update_goal(id, &draft)? {
            return Err(TrackerError::NotFound { kind: KIND, id });
        }
        self.notifier.publish(DataEvent::GoalEdited);
        self.get_goal(id)
    }

    /// Moves a goal to `status`, granting the priority reward when it
    /// becomes completed. Publishes only if the status actually changed.
    pub fn set_goal_status(
        &self,
        id: i64,
        status: GoalStatus,
    ) -> TrackerResult<StatusChange<GoalStatus>> {
        let goal = self.get_goal(id)?;
        let reward = self.config.goal_rewards.for_priority(goal.priority);

        let change = self
            .db
            .update_goal_status(id, status, reward, &self.calc)?
            .ok_or(TrackerError::NotFound { kind: KIND, id })?;

        if change.changed() {
            tracing::info!(
                "Goal {} {} -> {} (+{} exp)",
                id,
                change.previous,
                change.current,
                change.experience_awarded
            );
            self.notifier.publish(DataEvent::GoalChanged);
        } else {
            tracing::debug!("Goal {} already {}", id, status);
        }
        Ok(change)
    }

    pub fn complete_goal(&self, id: i64) -> TrackerResult<StatusChange<GoalStatus>> {
        self.set_goal_status(id, GoalStatus::Completed)
    }

    pub fn delete_goal(&self, id: i64) -> TrackerResult<()> {
        if !self.db.delete_goal(id)? {
            return Err(TrackerError::NotFound { kind: KIND, id });
        }
        tracing::info!("Deleted goal {}", id);
        self.notifier.publish(DataEvent::GoalDeleted);
        Ok(())
    }
}

fn normalize(draft: GoalDraft) -> TrackerResult<GoalDraft> {
    Ok(GoalDraft {
        title: require_text(&draft.title, "Goal title")?,
        description: draft.description.trim().to_string(),
        ..draft
    })
}
