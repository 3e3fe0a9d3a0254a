use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::description::TaskDescription;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskProfile {
    pub task_id: String,
    pub submission_time: DateTime<Utc>,
    pub description: TaskDescription,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Pending,
    Queued,
    Active,
    Completed,
    Failed,
    Canceled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Canceled
        )
    }

    /// Permitted transition DAG. A same-state update is a harmless no-op.
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        if *self == next {
            return true;
        }
        match self {
            TaskState::Pending => matches!(
                next,
                TaskState::Queued | TaskState::Canceled | TaskState::Failed
            ),
            TaskState::Queued => matches!(
                next,
                TaskState::Active | TaskState::Canceled | TaskState::Failed
            ),
            TaskState::Active => {
                matches!(next, TaskState::Completed | TaskState::Failed)
            }
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskState::Pending => "Pending",
            TaskState::Queued => "Queued",
            TaskState::Active => "Active",
            TaskState::Completed => "Completed",
            TaskState::Failed => "Failed",
            TaskState::Canceled => "Canceled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_profile: TaskProfile,
    pub state: TaskState,
    /// Set once a bid is won.
    pub fleet_name: Option<String>,
}

impl TaskStatus {
    pub fn pending(task_profile: TaskProfile) -> Self {
        Self {
            task_profile,
            state: TaskState::Pending,
            fleet_name: None,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_profile.task_id
    }

    pub fn is_terminated(&self) -> bool {
        self.state.is_terminal()
    }

    /// Moves to `next` if the DAG permits it. Returns false (state
    /// untouched) otherwise.
    pub fn advance(&mut self, next: TaskState) -> bool {
        if self.state.can_transition_to(next) {
            self.state = next;
            true
        } else {
            false
        }
    }
}
