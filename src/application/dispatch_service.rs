use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::{DispatchError, SharedClock};
use crate::config::DispatcherConfig;
use crate::domains::dispatch::{
    Auctioneer, Dispatcher, DispatcherActor, DispatcherHandle, Evaluator,
    MessageBus,
};
use crate::domains::tasks::{TaskDescription, TaskStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTaskResponse {
    pub success: bool,
    pub task_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelTaskResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTaskListResponse {
    pub active_tasks: Vec<TaskStatus>,
    pub terminated_tasks: Vec<TaskStatus>,
    pub success: bool,
}

/// User-facing surface of the dispatcher: the SubmitTask, CancelTask and
/// GetTaskList request/response services.
pub struct DispatchService {
    handle: DispatcherHandle,
}

impl DispatchService {
    /// Builds the dispatcher with its auctioneer and spawns its worker.
    pub fn spawn(
        config: DispatcherConfig,
        clock: SharedClock,
        bus: Arc<dyn MessageBus>,
        evaluator: Arc<dyn Evaluator>,
    ) -> Self {
        let publish_period =
            Duration::from_secs(config.publish_active_tasks_period.max(1));
        let auctioneer = Auctioneer::new(clock.clone(), bus.clone(), evaluator);
        let dispatcher = Dispatcher::new(config, clock.clone(), bus, auctioneer);
        let handle = DispatcherActor::spawn(dispatcher, clock, publish_period);
        Self { handle }
    }

    pub fn handle(&self) -> &DispatcherHandle {
        &self.handle
    }

    pub async fn submit_task(
        &self,
        description: TaskDescription,
    ) -> SubmitTaskResponse {
        match self.handle.submit_task(description).await {
            Some(task_id) => SubmitTaskResponse {
                success: true,
                task_id,
                message: String::new(),
            },
            None => SubmitTaskResponse {
                success: false,
                task_id: String::new(),
                message: "dispatcher is not running".to_string(),
            },
        }
    }

    /// Wire-level submission. An unrecognized task type tag fails here,
    /// before the dispatcher is involved.
    pub async fn submit_task_json(
        &self,
        payload: serde_json::Value,
    ) -> SubmitTaskResponse {
        match serde_json::from_value::<TaskDescription>(payload) {
            Ok(description) => self.submit_task(description).await,
            Err(err) => {
                let raw = err.to_string();
                let message = match raw.split('`').nth(1) {
                    Some(tag) if raw.contains("unknown variant") => {
                        DispatchError::InvalidTaskType(tag.to_string())
                            .to_string()
                    }
                    _ => raw,
                };
                SubmitTaskResponse {
                    success: false,
                    task_id: String::new(),
                    message,
                }
            }
        }
    }

    pub async fn cancel_task(
        &self,
        task_id: impl Into<String>,
    ) -> CancelTaskResponse {
        CancelTaskResponse { success: self.handle.cancel_task(task_id).await }
    }

    pub async fn task_list(&self) -> GetTaskListResponse {
        let (active_tasks, terminated_tasks) = self.handle.task_list().await;
        GetTaskListResponse { active_tasks, terminated_tasks, success: true }
    }
}
