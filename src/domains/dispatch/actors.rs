use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::auctioneer::Evaluator;
use super::dispatcher::{Dispatcher, StatusCallback};
use crate::common::{DispatchResult, SharedClock};
use crate::domains::messages::{BidProposal, DispatchAck};
use crate::domains::tasks::{TaskDescription, TaskState, TaskStatus};

pub enum DispatcherCommand {
    Submit {
        description: TaskDescription,
        reply: oneshot::Sender<String>,
    },
    Cancel {
        task_id: String,
        reply: oneshot::Sender<DispatchResult<()>>,
    },
    GetTaskState {
        task_id: String,
        reply: oneshot::Sender<Option<TaskState>>,
    },
    TaskList {
        reply: oneshot::Sender<(Vec<TaskStatus>, Vec<TaskStatus>)>,
    },
    OnChange(StatusCallback),
    SelectEvaluator(Arc<dyn Evaluator>),
    BidProposal(BidProposal),
    DispatchAck(DispatchAck),
    TaskSummary(TaskStatus),
}

/// Single-threaded worker that owns the Dispatcher. Besides draining the
/// command channel it watches the open auction's deadline and the periodic
/// ongoing-tasks publication.
pub struct DispatcherActor {
    dispatcher: Dispatcher,
    clock: SharedClock,
    publish_period: Duration,
    receiver: mpsc::UnboundedReceiver<DispatcherCommand>,
}

impl DispatcherActor {
    pub fn spawn(
        dispatcher: Dispatcher,
        clock: SharedClock,
        publish_period: Duration,
    ) -> DispatcherHandle {
        let (sender, receiver) = mpsc::unbounded_channel();
        let actor = Self { dispatcher, clock, publish_period, receiver };
        tokio::spawn(actor.run());
        DispatcherHandle { sender }
    }

    async fn run(mut self) {
        let mut publish_interval = tokio::time::interval(self.publish_period);
        publish_interval
            .set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        publish_interval.tick().await;

        loop {
            let sleep_for = self.dispatcher.auction_deadline().map(|deadline| {
                (deadline - self.clock.now()).to_std().unwrap_or(Duration::ZERO)
            });
            let auction_timer = async move {
                match sleep_for {
                    Some(remaining) => tokio::time::sleep(remaining).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                maybe_command = self.receiver.recv() => match maybe_command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                _ = auction_timer => {
                    self.dispatcher.close_auction_if_elapsed().await;
                }
                _ = publish_interval.tick() => {
                    self.dispatcher.publish_ongoing_tasks().await;
                }
            }
        }
    }

    async fn handle(&mut self, command: DispatcherCommand) {
        match command {
            DispatcherCommand::Submit { description, reply } => {
                let task_id = self.dispatcher.submit_task(description).await;
                let _ = reply.send(task_id);
            }
            DispatcherCommand::Cancel { task_id, reply } => {
                let result = self.dispatcher.cancel_task(&task_id).await;
                let _ = reply.send(result);
            }
            DispatcherCommand::GetTaskState { task_id, reply } => {
                let _ = reply.send(self.dispatcher.get_task_state(&task_id));
            }
            DispatcherCommand::TaskList { reply } => {
                let active =
                    self.dispatcher.active_tasks().values().cloned().collect();
                let terminated = self
                    .dispatcher
                    .terminated_tasks()
                    .values()
                    .cloned()
                    .collect();
                let _ = reply.send((active, terminated));
            }
            DispatcherCommand::OnChange(on_change_fn) => {
                self.dispatcher.on_change(on_change_fn);
            }
            DispatcherCommand::SelectEvaluator(evaluator) => {
                self.dispatcher.auctioneer_mut().select_evaluator(evaluator);
            }
            DispatcherCommand::BidProposal(proposal) => {
                self.dispatcher.receive_proposal(proposal);
            }
            DispatcherCommand::DispatchAck(ack) => {
                self.dispatcher.handle_dispatch_ack(ack).await;
            }
            DispatcherCommand::TaskSummary(status) => {
                self.dispatcher.task_status_update(status).await;
            }
        }
    }
}

/// Cloneable facade over the dispatcher worker's command channel.
#[derive(Clone)]
pub struct DispatcherHandle {
    sender: mpsc::UnboundedSender<DispatcherCommand>,
}

impl DispatcherHandle {
    pub fn sender(&self) -> mpsc::UnboundedSender<DispatcherCommand> {
        self.sender.clone()
    }

    pub async fn submit_task(
        &self,
        description: TaskDescription,
    ) -> Option<String> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(DispatcherCommand::Submit { description, reply })
            .ok()?;
        response.await.ok()
    }

    pub async fn cancel_task(&self, task_id: impl Into<String>) -> bool {
        let (reply, response) = oneshot::channel();
        if self
            .sender
            .send(DispatcherCommand::Cancel { task_id: task_id.into(), reply })
            .is_err()
        {
            return false;
        }
        matches!(response.await, Ok(Ok(())))
    }

    pub async fn get_task_state(
        &self,
        task_id: impl Into<String>,
    ) -> Option<TaskState> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(DispatcherCommand::GetTaskState {
                task_id: task_id.into(),
                reply,
            })
            .ok()?;
        response.await.ok().flatten()
    }

    pub async fn task_list(&self) -> (Vec<TaskStatus>, Vec<TaskStatus>) {
        let (reply, response) = oneshot::channel();
        if self.sender.send(DispatcherCommand::TaskList { reply }).is_err() {
            return (Vec::new(), Vec::new());
        }
        response.await.unwrap_or_default()
    }

    pub fn on_change(&self, on_change_fn: StatusCallback) {
        let _ = self.sender.send(DispatcherCommand::OnChange(on_change_fn));
    }

    pub fn select_evaluator(&self, evaluator: Arc<dyn Evaluator>) {
        let _ = self.sender.send(DispatcherCommand::SelectEvaluator(evaluator));
    }
}
