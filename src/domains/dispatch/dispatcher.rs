use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::auctioneer::{Auctioneer, Submission};
use super::ports::MessageBus;
use crate::common::{DispatchError, DispatchResult, SharedClock, TaskIdGenerator};
use crate::config::DispatcherConfig;
use crate::domains::messages::{
    ActiveTasksMsg, BidNotice, BidProposal, DispatchAck, DispatchMethod,
    DispatchRequest,
};
use crate::domains::tasks::{TaskDescription, TaskProfile, TaskState, TaskStatus};

pub type StatusCallback = Arc<dyn Fn(&TaskStatus) + Send + Sync>;

/// Owns the global task registry and orchestrates bidding. One instance
/// per deployment; all methods run on the dispatcher's worker.
pub struct Dispatcher {
    clock: SharedClock,
    bus: Arc<dyn MessageBus>,
    auctioneer: Auctioneer,
    config: DispatcherConfig,
    active_dispatch_tasks: HashMap<String, TaskStatus>,
    terminal_dispatch_tasks: HashMap<String, TaskStatus>,
    /// Ongoing task ids that came from user submissions, as opposed to
    /// tasks the fleets generated for themselves.
    user_submitted_tasks: HashSet<String>,
    queue_bidding_tasks: VecDeque<BidNotice>,
    id_generator: TaskIdGenerator,
    on_change_fn: Option<StatusCallback>,
}

impl Dispatcher {
    pub fn new(
        config: DispatcherConfig,
        clock: SharedClock,
        bus: Arc<dyn MessageBus>,
        auctioneer: Auctioneer,
    ) -> Self {
        Self {
            clock,
            bus,
            auctioneer,
            config,
            active_dispatch_tasks: HashMap::new(),
            terminal_dispatch_tasks: HashMap::new(),
            user_submitted_tasks: HashSet::new(),
            queue_bidding_tasks: VecDeque::new(),
            id_generator: TaskIdGenerator::new(),
            on_change_fn: None,
        }
    }

    pub fn on_change(&mut self, on_change_fn: StatusCallback) {
        self.on_change_fn = Some(on_change_fn);
    }

    pub fn auctioneer_mut(&mut self) -> &mut Auctioneer {
        &mut self.auctioneer
    }

    pub fn active_tasks(&self) -> &HashMap<String, TaskStatus> {
        &self.active_dispatch_tasks
    }

    pub fn terminated_tasks(&self) -> &HashMap<String, TaskStatus> {
        &self.terminal_dispatch_tasks
    }

    pub fn get_task_state(&self, task_id: &str) -> Option<TaskState> {
        self.active_dispatch_tasks
            .get(task_id)
            .or_else(|| self.terminal_dispatch_tasks.get(task_id))
            .map(|status| status.state)
    }

    pub fn auction_deadline(&self) -> Option<DateTime<Utc>> {
        self.auctioneer.deadline()
    }

    /// Registers the submission, assigns it a task id, and enqueues it for
    /// bidding. Auctions run one at a time in submission order, so bidding
    /// starts immediately only when the queue was empty.
    pub async fn submit_task(&mut self, description: TaskDescription) -> String {
        let task_id =
            self.id_generator.next_id(description.task_type().name());
        info!(%task_id, "received task submission");

        let profile = TaskProfile {
            task_id: task_id.clone(),
            submission_time: self.clock.now(),
            description,
        };
        let status = TaskStatus::pending(profile.clone());
        self.active_dispatch_tasks.insert(task_id.clone(), status.clone());
        self.user_submitted_tasks.insert(task_id.clone());
        self.notify_change(&status);

        let notice = BidNotice {
            task_profile: profile,
            time_window: Duration::from_secs_f64(
                self.config.bidding_time_window,
            ),
        };
        self.queue_bidding_tasks.push_back(notice);
        if self.queue_bidding_tasks.len() == 1 {
            let front = self.queue_bidding_tasks[0].clone();
            self.auctioneer.start_bidding(front).await;
        }

        task_id
    }

    /// Cancels a task. Pending tasks terminate locally; queued tasks are
    /// forwarded to their fleet, which re-plans around them. Executing
    /// tasks cannot be cancelled.
    pub async fn cancel_task(&mut self, task_id: &str) -> DispatchResult<()> {
        let Some(status) = self.active_dispatch_tasks.get(task_id).cloned()
        else {
            return match self.terminal_dispatch_tasks.get(task_id) {
                // Cancelling a task that already terminated as Canceled is
                // a success with no state change.
                Some(terminal) if terminal.state == TaskState::Canceled => {
                    Ok(())
                }
                Some(terminal) => Err(DispatchError::AlreadyTerminal {
                    task_id: task_id.to_string(),
                    state: terminal.state.name().to_string(),
                }),
                None => {
                    error!(task_id, "task is not known to the dispatcher");
                    Err(DispatchError::NotFound {
                        task_id: task_id.to_string(),
                    })
                }
            };
        };

        warn!(task_id, "cancelling task");

        if status.state == TaskState::Pending {
            let mut cancelled = status;
            cancelled.advance(TaskState::Canceled);
            self.terminate_task(cancelled.clone()).await;
            self.notify_change(&cancelled);
            return Ok(());
        }

        if !self.user_submitted_tasks.contains(task_id) {
            error!(task_id, "only user submitted tasks are cancellable");
            return Err(DispatchError::NotUserSubmitted {
                task_id: task_id.to_string(),
            });
        }

        if status.state != TaskState::Queued {
            error!(
                task_id,
                state = status.state.name(),
                "only queued tasks may be cancelled"
            );
            return Err(DispatchError::CancelOfActiveTask {
                task_id: task_id.to_string(),
            });
        }

        // Drop this fleet's self-generated tasks now so they do not turn
        // into duplicates once the fleet re-plans.
        self.reclaim_self_generated(status.fleet_name.as_deref()).await;

        let request = DispatchRequest {
            fleet_name: status.fleet_name.clone().unwrap_or_default(),
            task_profile: status.task_profile.clone(),
            method: DispatchMethod::Cancel,
        };
        self.bus.publish_dispatch_request(&request).await?;
        Ok(())
    }

    /// Outcome of the auction for `task_id`. Either awards the task to the
    /// winning fleet or fails it, then moves on to the next queued auction.
    pub async fn receive_bidding_winner(
        &mut self,
        task_id: &str,
        winner: Option<Submission>,
    ) {
        if !self.active_dispatch_tasks.contains_key(task_id) {
            // The task was cancelled while its auction ran. Still advance
            // the queue so later auctions are not wedged behind it.
            warn!(task_id, "bidding resolved for a task no longer tracked");
            self.advance_bidding_queue().await;
            return;
        }

        let Some(winner) = winner else {
            warn!(
                task_id,
                "no submissions during bidding window, task failed"
            );
            if let Some(status) = self.active_dispatch_tasks.get_mut(task_id) {
                status.advance(TaskState::Failed);
                let failed = status.clone();
                self.terminate_task(failed.clone()).await;
                self.notify_change(&failed);
            }
            self.advance_bidding_queue().await;
            return;
        };

        info!(
            task_id,
            fleet = %winner.fleet_name,
            robot = %winner.robot_name,
            new_cost = winner.new_cost,
            "bidding won"
        );

        let profile = match self.active_dispatch_tasks.get_mut(task_id) {
            Some(status) => {
                status.fleet_name = Some(winner.fleet_name.clone());
                status.task_profile.clone()
            }
            None => {
                self.advance_bidding_queue().await;
                return;
            }
        };

        // Reclaim the winning fleet's self-generated tasks before the ADD
        // is processed; the fleet re-plans them as needed.
        self.reclaim_self_generated(Some(&winner.fleet_name)).await;

        let request = DispatchRequest {
            fleet_name: winner.fleet_name.clone(),
            task_profile: profile,
            method: DispatchMethod::Add,
        };
        if let Err(err) = self.bus.publish_dispatch_request(&request).await {
            error!(task_id, %err, "failed to send dispatch request");
        }

        self.advance_bidding_queue().await;
    }

    /// Fires when an auction window elapses.
    pub async fn close_auction_if_elapsed(&mut self) {
        if let Some((task_id, winner)) = self.auctioneer.close_if_elapsed() {
            self.receive_bidding_winner(&task_id, winner).await;
        }
    }

    pub fn receive_proposal(&mut self, proposal: BidProposal) {
        self.auctioneer.receive_proposal(proposal);
    }

    /// Ack bookkeeping: a failed ADD fails the task; a successful CANCEL
    /// finishes the cancellation the fleet just re-planned.
    pub async fn handle_dispatch_ack(&mut self, ack: DispatchAck) {
        let task_id = ack.dispatch_request.task_id().to_string();
        match ack.dispatch_request.method {
            DispatchMethod::Add if !ack.success => {
                warn!(%task_id, "fleet rejected the dispatched task");
                if let Some(status) =
                    self.active_dispatch_tasks.get_mut(&task_id)
                {
                    status.advance(TaskState::Failed);
                    let failed = status.clone();
                    self.terminate_task(failed.clone()).await;
                    self.notify_change(&failed);
                }
            }
            DispatchMethod::Cancel if ack.success => {
                if let Some(status) =
                    self.active_dispatch_tasks.get_mut(&task_id)
                {
                    status.advance(TaskState::Canceled);
                    let cancelled = status.clone();
                    self.terminate_task(cancelled.clone()).await;
                    self.notify_change(&cancelled);
                }
            }
            DispatchMethod::Cancel => {
                warn!(%task_id, "fleet refused to cancel the task");
            }
            _ => {}
        }
    }

    /// Status ingress from the fleet adapters. Unknown task ids are
    /// adopted as stray tasks so self-generated work becomes visible.
    pub async fn task_status_update(&mut self, status: TaskStatus) {
        let task_id = status.task_id().to_string();

        if !self.active_dispatch_tasks.contains_key(&task_id)
            && !self.terminal_dispatch_tasks.contains_key(&task_id)
        {
            warn!(%task_id, "adopting previously unheard task");
            self.active_dispatch_tasks.insert(task_id.clone(), status.clone());
            self.notify_change(&status);
            return;
        }

        if let Some(existing) = self.active_dispatch_tasks.get_mut(&task_id) {
            if !existing.state.can_transition_to(status.state) {
                warn!(
                    %task_id,
                    from = existing.state.name(),
                    to = status.state.name(),
                    "ignoring illegal task state transition"
                );
                return;
            }
            existing.state = status.state;
            if status.fleet_name.is_some() {
                existing.fleet_name = status.fleet_name.clone();
            }
            let merged = existing.clone();
            if merged.is_terminated() {
                self.terminate_task(merged.clone()).await;
            }
            self.notify_change(&merged);
        }
        // Updates for already-terminated tasks are dropped.
    }

    /// Broadcasts the full active set on the ongoing-tasks topic.
    pub async fn publish_ongoing_tasks(&self) {
        let mut tasks: Vec<TaskStatus> =
            self.active_dispatch_tasks.values().cloned().collect();
        tasks.sort_by(|a, b| a.task_id().cmp(b.task_id()));
        let msg = ActiveTasksMsg { tasks };
        if let Err(err) = self.bus.publish_active_tasks(&msg).await {
            error!(%err, "failed to publish ongoing tasks");
        }
    }

    async fn advance_bidding_queue(&mut self) {
        self.queue_bidding_tasks.pop_front();
        if let Some(front) = self.queue_bidding_tasks.front().cloned() {
            self.auctioneer.start_bidding(front).await;
        }
    }

    /// Locally terminates, as Canceled, every non-user task attributed to
    /// `fleet_name`. Coarse by design: the fleet regenerates whatever
    /// automatic tasks it still needs after re-planning.
    async fn reclaim_self_generated(&mut self, fleet_name: Option<&str>) {
        let to_reclaim: Vec<String> = self
            .active_dispatch_tasks
            .values()
            .filter(|status| {
                status.fleet_name.as_deref() == fleet_name
                    && !self.user_submitted_tasks.contains(status.task_id())
            })
            .map(|status| status.task_id().to_string())
            .collect();

        for task_id in to_reclaim {
            let Some(status) = self.active_dispatch_tasks.get_mut(&task_id)
            else {
                continue;
            };
            if !status.advance(TaskState::Canceled) {
                warn!(
                    %task_id,
                    state = status.state.name(),
                    "cannot reclaim self-generated task in this state"
                );
                continue;
            }
            let cancelled = status.clone();
            info!(%task_id, "reclaimed self-generated task");
            self.terminate_task(cancelled.clone()).await;
            self.notify_change(&cancelled);
        }
    }

    /// Moves a terminal task into the bounded terminated set, evicting the
    /// earliest-submitted entry when the bound is reached.
    async fn terminate_task(&mut self, status: TaskStatus) {
        debug_assert!(status.is_terminated());
        self.publish_ongoing_tasks().await;

        if self.terminal_dispatch_tasks.len()
            >= self.config.terminated_tasks_max_size
        {
            warn!("terminated tasks reached max size, evicting earliest");
            let earliest = self
                .terminal_dispatch_tasks
                .values()
                .min_by_key(|s| s.task_profile.submission_time)
                .map(|s| s.task_id().to_string());
            if let Some(task_id) = earliest {
                self.terminal_dispatch_tasks.remove(&task_id);
            }
        }

        let task_id = status.task_id().to_string();
        self.terminal_dispatch_tasks.insert(task_id.clone(), status);
        self.user_submitted_tasks.remove(&task_id);
        self.active_dispatch_tasks.remove(&task_id);
    }

    fn notify_change(&self, status: &TaskStatus) {
        if let Some(on_change_fn) = &self.on_change_fn {
            on_change_fn(status);
        }
    }
}
