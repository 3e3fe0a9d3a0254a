use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::adapter::{AcceptTaskFn, FleetAdapter};
use super::ports::{PlannerStart, TaskPlannerParams};
use crate::common::RobotJoinError;
use crate::domains::messages::{BidNotice, DispatchRequest, DockSummary};

/// Everything the fleet's single-threaded worker knows how to do. Commands
/// are executed to completion in arrival order.
pub enum FleetCommand {
    BidNotice(BidNotice),
    DispatchRequest(DispatchRequest),
    DockSummary(DockSummary),
    AddRobot {
        name: String,
        footprint_radius: f64,
        start: Vec<PlannerStart>,
        reply: oneshot::Sender<Result<(), RobotJoinError>>,
    },
    OpenLanes(Vec<usize>),
    CloseLanes(Vec<usize>),
    SetTaskPlannerParams {
        params: TaskPlannerParams,
        reply: oneshot::Sender<bool>,
    },
    AcceptTaskRequests(AcceptTaskFn),
    SetDefaultMaximumDelay(Option<Duration>),
    BeginNextTask { robot: String, reply: oneshot::Sender<bool> },
    CompleteActiveTask { robot: String, reply: oneshot::Sender<bool> },
    PublishFleetState,
}

/// Owns a FleetAdapter and drains its command channel, giving the adapter
/// the serial execution its bookkeeping assumes.
pub struct FleetActor {
    adapter: FleetAdapter,
    receiver: mpsc::UnboundedReceiver<FleetCommand>,
}

impl FleetActor {
    pub fn spawn(adapter: FleetAdapter) -> FleetHandle {
        let (sender, receiver) = mpsc::unbounded_channel();
        let actor = Self { adapter, receiver };
        tokio::spawn(actor.run());
        FleetHandle { sender }
    }

    async fn run(mut self) {
        while let Some(command) = self.receiver.recv().await {
            self.handle(command).await;
        }
    }

    async fn handle(&mut self, command: FleetCommand) {
        match command {
            FleetCommand::BidNotice(notice) => {
                // Rejections were already logged; the auction resolves
                // elsewhere.
                let _ = self.adapter.handle_bid_notice(&notice).await;
            }
            FleetCommand::DispatchRequest(request) => {
                self.adapter.handle_dispatch_request(&request).await;
            }
            FleetCommand::DockSummary(summary) => {
                self.adapter.handle_dock_summary(&summary);
            }
            FleetCommand::AddRobot { name, footprint_radius, start, reply } => {
                let result =
                    self.adapter.add_robot(name, footprint_radius, start).await;
                let _ = reply.send(result);
            }
            FleetCommand::OpenLanes(lanes) => self.adapter.open_lanes(lanes),
            FleetCommand::CloseLanes(lanes) => self.adapter.close_lanes(lanes),
            FleetCommand::SetTaskPlannerParams { params, reply } => {
                let _ = reply.send(self.adapter.set_task_planner_params(params));
            }
            FleetCommand::AcceptTaskRequests(check) => {
                self.adapter.accept_task_requests(check);
            }
            FleetCommand::SetDefaultMaximumDelay(value) => {
                self.adapter.set_default_maximum_delay(value);
            }
            FleetCommand::BeginNextTask { robot, reply } => {
                let _ = reply.send(self.adapter.begin_next_task(&robot).await);
            }
            FleetCommand::CompleteActiveTask { robot, reply } => {
                let _ =
                    reply.send(self.adapter.complete_active_task(&robot).await);
            }
            FleetCommand::PublishFleetState => {
                self.adapter.publish_fleet_state().await;
            }
        }
    }
}

/// Cloneable facade over the fleet worker's command channel.
#[derive(Clone)]
pub struct FleetHandle {
    sender: mpsc::UnboundedSender<FleetCommand>,
}

impl FleetHandle {
    pub fn sender(&self) -> mpsc::UnboundedSender<FleetCommand> {
        self.sender.clone()
    }

    pub async fn add_robot(
        &self,
        name: impl Into<String>,
        footprint_radius: f64,
        start: Vec<PlannerStart>,
    ) -> Result<(), RobotJoinError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(FleetCommand::AddRobot {
                name: name.into(),
                footprint_radius,
                start,
                reply,
            })
            .map_err(|_| worker_stopped())?;
        response.await.map_err(|_| worker_stopped())?
    }

    pub async fn set_task_planner_params(&self, params: TaskPlannerParams) -> bool {
        let (reply, response) = oneshot::channel();
        if self
            .sender
            .send(FleetCommand::SetTaskPlannerParams { params, reply })
            .is_err()
        {
            return false;
        }
        response.await.unwrap_or(false)
    }

    pub fn accept_task_requests(&self, check: AcceptTaskFn) {
        let _ = self.sender.send(FleetCommand::AcceptTaskRequests(check));
    }

    pub fn set_default_maximum_delay(&self, value: Option<Duration>) {
        let _ = self.sender.send(FleetCommand::SetDefaultMaximumDelay(value));
    }

    pub fn open_lanes(&self, lanes: Vec<usize>) {
        let _ = self.sender.send(FleetCommand::OpenLanes(lanes));
    }

    pub fn close_lanes(&self, lanes: Vec<usize>) {
        let _ = self.sender.send(FleetCommand::CloseLanes(lanes));
    }

    pub async fn begin_next_task(&self, robot: impl Into<String>) -> bool {
        let (reply, response) = oneshot::channel();
        if self
            .sender
            .send(FleetCommand::BeginNextTask { robot: robot.into(), reply })
            .is_err()
        {
            return false;
        }
        response.await.unwrap_or(false)
    }

    pub async fn complete_active_task(&self, robot: impl Into<String>) -> bool {
        let (reply, response) = oneshot::channel();
        if self
            .sender
            .send(FleetCommand::CompleteActiveTask { robot: robot.into(), reply })
            .is_err()
        {
            return false;
        }
        response.await.unwrap_or(false)
    }

    pub fn publish_fleet_state(&self) {
        let _ = self.sender.send(FleetCommand::PublishFleetState);
    }
}

fn worker_stopped() -> RobotJoinError {
    RobotJoinError::Registration("fleet worker is no longer running".to_string())
}
