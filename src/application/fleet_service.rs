use std::sync::Arc;
use std::time::Duration;

use crate::common::{RobotJoinError, SharedClock};
use crate::domains::dispatch::MessageBus;
use crate::domains::fleet::{
    AcceptTaskFn, FleetActor, FleetAdapter, FleetHandle, NegotiationRoom,
    PlannerStart, ScheduleWriter, SharedPlanner, TaskPlannerFactory,
    TaskPlannerParams,
};

/// Operator-facing surface of one fleet adapter. Composition root for the
/// adapter core and its worker.
pub struct FleetService {
    name: String,
    handle: FleetHandle,
}

impl FleetService {
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        name: impl Into<String>,
        clock: SharedClock,
        bus: Arc<dyn MessageBus>,
        planner: SharedPlanner,
        task_planner_factory: Arc<dyn TaskPlannerFactory>,
        schedule_writer: Arc<dyn ScheduleWriter>,
        negotiation: Option<Arc<NegotiationRoom>>,
    ) -> Self {
        let name = name.into();
        let adapter = FleetAdapter::new(
            name.clone(),
            clock,
            bus,
            planner,
            task_planner_factory,
            schedule_writer,
            negotiation,
        );
        let handle = FleetActor::spawn(adapter);
        Self { name, handle }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> &FleetHandle {
        &self.handle
    }

    pub async fn add_robot(
        &self,
        robot_name: impl Into<String>,
        footprint_radius: f64,
        start: Vec<PlannerStart>,
    ) -> Result<(), RobotJoinError> {
        self.handle.add_robot(robot_name, footprint_radius, start).await
    }

    pub async fn set_task_planner_params(
        &self,
        params: TaskPlannerParams,
    ) -> bool {
        self.handle.set_task_planner_params(params).await
    }

    pub fn accept_task_requests(&self, check: AcceptTaskFn) {
        self.handle.accept_task_requests(check);
    }

    pub fn set_default_maximum_delay(&self, value: Option<Duration>) {
        self.handle.set_default_maximum_delay(value);
    }

    pub fn open_lanes(&self, lanes: Vec<usize>) {
        self.handle.open_lanes(lanes);
    }

    pub fn close_lanes(&self, lanes: Vec<usize>) {
        self.handle.close_lanes(lanes);
    }

    pub async fn begin_next_task(&self, robot: impl Into<String>) -> bool {
        self.handle.begin_next_task(robot).await
    }

    pub async fn complete_active_task(&self, robot: impl Into<String>) -> bool {
        self.handle.complete_active_task(robot).await
    }

    pub fn publish_fleet_state(&self) {
        self.handle.publish_fleet_state();
    }
}
