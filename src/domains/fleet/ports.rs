use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::nav::PlannerConfig;
use super::request::RequestRef;
use crate::common::TaskPlannerError;

/// Navigation planner capability. Implementations are immutable snapshots;
/// reconfiguration goes through `rebuild`, which returns a fresh snapshot
/// to be swapped in atomically.
pub trait Planner: Send + Sync {
    fn configuration(&self) -> &PlannerConfig;

    /// Optimistic cost of travelling from `start` to the goal waypoint, or
    /// None when the goal is unreachable.
    fn ideal_cost(&self, start: &PlannerStart, goal: usize) -> Option<f64>;

    fn rebuild(&self, config: PlannerConfig) -> Arc<dyn Planner>;
}

pub type SharedPlanner = Arc<dyn Planner>;

/// Where a robot begins planning from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannerStart {
    pub waypoint: usize,
    pub orientation: f64,
}

/// Robot state handed to the task planner: where (and when) the robot is
/// expected to be free, and with how much charge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotState {
    pub waypoint: usize,
    pub charger_waypoint: usize,
    /// State of charge in [0, 1].
    pub battery_soc: f64,
    pub finish_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinishState {
    pub finish_time: DateTime<Utc>,
    pub battery_soc: f64,
    pub waypoint: usize,
}

/// One scheduled task for one robot.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub request: RequestRef,
    pub deployment_time: DateTime<Utc>,
    pub finish_state: FinishState,
}

/// Ordered task sequence for a single robot.
pub type AssignmentBlock = Vec<Assignment>;

/// One block per robot, indexed by robot position. Whenever installed,
/// the length must equal the number of task managers.
pub type Assignments = Vec<AssignmentBlock>;

/// Opaque combinatorial assigner. Produces per-robot ordered assignments
/// for the full pending set, inserting automatic charging tasks as it
/// sees fit.
pub trait TaskPlanner: Send + Sync {
    fn plan(
        &self,
        now: DateTime<Utc>,
        states: Vec<RobotState>,
        pending: Vec<RequestRef>,
    ) -> Result<Assignments, TaskPlannerError>;

    fn compute_cost(&self, assignments: &Assignments) -> f64;
}

/// Battery pack description used to parameterize the task planner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatterySystem {
    pub nominal_voltage: f64,
    /// Capacity in ampere-hours.
    pub capacity: f64,
    pub charging_current: f64,
}

impl BatterySystem {
    pub fn capacity_wh(&self) -> f64 {
        self.nominal_voltage * self.capacity
    }
}

/// Energy drain model capability (motion, ambient electronics, tools).
pub trait PowerSink: Send + Sync {
    /// Nominal draw in watts.
    fn nominal_power(&self) -> f64;
}

/// Mints the request a robot should perform once its queue runs dry, e.g.
/// returning to a charger or a parking spot.
pub trait FinishingRequestFactory: Send + Sync {
    fn make(&self, state: &RobotState, now: DateTime<Utc>) -> RequestRef;
}

/// Parameters accepted by `FleetAdapter::set_task_planner_params`.
#[derive(Clone)]
pub struct TaskPlannerParams {
    pub battery_system: Option<BatterySystem>,
    pub motion_sink: Option<Arc<dyn PowerSink>>,
    pub ambient_sink: Option<Arc<dyn PowerSink>>,
    pub tool_sink: Option<Arc<dyn PowerSink>>,
    pub recharge_threshold: f64,
    pub recharge_soc: f64,
    pub account_for_battery_drain: bool,
    pub finishing_request: Option<Arc<dyn FinishingRequestFactory>>,
}

impl TaskPlannerParams {
    /// All battery components present and both SOC bounds within [0, 1].
    pub fn is_valid(&self) -> bool {
        self.battery_system.is_some()
            && self.motion_sink.is_some()
            && self.ambient_sink.is_some()
            && self.tool_sink.is_some()
            && (0.0..=1.0).contains(&self.recharge_threshold)
            && (0.0..=1.0).contains(&self.recharge_soc)
    }
}

/// Fully validated task-planner configuration handed to the factory.
#[derive(Clone)]
pub struct TaskPlannerConfig {
    pub planner: SharedPlanner,
    pub battery_system: BatterySystem,
    pub motion_sink: Arc<dyn PowerSink>,
    pub ambient_sink: Arc<dyn PowerSink>,
    pub tool_sink: Arc<dyn PowerSink>,
    pub recharge_threshold: f64,
    pub recharge_soc: f64,
    pub account_for_battery_drain: bool,
    pub finishing_request: Option<Arc<dyn FinishingRequestFactory>>,
}

/// Builds concrete task planners from validated configurations. Injected
/// so the fleet core never depends on a particular planning strategy.
pub trait TaskPlannerFactory: Send + Sync {
    fn make(&self, config: TaskPlannerConfig) -> Arc<dyn TaskPlanner>;
}

pub type ParticipantId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantDescription {
    pub name: String,
    pub owner: String,
    pub responsive: bool,
    pub footprint_radius: f64,
}

/// Traffic-schedule registry capability. Registration is asynchronous; the
/// continuation runs back on the fleet worker.
#[async_trait]
pub trait ScheduleWriter: Send + Sync {
    async fn make_participant(
        &self,
        description: ParticipantDescription,
    ) -> Result<ParticipantId, String>;
}
