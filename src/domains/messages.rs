//! Wire messages exchanged between the dispatcher and fleet adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domains::fleet::nav::Pose;
use crate::domains::tasks::{TaskProfile, TaskStatus};

/// Broadcast by the dispatcher to open an auction for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidNotice {
    pub task_profile: TaskProfile,
    /// How long proposals are accepted after the broadcast.
    pub time_window: Duration,
}

/// A fleet's offer to take on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidProposal {
    pub fleet_name: String,
    pub robot_name: String,
    pub task_profile: TaskProfile,
    /// Cost of the fleet's current assignment set.
    pub prev_cost: f64,
    /// Cost of the assignment set that accommodates the new task.
    pub new_cost: f64,
    pub finish_time: DateTime<Utc>,
}

impl BidProposal {
    pub fn task_id(&self) -> &str {
        &self.task_profile.task_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum DispatchMethod {
    Add,
    Cancel,
    /// Wire decodes of method codes this build does not understand.
    #[serde(other)]
    Unknown,
}

/// Sent by the dispatcher to the winning (or cancelling) fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub fleet_name: String,
    pub task_profile: TaskProfile,
    pub method: DispatchMethod,
}

impl DispatchRequest {
    pub fn task_id(&self) -> &str {
        &self.task_profile.task_id
    }
}

/// Fleet response to a DispatchRequest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchAck {
    pub dispatch_request: DispatchRequest,
    pub success: bool,
}

/// Docking parameters for one cleaning zone, keyed by its start waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockParam {
    pub start: String,
    pub finish: String,
    pub path: Vec<Pose>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dock {
    pub fleet_name: String,
    pub params: Vec<DockParam>,
}

/// Broadcast of docking parameters; each fleet keeps only its own entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DockSummary {
    pub docks: Vec<Dock>,
}

/// Per-robot snapshot inside a fleet-state broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotStateMsg {
    pub name: String,
    pub task_id: String,
    /// Battery level as a percentage in [0, 100].
    pub battery_percent: f64,
    pub location: Option<Pose>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetStateMsg {
    pub name: String,
    pub robots: Vec<RobotStateMsg>,
}

/// Periodic broadcast of every non-terminal task the dispatcher tracks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveTasksMsg {
    pub tasks: Vec<TaskStatus>,
}
