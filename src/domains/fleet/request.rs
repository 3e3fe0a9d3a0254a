use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::nav::Trajectory;
use crate::domains::tasks::Priority;

/// Planner-facing form of a task, with waypoint names already resolved to
/// graph indices. Shared by reference between the bid ledger and the
/// per-robot queues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub earliest_start_time: DateTime<Utc>,
    pub priority: Priority,
    pub detail: RequestDetail,
}

pub type RequestRef = Arc<Request>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RequestDetail {
    Clean {
        start_waypoint: usize,
        finish_waypoint: usize,
        cleaning_trajectory: Trajectory,
    },
    Delivery {
        pickup_waypoint: usize,
        pickup_wait: Duration,
        dropoff_waypoint: usize,
        dropoff_wait: Duration,
    },
    Loop {
        start_waypoint: usize,
        finish_waypoint: usize,
        num_loops: u32,
    },
    ChargeBattery,
}

impl Request {
    pub fn is_charge_request(&self) -> bool {
        matches!(self.detail, RequestDetail::ChargeBattery)
    }
}
