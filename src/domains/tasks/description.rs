use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of task types understood by the dispatcher. The numeric order
/// mirrors the wire-level type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    Station,
    Loop,
    Delivery,
    ChargeBattery,
    Clean,
    Patrol,
}

impl TaskType {
    pub fn name(&self) -> &'static str {
        match self {
            TaskType::Station => "Station",
            TaskType::Loop => "Loop",
            TaskType::Delivery => "Delivery",
            TaskType::ChargeBattery => "ChargeBattery",
            TaskType::Clean => "Clean",
            TaskType::Patrol => "Patrol",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Station" => Some(TaskType::Station),
            "Loop" => Some(TaskType::Loop),
            "Delivery" => Some(TaskType::Delivery),
            "ChargeBattery" => Some(TaskType::ChargeBattery),
            "Clean" => Some(TaskType::Clean),
            "Patrol" => Some(TaskType::Patrol),
            _ => None,
        }
    }
}

/// Binary priority scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    High,
}

impl Priority {
    /// Wire encodings carry priority as an integer; any positive value is
    /// treated as high.
    pub fn from_value(value: u32) -> Self {
        if value > 0 {
            Priority::High
        } else {
            Priority::Low
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Low
    }
}

/// Per-type payload of a task description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaskKind {
    Clean {
        start_waypoint: String,
    },
    Delivery {
        pickup_place_name: String,
        pickup_dispenser: String,
        dropoff_place_name: String,
        dropoff_ingestor: String,
    },
    Loop {
        start_name: String,
        finish_name: String,
        num_loops: u32,
    },
    ChargeBattery,
    Station,
    Patrol,
}

impl TaskKind {
    pub fn task_type(&self) -> TaskType {
        match self {
            TaskKind::Clean { .. } => TaskType::Clean,
            TaskKind::Delivery { .. } => TaskType::Delivery,
            TaskKind::Loop { .. } => TaskType::Loop,
            TaskKind::ChargeBattery => TaskType::ChargeBattery,
            TaskKind::Station => TaskType::Station,
            TaskKind::Patrol => TaskType::Patrol,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescription {
    /// Earliest permissible start.
    pub start_time: DateTime<Utc>,
    pub priority: Priority,
    pub kind: TaskKind,
}

impl TaskDescription {
    pub fn new(start_time: DateTime<Utc>, priority: Priority, kind: TaskKind) -> Self {
        Self { start_time, priority, kind }
    }

    pub fn task_type(&self) -> TaskType {
        self.kind.task_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_from_value_is_binary() {
        assert_eq!(Priority::from_value(0), Priority::Low);
        assert_eq!(Priority::from_value(1), Priority::High);
        assert_eq!(Priority::from_value(42), Priority::High);
    }

    #[test]
    fn type_names_round_trip() {
        for ty in [
            TaskType::Station,
            TaskType::Loop,
            TaskType::Delivery,
            TaskType::ChargeBattery,
            TaskType::Clean,
            TaskType::Patrol,
        ] {
            assert_eq!(TaskType::from_name(ty.name()), Some(ty));
        }
        assert_eq!(TaskType::from_name("Teleport"), None);
    }
}
