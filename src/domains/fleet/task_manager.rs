use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::warn;

use super::ports::{Assignment, AssignmentBlock, PlannerStart, RobotState};
use super::robot::RobotContext;
use crate::common::SharedClock;
use crate::domains::tasks::{
    Priority, TaskDescription, TaskKind, TaskProfile, TaskState, TaskStatus,
};

struct QueuedTask {
    assignment: Assignment,
    profile: TaskProfile,
}

/// Holds one robot's ordered task queue. The queue is only ever replaced
/// wholesale by `set_queue`; tasks that have begun executing move to the
/// executed set and are immune to re-planning.
pub struct TaskManager {
    context: Arc<RobotContext>,
    clock: SharedClock,
    queue: Vec<QueuedTask>,
    active: Option<QueuedTask>,
    executed_tasks: HashSet<String>,
}

impl TaskManager {
    pub fn make(context: Arc<RobotContext>, clock: SharedClock) -> Self {
        Self {
            context,
            clock,
            queue: Vec::new(),
            active: None,
            executed_tasks: HashSet::new(),
        }
    }

    pub fn context(&self) -> &Arc<RobotContext> {
        &self.context
    }

    /// Where this robot is expected to be once everything already queued
    /// has finished.
    pub fn expected_finish_state(&self) -> RobotState {
        let charger_waypoint = self.context.charger_waypoint();
        let last = self.queue.last().or(self.active.as_ref());
        match last {
            Some(queued) => RobotState {
                waypoint: queued.assignment.finish_state.waypoint,
                charger_waypoint,
                battery_soc: queued.assignment.finish_state.battery_soc,
                finish_time: queued.assignment.finish_state.finish_time,
            },
            None => RobotState {
                waypoint: self.context.location().waypoint,
                charger_waypoint,
                battery_soc: self.context.battery_soc(),
                finish_time: self.clock.now(),
            },
        }
    }

    /// Pending (queued, not yet executing) requests, excluding automatic
    /// charging tasks; the planner re-inserts those as needed.
    pub fn requests(&self) -> Vec<super::request::RequestRef> {
        self.queue
            .iter()
            .filter(|q| !q.assignment.request.is_charge_request())
            .map(|q| q.assignment.request.clone())
            .collect()
    }

    pub fn executed_tasks(&self) -> &HashSet<String> {
        &self.executed_tasks
    }

    pub fn queued_task_ids(&self) -> Vec<String> {
        self.queue.iter().map(|q| q.assignment.request.id.clone()).collect()
    }

    /// Atomically replaces the queue. Returns the Queued statuses to
    /// broadcast for the freshly installed tasks. Profiles for requests
    /// the planner generated itself (automatic charging) are synthesized
    /// on the spot.
    pub fn set_queue(
        &mut self,
        assignments: AssignmentBlock,
        task_profiles: &HashMap<String, TaskProfile>,
    ) -> Vec<TaskStatus> {
        debug_assert!(assignments
            .iter()
            .all(|a| !self.executed_tasks.contains(&a.request.id)));

        let fleet_name = self.context.fleet_name().to_string();
        self.queue = assignments
            .into_iter()
            .map(|assignment| {
                let profile = task_profiles
                    .get(&assignment.request.id)
                    .cloned()
                    .unwrap_or_else(|| synthesize_profile(&assignment));
                QueuedTask { assignment, profile }
            })
            .collect();

        self.queue
            .iter()
            .map(|queued| TaskStatus {
                task_profile: queued.profile.clone(),
                state: TaskState::Queued,
                fleet_name: Some(fleet_name.clone()),
            })
            .collect()
    }

    /// Begins executing the task at the front of the queue. Returns the
    /// Active status to broadcast.
    pub fn begin_next_task(&mut self) -> Option<TaskStatus> {
        if self.active.is_some() {
            warn!(
                robot = self.context.name(),
                "cannot begin a task while another is executing"
            );
            return None;
        }
        if self.queue.is_empty() {
            return None;
        }
        let queued = self.queue.remove(0);
        self.executed_tasks.insert(queued.assignment.request.id.clone());
        let status = TaskStatus {
            task_profile: queued.profile.clone(),
            state: TaskState::Active,
            fleet_name: Some(self.context.fleet_name().to_string()),
        };
        self.active = Some(queued);
        Some(status)
    }

    /// Finishes the executing task, moving the robot to the task's
    /// expected finish state. Returns the Completed status to broadcast.
    pub fn complete_active_task(&mut self) -> Option<TaskStatus> {
        let finished = self.active.take()?;
        let finish = finished.assignment.finish_state;
        self.context.set_location(PlannerStart {
            waypoint: finish.waypoint,
            orientation: self.context.location().orientation,
        });
        self.context.set_battery_soc(finish.battery_soc);
        Some(TaskStatus {
            task_profile: finished.profile,
            state: TaskState::Completed,
            fleet_name: Some(self.context.fleet_name().to_string()),
        })
    }

    pub fn current_task_id(&self) -> Option<String> {
        self.active.as_ref().map(|q| q.assignment.request.id.clone())
    }
}

fn synthesize_profile(assignment: &Assignment) -> TaskProfile {
    TaskProfile {
        task_id: assignment.request.id.clone(),
        submission_time: assignment.deployment_time,
        description: TaskDescription::new(
            assignment.request.earliest_start_time,
            Priority::Low,
            TaskKind::ChargeBattery,
        ),
    }
}
