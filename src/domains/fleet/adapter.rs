use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;

use tracing::{error, info, warn};

use super::nav::interpolate_positions;
use super::negotiation::{
    rate_limited_interrupt, LiaisonNegotiator, NegotiationRoom, Negotiator,
};
use super::ports::{
    Assignments, ParticipantDescription, PlannerStart, ScheduleWriter,
    SharedPlanner, TaskPlanner, TaskPlannerConfig, TaskPlannerFactory,
    TaskPlannerParams,
};
use super::request::{Request, RequestDetail, RequestRef};
use super::robot::RobotContext;
use super::task_manager::TaskManager;
use crate::common::{
    BidRejection, DispatchRejection, RobotJoinError, SharedClock,
    TaskPlannerError,
};
use crate::domains::dispatch::ports::MessageBus;
use crate::domains::messages::{
    BidNotice, BidProposal, DispatchAck, DispatchMethod, DispatchRequest,
    DockParam, DockSummary, FleetStateMsg, RobotStateMsg,
};
use crate::domains::tasks::{TaskKind, TaskProfile};

pub type AcceptTaskFn = Arc<dyn Fn(&TaskProfile) -> bool + Send + Sync>;

/// Core of one fleet adapter: evaluates bid notices, installs awarded
/// assignments on the per-robot task managers, and re-plans around
/// cancellations. All mutation happens on the fleet's worker, so the
/// methods here assume serial execution.
pub struct FleetAdapter {
    name: String,
    clock: SharedClock,
    bus: Arc<dyn MessageBus>,
    planner: Arc<RwLock<SharedPlanner>>,
    task_planner: Option<Arc<dyn TaskPlanner>>,
    task_planner_factory: Arc<dyn TaskPlannerFactory>,
    schedule_writer: Arc<dyn ScheduleWriter>,
    negotiation: Option<Arc<NegotiationRoom>>,
    accept_task: Option<AcceptTaskFn>,
    default_maximum_delay: Option<Duration>,
    task_managers: Vec<TaskManager>,
    dock_param_map: HashMap<String, DockParam>,
    bid_notice_assignments: HashMap<String, Assignments>,
    generated_requests: HashMap<String, RequestRef>,
    assigned_requests: HashMap<String, RequestRef>,
    cancelled_task_ids: HashSet<String>,
    task_profile_map: HashMap<String, TaskProfile>,
    current_assignment_cost: f64,
}

impl FleetAdapter {
    pub fn new(
        name: impl Into<String>,
        clock: SharedClock,
        bus: Arc<dyn MessageBus>,
        planner: SharedPlanner,
        task_planner_factory: Arc<dyn TaskPlannerFactory>,
        schedule_writer: Arc<dyn ScheduleWriter>,
        negotiation: Option<Arc<NegotiationRoom>>,
    ) -> Self {
        Self {
            name: name.into(),
            clock,
            bus,
            planner: Arc::new(RwLock::new(planner)),
            task_planner: None,
            task_planner_factory,
            schedule_writer,
            negotiation,
            accept_task: None,
            default_maximum_delay: None,
            task_managers: Vec::new(),
            dock_param_map: HashMap::new(),
            bid_notice_assignments: HashMap::new(),
            generated_requests: HashMap::new(),
            assigned_requests: HashMap::new(),
            cancelled_task_ids: HashSet::new(),
            task_profile_map: HashMap::new(),
            current_assignment_cost: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accept_task_requests(&mut self, check: AcceptTaskFn) {
        self.accept_task = Some(check);
    }

    pub fn set_default_maximum_delay(&mut self, value: Option<Duration>) {
        self.default_maximum_delay = value;
    }

    pub fn default_maximum_delay(&self) -> Option<Duration> {
        self.default_maximum_delay
    }

    pub fn planner_snapshot(&self) -> SharedPlanner {
        self.planner.read().unwrap().clone()
    }

    pub fn current_assignment_cost(&self) -> f64 {
        self.current_assignment_cost
    }

    pub fn task_managers(&self) -> &[TaskManager] {
        &self.task_managers
    }

    pub fn has_evaluated_bid(&self, task_id: &str) -> bool {
        self.bid_notice_assignments.contains_key(task_id)
    }

    pub fn dock_params(&self) -> &HashMap<String, DockParam> {
        &self.dock_param_map
    }

    /// Replaces the dock parameter map with the entry addressed to this
    /// fleet, if the summary carries one.
    pub fn handle_dock_summary(&mut self, summary: &DockSummary) {
        for dock in &summary.docks {
            if dock.fleet_name == self.name {
                self.dock_param_map.clear();
                for param in &dock.params {
                    self.dock_param_map.insert(param.start.clone(), param.clone());
                }
                break;
            }
        }
    }

    /// Evaluates a bid notice and, when every precondition holds and an
    /// allocation exists, publishes a BidProposal. Any rejection skips the
    /// proposal; the auction resolves through other fleets or times out.
    pub async fn handle_bid_notice(
        &mut self,
        notice: &BidNotice,
    ) -> Result<(), BidRejection> {
        let task_id = notice.task_profile.task_id.clone();

        if self.task_managers.is_empty() {
            info!(
                fleet = %self.name,
                %task_id, "fleet has no robots to accept this task"
            );
            return Err(BidRejection::NoRobots);
        }

        if task_id.is_empty() {
            warn!(fleet = %self.name, "bid notice carries an empty task_id");
            return Err(BidRejection::EmptyTaskId);
        }

        // Task revival is unsupported; a repeated notice is a no-op.
        if self.bid_notice_assignments.contains_key(&task_id) {
            return Err(BidRejection::DuplicateTaskId { task_id });
        }

        let accept_task = match &self.accept_task {
            Some(accept_task) => accept_task.clone(),
            None => {
                warn!(
                    fleet = %self.name,
                    "fleet is not configured to accept task requests"
                );
                return Err(BidRejection::NoAcceptCallback);
            }
        };
        if !accept_task(&notice.task_profile) {
            info!(fleet = %self.name, %task_id, "fleet declined the task");
            return Err(BidRejection::TaskDeclined);
        }

        if self.task_planner.is_none() {
            warn!(
                fleet = %self.name,
                "fleet has no task planning parameters configured"
            );
            return Err(BidRejection::NoPlannerConfigured);
        }

        let request = self.make_request(&notice.task_profile).map_err(|err| {
            warn!(fleet = %self.name, %task_id, %err, "rejecting bid notice");
            err
        })?;

        self.generated_requests.insert(task_id.clone(), request.clone());
        self.task_profile_map
            .insert(task_id.clone(), notice.task_profile.clone());

        let assignments = self
            .allocate_tasks(Some(request), None)
            .ok_or(BidRejection::NoAssignments)?;

        let cost = match &self.task_planner {
            Some(task_planner) => task_planner.compute_cost(&assignments),
            None => return Err(BidRejection::NoPlannerConfigured),
        };

        let mut proposal = BidProposal {
            fleet_name: self.name.clone(),
            robot_name: String::new(),
            task_profile: notice.task_profile.clone(),
            prev_cost: self.current_assignment_cost,
            new_cost: cost,
            finish_time: self.clock.now(),
        };
        for (index, block) in assignments.iter().enumerate() {
            if let Some(assignment) =
                block.iter().find(|a| a.request.id == task_id)
            {
                proposal.finish_time = assignment.finish_state.finish_time;
                proposal.robot_name =
                    self.task_managers[index].context().name().to_string();
                break;
            }
        }

        if let Err(err) = self.bus.publish_bid_proposal(&proposal).await {
            error!(fleet = %self.name, %task_id, %err, "failed to publish proposal");
        } else {
            info!(
                fleet = %self.name,
                %task_id,
                robot = %proposal.robot_name,
                new_cost = cost,
                "submitted bid proposal"
            );
        }

        self.bid_notice_assignments.insert(task_id, assignments);
        Ok(())
    }

    /// Processes an ADD or CANCEL addressed to this fleet, replying with a
    /// DispatchAck. Requests for other fleets and unknown methods are
    /// ignored without an ack.
    pub async fn handle_dispatch_request(
        &mut self,
        request: &DispatchRequest,
    ) -> Option<bool> {
        if request.fleet_name != self.name {
            return None;
        }

        let outcome = match request.method {
            DispatchMethod::Add => self.process_add(request).await,
            DispatchMethod::Cancel => self.process_cancel(request).await,
            DispatchMethod::Unknown => {
                warn!(
                    fleet = %self.name,
                    task_id = request.task_id(),
                    "dispatch request with unsupported method; only ADD and \
                     CANCEL are understood"
                );
                return None;
            }
        };
        let success = match outcome {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    fleet = %self.name,
                    task_id = request.task_id(),
                    %err, "refusing dispatch request"
                );
                false
            }
        };

        let ack = DispatchAck { dispatch_request: request.clone(), success };
        if let Err(err) = self.bus.publish_dispatch_ack(&ack).await {
            error!(fleet = %self.name, %err, "failed to publish dispatch ack");
        }
        Some(success)
    }

    async fn process_add(
        &mut self,
        request: &DispatchRequest,
    ) -> Result<(), DispatchRejection> {
        let task_id = request.task_id().to_string();

        let Some(stored) = self.bid_notice_assignments.get(&task_id) else {
            return Err(DispatchRejection::UnknownBid { task_id });
        };
        let mut assignments = stored.clone();

        if assignments.len() != self.task_managers.len() {
            return Err(DispatchRejection::AssignmentSizeMismatch {
                assignments: assignments.len(),
                robots: self.task_managers.len(),
            });
        }

        let Some(generated) = self.generated_requests.get(&task_id).cloned()
        else {
            return Err(DispatchRejection::MissingGeneratedRequest { task_id });
        };

        // If any referenced task has begun execution since bidding, the
        // stored assignments are stale; re-plan before installing. Planning
        // runs on this worker, so no task can start mid-replan.
        if !self.is_valid_assignments(&assignments) {
            match self.allocate_tasks(Some(generated.clone()), None) {
                Some(replanned) => {
                    assignments = replanned;
                    self.bid_notice_assignments
                        .insert(task_id.clone(), assignments.clone());
                }
                None => {
                    return Err(DispatchRejection::ReplanFailed { task_id })
                }
            }
        }

        self.install_queues(&assignments).await;
        if let Some(task_planner) = &self.task_planner {
            self.current_assignment_cost = task_planner.compute_cost(&assignments);
        }
        self.assigned_requests.insert(task_id.clone(), generated);
        info!(
            fleet = %self.name,
            %task_id, "assignments updated to accommodate awarded task"
        );
        Ok(())
    }

    async fn process_cancel(
        &mut self,
        request: &DispatchRequest,
    ) -> Result<(), DispatchRejection> {
        let task_id = request.task_id().to_string();

        if self.cancelled_task_ids.contains(&task_id) {
            warn!(fleet = %self.name, %task_id, "task was already cancelled");
            return Ok(());
        }

        let Some(to_cancel) = self.assigned_requests.get(&task_id).cloned()
        else {
            return Err(DispatchRejection::NotAssigned { task_id });
        };

        let executed: HashSet<&String> = self
            .task_managers
            .iter()
            .flat_map(|mgr| mgr.executed_tasks())
            .collect();
        if executed.contains(&task_id) {
            return Err(DispatchRejection::ReferencesActiveTask { task_id });
        }

        let Some(assignments) = self.allocate_tasks(None, Some(&to_cancel))
        else {
            return Err(DispatchRejection::ReplanFailed { task_id });
        };

        self.install_queues(&assignments).await;
        if let Some(task_planner) = &self.task_planner {
            self.current_assignment_cost = task_planner.compute_cost(&assignments);
        }
        self.cancelled_task_ids.insert(task_id.clone());
        info!(
            fleet = %self.name,
            %task_id, "task cancelled and assignments re-planned"
        );
        Ok(())
    }

    async fn install_queues(&mut self, assignments: &Assignments) {
        let mut summaries = Vec::new();
        for (index, manager) in self.task_managers.iter_mut().enumerate() {
            summaries.extend(
                manager.set_queue(assignments[index].clone(), &self.task_profile_map),
            );
        }
        for summary in summaries {
            if let Err(err) = self.bus.publish_task_summary(&summary).await {
                error!(fleet = %self.name, %err, "failed to publish task summary");
            }
        }
    }

    fn is_valid_assignments(&self, assignments: &Assignments) -> bool {
        let executed: HashSet<&String> = self
            .task_managers
            .iter()
            .flat_map(|mgr| mgr.executed_tasks())
            .collect();
        for block in assignments {
            for assignment in block {
                if executed.contains(&assignment.request.id) {
                    return false;
                }
            }
        }
        true
    }

    /// Re-plans the union of pending requests across all managers, with an
    /// optional new request prepended and an optional request removed.
    pub fn allocate_tasks(
        &self,
        new_request: Option<RequestRef>,
        ignore_request: Option<&RequestRef>,
    ) -> Option<Assignments> {
        let task_planner = self.task_planner.as_ref()?;

        let mut pending: Vec<RequestRef> = Vec::new();
        let mut planning_for = String::new();
        if let Some(new_request) = new_request {
            planning_for = new_request.id.clone();
            pending.push(new_request);
        }

        let mut states = Vec::new();
        for manager in &self.task_managers {
            states.push(manager.expected_finish_state());
            pending.extend(manager.requests());
        }

        if let Some(ignore) = ignore_request {
            match pending.iter().position(|r| r.id == ignore.id) {
                Some(index) => {
                    pending.remove(index);
                    info!(
                        fleet = %self.name,
                        task_id = %ignore.id,
                        "request excluded from task allocation"
                    );
                }
                None => warn!(
                    fleet = %self.name,
                    task_id = %ignore.id,
                    "request to ignore is not present in any task queue"
                ),
            }
        }

        info!(
            fleet = %self.name,
            robots = states.len(),
            requests = pending.len(),
            "planning task assignments"
        );

        match task_planner.plan(self.clock.now(), states, pending) {
            Ok(assignments) if assignments.is_empty() => {
                error!(
                    fleet = %self.name,
                    task_id = %planning_for,
                    "task planner produced no assignments"
                );
                None
            }
            Ok(assignments) => Some(assignments),
            Err(TaskPlannerError::LowBattery) => {
                error!(
                    fleet = %self.name,
                    task_id = %planning_for,
                    "planning failed: insufficient initial battery charge for \
                     all robots in this fleet"
                );
                None
            }
            Err(TaskPlannerError::LimitedCapacity) => {
                error!(
                    fleet = %self.name,
                    task_id = %planning_for,
                    "planning failed: insufficient battery capacity to \
                     accommodate one or more requests"
                );
                None
            }
            Err(TaskPlannerError::Other(reason)) => {
                error!(
                    fleet = %self.name,
                    task_id = %planning_for,
                    %reason, "planning failed"
                );
                None
            }
        }
    }

    fn make_request(
        &self,
        profile: &TaskProfile,
    ) -> Result<RequestRef, BidRejection> {
        let planner = self.planner_snapshot();
        let config = planner.configuration();
        let graph = &config.graph;
        let start_time = profile.description.start_time;
        let priority = profile.description.priority;

        let detail = match &profile.description.kind {
            TaskKind::Clean { start_waypoint } => {
                if start_waypoint.is_empty() {
                    return Err(BidRejection::MissingRequiredField {
                        field: "clean.start_waypoint",
                    });
                }
                let start = graph.find_waypoint(start_waypoint).ok_or_else(|| {
                    BidRejection::UnknownWaypoint { name: start_waypoint.clone() }
                })?;
                let dock_param = self
                    .dock_param_map
                    .get(start_waypoint)
                    .ok_or_else(|| BidRejection::MissingDockParam {
                        dock: start_waypoint.clone(),
                    })?;
                let finish =
                    graph.find_waypoint(&dock_param.finish).ok_or_else(|| {
                        BidRejection::UnknownWaypoint {
                            name: dock_param.finish.clone(),
                        }
                    })?;
                let cleaning_trajectory = interpolate_positions(
                    &config.traits,
                    start_time,
                    &dock_param.path,
                );
                if cleaning_trajectory.is_empty() {
                    return Err(BidRejection::EmptyTrajectory);
                }
                RequestDetail::Clean {
                    start_waypoint: start,
                    finish_waypoint: finish,
                    cleaning_trajectory,
                }
            }
            TaskKind::Delivery {
                pickup_place_name,
                pickup_dispenser,
                dropoff_place_name,
                dropoff_ingestor,
            } => {
                if pickup_place_name.is_empty() {
                    return Err(BidRejection::MissingRequiredField {
                        field: "delivery.pickup_place_name",
                    });
                }
                if pickup_dispenser.is_empty() {
                    return Err(BidRejection::MissingRequiredField {
                        field: "delivery.pickup_dispenser",
                    });
                }
                if dropoff_place_name.is_empty() {
                    return Err(BidRejection::MissingRequiredField {
                        field: "delivery.dropoff_place_name",
                    });
                }
                if dropoff_ingestor.is_empty() {
                    return Err(BidRejection::MissingRequiredField {
                        field: "delivery.dropoff_ingestor",
                    });
                }
                let pickup =
                    graph.find_waypoint(pickup_place_name).ok_or_else(|| {
                        BidRejection::UnknownWaypoint {
                            name: pickup_place_name.clone(),
                        }
                    })?;
                let dropoff =
                    graph.find_waypoint(dropoff_place_name).ok_or_else(|| {
                        BidRejection::UnknownWaypoint {
                            name: dropoff_place_name.clone(),
                        }
                    })?;
                // Dispenser and ingestor cycle times are not published
                // anywhere we can query, so the wait durations default to
                // zero.
                RequestDetail::Delivery {
                    pickup_waypoint: pickup,
                    pickup_wait: Duration::ZERO,
                    dropoff_waypoint: dropoff,
                    dropoff_wait: Duration::ZERO,
                }
            }
            TaskKind::Loop { start_name, finish_name, num_loops } => {
                if start_name.is_empty() {
                    return Err(BidRejection::MissingRequiredField {
                        field: "loop.start_name",
                    });
                }
                if finish_name.is_empty() {
                    return Err(BidRejection::MissingRequiredField {
                        field: "loop.finish_name",
                    });
                }
                if *num_loops < 1 {
                    return Err(BidRejection::MissingRequiredField {
                        field: "loop.num_loops",
                    });
                }
                let start = graph.find_waypoint(start_name).ok_or_else(|| {
                    BidRejection::UnknownWaypoint { name: start_name.clone() }
                })?;
                let finish = graph.find_waypoint(finish_name).ok_or_else(|| {
                    BidRejection::UnknownWaypoint { name: finish_name.clone() }
                })?;
                RequestDetail::Loop {
                    start_waypoint: start,
                    finish_waypoint: finish,
                    num_loops: *num_loops,
                }
            }
            other => {
                return Err(BidRejection::UnsupportedTaskType(
                    other.task_type().name().to_string(),
                ))
            }
        };

        Ok(Arc::new(Request {
            id: profile.task_id.clone(),
            earliest_start_time: start_time,
            priority,
            detail,
        }))
    }

    /// Registers a robot: traffic participant first, then charger lookup,
    /// then context + task manager creation on this worker.
    pub async fn add_robot(
        &mut self,
        name: impl Into<String>,
        footprint_radius: f64,
        start: Vec<PlannerStart>,
    ) -> Result<(), RobotJoinError> {
        let name = name.into();
        if start.is_empty() {
            return Err(RobotJoinError::EmptyStartSet);
        }

        let description = ParticipantDescription {
            name: name.clone(),
            owner: self.name.clone(),
            responsive: true,
            footprint_radius,
        };
        let participant = self
            .schedule_writer
            .make_participant(description)
            .await
            .map_err(RobotJoinError::Registration)?;

        let charger = self
            .nearest_charger(&start[0])
            .ok_or(RobotJoinError::NoChargingWaypoint)?;

        let context = RobotContext::new(
            name,
            self.name.clone(),
            participant,
            start[0],
            charger,
            self.planner.clone(),
            self.task_planner.clone(),
        );

        if let Some(negotiation) = &self.negotiation {
            let as_negotiator: Arc<dyn Negotiator> = context.clone();
            let weak_context: Weak<RobotContext> = Arc::downgrade(&context);
            let license = negotiation.register_negotiator(
                participant,
                Box::new(LiaisonNegotiator::new(Arc::downgrade(&as_negotiator))),
                rate_limited_interrupt(move || {
                    if let Some(context) = weak_context.upgrade() {
                        context.trigger_interrupt();
                    }
                }),
            );
            context.set_negotiation_license(license);
        }

        info!(
            fleet = %self.name,
            robot = context.name(),
            participant,
            charger, "added robot to fleet"
        );
        self.task_managers
            .push(TaskManager::make(context, self.clock.clone()));
        Ok(())
    }

    fn nearest_charger(&self, start: &PlannerStart) -> Option<usize> {
        let planner = self.planner_snapshot();
        let chargers = planner.configuration().graph.charging_waypoints();
        let mut nearest: Option<(usize, f64)> = None;
        for waypoint in chargers {
            if let Some(cost) = planner.ideal_cost(start, waypoint) {
                let closer = nearest.map(|(_, best)| cost < best).unwrap_or(true);
                if closer {
                    nearest = Some((waypoint, cost));
                }
            }
        }
        nearest.map(|(waypoint, _)| waypoint)
    }

    pub fn close_lanes(&mut self, lane_indices: Vec<usize>) {
        let planner = self.planner_snapshot();
        let closures = &planner.configuration().lane_closures;
        if !lane_indices.iter().any(|lane| closures.is_open(*lane)) {
            // No changes are needed to the planner
            return;
        }

        let mut config = planner.configuration().clone();
        for lane in lane_indices {
            config.lane_closures.close(lane);
        }
        *self.planner.write().unwrap() = planner.rebuild(config);
    }

    pub fn open_lanes(&mut self, lane_indices: Vec<usize>) {
        let planner = self.planner_snapshot();
        let closures = &planner.configuration().lane_closures;
        if !lane_indices.iter().any(|lane| closures.is_closed(*lane)) {
            // No changes are needed to the planner
            return;
        }

        let mut config = planner.configuration().clone();
        for lane in lane_indices {
            config.lane_closures.open(lane);
        }
        *self.planner.write().unwrap() = planner.rebuild(config);
    }

    /// Builds a fresh task planner from the given parameters and installs
    /// it on the fleet and every robot context. Returns false when any
    /// battery component is missing or either SOC bound is out of range.
    pub fn set_task_planner_params(&mut self, params: TaskPlannerParams) -> bool {
        if !params.is_valid() {
            return false;
        }
        let (Some(battery_system), Some(motion_sink), Some(ambient_sink), Some(tool_sink)) = (
            params.battery_system,
            params.motion_sink,
            params.ambient_sink,
            params.tool_sink,
        ) else {
            return false;
        };

        let config = TaskPlannerConfig {
            planner: self.planner_snapshot(),
            battery_system,
            motion_sink,
            ambient_sink,
            tool_sink,
            recharge_threshold: params.recharge_threshold,
            recharge_soc: params.recharge_soc,
            account_for_battery_drain: params.account_for_battery_drain,
            finishing_request: params.finishing_request,
        };
        let task_planner = self.task_planner_factory.make(config);

        // The task managers rely on the planner parameters for automatic
        // retreat, so every context follows the fleet-level update.
        for manager in &self.task_managers {
            manager.context().set_task_planner(task_planner.clone());
        }
        self.task_planner = Some(task_planner);
        true
    }

    pub fn fleet_state(&self) -> FleetStateMsg {
        let planner = self.planner_snapshot();
        let graph = &planner.configuration().graph;
        let robots = self
            .task_managers
            .iter()
            .map(|manager| {
                let context = manager.context();
                let waypoint = context.location().waypoint;
                RobotStateMsg {
                    name: context.name().to_string(),
                    task_id: manager.current_task_id().unwrap_or_default(),
                    battery_percent: context.battery_soc() * 100.0,
                    location: (waypoint < graph.waypoints.len())
                        .then(|| graph.waypoint(waypoint).position()),
                }
            })
            .collect();
        FleetStateMsg { name: self.name.clone(), robots }
    }

    pub async fn publish_fleet_state(&self) {
        let state = self.fleet_state();
        if let Err(err) = self.bus.publish_fleet_state(&state).await {
            error!(fleet = %self.name, %err, "failed to publish fleet state");
        }
    }

    /// Starts the next queued task on the named robot, broadcasting the
    /// Active summary. Driven by the robot-side executor.
    pub async fn begin_next_task(&mut self, robot: &str) -> bool {
        let bus = self.bus.clone();
        let Some(manager) = self
            .task_managers
            .iter_mut()
            .find(|m| m.context().name() == robot)
        else {
            return false;
        };
        match manager.begin_next_task() {
            Some(summary) => {
                if let Err(err) = bus.publish_task_summary(&summary).await {
                    error!(fleet = %self.name, %err, "failed to publish summary");
                }
                true
            }
            None => false,
        }
    }

    /// Completes the executing task on the named robot, broadcasting the
    /// Completed summary.
    pub async fn complete_active_task(&mut self, robot: &str) -> bool {
        let bus = self.bus.clone();
        let Some(manager) = self
            .task_managers
            .iter_mut()
            .find(|m| m.context().name() == robot)
        else {
            return false;
        };
        match manager.complete_active_task() {
            Some(summary) => {
                if let Err(err) = bus.publish_task_summary(&summary).await {
                    error!(fleet = %self.name, %err, "failed to publish summary");
                }
                true
            }
            None => false,
        }
    }
}
