use thiserror::Error;

/// Errors surfaced to the submitter of a task.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Task type is invalid: {0}")]
    InvalidTaskType(String),

    #[error("Task not found: {task_id}")]
    NotFound { task_id: String },

    #[error("Task {task_id} already reached terminal state {state}")]
    AlreadyTerminal { task_id: String, state: String },

    #[error("Task {task_id} is executing and can no longer be cancelled")]
    CancelOfActiveTask { task_id: String },

    #[error("Task {task_id} was not submitted by a user")]
    NotUserSubmitted { task_id: String },

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),
}

/// Reasons a fleet silently declines to bid on a task. Every variant maps
/// to a skipped proposal with a logged warning, never a hard failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BidRejection {
    #[error("fleet has no robots registered")]
    NoRobots,

    #[error("bid notice carries an empty task_id")]
    EmptyTaskId,

    #[error("task {task_id} was already evaluated; revival is unsupported")]
    DuplicateTaskId { task_id: String },

    #[error("fleet is not configured to accept task requests")]
    NoAcceptCallback,

    #[error("fleet declined the task via its accept_task callback")]
    TaskDeclined,

    #[error("fleet has no task planner configured")]
    NoPlannerConfigured,

    #[error("required field [{field}] missing in task profile")]
    MissingRequiredField { field: &'static str },

    #[error("waypoint [{name}] is not in the navigation graph")]
    UnknownWaypoint { name: String },

    #[error("no dock parameters registered for [{dock}]")]
    MissingDockParam { dock: String },

    #[error("cleaning path produced an empty trajectory")]
    EmptyTrajectory,

    #[error("task type [{0}] cannot be planned by this fleet")]
    UnsupportedTaskType(String),

    #[error("task planner returned no assignments")]
    NoAssignments,
}

/// Reasons a DispatchRequest is refused. These surface to the dispatcher
/// through a DispatchAck with success = false.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchRejection {
    #[error("no bid was evaluated for task {task_id}")]
    UnknownBid { task_id: String },

    #[error("assignment count {assignments} does not match {robots} robots")]
    AssignmentSizeMismatch { assignments: usize, robots: usize },

    #[error("no generated request recorded for task {task_id}")]
    MissingGeneratedRequest { task_id: String },

    #[error("task {task_id} is not assigned to this fleet")]
    NotAssigned { task_id: String },

    #[error("task {task_id} has already begun execution")]
    ReferencesActiveTask { task_id: String },

    #[error("re-planning failed while handling task {task_id}")]
    ReplanFailed { task_id: String },
}

/// Failure modes of the combinatorial task planner.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskPlannerError {
    #[error("insufficient initial battery charge for all robots in this fleet")]
    LowBattery,

    #[error("insufficient battery capacity to accommodate one or more requests")]
    LimitedCapacity,

    #[error("task planning failed: {0}")]
    Other(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

/// Unrecoverable preconditions of adding a robot to a fleet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RobotJoinError {
    #[error(
        "start set is empty; adding a robot requires at least one planner start"
    )]
    EmptyStartSet,

    #[error(
        "no charging waypoint reachable; the navigation graph must designate \
         at least one charger"
    )]
    NoChargingWaypoint,

    #[error("participant registration failed: {0}")]
    Registration(String),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
