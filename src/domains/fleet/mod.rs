pub mod actors;
pub mod adapter;
pub mod nav;
pub mod negotiation;
pub mod ports;
pub mod request;
pub mod robot;
pub mod task_manager;

pub use actors::{FleetActor, FleetCommand, FleetHandle};
pub use adapter::{AcceptTaskFn, FleetAdapter};
pub use negotiation::{
    LiaisonNegotiator, NegotiationLicense, NegotiationResponder,
    NegotiationRoom, NegotiationView, Negotiator,
};
pub use ports::{
    Assignment, AssignmentBlock, Assignments, BatterySystem, FinishState,
    FinishingRequestFactory, ParticipantDescription, ParticipantId, Planner,
    PlannerStart, PowerSink, RobotState, ScheduleWriter, SharedPlanner,
    TaskPlanner, TaskPlannerConfig, TaskPlannerFactory, TaskPlannerParams,
};
pub use request::{Request, RequestDetail, RequestRef};
pub use robot::RobotContext;
pub use task_manager::TaskManager;
