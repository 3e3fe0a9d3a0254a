pub mod dispatch_service;
pub mod fleet_service;

pub use dispatch_service::{
    CancelTaskResponse, DispatchService, GetTaskListResponse,
    SubmitTaskResponse,
};
pub use fleet_service::FleetService;
