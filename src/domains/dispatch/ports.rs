use async_trait::async_trait;

use crate::common::TransportError;
use crate::domains::messages::{
    ActiveTasksMsg, BidNotice, BidProposal, DispatchAck, DispatchRequest,
    DockSummary, FleetStateMsg,
};
use crate::domains::tasks::TaskStatus;

/// Transport capability. Publication is fire-and-forget from the caller's
/// perspective; delivery and subscription wiring belong to the adapter.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish_bid_notice(&self, notice: &BidNotice)
        -> Result<(), TransportError>;

    async fn publish_bid_proposal(&self, proposal: &BidProposal)
        -> Result<(), TransportError>;

    async fn publish_dispatch_request(&self, request: &DispatchRequest)
        -> Result<(), TransportError>;

    async fn publish_dispatch_ack(&self, ack: &DispatchAck)
        -> Result<(), TransportError>;

    async fn publish_task_summary(&self, summary: &TaskStatus)
        -> Result<(), TransportError>;

    async fn publish_active_tasks(&self, tasks: &ActiveTasksMsg)
        -> Result<(), TransportError>;

    async fn publish_dock_summary(&self, summary: &DockSummary)
        -> Result<(), TransportError>;

    async fn publish_fleet_state(&self, state: &FleetStateMsg)
        -> Result<(), TransportError>;
}
