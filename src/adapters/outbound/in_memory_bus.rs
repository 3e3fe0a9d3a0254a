use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::common::TransportError;
use crate::domains::dispatch::ports::MessageBus;
use crate::domains::dispatch::DispatcherCommand;
use crate::domains::fleet::FleetCommand;
use crate::domains::messages::{
    ActiveTasksMsg, BidNotice, BidProposal, DispatchAck, DispatchRequest,
    DockSummary, FleetStateMsg,
};
use crate::domains::tasks::TaskStatus;

/// In-memory message bus for testing and development. Every publication is
/// recorded for inspection and routed to whichever workers have been
/// registered; absent subscribers are simply skipped, like an empty topic.
#[derive(Default)]
pub struct InMemoryBus {
    dispatcher: Mutex<Option<mpsc::UnboundedSender<DispatcherCommand>>>,
    fleets: Mutex<Vec<mpsc::UnboundedSender<FleetCommand>>>,
    record: Mutex<BusRecord>,
}

#[derive(Default)]
struct BusRecord {
    bid_notices: Vec<BidNotice>,
    bid_proposals: Vec<BidProposal>,
    dispatch_requests: Vec<DispatchRequest>,
    dispatch_acks: Vec<DispatchAck>,
    task_summaries: Vec<TaskStatus>,
    active_tasks: Vec<ActiveTasksMsg>,
    dock_summaries: Vec<DockSummary>,
    fleet_states: Vec<FleetStateMsg>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_dispatcher(
        &self,
        sender: mpsc::UnboundedSender<DispatcherCommand>,
    ) {
        *self.dispatcher.lock().unwrap() = Some(sender);
    }

    pub fn register_fleet(&self, sender: mpsc::UnboundedSender<FleetCommand>) {
        self.fleets.lock().unwrap().push(sender);
    }

    pub fn bid_notices(&self) -> Vec<BidNotice> {
        self.record.lock().unwrap().bid_notices.clone()
    }

    pub fn bid_proposals(&self) -> Vec<BidProposal> {
        self.record.lock().unwrap().bid_proposals.clone()
    }

    pub fn dispatch_requests(&self) -> Vec<DispatchRequest> {
        self.record.lock().unwrap().dispatch_requests.clone()
    }

    pub fn dispatch_acks(&self) -> Vec<DispatchAck> {
        self.record.lock().unwrap().dispatch_acks.clone()
    }

    pub fn task_summaries(&self) -> Vec<TaskStatus> {
        self.record.lock().unwrap().task_summaries.clone()
    }

    pub fn active_task_broadcasts(&self) -> Vec<ActiveTasksMsg> {
        self.record.lock().unwrap().active_tasks.clone()
    }

    pub fn fleet_states(&self) -> Vec<FleetStateMsg> {
        self.record.lock().unwrap().fleet_states.clone()
    }

    fn send_to_dispatcher(&self, command: DispatcherCommand) {
        if let Some(sender) = self.dispatcher.lock().unwrap().as_ref() {
            let _ = sender.send(command);
        }
    }

    fn send_to_fleets(&self, make: impl Fn() -> FleetCommand) {
        for sender in self.fleets.lock().unwrap().iter() {
            let _ = sender.send(make());
        }
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish_bid_notice(
        &self,
        notice: &BidNotice,
    ) -> Result<(), TransportError> {
        self.record.lock().unwrap().bid_notices.push(notice.clone());
        self.send_to_fleets(|| FleetCommand::BidNotice(notice.clone()));
        Ok(())
    }

    async fn publish_bid_proposal(
        &self,
        proposal: &BidProposal,
    ) -> Result<(), TransportError> {
        self.record.lock().unwrap().bid_proposals.push(proposal.clone());
        self.send_to_dispatcher(DispatcherCommand::BidProposal(
            proposal.clone(),
        ));
        Ok(())
    }

    async fn publish_dispatch_request(
        &self,
        request: &DispatchRequest,
    ) -> Result<(), TransportError> {
        self.record.lock().unwrap().dispatch_requests.push(request.clone());
        self.send_to_fleets(|| FleetCommand::DispatchRequest(request.clone()));
        Ok(())
    }

    async fn publish_dispatch_ack(
        &self,
        ack: &DispatchAck,
    ) -> Result<(), TransportError> {
        self.record.lock().unwrap().dispatch_acks.push(ack.clone());
        self.send_to_dispatcher(DispatcherCommand::DispatchAck(ack.clone()));
        Ok(())
    }

    async fn publish_task_summary(
        &self,
        summary: &TaskStatus,
    ) -> Result<(), TransportError> {
        self.record.lock().unwrap().task_summaries.push(summary.clone());
        self.send_to_dispatcher(DispatcherCommand::TaskSummary(
            summary.clone(),
        ));
        Ok(())
    }

    async fn publish_active_tasks(
        &self,
        tasks: &ActiveTasksMsg,
    ) -> Result<(), TransportError> {
        self.record.lock().unwrap().active_tasks.push(tasks.clone());
        Ok(())
    }

    async fn publish_dock_summary(
        &self,
        summary: &DockSummary,
    ) -> Result<(), TransportError> {
        self.record.lock().unwrap().dock_summaries.push(summary.clone());
        self.send_to_fleets(|| FleetCommand::DockSummary(summary.clone()));
        Ok(())
    }

    async fn publish_fleet_state(
        &self,
        state: &FleetStateMsg,
    ) -> Result<(), TransportError> {
        self.record.lock().unwrap().fleet_states.push(state.clone());
        Ok(())
    }
}
