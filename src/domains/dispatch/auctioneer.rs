use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::ports::MessageBus;
use crate::common::SharedClock;
use crate::domains::messages::{BidNotice, BidProposal};

/// Winning bid, as delivered to the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub fleet_name: String,
    pub robot_name: String,
    pub prev_cost: f64,
    pub new_cost: f64,
    pub finish_time: DateTime<Utc>,
}

impl Submission {
    fn from_proposal(proposal: &BidProposal) -> Self {
        Self {
            fleet_name: proposal.fleet_name.clone(),
            robot_name: proposal.robot_name.clone(),
            prev_cost: proposal.prev_cost,
            new_cost: proposal.new_cost,
            finish_time: proposal.finish_time,
        }
    }
}

/// Winner-selection strategy, injected into the auctioneer.
pub trait Evaluator: Send + Sync {
    fn evaluate(
        &self,
        task_id: &str,
        proposals: &[BidProposal],
    ) -> Option<Submission>;
}

/// Picks the lowest new cost; ties break on lexicographic fleet name, then
/// robot name.
#[derive(Debug, Default)]
pub struct LeastCostEvaluator;

impl Evaluator for LeastCostEvaluator {
    fn evaluate(
        &self,
        _task_id: &str,
        proposals: &[BidProposal],
    ) -> Option<Submission> {
        proposals
            .iter()
            .min_by(|a, b| {
                a.new_cost
                    .total_cmp(&b.new_cost)
                    .then_with(|| a.fleet_name.cmp(&b.fleet_name))
                    .then_with(|| a.robot_name.cmp(&b.robot_name))
            })
            .map(Submission::from_proposal)
    }
}

struct OpenAuction {
    notice: BidNotice,
    deadline: DateTime<Utc>,
    proposals: Vec<BidProposal>,
}

/// Runs at most one auction at a time: broadcasts the notice, collects
/// proposals until the window closes, then asks the evaluator to pick a
/// winner.
pub struct Auctioneer {
    clock: SharedClock,
    bus: Arc<dyn MessageBus>,
    evaluator: Arc<dyn Evaluator>,
    open_auction: Option<OpenAuction>,
}

impl Auctioneer {
    pub fn new(
        clock: SharedClock,
        bus: Arc<dyn MessageBus>,
        evaluator: Arc<dyn Evaluator>,
    ) -> Self {
        Self { clock, bus, evaluator, open_auction: None }
    }

    pub fn select_evaluator(&mut self, evaluator: Arc<dyn Evaluator>) {
        self.evaluator = evaluator;
    }

    /// Broadcasts the notice and opens the proposal window.
    pub async fn start_bidding(&mut self, notice: BidNotice) {
        debug_assert!(self.open_auction.is_none(), "auctions may not overlap");

        let window = Duration::from_std(notice.time_window)
            .unwrap_or_else(|_| Duration::seconds(2));
        let deadline = self.clock.now() + window;
        info!(
            task_id = %notice.task_profile.task_id,
            "starting bidding for task"
        );
        if let Err(err) = self.bus.publish_bid_notice(&notice).await {
            error!(
                task_id = %notice.task_profile.task_id,
                %err, "failed to broadcast bid notice"
            );
        }
        self.open_auction =
            Some(OpenAuction { notice, deadline, proposals: Vec::new() });
    }

    /// Accumulates a proposal if it matches the open auction and arrived
    /// within the window; anything else is dropped.
    pub fn receive_proposal(&mut self, proposal: BidProposal) {
        let now = self.clock.now();
        let Some(auction) = self.open_auction.as_mut() else {
            debug!(
                task_id = proposal.task_id(),
                "dropping proposal; no auction is open"
            );
            return;
        };
        if auction.notice.task_profile.task_id != proposal.task_id() {
            debug!(
                task_id = proposal.task_id(),
                "dropping proposal for a different task"
            );
            return;
        }
        if now > auction.deadline {
            debug!(
                task_id = proposal.task_id(),
                "dropping proposal received after the bidding window"
            );
            return;
        }
        auction.proposals.push(proposal);
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.open_auction.as_ref().map(|auction| auction.deadline)
    }

    /// Closes the auction if its window has elapsed, returning the task id
    /// and the evaluator's verdict.
    pub fn close_if_elapsed(&mut self) -> Option<(String, Option<Submission>)> {
        let deadline = self.deadline()?;
        if self.clock.now() < deadline {
            return None;
        }
        let auction = self.open_auction.take()?;
        let task_id = auction.notice.task_profile.task_id;
        let winner = self.evaluator.evaluate(&task_id, &auction.proposals);
        Some((task_id, winner))
    }
}
