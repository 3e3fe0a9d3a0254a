use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use super::negotiation::{NegotiationLicense, NegotiationResponder, NegotiationView, Negotiator};
use super::ports::{ParticipantId, PlannerStart, SharedPlanner, TaskPlanner};

/// Per-robot state shared between its task manager and the negotiation
/// registry. The registry only ever holds a weak reference.
pub struct RobotContext {
    name: String,
    fleet_name: String,
    participant: ParticipantId,
    charger_waypoint: usize,
    location: RwLock<PlannerStart>,
    battery_soc: RwLock<f64>,
    /// Shared planner reference; rebinding it swaps the snapshot for every
    /// holder at once.
    planner: Arc<RwLock<SharedPlanner>>,
    task_planner: RwLock<Option<Arc<dyn TaskPlanner>>>,
    negotiator: RwLock<Option<Arc<dyn Negotiator>>>,
    negotiation_license: RwLock<Option<NegotiationLicense>>,
    interrupt_count: AtomicU32,
}

impl RobotContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        fleet_name: String,
        participant: ParticipantId,
        start: PlannerStart,
        charger_waypoint: usize,
        planner: Arc<RwLock<SharedPlanner>>,
        task_planner: Option<Arc<dyn TaskPlanner>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            fleet_name,
            participant,
            charger_waypoint,
            location: RwLock::new(start),
            battery_soc: RwLock::new(1.0),
            planner,
            task_planner: RwLock::new(task_planner),
            negotiator: RwLock::new(None),
            negotiation_license: RwLock::new(None),
            interrupt_count: AtomicU32::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fleet_name(&self) -> &str {
        &self.fleet_name
    }

    pub fn participant(&self) -> ParticipantId {
        self.participant
    }

    pub fn charger_waypoint(&self) -> usize {
        self.charger_waypoint
    }

    pub fn location(&self) -> PlannerStart {
        *self.location.read().unwrap()
    }

    pub fn set_location(&self, location: PlannerStart) {
        *self.location.write().unwrap() = location;
    }

    pub fn battery_soc(&self) -> f64 {
        *self.battery_soc.read().unwrap()
    }

    pub fn set_battery_soc(&self, soc: f64) {
        *self.battery_soc.write().unwrap() = soc.clamp(0.0, 1.0);
    }

    pub fn planner(&self) -> SharedPlanner {
        self.planner.read().unwrap().clone()
    }

    pub fn set_task_planner(&self, task_planner: Arc<dyn TaskPlanner>) {
        *self.task_planner.write().unwrap() = Some(task_planner);
    }

    pub fn set_negotiator(&self, negotiator: Arc<dyn Negotiator>) {
        *self.negotiator.write().unwrap() = Some(negotiator);
    }

    pub fn set_negotiation_license(&self, license: NegotiationLicense) {
        *self.negotiation_license.write().unwrap() = Some(license);
    }

    /// Asks the robot to re-plan around a schedule conflict.
    pub fn trigger_interrupt(&self) {
        self.interrupt_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn interrupt_count(&self) -> u32 {
        self.interrupt_count.load(Ordering::SeqCst)
    }
}

impl Negotiator for RobotContext {
    fn respond(&self, view: &NegotiationView, responder: &dyn NegotiationResponder) {
        let negotiator = self.negotiator.read().unwrap().clone();
        match negotiator {
            Some(negotiator) => negotiator.respond(view, responder),
            None => responder.forfeit(),
        }
    }
}
