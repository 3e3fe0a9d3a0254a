use std::sync::Arc;

use crate::domains::fleet::nav::PlannerConfig;
use crate::domains::fleet::{Planner, PlannerStart};

/// Planner adapter that prices every route at straight-line distance over
/// the vehicle's nominal speed. Good enough for charger selection and
/// testing; real deployments plug in a graph-search planner here.
pub struct StraightLinePlanner {
    config: PlannerConfig,
}

impl StraightLinePlanner {
    pub fn new(config: PlannerConfig) -> Arc<Self> {
        Arc::new(Self { config })
    }
}

impl Planner for StraightLinePlanner {
    fn configuration(&self) -> &PlannerConfig {
        &self.config
    }

    fn ideal_cost(&self, start: &PlannerStart, goal: usize) -> Option<f64> {
        let graph = &self.config.graph;
        if start.waypoint >= graph.waypoints.len()
            || goal >= graph.waypoints.len()
        {
            return None;
        }
        let from = graph.waypoint(start.waypoint).position();
        let to = graph.waypoint(goal).position();
        Some(from.distance_to(&to) / self.config.traits.linear_velocity.max(1e-6))
    }

    fn rebuild(&self, config: PlannerConfig) -> Arc<dyn Planner> {
        Arc::new(Self { config })
    }
}
