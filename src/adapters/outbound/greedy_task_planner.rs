use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::common::TaskPlannerError;
use crate::domains::fleet::nav::NavGraph;
use crate::domains::fleet::{
    Assignment, AssignmentBlock, Assignments, FinishState, Request,
    RequestDetail, RequestRef, RobotState, TaskPlanner, TaskPlannerConfig,
    TaskPlannerFactory,
};
use crate::domains::tasks::Priority;

/// Builds greedy task planners. Injected wherever a
/// `dyn TaskPlannerFactory` is expected.
#[derive(Debug, Default)]
pub struct GreedyTaskPlannerFactory;

impl TaskPlannerFactory for GreedyTaskPlannerFactory {
    fn make(&self, config: TaskPlannerConfig) -> Arc<dyn TaskPlanner> {
        Arc::new(GreedyTaskPlanner::new(config))
    }
}

/// Earliest-finish greedy assigner. Requests are ordered by priority and
/// earliest start, then each goes to the robot that can finish it first.
/// When battery drain is accounted for, a robot projected to dip under the
/// recharge threshold gets an automatic ChargeBattery task inserted ahead
/// of the request.
pub struct GreedyTaskPlanner {
    config: TaskPlannerConfig,
    charge_counter: AtomicU64,
}

impl GreedyTaskPlanner {
    pub fn new(config: TaskPlannerConfig) -> Self {
        Self { config, charge_counter: AtomicU64::new(0) }
    }

    fn graph(&self) -> Arc<NavGraph> {
        self.config.planner.configuration().graph.clone()
    }

    fn speed(&self) -> f64 {
        self.config.planner.configuration().traits.linear_velocity.max(1e-6)
    }

    fn travel_secs(&self, from: usize, to: usize) -> f64 {
        let graph = self.graph();
        if from >= graph.waypoints.len() || to >= graph.waypoints.len() {
            return 0.0;
        }
        graph.waypoint(from).position().distance_to(&graph.waypoint(to).position())
            / self.speed()
    }

    fn entry_waypoint(&self, request: &Request, robot: &RobotState) -> usize {
        match &request.detail {
            RequestDetail::Clean { start_waypoint, .. } => *start_waypoint,
            RequestDetail::Delivery { pickup_waypoint, .. } => *pickup_waypoint,
            RequestDetail::Loop { start_waypoint, .. } => *start_waypoint,
            RequestDetail::ChargeBattery => robot.charger_waypoint,
        }
    }

    fn exit_waypoint(&self, request: &Request, robot: &RobotState) -> usize {
        match &request.detail {
            RequestDetail::Clean { finish_waypoint, .. } => *finish_waypoint,
            RequestDetail::Delivery { dropoff_waypoint, .. } => *dropoff_waypoint,
            RequestDetail::Loop { start_waypoint, finish_waypoint, num_loops } => {
                // An even loop count ends back at the start.
                if num_loops % 2 == 0 {
                    *start_waypoint
                } else {
                    *finish_waypoint
                }
            }
            RequestDetail::ChargeBattery => robot.charger_waypoint,
        }
    }

    fn service_secs(&self, request: &Request, robot: &RobotState) -> f64 {
        match &request.detail {
            RequestDetail::Clean { cleaning_trajectory, .. } => {
                match (
                    cleaning_trajectory.points().first(),
                    cleaning_trajectory.finish_time(),
                ) {
                    (Some(first), Some(finish)) => {
                        (finish - first.time).num_milliseconds() as f64 / 1000.0
                    }
                    _ => 0.0,
                }
            }
            RequestDetail::Delivery {
                pickup_waypoint,
                pickup_wait,
                dropoff_waypoint,
                dropoff_wait,
            } => {
                self.travel_secs(*pickup_waypoint, *dropoff_waypoint)
                    + pickup_wait.as_secs_f64()
                    + dropoff_wait.as_secs_f64()
            }
            RequestDetail::Loop { start_waypoint, finish_waypoint, num_loops } => {
                let leg = self.travel_secs(*start_waypoint, *finish_waypoint);
                leg * (2 * num_loops - 1) as f64
            }
            RequestDetail::ChargeBattery => {
                let battery = &self.config.battery_system;
                let deficit =
                    (self.config.recharge_soc - robot.battery_soc).max(0.0);
                deficit * battery.capacity / battery.charging_current.max(1e-6)
                    * 3600.0
            }
        }
    }

    fn total_power(&self) -> f64 {
        self.config.motion_sink.nominal_power()
            + self.config.ambient_sink.nominal_power()
            + self.config.tool_sink.nominal_power()
    }

    /// Fraction of a full battery consumed over the given duration.
    fn drain_fraction(&self, duration_secs: f64) -> f64 {
        let capacity_wh = self.config.battery_system.capacity_wh().max(1e-6);
        self.total_power() * duration_secs / (capacity_wh * 3600.0)
    }

    fn projected_finish(
        &self,
        robot: &RobotState,
        request: &Request,
        now: DateTime<Utc>,
    ) -> f64 {
        let deployment = deployment_time(robot, request, now);
        let duration = self
            .travel_secs(robot.waypoint, self.entry_waypoint(request, robot))
            + self.service_secs(request, robot);
        epoch_secs(deployment) + duration
    }

    fn insert_charge(
        &self,
        robot: &mut RobotState,
        block: &mut AssignmentBlock,
    ) {
        let id = format!(
            "ChargeBattery{}",
            self.charge_counter.fetch_add(1, Ordering::SeqCst)
        );
        let request: RequestRef = Arc::new(Request {
            id,
            earliest_start_time: robot.finish_time,
            priority: Priority::Low,
            detail: RequestDetail::ChargeBattery,
        });

        let travel = self.travel_secs(robot.waypoint, robot.charger_waypoint);
        let charging = self.service_secs(&request, robot);
        let deployment = robot.finish_time;
        let finish_time = deployment + millis(travel + charging);
        let finish_state = FinishState {
            finish_time,
            battery_soc: self.config.recharge_soc,
            waypoint: robot.charger_waypoint,
        };
        block.push(Assignment {
            request,
            deployment_time: deployment,
            finish_state,
        });
        robot.waypoint = finish_state.waypoint;
        robot.battery_soc = finish_state.battery_soc;
        robot.finish_time = finish_time;
    }

    fn assign(
        &self,
        robot: &mut RobotState,
        block: &mut AssignmentBlock,
        request: RequestRef,
        now: DateTime<Utc>,
    ) -> Result<(), TaskPlannerError> {
        let mut deployment = deployment_time(robot, &request, now);
        let mut duration = self
            .travel_secs(robot.waypoint, self.entry_waypoint(&request, robot))
            + self.service_secs(&request, robot);
        let mut drain = if self.config.account_for_battery_drain {
            self.drain_fraction(duration)
        } else {
            0.0
        };
        if drain > 1.0 {
            return Err(TaskPlannerError::LimitedCapacity);
        }

        if self.config.account_for_battery_drain
            && !request.is_charge_request()
            && robot.battery_soc - drain < self.config.recharge_threshold
        {
            self.insert_charge(robot, block);
            deployment = deployment_time(robot, &request, now);
            duration = self
                .travel_secs(robot.waypoint, self.entry_waypoint(&request, robot))
                + self.service_secs(&request, robot);
            drain = self.drain_fraction(duration);
        }
        if robot.battery_soc - drain < 0.0 {
            return Err(TaskPlannerError::LowBattery);
        }

        let exit = self.exit_waypoint(&request, robot);
        let finish_time = deployment + millis(duration);
        let finish_state = FinishState {
            finish_time,
            battery_soc: robot.battery_soc - drain,
            waypoint: exit,
        };
        block.push(Assignment {
            request,
            deployment_time: deployment,
            finish_state,
        });
        robot.waypoint = exit;
        robot.battery_soc = finish_state.battery_soc;
        robot.finish_time = finish_time;
        Ok(())
    }
}

impl TaskPlanner for GreedyTaskPlanner {
    fn plan(
        &self,
        now: DateTime<Utc>,
        states: Vec<RobotState>,
        pending: Vec<RequestRef>,
    ) -> Result<Assignments, TaskPlannerError> {
        if states.is_empty() {
            return Err(TaskPlannerError::Other(
                "fleet has no robot states to plan for".to_string(),
            ));
        }

        let mut robots = states;
        let mut blocks: Assignments = vec![Vec::new(); robots.len()];

        let mut queue = pending;
        queue.sort_by(|a, b| {
            priority_rank(a.priority)
                .cmp(&priority_rank(b.priority))
                .then_with(|| a.earliest_start_time.cmp(&b.earliest_start_time))
                .then_with(|| a.id.cmp(&b.id))
        });

        for request in queue {
            let mut best: Option<(usize, f64)> = None;
            for (index, robot) in robots.iter().enumerate() {
                let finish = self.projected_finish(robot, &request, now);
                let better =
                    best.map(|(_, current)| finish < current).unwrap_or(true);
                if better {
                    best = Some((index, finish));
                }
            }
            let Some((index, _)) = best else {
                return Err(TaskPlannerError::Other(
                    "no robot could take the request".to_string(),
                ));
            };
            self.assign(&mut robots[index], &mut blocks[index], request, now)?;
        }

        if let Some(factory) = &self.config.finishing_request {
            for (index, robot) in robots.iter_mut().enumerate() {
                let request = factory.make(robot, now);
                self.assign(robot, &mut blocks[index], request, now)?;
            }
        }

        Ok(blocks)
    }

    fn compute_cost(&self, assignments: &Assignments) -> f64 {
        assignments
            .iter()
            .flatten()
            .map(|assignment| {
                (assignment.finish_state.finish_time
                    - assignment.deployment_time)
                    .num_milliseconds() as f64
                    / 1000.0
            })
            .sum()
    }
}

fn priority_rank(priority: Priority) -> u8 {
    match priority {
        Priority::High => 0,
        Priority::Low => 1,
    }
}

fn deployment_time(
    robot: &RobotState,
    request: &Request,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    robot.finish_time.max(request.earliest_start_time).max(now)
}

fn epoch_secs(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

fn millis(secs: f64) -> chrono::Duration {
    chrono::Duration::milliseconds((secs * 1000.0) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::straight_line_planner::StraightLinePlanner;
    use crate::domains::fleet::nav::{
        LaneClosures, NavGraph, PlannerConfig, VehicleTraits, Waypoint,
    };
    use crate::domains::fleet::{BatterySystem, FinishingRequestFactory, PowerSink};
    use std::time::Duration;

    struct ConstantSink(f64);

    impl PowerSink for ConstantSink {
        fn nominal_power(&self) -> f64 {
            self.0
        }
    }

    fn waypoint(name: &str, x: f64, is_charger: bool) -> Waypoint {
        Waypoint { name: name.to_string(), x, y: 0.0, is_charger }
    }

    fn test_config(
        account_for_battery_drain: bool,
        recharge_threshold: f64,
    ) -> TaskPlannerConfig {
        let graph = Arc::new(NavGraph {
            waypoints: vec![
                waypoint("charger", 0.0, true),
                waypoint("pantry", 10.0, false),
                waypoint("lounge", 20.0, false),
            ],
            lanes: vec![],
        });
        let planner = StraightLinePlanner::new(PlannerConfig {
            graph,
            traits: VehicleTraits { linear_velocity: 1.0, angular_velocity: 1.0 },
            lane_closures: LaneClosures::default(),
        });
        TaskPlannerConfig {
            planner,
            battery_system: BatterySystem {
                nominal_voltage: 24.0,
                capacity: 40.0,
                charging_current: 26.0,
            },
            motion_sink: Arc::new(ConstantSink(20.0)),
            ambient_sink: Arc::new(ConstantSink(5.0)),
            tool_sink: Arc::new(ConstantSink(0.0)),
            recharge_threshold,
            recharge_soc: 1.0,
            account_for_battery_drain,
            finishing_request: None,
        }
    }

    fn delivery(id: &str, now: DateTime<Utc>) -> RequestRef {
        Arc::new(Request {
            id: id.to_string(),
            earliest_start_time: now,
            priority: Priority::Low,
            detail: RequestDetail::Delivery {
                pickup_waypoint: 1,
                pickup_wait: Duration::ZERO,
                dropoff_waypoint: 2,
                dropoff_wait: Duration::ZERO,
            },
        })
    }

    fn idle_robot(now: DateTime<Utc>, soc: f64) -> RobotState {
        RobotState {
            waypoint: 0,
            charger_waypoint: 0,
            battery_soc: soc,
            finish_time: now,
        }
    }

    #[test]
    fn assigns_each_request_to_some_robot() {
        let now = Utc::now();
        let planner = GreedyTaskPlanner::new(test_config(false, 0.2));
        let assignments = planner
            .plan(
                now,
                vec![idle_robot(now, 1.0), idle_robot(now, 1.0)],
                vec![delivery("Delivery0", now), delivery("Delivery1", now)],
            )
            .unwrap();

        assert_eq!(assignments.len(), 2);
        let total: usize = assignments.iter().map(|b| b.len()).sum();
        assert_eq!(total, 2);
        assert!(planner.compute_cost(&assignments) > 0.0);
    }

    #[test]
    fn high_priority_requests_are_placed_first() {
        let now = Utc::now();
        let planner = GreedyTaskPlanner::new(test_config(false, 0.2));
        let urgent = Arc::new(Request {
            priority: Priority::High,
            ..(*delivery("Delivery9", now)).clone()
        });
        let assignments = planner
            .plan(
                now,
                vec![idle_robot(now, 1.0)],
                vec![delivery("Delivery0", now), urgent],
            )
            .unwrap();

        assert_eq!(assignments[0][0].request.id, "Delivery9");
        assert_eq!(assignments[0][1].request.id, "Delivery0");
    }

    #[test]
    fn inserts_charge_task_below_threshold() {
        let now = Utc::now();
        let planner = GreedyTaskPlanner::new(test_config(true, 0.9));
        let assignments = planner
            .plan(
                now,
                vec![idle_robot(now, 0.9)],
                vec![delivery("Delivery0", now)],
            )
            .unwrap();

        let block = &assignments[0];
        assert_eq!(block.len(), 2);
        assert!(block[0].request.is_charge_request());
        assert!(block[0].request.id.starts_with("ChargeBattery"));
        assert_eq!(block[1].request.id, "Delivery0");
    }

    #[test]
    fn depleted_fleet_reports_low_battery() {
        let now = Utc::now();
        // recharge_soc below the threshold keeps the charge insert from
        // rescuing the robot.
        let mut config = test_config(true, 0.0);
        config.recharge_soc = 0.0;
        let planner = GreedyTaskPlanner::new(config);
        let result = planner.plan(
            now,
            vec![idle_robot(now, 1e-9)],
            vec![delivery("Delivery0", now)],
        );
        assert_eq!(result.unwrap_err(), TaskPlannerError::LowBattery);
    }

    #[test]
    fn finishing_request_appends_per_robot() {
        struct ReturnToCharger;

        impl FinishingRequestFactory for ReturnToCharger {
            fn make(&self, state: &RobotState, now: DateTime<Utc>) -> RequestRef {
                Arc::new(Request {
                    id: format!("Finish-{}", state.waypoint),
                    earliest_start_time: now,
                    priority: Priority::Low,
                    detail: RequestDetail::ChargeBattery,
                })
            }
        }

        let now = Utc::now();
        let mut config = test_config(false, 0.2);
        config.finishing_request = Some(Arc::new(ReturnToCharger));
        let planner = GreedyTaskPlanner::new(config);
        let assignments = planner
            .plan(now, vec![idle_robot(now, 1.0)], vec![delivery("Delivery0", now)])
            .unwrap();

        let block = &assignments[0];
        assert_eq!(block.len(), 2);
        assert!(block[1].request.id.starts_with("Finish-"));
    }
}
