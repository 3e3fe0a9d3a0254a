use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use peregrine_fleet::adapters::outbound::{
    GreedyTaskPlannerFactory, InMemoryBus, InMemoryScheduleWriter,
    StraightLinePlanner,
};
use peregrine_fleet::common::{BidRejection, RobotJoinError, SharedClock, SystemClock};
use peregrine_fleet::domains::fleet::nav::{
    Lane, LaneClosures, NavGraph, PlannerConfig, Pose, VehicleTraits, Waypoint,
};
use peregrine_fleet::domains::fleet::{
    BatterySystem, FleetAdapter, NegotiationResponder, NegotiationRoom,
    NegotiationView, Negotiator, PlannerStart, PowerSink, SharedPlanner,
    TaskPlannerParams,
};
use peregrine_fleet::domains::messages::{
    BidNotice, DispatchMethod, DispatchRequest, Dock, DockParam, DockSummary,
};
use peregrine_fleet::domains::tasks::{
    Priority, TaskDescription, TaskKind, TaskProfile, TaskState,
};

struct ConstantSink(f64);

impl PowerSink for ConstantSink {
    fn nominal_power(&self) -> f64 {
        self.0
    }
}

fn waypoint(name: &str, x: f64, y: f64, is_charger: bool) -> Waypoint {
    Waypoint { name: name.to_string(), x, y, is_charger }
}

fn test_graph() -> Arc<NavGraph> {
    Arc::new(NavGraph {
        waypoints: vec![
            waypoint("charger_1", 0.0, 0.0, true),
            waypoint("pantry", 10.0, 0.0, false),
            waypoint("lounge", 20.0, 0.0, false),
            waypoint("supplies", 30.0, 0.0, false),
            waypoint("charger_2", 25.0, 0.0, true),
            waypoint("zone_a", 5.0, 5.0, false),
            waypoint("zone_exit", 6.0, 5.0, false),
        ],
        lanes: vec![Lane { from: 0, to: 1 }, Lane { from: 1, to: 2 }],
    })
}

fn test_planner(graph: Arc<NavGraph>) -> SharedPlanner {
    StraightLinePlanner::new(PlannerConfig {
        graph,
        traits: VehicleTraits { linear_velocity: 1.0, angular_velocity: 1.0 },
        lane_closures: LaneClosures::default(),
    })
}

fn make_adapter(
    bus: Arc<InMemoryBus>,
    negotiation: Option<Arc<NegotiationRoom>>,
) -> FleetAdapter {
    let clock: SharedClock = Arc::new(SystemClock);
    FleetAdapter::new(
        "hermes",
        clock,
        bus,
        test_planner(test_graph()),
        Arc::new(GreedyTaskPlannerFactory),
        Arc::new(InMemoryScheduleWriter::new()),
        negotiation,
    )
}

fn valid_params() -> TaskPlannerParams {
    TaskPlannerParams {
        battery_system: Some(BatterySystem {
            nominal_voltage: 24.0,
            capacity: 40.0,
            charging_current: 26.0,
        }),
        motion_sink: Some(Arc::new(ConstantSink(20.0))),
        ambient_sink: Some(Arc::new(ConstantSink(5.0))),
        tool_sink: Some(Arc::new(ConstantSink(0.0))),
        recharge_threshold: 0.1,
        recharge_soc: 1.0,
        account_for_battery_drain: false,
        finishing_request: None,
    }
}

/// Adapter with one robot, an accepting callback, and planner params set.
async fn ready_adapter(bus: Arc<InMemoryBus>) -> FleetAdapter {
    let mut adapter = make_adapter(bus, None);
    adapter.accept_task_requests(Arc::new(|_| true));
    assert!(adapter.set_task_planner_params(valid_params()));
    adapter
        .add_robot(
            "mule_1",
            0.3,
            vec![PlannerStart { waypoint: 0, orientation: 0.0 }],
        )
        .await
        .unwrap();
    adapter
}

fn profile(id: &str, kind: TaskKind) -> TaskProfile {
    TaskProfile {
        task_id: id.to_string(),
        submission_time: Utc::now(),
        description: TaskDescription::new(Utc::now(), Priority::Low, kind),
    }
}

fn notice(id: &str, kind: TaskKind) -> BidNotice {
    BidNotice {
        task_profile: profile(id, kind),
        time_window: Duration::from_secs(2),
    }
}

fn delivery_kind() -> TaskKind {
    TaskKind::Delivery {
        pickup_place_name: "pantry".to_string(),
        pickup_dispenser: "coke_dispenser".to_string(),
        dropoff_place_name: "lounge".to_string(),
        dropoff_ingestor: "coke_ingestor".to_string(),
    }
}

fn loop_kind(num_loops: u32) -> TaskKind {
    TaskKind::Loop {
        start_name: "supplies".to_string(),
        finish_name: "lounge".to_string(),
        num_loops,
    }
}

fn add_request(id: &str, kind: TaskKind) -> DispatchRequest {
    DispatchRequest {
        fleet_name: "hermes".to_string(),
        task_profile: profile(id, kind),
        method: DispatchMethod::Add,
    }
}

fn cancel_request(id: &str, kind: TaskKind) -> DispatchRequest {
    DispatchRequest {
        fleet_name: "hermes".to_string(),
        task_profile: profile(id, kind),
        method: DispatchMethod::Cancel,
    }
}

#[tokio::test]
async fn bid_is_skipped_without_robots() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = make_adapter(bus.clone(), None);

    let result = adapter.handle_bid_notice(&notice("Delivery0", delivery_kind())).await;
    assert_eq!(result.unwrap_err(), BidRejection::NoRobots);
    assert!(bus.bid_proposals().is_empty());
}

#[tokio::test]
async fn bid_preconditions_are_checked_in_order() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = make_adapter(bus.clone(), None);
    adapter
        .add_robot(
            "mule_1",
            0.3,
            vec![PlannerStart { waypoint: 0, orientation: 0.0 }],
        )
        .await
        .unwrap();

    let empty_id = adapter.handle_bid_notice(&notice("", delivery_kind())).await;
    assert_eq!(empty_id.unwrap_err(), BidRejection::EmptyTaskId);

    let no_callback =
        adapter.handle_bid_notice(&notice("Delivery0", delivery_kind())).await;
    assert_eq!(no_callback.unwrap_err(), BidRejection::NoAcceptCallback);

    adapter.accept_task_requests(Arc::new(|_| false));
    let declined =
        adapter.handle_bid_notice(&notice("Delivery0", delivery_kind())).await;
    assert_eq!(declined.unwrap_err(), BidRejection::TaskDeclined);

    adapter.accept_task_requests(Arc::new(|_| true));
    let no_planner =
        adapter.handle_bid_notice(&notice("Delivery0", delivery_kind())).await;
    assert_eq!(no_planner.unwrap_err(), BidRejection::NoPlannerConfigured);

    assert!(bus.bid_proposals().is_empty());
}

#[tokio::test]
async fn delivery_bid_produces_a_proposal() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = ready_adapter(bus.clone()).await;

    adapter
        .handle_bid_notice(&notice("Delivery0", delivery_kind()))
        .await
        .unwrap();

    let proposals = bus.bid_proposals();
    assert_eq!(proposals.len(), 1);
    let proposal = &proposals[0];
    assert_eq!(proposal.fleet_name, "hermes");
    assert_eq!(proposal.robot_name, "mule_1");
    assert_eq!(proposal.task_id(), "Delivery0");
    assert_eq!(proposal.prev_cost, 0.0);
    assert!(proposal.new_cost > 0.0);
    assert!(adapter.has_evaluated_bid("Delivery0"));
}

#[tokio::test]
async fn repeated_bid_notices_are_suppressed() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = ready_adapter(bus.clone()).await;

    adapter
        .handle_bid_notice(&notice("Delivery0", delivery_kind()))
        .await
        .unwrap();
    let repeat = adapter
        .handle_bid_notice(&notice("Delivery0", delivery_kind()))
        .await;
    assert!(matches!(
        repeat.unwrap_err(),
        BidRejection::DuplicateTaskId { .. }
    ));
    assert_eq!(bus.bid_proposals().len(), 1);
}

#[tokio::test]
async fn unknown_waypoints_and_missing_fields_skip_the_bid() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = ready_adapter(bus.clone()).await;

    let unknown = adapter
        .handle_bid_notice(&notice(
            "Delivery0",
            TaskKind::Delivery {
                pickup_place_name: "warehouse".to_string(),
                pickup_dispenser: "d".to_string(),
                dropoff_place_name: "lounge".to_string(),
                dropoff_ingestor: "i".to_string(),
            },
        ))
        .await;
    assert!(matches!(
        unknown.unwrap_err(),
        BidRejection::UnknownWaypoint { .. }
    ));

    let missing = adapter
        .handle_bid_notice(&notice(
            "Delivery1",
            TaskKind::Delivery {
                pickup_place_name: "pantry".to_string(),
                pickup_dispenser: String::new(),
                dropoff_place_name: "lounge".to_string(),
                dropoff_ingestor: "i".to_string(),
            },
        ))
        .await;
    assert!(matches!(
        missing.unwrap_err(),
        BidRejection::MissingRequiredField { field: "delivery.pickup_dispenser" }
    ));

    let unsupported =
        adapter.handle_bid_notice(&notice("Patrol2", TaskKind::Patrol)).await;
    assert!(matches!(
        unsupported.unwrap_err(),
        BidRejection::UnsupportedTaskType(_)
    ));

    assert!(bus.bid_proposals().is_empty());
}

#[tokio::test]
async fn loop_boundaries_follow_num_loops() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = ready_adapter(bus.clone()).await;

    let zero = adapter.handle_bid_notice(&notice("Loop0", loop_kind(0))).await;
    assert!(matches!(
        zero.unwrap_err(),
        BidRejection::MissingRequiredField { field: "loop.num_loops" }
    ));

    // A single loop is a degenerate but valid request.
    adapter.handle_bid_notice(&notice("Loop1", loop_kind(1))).await.unwrap();
    assert_eq!(bus.bid_proposals().len(), 1);
}

#[tokio::test]
async fn clean_bids_need_dock_params_and_a_real_path() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = ready_adapter(bus.clone()).await;
    let clean = TaskKind::Clean { start_waypoint: "zone_a".to_string() };

    let no_dock =
        adapter.handle_bid_notice(&notice("Clean0", clean.clone())).await;
    assert!(matches!(
        no_dock.unwrap_err(),
        BidRejection::MissingDockParam { .. }
    ));

    // An empty dock path interpolates to a trajectory with no segments.
    adapter.handle_dock_summary(&DockSummary {
        docks: vec![Dock {
            fleet_name: "hermes".to_string(),
            params: vec![DockParam {
                start: "zone_a".to_string(),
                finish: "zone_exit".to_string(),
                path: vec![],
            }],
        }],
    });
    let empty =
        adapter.handle_bid_notice(&notice("Clean0", clean.clone())).await;
    assert_eq!(empty.unwrap_err(), BidRejection::EmptyTrajectory);

    adapter.handle_dock_summary(&DockSummary {
        docks: vec![Dock {
            fleet_name: "hermes".to_string(),
            params: vec![DockParam {
                start: "zone_a".to_string(),
                finish: "zone_exit".to_string(),
                path: vec![
                    Pose::new(5.0, 5.0, 0.0),
                    Pose::new(6.0, 5.0, 0.0),
                    Pose::new(6.0, 6.0, 1.5),
                ],
            }],
        }],
    });
    adapter.handle_bid_notice(&notice("Clean0", clean)).await.unwrap();
    assert_eq!(bus.bid_proposals().len(), 1);
}

#[tokio::test]
async fn dock_summary_only_applies_to_the_matching_fleet() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = make_adapter(bus, None);

    adapter.handle_dock_summary(&DockSummary {
        docks: vec![
            Dock {
                fleet_name: "hermes".to_string(),
                params: vec![DockParam {
                    start: "zone_a".to_string(),
                    finish: "zone_exit".to_string(),
                    path: vec![],
                }],
            },
            Dock {
                fleet_name: "other".to_string(),
                params: vec![DockParam {
                    start: "elsewhere".to_string(),
                    finish: "elsewhere".to_string(),
                    path: vec![],
                }],
            },
        ],
    });
    assert!(adapter.dock_params().contains_key("zone_a"));
    assert!(!adapter.dock_params().contains_key("elsewhere"));

    // A summary for an unrelated fleet leaves the map untouched.
    adapter.handle_dock_summary(&DockSummary {
        docks: vec![Dock {
            fleet_name: "other".to_string(),
            params: vec![],
        }],
    });
    assert!(adapter.dock_params().contains_key("zone_a"));

    // A fresh summary for this fleet replaces the map wholesale.
    adapter.handle_dock_summary(&DockSummary {
        docks: vec![Dock {
            fleet_name: "hermes".to_string(),
            params: vec![DockParam {
                start: "zone_b".to_string(),
                finish: "zone_exit".to_string(),
                path: vec![],
            }],
        }],
    });
    assert!(!adapter.dock_params().contains_key("zone_a"));
    assert!(adapter.dock_params().contains_key("zone_b"));
}

#[tokio::test]
async fn dispatch_before_bid_evaluation_is_refused() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = ready_adapter(bus.clone()).await;

    let outcome = adapter
        .handle_dispatch_request(&add_request("Delivery0", delivery_kind()))
        .await;
    assert_eq!(outcome, Some(false));

    let acks = bus.dispatch_acks();
    assert_eq!(acks.len(), 1);
    assert!(!acks[0].success);
}

#[tokio::test]
async fn dispatch_for_other_fleets_and_unknown_methods_is_ignored() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = ready_adapter(bus.clone()).await;

    let mut foreign = add_request("Delivery0", delivery_kind());
    foreign.fleet_name = "other".to_string();
    assert_eq!(adapter.handle_dispatch_request(&foreign).await, None);

    let mut unknown = add_request("Delivery0", delivery_kind());
    unknown.method = DispatchMethod::Unknown;
    assert_eq!(adapter.handle_dispatch_request(&unknown).await, None);

    assert!(bus.dispatch_acks().is_empty());
}

#[tokio::test]
async fn awarded_task_installs_the_queues() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = ready_adapter(bus.clone()).await;

    adapter
        .handle_bid_notice(&notice("Delivery0", delivery_kind()))
        .await
        .unwrap();
    let outcome = adapter
        .handle_dispatch_request(&add_request("Delivery0", delivery_kind()))
        .await;
    assert_eq!(outcome, Some(true));

    let managers = adapter.task_managers();
    assert_eq!(managers.len(), 1);
    assert_eq!(managers[0].queued_task_ids(), vec!["Delivery0".to_string()]);
    assert!(adapter.current_assignment_cost() > 0.0);

    let queued: Vec<_> = bus
        .task_summaries()
        .into_iter()
        .filter(|s| s.state == TaskState::Queued)
        .collect();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].task_id(), "Delivery0");
    assert_eq!(queued[0].fleet_name.as_deref(), Some("hermes"));

    let acks = bus.dispatch_acks();
    assert!(acks.last().unwrap().success);
}

#[tokio::test]
async fn robot_count_must_match_the_stored_assignments() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = ready_adapter(bus.clone()).await;

    adapter
        .handle_bid_notice(&notice("Delivery0", delivery_kind()))
        .await
        .unwrap();
    // A robot joined between the bid and the award.
    adapter
        .add_robot(
            "mule_2",
            0.3,
            vec![PlannerStart { waypoint: 3, orientation: 0.0 }],
        )
        .await
        .unwrap();

    let outcome = adapter
        .handle_dispatch_request(&add_request("Delivery0", delivery_kind()))
        .await;
    assert_eq!(outcome, Some(false));
}

#[tokio::test]
async fn stale_assignments_are_replanned_before_install() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = ready_adapter(bus.clone()).await;

    adapter
        .handle_bid_notice(&notice("Delivery0", delivery_kind()))
        .await
        .unwrap();
    adapter
        .handle_dispatch_request(&add_request("Delivery0", delivery_kind()))
        .await;

    // The second bid's assignments still reference Delivery0.
    adapter
        .handle_bid_notice(&notice("Loop1", loop_kind(2)))
        .await
        .unwrap();

    // Delivery0 begins executing before the award for Loop1 arrives.
    assert!(adapter.begin_next_task("mule_1").await);

    let outcome = adapter
        .handle_dispatch_request(&add_request("Loop1", loop_kind(2)))
        .await;
    assert_eq!(outcome, Some(true));

    let manager = &adapter.task_managers()[0];
    assert_eq!(manager.queued_task_ids(), vec!["Loop1".to_string()]);
    for id in manager.queued_task_ids() {
        assert!(!manager.executed_tasks().contains(&id));
    }
}

#[tokio::test]
async fn cancelling_a_queued_task_replans_without_it() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = ready_adapter(bus.clone()).await;

    for (id, kind) in
        [("Delivery0", delivery_kind()), ("Loop1", loop_kind(2))]
    {
        adapter.handle_bid_notice(&notice(id, kind.clone())).await.unwrap();
        adapter.handle_dispatch_request(&add_request(id, kind)).await;
    }
    let manager = &adapter.task_managers()[0];
    assert_eq!(manager.queued_task_ids().len(), 2);

    let outcome = adapter
        .handle_dispatch_request(&cancel_request("Delivery0", delivery_kind()))
        .await;
    assert_eq!(outcome, Some(true));

    let manager = &adapter.task_managers()[0];
    assert_eq!(manager.queued_task_ids(), vec!["Loop1".to_string()]);

    // Cancelling again acks success without another re-plan.
    let again = adapter
        .handle_dispatch_request(&cancel_request("Delivery0", delivery_kind()))
        .await;
    assert_eq!(again, Some(true));
}

#[tokio::test]
async fn cancel_of_unassigned_or_executing_tasks_is_refused() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = ready_adapter(bus.clone()).await;

    let unassigned = adapter
        .handle_dispatch_request(&cancel_request("Delivery0", delivery_kind()))
        .await;
    assert_eq!(unassigned, Some(false));

    adapter
        .handle_bid_notice(&notice("Delivery0", delivery_kind()))
        .await
        .unwrap();
    adapter
        .handle_dispatch_request(&add_request("Delivery0", delivery_kind()))
        .await;
    assert!(adapter.begin_next_task("mule_1").await);

    let executing = adapter
        .handle_dispatch_request(&cancel_request("Delivery0", delivery_kind()))
        .await;
    assert_eq!(executing, Some(false));
}

#[tokio::test]
async fn add_robot_requires_a_start_and_a_charger() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = make_adapter(bus.clone(), None);

    let empty = adapter.add_robot("mule_1", 0.3, vec![]).await;
    assert_eq!(empty.unwrap_err(), RobotJoinError::EmptyStartSet);

    let chargerless = Arc::new(NavGraph {
        waypoints: vec![waypoint("pantry", 10.0, 0.0, false)],
        lanes: vec![],
    });
    let clock: SharedClock = Arc::new(SystemClock);
    let mut no_charger_adapter = FleetAdapter::new(
        "hermes",
        clock,
        bus,
        test_planner(chargerless),
        Arc::new(GreedyTaskPlannerFactory),
        Arc::new(InMemoryScheduleWriter::new()),
        None,
    );
    let result = no_charger_adapter
        .add_robot(
            "mule_1",
            0.3,
            vec![PlannerStart { waypoint: 0, orientation: 0.0 }],
        )
        .await;
    assert_eq!(result.unwrap_err(), RobotJoinError::NoChargingWaypoint);
}

#[tokio::test]
async fn joining_robots_get_the_nearest_charger() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = make_adapter(bus, None);

    // supplies sits at x=30; charger_2 (x=25) beats charger_1 (x=0).
    adapter
        .add_robot(
            "mule_1",
            0.3,
            vec![PlannerStart { waypoint: 3, orientation: 0.0 }],
        )
        .await
        .unwrap();

    let context = adapter.task_managers()[0].context();
    assert_eq!(context.charger_waypoint(), 4);
    assert_eq!(context.battery_soc(), 1.0);
}

#[tokio::test]
async fn planner_params_are_validated_before_installing() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = make_adapter(bus, None);

    let mut missing_sink = valid_params();
    missing_sink.motion_sink = None;
    assert!(!adapter.set_task_planner_params(missing_sink));

    let mut bad_threshold = valid_params();
    bad_threshold.recharge_threshold = 1.5;
    assert!(!adapter.set_task_planner_params(bad_threshold));

    let mut bad_soc = valid_params();
    bad_soc.recharge_soc = -0.1;
    assert!(!adapter.set_task_planner_params(bad_soc));

    assert!(adapter.set_task_planner_params(valid_params()));
}

#[tokio::test]
async fn lane_closures_swap_the_planner_snapshot() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = make_adapter(bus, None);
    adapter
        .add_robot(
            "mule_1",
            0.3,
            vec![PlannerStart { waypoint: 0, orientation: 0.0 }],
        )
        .await
        .unwrap();
    let context = adapter.task_managers()[0].context().clone();

    let before = adapter.planner_snapshot();
    adapter.close_lanes(vec![0]);
    let closed = adapter.planner_snapshot();
    assert!(!Arc::ptr_eq(&before, &closed));
    assert!(closed.configuration().lane_closures.is_closed(0));
    assert!(closed.configuration().lane_closures.is_open(1));

    // Robot contexts observe the swap through the shared reference.
    assert!(context.planner().configuration().lane_closures.is_closed(0));

    // Closing an already-closed lane is a no-op: no rebuild.
    adapter.close_lanes(vec![0]);
    let unchanged = adapter.planner_snapshot();
    assert!(Arc::ptr_eq(&closed, &unchanged));

    adapter.open_lanes(vec![0]);
    let reopened = adapter.planner_snapshot();
    assert!(reopened.configuration().lane_closures.is_open(0));

    adapter.open_lanes(vec![0]);
    assert!(Arc::ptr_eq(&reopened, &adapter.planner_snapshot()));
}

#[derive(Default)]
struct CountingResponder {
    forfeits: AtomicUsize,
    submissions: AtomicUsize,
}

impl NegotiationResponder for CountingResponder {
    fn submit(&self, _itinerary: Vec<u64>) {
        self.submissions.fetch_add(1, Ordering::SeqCst);
    }

    fn forfeit(&self) {
        self.forfeits.fetch_add(1, Ordering::SeqCst);
    }
}

struct EagerNegotiator;

impl Negotiator for EagerNegotiator {
    fn respond(&self, view: &NegotiationView, responder: &dyn NegotiationResponder) {
        responder.submit(view.participants.clone());
    }
}

#[tokio::test]
async fn joined_robots_negotiate_through_the_room() {
    let bus = Arc::new(InMemoryBus::new());
    let room = NegotiationRoom::new();
    let mut adapter = make_adapter(bus, Some(room.clone()));
    adapter
        .add_robot(
            "mule_1",
            0.3,
            vec![PlannerStart { waypoint: 0, orientation: 0.0 }],
        )
        .await
        .unwrap();

    let context = adapter.task_managers()[0].context().clone();
    let participant = context.participant();

    // Without a robot-side negotiator the context forfeits.
    let responder = CountingResponder::default();
    room.respond(participant, &NegotiationView::default(), &responder);
    assert_eq!(responder.forfeits.load(Ordering::SeqCst), 1);

    // Once the robot installs a negotiator, rounds are forwarded to it.
    context.set_negotiator(Arc::new(EagerNegotiator));
    room.respond(participant, &NegotiationView::default(), &responder);
    assert_eq!(responder.submissions.load(Ordering::SeqCst), 1);

    // Re-interrupts inside the cooldown collapse into one.
    room.interrupt(participant);
    room.interrupt(participant);
    assert_eq!(context.interrupt_count(), 1);
}

#[tokio::test]
async fn fleet_state_snapshot_reports_every_robot() {
    let bus = Arc::new(InMemoryBus::new());
    let mut adapter = ready_adapter(bus.clone()).await;
    adapter
        .add_robot(
            "mule_2",
            0.3,
            vec![PlannerStart { waypoint: 3, orientation: 0.0 }],
        )
        .await
        .unwrap();

    let state = adapter.fleet_state();
    assert_eq!(state.name, "hermes");
    assert_eq!(state.robots.len(), 2);
    assert_eq!(state.robots[0].name, "mule_1");
    assert_eq!(state.robots[0].battery_percent, 100.0);
    assert!(state.robots[0].location.is_some());
    assert_eq!(state.robots[0].task_id, "");

    adapter.publish_fleet_state().await;
    assert_eq!(bus.fleet_states().len(), 1);
}
