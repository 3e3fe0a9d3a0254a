use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use peregrine_fleet::adapters::outbound::{
    GreedyTaskPlannerFactory, InMemoryBus, InMemoryScheduleWriter,
    StraightLinePlanner,
};
use peregrine_fleet::application::{DispatchService, FleetService};
use peregrine_fleet::common::{SharedClock, SystemClock};
use peregrine_fleet::Config;
use peregrine_fleet::domains::dispatch::LeastCostEvaluator;
use peregrine_fleet::domains::fleet::nav::{
    LaneClosures, NavGraph, PlannerConfig, VehicleTraits, Waypoint,
};
use peregrine_fleet::domains::fleet::{
    BatterySystem, NegotiationRoom, PlannerStart, PowerSink, TaskPlannerParams,
};
use peregrine_fleet::domains::tasks::{
    Priority, TaskDescription, TaskKind, TaskStatus,
};

struct ConstantSink(f64);

impl PowerSink for ConstantSink {
    fn nominal_power(&self) -> f64 {
        self.0
    }
}

fn demo_graph() -> Arc<NavGraph> {
    let waypoint = |name: &str, x: f64, y: f64, is_charger: bool| Waypoint {
        name: name.to_string(),
        x,
        y,
        is_charger,
    };
    Arc::new(NavGraph {
        waypoints: vec![
            waypoint("charger_1", 0.0, 0.0, true),
            waypoint("pantry", 12.0, 0.0, false),
            waypoint("lounge", 12.0, 8.0, false),
            waypoint("supplies", 0.0, 8.0, false),
        ],
        lanes: vec![],
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting fleet coordination demo");

    let clock: SharedClock = Arc::new(SystemClock);
    let bus = Arc::new(InMemoryBus::new());

    let mut config = Config::from_file("config.toml").await.unwrap_or_default();
    config.dispatcher.bidding_time_window = 0.5;
    let dispatch = DispatchService::spawn(
        config.dispatcher.clone(),
        clock.clone(),
        bus.clone(),
        Arc::new(LeastCostEvaluator),
    );
    bus.register_dispatcher(dispatch.handle().sender());
    dispatch.handle().on_change(Arc::new(|status: &TaskStatus| {
        info!(
            task_id = status.task_id(),
            state = status.state.name(),
            "task status changed"
        );
    }));

    let planner = StraightLinePlanner::new(PlannerConfig {
        graph: demo_graph(),
        traits: VehicleTraits::default(),
        lane_closures: LaneClosures::default(),
    });
    let fleet = FleetService::spawn(
        "hermes",
        clock.clone(),
        bus.clone(),
        planner,
        Arc::new(GreedyTaskPlannerFactory),
        Arc::new(InMemoryScheduleWriter::new()),
        Some(NegotiationRoom::new()),
    );
    bus.register_fleet(fleet.handle().sender());

    fleet.accept_task_requests(Arc::new(|_profile| true));
    fleet.set_default_maximum_delay(Some(Duration::from_secs(10)));
    let configured = fleet
        .set_task_planner_params(TaskPlannerParams {
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
            account_for_battery_drain: true,
            finishing_request: None,
        })
        .await;
    if !configured {
        return Err("task planner parameters were rejected".into());
    }

    fleet
        .add_robot(
            "mule_1",
            0.3,
            vec![PlannerStart { waypoint: 0, orientation: 0.0 }],
        )
        .await?;
    fleet
        .add_robot(
            "mule_2",
            0.3,
            vec![PlannerStart { waypoint: 3, orientation: 0.0 }],
        )
        .await?;

    let delivery = TaskDescription::new(
        Utc::now(),
        Priority::Low,
        TaskKind::Delivery {
            pickup_place_name: "pantry".to_string(),
            pickup_dispenser: "coke_dispenser".to_string(),
            dropoff_place_name: "lounge".to_string(),
            dropoff_ingestor: "coke_ingestor".to_string(),
        },
    );
    let response = dispatch.submit_task(delivery).await;
    info!(task_id = %response.task_id, "submitted delivery task");

    let patrol = TaskDescription::new(
        Utc::now(),
        Priority::High,
        TaskKind::Loop {
            start_name: "supplies".to_string(),
            finish_name: "lounge".to_string(),
            num_loops: 2,
        },
    );
    let response = dispatch.submit_task(patrol).await;
    info!(task_id = %response.task_id, "submitted loop task");

    // Let both auctions resolve and the awards install.
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let list = dispatch.task_list().await;
    for task in &list.active_tasks {
        info!(
            task_id = task.task_id(),
            state = task.state.name(),
            fleet = task.fleet_name.as_deref().unwrap_or("-"),
            "ongoing task"
        );
    }

    // Drive one robot through its queue.
    if fleet.begin_next_task("mule_1").await {
        fleet.complete_active_task("mule_1").await;
    }
    fleet.publish_fleet_state();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let list = dispatch.task_list().await;
    info!(
        active = list.active_tasks.len(),
        terminated = list.terminated_tasks.len(),
        "demo finished"
    );
    Ok(())
}
