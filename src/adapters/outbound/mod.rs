pub mod greedy_task_planner;
pub mod in_memory_bus;
pub mod in_memory_schedule;
pub mod kafka_bus;
pub mod straight_line_planner;

pub use greedy_task_planner::{GreedyTaskPlanner, GreedyTaskPlannerFactory};
pub use in_memory_bus::InMemoryBus;
pub use in_memory_schedule::InMemoryScheduleWriter;
pub use kafka_bus::KafkaMessageBus;
pub use straight_line_planner::StraightLinePlanner;
