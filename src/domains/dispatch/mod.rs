pub mod actors;
pub mod auctioneer;
pub mod dispatcher;
pub mod ports;

pub use actors::{DispatcherActor, DispatcherCommand, DispatcherHandle};
pub use auctioneer::{Auctioneer, Evaluator, LeastCostEvaluator, Submission};
pub use dispatcher::{Dispatcher, StatusCallback};
pub use ports::MessageBus;
