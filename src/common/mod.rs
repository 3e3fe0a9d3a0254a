pub mod clock;
pub mod error;
pub mod ids;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::*;
pub use ids::TaskIdGenerator;
