pub mod health;
pub mod reset;
pub mod scheduler;

pub use health::HealthService;
pub use reset::PollResetService;
pub use scheduler::{Clock, MatchSchedule, SystemClock};
