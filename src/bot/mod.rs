pub mod commands;
pub mod coordinator;
pub mod handlers;
pub mod messages;
pub mod transport;

pub use commands::{Intent, IntentMatcher};
pub use coordinator::{CallbackOutcome, Coordinator, IntentOutcome, Phase, PollStatus};
pub use transport::{ChatTransport, MessageHandle};
