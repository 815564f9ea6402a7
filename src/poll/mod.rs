//! Weekly attendance poll: roster, responses and the team split derived from them.

pub mod member;
pub mod state;
pub mod teams;

pub use member::*;
pub use state::*;
pub use teams::*;
