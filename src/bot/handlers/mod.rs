//! Slack webhook routes.
//!
//! Slack only wants a quick 200; the work behind a request is spawned onto the
//! runtime and its failures end up in the log.

pub mod callback;
pub mod events;

use axum::{routing::post, Router};
use std::sync::Arc;

use crate::bot::coordinator::Coordinator;

pub fn router(coordinator: Arc<Coordinator>) -> Router {
    Router::new()
        .route("/slack/events", post(events::events_handler))
        .route("/slack/action", post(callback::callback_handler))
        .with_state(coordinator)
}
