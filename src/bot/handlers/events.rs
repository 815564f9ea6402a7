use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::bot::coordinator::Coordinator;
use crate::slack::{ChatEvent, EventEnvelope};
use crate::utils::logging::{log_rejected_payload, log_transport_error};

const ROUTE: &str = "/slack/events";

pub async fn events_handler(
    State(coordinator): State<Arc<Coordinator>>,
    payload: Result<Json<EventEnvelope>, JsonRejection>,
) -> Response {
    let envelope = match payload {
        Ok(Json(envelope)) => envelope,
        Err(rejection) => {
            log_rejected_payload(ROUTE, &rejection.body_text());
            return StatusCode::OK.into_response();
        }
    };

    match envelope {
        EventEnvelope::UrlVerification { challenge } => {
            Json(json!({ "challenge": challenge })).into_response()
        }
        EventEnvelope::EventCallback { event, event_id } => {
            match serde_json::from_value::<ChatEvent>(event) {
                Ok(event) if event.is_chat_message() => {
                    tokio::spawn(dispatch(coordinator, event));
                }
                Ok(event) => debug!("Ignoring {} event", event.event_type),
                Err(e) => {
                    let id = event_id.unwrap_or_else(|| "unknown".to_string());
                    log_rejected_payload(ROUTE, &format!("event {id}: {e}"));
                }
            }
            StatusCode::OK.into_response()
        }
        EventEnvelope::Unknown => {
            debug!("Ignoring unsupported envelope type");
            StatusCode::OK.into_response()
        }
    }
}

async fn dispatch(coordinator: Arc<Coordinator>, event: ChatEvent) {
    if let Some(Err(e)) = coordinator.handle_chat_event(&event).await {
        log_transport_error("handle mention", &e);
    }
}
