use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    Form,
};
use std::sync::Arc;

use crate::bot::coordinator::Coordinator;
use crate::slack::{ActionForm, ActionPayload};
use crate::utils::logging::{log_rejected_payload, log_transport_error};

const ROUTE: &str = "/slack/action";

/// Button presses on the poll. Always answers 200 with an empty body so Slack
/// leaves the original message alone; the edit is made through the Web API.
pub async fn callback_handler(
    State(coordinator): State<Arc<Coordinator>>,
    form: Result<Form<ActionForm>, FormRejection>,
) -> StatusCode {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            log_rejected_payload(ROUTE, &rejection.body_text());
            return StatusCode::OK;
        }
    };

    let payload: ActionPayload = match serde_json::from_str(&form.payload) {
        Ok(payload) => payload,
        Err(e) => {
            log_rejected_payload(ROUTE, &format!("invalid payload JSON: {e}"));
            return StatusCode::OK;
        }
    };

    tokio::spawn(async move {
        if let Err(e) = coordinator.on_callback(&payload).await {
            log_transport_error("record poll answer", &e);
        }
    });

    StatusCode::OK
}
