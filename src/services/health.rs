use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::bot::coordinator::{Coordinator, Phase, PollStatus};

/// How long a health probe waits for the poll session before calling it stuck.
const SESSION_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub poll: PollHealth,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PollHealth {
    pub phase: String,
    pub channel: Option<String>,
    pub displayed_message: bool,
    pub yes: usize,
    pub no: usize,
    pub unknown: usize,
}

impl From<PollStatus> for PollHealth {
    fn from(status: PollStatus) -> Self {
        let phase = match status.phase {
            Phase::NoPoll => "no_poll",
            Phase::PollOpen => "poll_open",
        };
        Self {
            phase: phase.to_string(),
            channel: status.channel.map(|c| c.as_str().to_string()),
            displayed_message: status.displayed_message,
            yes: status.yes,
            no: status.no,
            unknown: status.unknown,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub start_time: DateTime<Utc>,
}

pub struct HealthService {
    pub router: Router,
}

impl HealthService {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        let state = AppState {
            coordinator,
            start_time: Utc::now(),
        };

        let router = Router::new()
            .route("/health", get(health_check))
            .route("/health/ready", get(readiness_check))
            .route("/health/live", get(liveness_check))
            .with_state(state);

        Self { router }
    }
}

async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    let status = probe_session(&state.coordinator)
        .await
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    let uptime = Utc::now()
        .signed_duration_since(state.start_time)
        .num_seconds()
        .max(0) as u64;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        poll: status.into(),
        uptime_seconds: uptime,
    }))
}

async fn readiness_check(State(state): State<AppState>) -> Result<Json<&'static str>, StatusCode> {
    match probe_session(&state.coordinator).await {
        Some(_) => Ok(Json("ready")),
        None => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

async fn liveness_check() -> Json<&'static str> {
    Json("alive")
}

/// `None` if the session lock could not be taken in time.
async fn probe_session(coordinator: &Coordinator) -> Option<PollStatus> {
    tokio::time::timeout(SESSION_PROBE_TIMEOUT, coordinator.status())
        .await
        .ok()
}
