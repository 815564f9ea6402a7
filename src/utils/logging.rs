use tracing::{debug, error, info, warn};

use crate::error::BotError;

/// Logs an interpreted direct mention with consistent format
pub fn log_intent(intent: &str, user: Option<&str>, channel: &str) {
    info!(
        "INTENT: {} by {} in channel {}",
        intent,
        user.unwrap_or("unknown"),
        channel
    );
}

/// Logs a button press with consistent format
pub fn log_callback(action: &str, value: &str, user: &str, outcome: &str) {
    info!(
        "CALLBACK: {}={} from {} - {}",
        action, value, user, outcome
    );
}

/// Logs a failed collaborator call; these are dropped, never retried
pub fn log_transport_error(operation: &str, err: &BotError) {
    error!("TRANSPORT_ERROR: {} [{}] - {}", operation, err.kind(), err);
}

/// Logs poll lifecycle changes with consistent format
pub fn log_poll_event(event: &str, channel: &str, details: Option<&str>) {
    match details {
        Some(d) => info!("POLL: {} in channel {} - {}", event, channel, d),
        None => info!("POLL: {} in channel {}", event, channel),
    }
}

/// Logs a payload we could not make sense of
pub fn log_rejected_payload(route: &str, reason: &str) {
    warn!("PAYLOAD_REJECTED: {} - {}", route, reason);
}

/// Logs outbound platform calls at debug level
pub fn log_api_call(method: &str, details: Option<&str>) {
    match details {
        Some(d) => debug!("API_CALL: {} - {}", method, d),
        None => debug!("API_CALL: {}", method),
    }
}

/// Logs system events with consistent format
pub fn log_system_event(event: &str, details: Option<&str>) {
    match details {
        Some(d) => info!("SYSTEM: {} - {}", event, d),
        None => info!("SYSTEM: {}", event),
    }
}
