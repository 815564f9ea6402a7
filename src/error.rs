//! Error types for the chat transport and the poll coordinator.
//!
//! Collaborator failures surface as [`TransportError`]; the coordinator wraps
//! them in a [`BotError`] naming which operation failed. Neither is retried:
//! the webhook layer logs them and moves on.

use thiserror::Error;

use crate::poll::ChannelId;

/// Failures talking to the chat platform.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The platform answered but rejected the call (e.g. `channel_not_found`).
    #[error("API error: {code}")]
    Api { code: String },

    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("JSON error: {0}")]
    Json(String),

    /// The response parsed but lacked a field we rely on.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            TransportError::Json(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Json(err.to_string())
    }
}

/// A coordinator operation that could not complete because a collaborator failed.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Roster lookup failed for channel {channel}: {source}")]
    RosterLookupFailed {
        channel: ChannelId,
        source: TransportError,
    },

    #[error("Sending message to channel {channel} failed: {source}")]
    SendFailed {
        channel: ChannelId,
        source: TransportError,
    },

    #[error("Updating message {ts} in channel {channel} failed: {source}")]
    UpdateFailed {
        channel: ChannelId,
        ts: String,
        source: TransportError,
    },

    #[error("Deleting message {ts} in channel {channel} failed: {source}")]
    DeleteFailed {
        channel: ChannelId,
        ts: String,
        source: TransportError,
    },
}

impl BotError {
    /// Short stable name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            BotError::RosterLookupFailed { .. } => "RosterLookupFailed",
            BotError::SendFailed { .. } => "SendFailed",
            BotError::UpdateFailed { .. } => "UpdateFailed",
            BotError::DeleteFailed { .. } => "DeleteFailed",
        }
    }
}

/// A button value that is not one of the poll answers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown response value: '{0}'")]
pub struct ParseResponseError(pub String);
