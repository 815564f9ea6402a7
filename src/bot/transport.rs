//! The chat platform as seen by the poll coordinator.
//!
//! Everything here is I/O owned by someone else: listing who is in a channel
//! and posting, editing or removing a message. The Slack Web API client in
//! [`crate::slack`] is the production implementation; tests substitute an
//! in-memory recorder.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::bot::messages::OutgoingMessage;
use crate::error::TransportError;
use crate::poll::{ChannelId, MemberId};

/// Where a posted message lives, needed to edit or delete it later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle {
    pub channel: ChannelId,
    /// Platform timestamp identifying the message within its channel.
    pub ts: String,
}

impl MessageHandle {
    pub fn new(channel: ChannelId, ts: impl Into<String>) -> Self {
        Self {
            channel,
            ts: ts.into(),
        }
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Current members of `channel`.
    async fn channel_members(&self, channel: &ChannelId) -> Result<Vec<MemberId>, TransportError>;

    async fn post_message(
        &self,
        channel: &ChannelId,
        message: &OutgoingMessage,
    ) -> Result<MessageHandle, TransportError>;

    /// Replaces the content of a previously posted message in place.
    async fn update_message(
        &self,
        handle: &MessageHandle,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError>;

    async fn delete_message(&self, handle: &MessageHandle) -> Result<(), TransportError>;
}
