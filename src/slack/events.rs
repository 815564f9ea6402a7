//! Payloads Slack posts to our webhooks.
//!
//! - `/slack/events` receives Events API envelopes (`url_verification` and
//!   `event_callback` wrapping `message` / `app_mention` events)
//! - `/slack/action` receives interactive-message callbacks as a form field
//!   named `payload` holding JSON

use serde::{Deserialize, Serialize};

use crate::poll::{ChannelId, MemberId};

/// Subtypes that describe edits or deletions rather than a person talking.
const IGNORED_SUBTYPES: [&str; 2] = ["message_changed", "message_deleted"];

/// Outer Events API envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    /// Sent once when the request URL is configured; the challenge must be echoed.
    UrlVerification { challenge: String },
    EventCallback {
        event: serde_json::Value,
        #[serde(default)]
        event_id: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

/// A chat message event addressed to, or seen by, the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    /// `message` or `app_mention`.
    #[serde(rename = "type")]
    pub event_type: String,
    pub channel: ChannelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<MemberId>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
}

impl ChatEvent {
    /// A message in `channel` from `user` saying `text`.
    pub fn message(channel: &str, user: &str, text: &str) -> Self {
        Self {
            event_type: "message".to_string(),
            channel: ChannelId::new(channel),
            user: Some(MemberId::new(user)),
            text: text.to_string(),
            subtype: None,
            bot_id: None,
            ts: None,
        }
    }

    pub fn is_chat_message(&self) -> bool {
        matches!(self.event_type.as_str(), "message" | "app_mention")
    }

    pub fn is_bot_message(&self) -> bool {
        self.bot_id.is_some() || self.subtype.as_deref() == Some("bot_message")
    }

    /// Edits, deletions and bot posts are never commands.
    pub fn is_system_generated(&self) -> bool {
        self.is_bot_message()
            || self
                .subtype
                .as_deref()
                .is_some_and(|s| IGNORED_SUBTYPES.contains(&s))
    }
}

/// The `payload` form field of an interactive-message callback.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionForm {
    pub payload: String,
}

/// Decoded interactive-message callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPayload {
    #[serde(default)]
    pub actions: Vec<ActionInvocation>,
    pub user: ActionUser,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
}

impl ActionPayload {
    pub fn new(user: &str, name: &str, value: &str) -> Self {
        Self {
            actions: vec![ActionInvocation {
                name: name.to_string(),
                value: value.to_string(),
            }],
            user: ActionUser {
                id: MemberId::new(user),
                name: None,
            },
            callback_id: None,
        }
    }

    /// Only the first action is meaningful for button presses.
    pub fn first_action(&self) -> Option<&ActionInvocation> {
        self.actions.first()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionInvocation {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionUser {
    pub id: MemberId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_verification_envelope() {
        let envelope: EventEnvelope = serde_json::from_value(json!({
            "type": "url_verification",
            "token": "t",
            "challenge": "abc123"
        }))
        .unwrap();

        assert!(matches!(
            envelope,
            EventEnvelope::UrlVerification { challenge } if challenge == "abc123"
        ));
    }

    #[test]
    fn test_unknown_envelope_type() {
        let envelope: EventEnvelope =
            serde_json::from_value(json!({"type": "app_rate_limited"})).unwrap();
        assert!(matches!(envelope, EventEnvelope::Unknown));
    }

    #[test]
    fn test_message_changed_is_system_generated() {
        let event: ChatEvent = serde_json::from_value(json!({
            "type": "message",
            "subtype": "message_changed",
            "channel": "C1",
            "message": {"text": "<@UBOT> poll"}
        }))
        .unwrap();

        assert!(event.is_system_generated());
        assert_eq!(event.text, "");
    }

    #[test]
    fn test_bot_message_detection() {
        let mut event = ChatEvent::message("C1", "U1", "hi");
        assert!(!event.is_bot_message());
        assert!(!event.is_system_generated());

        event.bot_id = Some("B1".to_string());
        assert!(event.is_bot_message());
        assert!(event.is_system_generated());

        let mut legacy = ChatEvent::message("C1", "U1", "hi");
        legacy.subtype = Some("bot_message".to_string());
        assert!(legacy.is_bot_message());
        assert!(legacy.is_system_generated());
    }

    #[test]
    fn test_action_payload_decoding() {
        let payload: ActionPayload = serde_json::from_str(
            r#"{"actions":[{"name":"weekly_game_res","type":"button","value":"yes"}],
                "callback_id":"weekly_game",
                "user":{"id":"U7","name":"sam"}}"#,
        )
        .unwrap();

        let action = payload.first_action().unwrap();
        assert_eq!(action.name, "weekly_game_res");
        assert_eq!(action.value, "yes");
        assert_eq!(payload.user.id, MemberId::new("U7"));
    }
}
