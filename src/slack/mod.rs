//! Slack specifics: the Web API client and the inbound webhook payloads.

pub mod client;
pub mod events;

pub use client::SlackClient;
pub use events::{ActionForm, ActionPayload, ChatEvent, EventEnvelope};
