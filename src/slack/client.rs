//! Slack Web API client backing [`ChatTransport`].
//!
//! Write methods (`chat.*`) are JSON POSTs; `conversations.members` is a
//! paginated GET. Every call is made once: rate limits and `ok: false`
//! answers come back as [`TransportError`] for the caller to log.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::bot::messages::OutgoingMessage;
use crate::bot::transport::{ChatTransport, MessageHandle};
use crate::error::TransportError;
use crate::poll::{ChannelId, MemberId};
use crate::utils::logging::log_api_call;

pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Page size requested from `conversations.members`.
const MEMBERS_PAGE_LIMIT: &str = "200";

#[derive(Debug, Deserialize)]
struct AuthTestResponse {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct MembersResponse {
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ts: String,
}

pub struct SlackClient {
    client: reqwest::Client,
    base_url: String,
    bot_token: String,
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("base_url", &self.base_url)
            .field("bot_token", &"[REDACTED]")
            .finish()
    }
}

impl SlackClient {
    pub fn new(
        base_url: impl Into<String>,
        bot_token: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                TransportError::Network(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        })
    }

    /// The bot's own user id, used to recognise direct mentions.
    pub async fn auth_test(&self) -> Result<MemberId, TransportError> {
        let response: AuthTestResponse = self
            .post_json("auth.test", &serde_json::json!({}))
            .await?;
        Ok(MemberId::new(response.user_id))
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<T, TransportError> {
        log_api_call(method, None);
        let response = self
            .client
            .post(self.url(method))
            .bearer_auth(&self.bot_token)
            .json(payload)
            .send()
            .await?;
        Self::read_response(response).await
    }

    async fn get_query<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TransportError> {
        log_api_call(method, None);
        let response = self
            .client
            .get(self.url(method))
            .bearer_auth(&self.bot_token)
            .query(query)
            .send()
            .await?;
        Self::read_response(response).await
    }

    async fn read_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(30);
            return Err(TransportError::RateLimited { retry_after_secs });
        }

        if !response.status().is_success() {
            return Err(TransportError::Api {
                code: format!("http_{}", response.status().as_u16()),
            });
        }

        let body: serde_json::Value = response.json().await?;
        if body.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let code = body
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown")
                .to_string();
            return Err(TransportError::Api { code });
        }

        Ok(serde_json::from_value(body)?)
    }

    fn message_body(
        channel: &ChannelId,
        ts: Option<&str>,
        message: &OutgoingMessage,
    ) -> Result<serde_json::Value, TransportError> {
        let mut body = serde_json::json!({
            "channel": channel.as_str(),
            "text": message.headline,
            "attachments": serde_json::to_value(&message.attachments)?,
        });
        if let Some(ts) = ts {
            body["ts"] = serde_json::json!(ts);
        }
        Ok(body)
    }
}

#[async_trait]
impl ChatTransport for SlackClient {
    async fn channel_members(&self, channel: &ChannelId) -> Result<Vec<MemberId>, TransportError> {
        let mut members = Vec::new();
        let mut cursor = String::new();

        loop {
            let mut query = vec![("channel", channel.as_str()), ("limit", MEMBERS_PAGE_LIMIT)];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.as_str()));
            }
            let page: MembersResponse = self.get_query("conversations.members", &query).await?;
            members.extend(page.members.into_iter().map(MemberId::new));

            match page.response_metadata {
                Some(meta) if !meta.next_cursor.is_empty() => cursor = meta.next_cursor,
                _ => break,
            }
        }

        Ok(members)
    }

    async fn post_message(
        &self,
        channel: &ChannelId,
        message: &OutgoingMessage,
    ) -> Result<MessageHandle, TransportError> {
        let body = Self::message_body(channel, None, message)?;
        let response: PostMessageResponse = self.post_json("chat.postMessage", &body).await?;
        if response.ts.is_empty() {
            return Err(TransportError::InvalidResponse(
                "Missing ts in response".to_string(),
            ));
        }
        Ok(MessageHandle::new(channel.clone(), response.ts))
    }

    async fn update_message(
        &self,
        handle: &MessageHandle,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError> {
        let body = Self::message_body(&handle.channel, Some(&handle.ts), message)?;
        let _: serde_json::Value = self.post_json("chat.update", &body).await?;
        Ok(())
    }

    async fn delete_message(&self, handle: &MessageHandle) -> Result<(), TransportError> {
        let body = serde_json::json!({
            "channel": handle.channel.as_str(),
            "ts": handle.ts,
        });
        let _: serde_json::Value = self.post_json("chat.delete", &body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let client = SlackClient::new(DEFAULT_API_BASE_URL, "xoxb-secret").unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("xoxb-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_url_joins_method_without_double_slash() {
        let client = SlackClient::new("http://localhost:9999/api/", "xoxb-t").unwrap();
        assert_eq!(client.url("chat.update"), "http://localhost:9999/api/chat.update");
    }

    #[test]
    fn test_message_body_includes_ts_only_for_updates() {
        let message = OutgoingMessage::headline("hello");
        let channel = ChannelId::new("C1");

        let post = SlackClient::message_body(&channel, None, &message).unwrap();
        assert!(post.get("ts").is_none());
        assert_eq!(post["text"], "hello");

        let update = SlackClient::message_body(&channel, Some("1.5"), &message).unwrap();
        assert_eq!(update["ts"], "1.5");
        assert_eq!(update["attachments"], serde_json::json!([]));
    }
}
