#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveTime, Weekday};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use footy_roster_bot::bot::messages::OutgoingMessage;
use footy_roster_bot::bot::{ChatTransport, Coordinator, IntentMatcher, MessageHandle};
use footy_roster_bot::error::TransportError;
use footy_roster_bot::poll::{ChannelId, MemberId};
use footy_roster_bot::services::{Clock, MatchSchedule};

pub const BOT_ID: &str = "UBOT";
pub const FOOTBALL_CHANNEL: &str = "CFOOTY";

/// A Monday and the Tuesday after it, both mid-morning.
pub const MONDAY: &str = "2024-01-01T10:00:00+00:00";
pub const TUESDAY: &str = "2024-01-02T10:00:00+00:00";

/// Every call the coordinator made, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Members(ChannelId),
    Post {
        channel: ChannelId,
        message: OutgoingMessage,
    },
    Update {
        handle: MessageHandle,
        message: OutgoingMessage,
    },
    Delete(MessageHandle),
}

/// In-memory chat platform that records calls and hands out increasing timestamps.
#[derive(Default)]
pub struct RecordingTransport {
    members: Mutex<Vec<MemberId>>,
    calls: Mutex<Vec<Call>>,
    next_ts: AtomicU64,
    pub fail_members: AtomicBool,
    pub fail_posts: AtomicBool,
    pub fail_updates: AtomicBool,
    pub fail_deletes: AtomicBool,
    /// How long `post_message` takes to answer, in milliseconds.
    pub post_delay_ms: AtomicU64,
}

impl RecordingTransport {
    pub fn with_members(ids: &[&str]) -> Self {
        let transport = Self::default();
        transport.set_members(ids);
        transport
    }

    pub fn set_members(&self, ids: &[&str]) {
        *self.members.lock().unwrap() = ids.iter().map(|id| MemberId::new(*id)).collect();
    }

    pub fn slow_posts(&self, millis: u64) {
        self.post_delay_ms.store(millis, Ordering::SeqCst);
    }

    pub fn deletes(&self) -> Vec<MessageHandle> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete(handle) => Some(handle),
                _ => None,
            })
            .collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn posts(&self) -> Vec<OutgoingMessage> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Post { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn last_post(&self) -> OutgoingMessage {
        self.posts().pop().expect("no message was posted")
    }

    pub fn updates(&self) -> Vec<(MessageHandle, OutgoingMessage)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Update { handle, message } => Some((handle, message)),
                _ => None,
            })
            .collect()
    }

    pub fn member_lookups(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Members(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn refused(flag: &AtomicBool) -> Result<(), TransportError> {
        if flag.load(Ordering::SeqCst) {
            Err(TransportError::Api {
                code: "not_allowed".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn channel_members(&self, channel: &ChannelId) -> Result<Vec<MemberId>, TransportError> {
        self.record(Call::Members(channel.clone()));
        Self::refused(&self.fail_members)?;
        Ok(self.members.lock().unwrap().clone())
    }

    async fn post_message(
        &self,
        channel: &ChannelId,
        message: &OutgoingMessage,
    ) -> Result<MessageHandle, TransportError> {
        self.record(Call::Post {
            channel: channel.clone(),
            message: message.clone(),
        });
        let delay = self.post_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Self::refused(&self.fail_posts)?;
        let ts = self.next_ts.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MessageHandle::new(channel.clone(), format!("{ts}.000")))
    }

    async fn update_message(
        &self,
        handle: &MessageHandle,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError> {
        self.record(Call::Update {
            handle: handle.clone(),
            message: message.clone(),
        });
        Self::refused(&self.fail_updates)
    }

    async fn delete_message(&self, handle: &MessageHandle) -> Result<(), TransportError> {
        self.record(Call::Delete(handle.clone()));
        Self::refused(&self.fail_deletes)
    }
}

/// A clock that stays where it is put.
pub struct FixedClock(Mutex<DateTime<FixedOffset>>);

impl FixedClock {
    pub fn at(rfc3339: &str) -> Self {
        Self(Mutex::new(DateTime::parse_from_rfc3339(rfc3339).unwrap()))
    }

    pub fn set(&self, rfc3339: &str) {
        *self.0.lock().unwrap() = DateTime::parse_from_rfc3339(rfc3339).unwrap();
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.0.lock().unwrap()
    }
}

pub fn tuesday_schedule() -> MatchSchedule {
    MatchSchedule::new(Weekday::Tue, NaiveTime::from_hms_opt(18, 30, 0).unwrap())
}

pub fn football_channel() -> ChannelId {
    ChannelId::new(FOOTBALL_CHANNEL)
}

pub fn coordinator(transport: Arc<RecordingTransport>, clock: Arc<FixedClock>) -> Coordinator {
    Coordinator::new(
        transport,
        IntentMatcher::new(&MemberId::new(BOT_ID)).unwrap(),
        tuesday_schedule(),
        football_channel(),
    )
    .with_clock(clock)
    .with_rng(StdRng::seed_from_u64(7))
}

/// Text of the first attachment, where the poll and team lists live.
pub fn attachment_text(message: &OutgoingMessage) -> &str {
    message
        .attachments
        .first()
        .map(|a| a.text.as_str())
        .unwrap_or("")
}
