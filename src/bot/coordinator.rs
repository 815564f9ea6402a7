//! The session coordinator: the one place poll state is mutated.
//!
//! Chat mentions, button callbacks and the weekly reset timer all arrive
//! concurrently. Every mutation happens under the [`Session`] mutex and the
//! message to send is rendered from that same locked snapshot; the session
//! lock is never held across a platform call. Poll requests are additionally
//! run one at a time under their own lock, from the open-poll check through
//! to recording the displayed message. A reset bumps the session generation
//! so that a send finishing afterwards does not reattach its handle to the
//! new poll.
//!
//! Known limitation: two updates racing for the same displayed message can
//! land out of order, leaving a slightly stale tally on screen until the next
//! button press.

use chrono::Duration;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::bot::commands::{Intent, IntentMatcher};
use crate::bot::messages::{self, OutgoingMessage, POLL_ACTION_NAME, POLL_CALLBACK_ID};
use crate::bot::transport::{ChatTransport, MessageHandle};
use crate::error::BotError;
use crate::poll::{ChannelId, PollState, Response, ResponseChange};
use crate::services::scheduler::{Clock, MatchSchedule, SystemClock};
use crate::slack::{ActionPayload, ChatEvent};
use crate::utils::logging::{log_callback, log_intent, log_poll_event, log_transport_error};

/// Where the session is in the weekly cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No poll since startup or since the last weekly reset.
    NoPoll,
    PollOpen,
}

/// Why an intent was answered with a refusal instead of doing its job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    WrongChannel,
    NotMatchDay,
    PollNotOpen,
}

/// What handling an intent produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    /// A stateless or read-only answer was posted.
    Replied(MessageHandle),
    Rejected {
        reason: Rejection,
        handle: MessageHandle,
    },
    /// A fresh roster was fetched and a new poll posted.
    PollStarted { handle: MessageHandle, members: usize },
    /// The open poll was posted again and the old copy removed.
    PollReposted(MessageHandle),
    /// The channel had nobody in it, so no poll was opened.
    RosterEmpty,
}

/// Why a button press changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NoAction,
    /// The press came from an attachment other than the poll.
    UnknownCallback,
    UnknownAction,
    UnknownValue,
    NoOpenPoll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Ignored(IgnoreReason),
    /// The answer was recorded; `updated` tells whether the displayed poll was edited.
    Recorded { change: ResponseChange, updated: bool },
}

/// Read-only view of the session for health reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollStatus {
    pub phase: Phase,
    pub channel: Option<ChannelId>,
    pub displayed_message: bool,
    pub yes: usize,
    pub no: usize,
    pub unknown: usize,
}

/// Mutable state shared by all handlers.
struct Session {
    poll: Option<PollState>,
    displayed: Option<MessageHandle>,
    /// Bumped whenever the poll is replaced or discarded.
    generation: u64,
    rng: StdRng,
    /// `channel:ts` of recently handled chat events, oldest first.
    recent_events: VecDeque<String>,
}

/// How many handled chat events are remembered for duplicate detection.
const RECENT_EVENTS: usize = 64;

impl Session {
    fn new(rng: StdRng) -> Self {
        Self {
            poll: None,
            displayed: None,
            generation: 0,
            rng,
            recent_events: VecDeque::with_capacity(RECENT_EVENTS),
        }
    }

    /// Returns `false` if this event was already seen.
    fn remember_event(&mut self, key: String) -> bool {
        if self.recent_events.contains(&key) {
            return false;
        }
        if self.recent_events.len() == RECENT_EVENTS {
            self.recent_events.pop_front();
        }
        self.recent_events.push_back(key);
        true
    }

    fn phase(&self) -> Phase {
        match self.poll {
            Some(_) => Phase::PollOpen,
            None => Phase::NoPoll,
        }
    }
}

pub struct Coordinator {
    transport: Arc<dyn ChatTransport>,
    matcher: IntentMatcher,
    schedule: MatchSchedule,
    poll_channel: ChannelId,
    clock: Arc<dyn Clock>,
    session: Mutex<Session>,
    /// Held for the whole of a poll request.
    poll_flow: Mutex<()>,
}

impl Coordinator {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        matcher: IntentMatcher,
        schedule: MatchSchedule,
        poll_channel: ChannelId,
    ) -> Self {
        Self {
            transport,
            matcher,
            schedule,
            poll_channel,
            clock: Arc::new(SystemClock),
            session: Mutex::new(Session::new(StdRng::from_entropy())),
            poll_flow: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the roster shuffling source, e.g. with a seeded one.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.session = Mutex::new(Session::new(rng));
        self
    }

    pub fn schedule(&self) -> &MatchSchedule {
        &self.schedule
    }

    pub fn time_until_next_match(&self) -> Duration {
        self.schedule.time_until_next_match(&self.clock.now())
    }

    fn is_match_day(&self) -> bool {
        self.schedule.is_match_day(&self.clock.now())
    }

    /// Interprets a chat event and handles it if it is a mention of the bot.
    ///
    /// The same message can arrive as both `message` and `app_mention`; only
    /// the first delivery of a given channel and `ts` is handled.
    pub async fn handle_chat_event(
        &self,
        event: &ChatEvent,
    ) -> Option<Result<IntentOutcome, BotError>> {
        let intent = self.matcher.interpret(event)?;
        if let Some(ts) = &event.ts {
            let key = format!("{}:{}", event.channel, ts);
            if !self.session.lock().await.remember_event(key) {
                debug!("Ignoring duplicate delivery of {} in {}", ts, event.channel);
                return None;
            }
        }
        log_intent(
            intent.as_str(),
            event.user.as_ref().map(|u| u.as_str()),
            event.channel.as_str(),
        );
        Some(self.on_intent(intent, &event.channel).await)
    }

    pub async fn on_intent(
        &self,
        intent: Intent,
        channel: &ChannelId,
    ) -> Result<IntentOutcome, BotError> {
        match intent {
            Intent::Help => self.reply(channel, messages::help_message()).await,
            Intent::When => {
                let message = messages::when_message(self.time_until_next_match());
                self.reply(channel, message).await
            }
            Intent::Unknown => self.reply(channel, messages::unknown_message()).await,
            Intent::Poll => self.open_poll(channel).await,
            Intent::Teams => self.show_teams(channel).await,
        }
    }

    async fn reply(
        &self,
        channel: &ChannelId,
        message: OutgoingMessage,
    ) -> Result<IntentOutcome, BotError> {
        let handle = self.send(channel, &message).await?;
        Ok(IntentOutcome::Replied(handle))
    }

    async fn reject(
        &self,
        channel: &ChannelId,
        reason: Rejection,
        message: OutgoingMessage,
    ) -> Result<IntentOutcome, BotError> {
        debug!("Rejecting request in {}: {:?}", channel, reason);
        let handle = self.send(channel, &message).await?;
        Ok(IntentOutcome::Rejected { reason, handle })
    }

    async fn send(
        &self,
        channel: &ChannelId,
        message: &OutgoingMessage,
    ) -> Result<MessageHandle, BotError> {
        self.transport
            .post_message(channel, message)
            .await
            .map_err(|source| BotError::SendFailed {
                channel: channel.clone(),
                source,
            })
    }

    async fn open_poll(&self, channel: &ChannelId) -> Result<IntentOutcome, BotError> {
        if *channel != self.poll_channel {
            let message = messages::wrong_channel_message(&self.poll_channel);
            return self.reject(channel, Rejection::WrongChannel, message).await;
        }
        if !self.is_match_day() {
            let message = messages::poll_unavailable_message(self.schedule.weekday());
            return self.reject(channel, Rejection::NotMatchDay, message).await;
        }

        let _flow = self.poll_flow.lock().await;
        let previous = {
            let session = self.session.lock().await;
            match session.poll {
                Some(_) => session.displayed.clone(),
                None => None,
            }
        };

        match previous {
            None => self.start_fresh_poll(channel).await,
            Some(previous) => self.repost_poll(channel, previous).await,
        }
    }

    async fn start_fresh_poll(&self, channel: &ChannelId) -> Result<IntentOutcome, BotError> {
        let members = self
            .transport
            .channel_members(channel)
            .await
            .map_err(|source| BotError::RosterLookupFailed {
                channel: channel.clone(),
                source,
            })?;

        let (message, generation, count) = {
            let mut session = self.session.lock().await;
            let session = &mut *session;
            session.generation += 1;
            session.displayed = None;

            let mut poll = PollState::new(channel.clone());
            let count = poll.reset_roster(members, &mut session.rng);
            if count == 0 {
                session.poll = None;
                warn!("Channel {} has no members, poll not started", channel);
                return Ok(IntentOutcome::RosterEmpty);
            }
            let message = messages::poll_message(&poll.tally());
            session.poll = Some(poll);
            (message, session.generation, count)
        };
        log_poll_event("roster reset", channel.as_str(), Some(&format!("{count} members")));

        let handle = self.send(channel, &message).await?;
        self.remember_displayed(generation, &handle, &message).await;
        Ok(IntentOutcome::PollStarted {
            handle,
            members: count,
        })
    }

    async fn repost_poll(
        &self,
        channel: &ChannelId,
        previous: MessageHandle,
    ) -> Result<IntentOutcome, BotError> {
        if let Err(source) = self.transport.delete_message(&previous).await {
            let err = BotError::DeleteFailed {
                channel: previous.channel.clone(),
                ts: previous.ts.clone(),
                source,
            };
            log_transport_error("delete superseded poll", &err);
        }

        let snapshot = {
            let mut session = self.session.lock().await;
            let generation = session.generation;
            session.displayed = None;
            session
                .poll
                .as_ref()
                .map(|poll| (messages::poll_message(&poll.tally()), generation))
        };
        // A reset slipped in while the old message was being removed.
        let Some((message, generation)) = snapshot else {
            return self.start_fresh_poll(channel).await;
        };

        let handle = self.send(channel, &message).await?;
        self.remember_displayed(generation, &handle, &message).await;
        log_poll_event("poll reposted", channel.as_str(), None);
        Ok(IntentOutcome::PollReposted(handle))
    }

    /// Records `handle` as the displayed poll, then brings it up to date with
    /// any answers that arrived while `sent` was in flight.
    async fn remember_displayed(
        &self,
        generation: u64,
        handle: &MessageHandle,
        sent: &OutgoingMessage,
    ) {
        let current = {
            let mut session = self.session.lock().await;
            let session = &mut *session;
            match session.poll.as_ref() {
                Some(poll) if session.generation == generation => {
                    session.displayed = Some(handle.clone());
                    messages::poll_message(&poll.tally())
                }
                _ => {
                    debug!("Poll was reset while message {} was being sent", handle.ts);
                    return;
                }
            }
        };
        if current == *sent {
            return;
        }

        debug!("Answers arrived while message {} was being sent", handle.ts);
        if let Err(source) = self.transport.update_message(handle, &current).await {
            let err = BotError::UpdateFailed {
                channel: handle.channel.clone(),
                ts: handle.ts.clone(),
                source,
            };
            log_transport_error("refresh poll after send", &err);
        }
    }

    async fn show_teams(&self, channel: &ChannelId) -> Result<IntentOutcome, BotError> {
        if !self.is_match_day() {
            let message = messages::teams_unavailable_message(self.schedule.weekday());
            return self.reject(channel, Rejection::NotMatchDay, message).await;
        }

        let message = {
            let mut session = self.session.lock().await;
            session.poll.as_mut().map(|poll| {
                let teams = poll.teams();
                messages::teams_message(poll.channel(), teams.as_ref())
            })
        };

        match message {
            Some(message) => self.reply(channel, message).await,
            None => {
                self.reject(channel, Rejection::PollNotOpen, messages::no_poll_message())
                    .await
            }
        }
    }

    /// Applies a poll button press and edits the displayed poll in place.
    pub async fn on_callback(&self, payload: &ActionPayload) -> Result<CallbackOutcome, BotError> {
        let user = payload.user.id.as_str();
        let Some(action) = payload.first_action() else {
            return Ok(CallbackOutcome::Ignored(IgnoreReason::NoAction));
        };
        if payload
            .callback_id
            .as_deref()
            .is_some_and(|id| id != POLL_CALLBACK_ID)
        {
            log_callback(&action.name, &action.value, user, "ignored: unknown callback");
            return Ok(CallbackOutcome::Ignored(IgnoreReason::UnknownCallback));
        }
        if action.name != POLL_ACTION_NAME {
            log_callback(&action.name, &action.value, user, "ignored: unknown action");
            return Ok(CallbackOutcome::Ignored(IgnoreReason::UnknownAction));
        }
        let response = match action.value.parse::<Response>() {
            Ok(Response::Unknown) | Err(_) => {
                log_callback(&action.name, &action.value, user, "ignored: unknown value");
                return Ok(CallbackOutcome::Ignored(IgnoreReason::UnknownValue));
            }
            Ok(response) => response,
        };

        let (change, message, displayed) = {
            let mut session = self.session.lock().await;
            let session = &mut *session;
            let Some(poll) = session.poll.as_mut() else {
                log_callback(&action.name, &action.value, user, "ignored: no open poll");
                return Ok(CallbackOutcome::Ignored(IgnoreReason::NoOpenPoll));
            };
            let change = poll.record_response(payload.user.id.clone(), response);
            (change, messages::poll_message(&poll.tally()), session.displayed.clone())
        };
        log_callback(&action.name, &action.value, user, &format!("recorded: {change:?}"));

        let Some(handle) = displayed else {
            warn!("No poll message on display to update");
            return Ok(CallbackOutcome::Recorded {
                change,
                updated: false,
            });
        };

        self.transport
            .update_message(&handle, &message)
            .await
            .map_err(|source| BotError::UpdateFailed {
                channel: handle.channel.clone(),
                ts: handle.ts.clone(),
                source,
            })?;

        Ok(CallbackOutcome::Recorded {
            change,
            updated: true,
        })
    }

    /// Discards the poll and forgets the displayed message. Run once a week at kickoff.
    pub async fn reset_cycle(&self) {
        let mut session = self.session.lock().await;
        let was_open = session.poll.is_some();
        session.poll = None;
        session.displayed = None;
        session.generation += 1;
        log_poll_event(
            "weekly reset",
            self.poll_channel.as_str(),
            Some(if was_open { "open poll discarded" } else { "no poll to discard" }),
        );
    }

    pub async fn status(&self) -> PollStatus {
        let session = self.session.lock().await;
        let tally = session.poll.as_ref().map(|p| p.tally()).unwrap_or_default();
        PollStatus {
            phase: session.phase(),
            channel: session.poll.as_ref().map(|p| p.channel().clone()),
            displayed_message: session.displayed.is_some(),
            yes: tally.yes.len(),
            no: tally.no.len(),
            unknown: tally.unknown.len(),
        }
    }
}
