//! Everything the bot says, rendered as pure functions of poll state.
//!
//! The attachment shapes follow Slack's legacy interactive messages: the poll
//! carries two buttons named [`POLL_ACTION_NAME`] whose values are the
//! [`Response`] strings, and the "Nah" button asks for confirmation.

use chrono::{Duration, Weekday};
use serde::{Deserialize, Serialize};

use crate::poll::{ChannelId, MemberId, Response, Tally, TeamAssignment};
use crate::utils::datetime::{format_countdown, weekday_name};

/// `callback_id` of the poll attachment.
pub const POLL_CALLBACK_ID: &str = "weekly_game";
/// `name` shared by both poll buttons.
pub const POLL_ACTION_NAME: &str = "weekly_game_res";

/// A message ready to be posted: headline text plus optional attachments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub headline: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl OutgoingMessage {
    pub fn headline(text: impl Into<String>) -> Self {
        Self {
            headline: text.into(),
            attachments: Vec::new(),
        }
    }

    fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

impl Attachment {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fallback: None,
            callback_id: None,
            attachment_type: None,
            actions: Vec::new(),
        }
    }
}

/// An interactive button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub text: String,
    #[serde(rename = "type")]
    pub action_type: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm: Option<Confirm>,
}

impl Action {
    fn button(text: &str, response: Response) -> Self {
        Self {
            name: POLL_ACTION_NAME.to_string(),
            text: text.to_string(),
            action_type: "button".to_string(),
            value: response.as_str().to_string(),
            confirm: None,
        }
    }
}

/// Confirmation dialog shown before a button press is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confirm {
    pub title: String,
    pub text: String,
    pub ok_text: String,
    pub dismiss_text: String,
}

fn mentions(members: &[MemberId]) -> String {
    members
        .iter()
        .map(MemberId::mention)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn help_message() -> OutgoingMessage {
    OutgoingMessage::headline("Supported commands: *help, when, poll, teams*")
}

pub fn when_message(until_kickoff: Duration) -> OutgoingMessage {
    OutgoingMessage::headline(format!(
        "The next game will be in {}",
        format_countdown(until_kickoff)
    ))
}

pub fn unknown_message() -> OutgoingMessage {
    OutgoingMessage::headline("Not sure what you mean. Try `@Footy Manager Bot help`")
}

pub fn wrong_channel_message(poll_channel: &ChannelId) -> OutgoingMessage {
    OutgoingMessage::headline(format!(
        "Sorry, I can only start a poll in {}",
        poll_channel.link()
    ))
}

pub fn poll_unavailable_message(match_day: Weekday) -> OutgoingMessage {
    OutgoingMessage::headline(format!(
        "Poll not available until next {}",
        weekday_name(match_day)
    ))
}

pub fn teams_unavailable_message(match_day: Weekday) -> OutgoingMessage {
    OutgoingMessage::headline(format!(
        "Teams not available until next {}",
        weekday_name(match_day)
    ))
}

pub fn no_poll_message() -> OutgoingMessage {
    OutgoingMessage::headline("No poll has been started this week!")
}

pub fn poll_message(tally: &Tally) -> OutgoingMessage {
    let text = format!(
        ":+1: Sure!    `{}`\n{}\n\n:-1: Nah    `{}`\n{}\n\n:question: No answer    `{}`\n{}",
        tally.yes.len(),
        mentions(&tally.yes),
        tally.no.len(),
        mentions(&tally.no),
        tally.unknown.len(),
        mentions(&tally.unknown),
    );

    let mut nah = Action::button("Nah", Response::No);
    nah.confirm = Some(Confirm {
        title: "Are you sure?".to_string(),
        text: "Why not, the more the merrier!".to_string(),
        ok_text: "I'm sure".to_string(),
        dismiss_text: "No, wait!".to_string(),
    });

    OutgoingMessage::headline("Ok - who's coming to the match tonight?").with_attachment(
        Attachment {
            text,
            fallback: Some("You cannot choose an option at this time".to_string()),
            callback_id: Some(POLL_CALLBACK_ID.to_string()),
            attachment_type: Some("default".to_string()),
            actions: vec![Action::button("Sure!", Response::Yes), nah],
        },
    )
}

pub fn teams_message(channel: &ChannelId, teams: Option<&TeamAssignment>) -> OutgoingMessage {
    match teams {
        Some(teams) => OutgoingMessage::headline(format!("Teams so far in {}:", channel.link()))
            .with_attachment(Attachment::text(format!(
                ":house: Home    `{}`\n{}\n\n:car: Away    `{}`\n{}",
                teams.home.len(),
                mentions(&teams.home),
                teams.away.len(),
                mentions(&teams.away),
            ))),
        None => OutgoingMessage::headline("Not enough players! :slightly_frowning_face:"),
    }
}
