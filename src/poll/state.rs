use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseResponseError;
use crate::poll::member::{ChannelId, MemberId};
use crate::poll::teams::{allocate, TeamAssignment};

/// A member's answer to the weekly poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    #[default]
    Unknown,
    Yes,
    No,
}

impl Response {
    pub fn as_str(&self) -> &'static str {
        match self {
            Response::Unknown => "unknown",
            Response::Yes => "yes",
            Response::No => "no",
        }
    }

    /// Whether moving from `self` to `next` can change who is eligible for a team.
    ///
    /// Opting out while still unanswered leaves the YES set untouched.
    pub fn affects_teams(self, next: Response) -> bool {
        self != next && !(self == Response::Unknown && next == Response::No)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Response {
    type Err = ParseResponseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknown" => Ok(Response::Unknown),
            "yes" => Ok(Response::Yes),
            "no" => Ok(Response::No),
            other => Err(ParseResponseError(other.to_string())),
        }
    }
}

/// One roster member's slot in the poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollEntry {
    pub member: MemberId,
    /// Stable ordering used for team derivation, fixed when the entry is created.
    pub position: usize,
    pub response: Response,
}

/// What a call to [`PollState::record_response`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseChange {
    /// Same answer as before; nothing touched.
    Unchanged,
    Updated { from: Response, to: Response },
    /// Member was not on the roster and got appended at `position`.
    Added { position: usize },
}

/// Members partitioned by their answer, in roster iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub yes: Vec<MemberId>,
    pub no: Vec<MemberId>,
    pub unknown: Vec<MemberId>,
}

/// Roster-to-response mapping for one channel plus the cached team split.
#[derive(Debug, Clone)]
pub struct PollState {
    channel: ChannelId,
    entries: Vec<PollEntry>,
    cached_teams: Option<TeamAssignment>,
}

impl PollState {
    pub fn new(channel: ChannelId) -> Self {
        Self {
            channel,
            entries: Vec::new(),
            cached_teams: None,
        }
    }

    /// Replaces the roster with `members`, every answer reset to [`Response::Unknown`].
    ///
    /// Positions are a uniformly random permutation of `0..n` drawn from `rng`.
    /// Duplicate ids keep their first occurrence. Returns the number of members
    /// now on the roster; zero means the poll is still not started.
    pub fn reset_roster<R>(&mut self, members: Vec<MemberId>, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        let mut seen = HashSet::new();
        let members: Vec<MemberId> = members
            .into_iter()
            .filter(|m| seen.insert(m.clone()))
            .collect();

        let mut positions: Vec<usize> = (0..members.len()).collect();
        positions.shuffle(rng);

        self.entries = members
            .into_iter()
            .zip(positions)
            .map(|(member, position)| PollEntry {
                member,
                position,
                response: Response::Unknown,
            })
            .collect();
        self.cached_teams = None;

        self.entries.len()
    }

    /// Records `member`'s answer, appending them if they were not on the roster.
    pub fn record_response(&mut self, member: MemberId, response: Response) -> ResponseChange {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.member == member) {
            let from = entry.response;
            if from == response {
                return ResponseChange::Unchanged;
            }
            entry.response = response;
            if from.affects_teams(response) {
                self.cached_teams = None;
            }
            return ResponseChange::Updated { from, to: response };
        }

        let position = self
            .entries
            .iter()
            .map(|e| e.position + 1)
            .max()
            .unwrap_or(0);
        self.entries.push(PollEntry {
            member,
            position,
            response,
        });
        if Response::Unknown.affects_teams(response) {
            self.cached_teams = None;
        }
        ResponseChange::Added { position }
    }

    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for entry in &self.entries {
            let bucket = match entry.response {
                Response::Yes => &mut tally.yes,
                Response::No => &mut tally.no,
                Response::Unknown => &mut tally.unknown,
            };
            bucket.push(entry.member.clone());
        }
        tally
    }

    /// Current team split, derived on demand and cached until a response
    /// change could alter it. `None` while fewer than four players said yes.
    pub fn teams(&mut self) -> Option<TeamAssignment> {
        if let Some(teams) = &self.cached_teams {
            return Some(teams.clone());
        }
        let teams = allocate(&self.entries)?;
        self.cached_teams = Some(teams.clone());
        Some(teams)
    }

    pub fn cached_teams(&self) -> Option<&TeamAssignment> {
        self.cached_teams.as_ref()
    }

    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub fn entries(&self) -> &[PollEntry] {
        &self.entries
    }

    pub fn entry(&self, member: &MemberId) -> Option<&PollEntry> {
        self.entries.iter().find(|e| &e.member == member)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
