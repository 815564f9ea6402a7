use serde::Serialize;

use crate::poll::member::MemberId;
use crate::poll::state::{PollEntry, Response};

/// Fewest YES answers needed before teams can be picked.
pub const MIN_PLAYERS: usize = 4;

/// The two sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    fn for_position(position: usize) -> Self {
        if position % 2 == 0 {
            Side::Home
        } else {
            Side::Away
        }
    }

    fn other(self) -> Self {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

/// Players split into home and away, each in position order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamAssignment {
    pub home: Vec<MemberId>,
    pub away: Vec<MemberId>,
}

impl TeamAssignment {
    fn side(&self, side: Side) -> &Vec<MemberId> {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut Vec<MemberId> {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }

    pub fn len(&self) -> usize {
        self.home.len() + self.away.len()
    }

    pub fn is_empty(&self) -> bool {
        self.home.is_empty() && self.away.is_empty()
    }
}

/// Splits the YES respondents into two teams whose sizes differ by at most one.
///
/// Slots are walked in `position` order. A player at position `p` joins the
/// side picked by `p % 2` unless that side is already strictly larger, in
/// which case they join the other one. Equal counts follow parity.
pub fn allocate(entries: &[PollEntry]) -> Option<TeamAssignment> {
    let players = entries
        .iter()
        .filter(|e| e.response == Response::Yes)
        .count();
    if players < MIN_PLAYERS {
        return None;
    }

    let len = entries.iter().map(|e| e.position + 1).max().unwrap_or(0);
    let mut slots: Vec<Option<&MemberId>> = vec![None; len];
    for entry in entries.iter().filter(|e| e.response == Response::Yes) {
        slots[entry.position] = Some(&entry.member);
    }

    let mut teams = TeamAssignment::default();
    for (position, member) in slots.into_iter().enumerate() {
        let Some(member) = member else { continue };
        let mut side = Side::for_position(position);
        if teams.side(side).len() > teams.side(side.other()).len() {
            side = side.other();
        }
        teams.side_mut(side).push(member.clone());
    }

    Some(teams)
}
