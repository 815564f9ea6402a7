use regex::Regex;
use std::fmt;

use crate::poll::MemberId;
use crate::slack::ChatEvent;

/// What a direct mention is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Help,
    When,
    Poll,
    Teams,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Help => "help",
            Intent::When => "when",
            Intent::Poll => "poll",
            Intent::Teams => "teams",
            Intent::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword rules, checked in order. A keyword must follow whitespace and end
/// at a word boundary, so `help!` matches but `helpful` does not.
const RULES: [(Intent, &str); 4] = [
    (Intent::Help, r"(?i)\shelp(\W|\b)"),
    (Intent::When, r"(?i)\s(when|time|game|match)(\W|\b)"),
    (Intent::Poll, r"(?i)\spoll(\W|\b)"),
    (Intent::Teams, r"(?i)\steams?(\W|\b)"),
];

/// Classifies chat messages that mention the bot.
#[derive(Debug, Clone)]
pub struct IntentMatcher {
    self_mention: String,
    rules: Vec<(Intent, Regex)>,
}

impl IntentMatcher {
    pub fn new(self_id: &MemberId) -> Result<Self, regex::Error> {
        let rules = RULES
            .iter()
            .map(|(intent, pattern)| Regex::new(pattern).map(|re| (*intent, re)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            self_mention: self_id.mention(),
            rules,
        })
    }

    /// `None` for anything that is not a person mentioning the bot.
    pub fn interpret(&self, event: &ChatEvent) -> Option<Intent> {
        if event.is_system_generated() || !event.text.contains(&self.self_mention) {
            return None;
        }
        Some(self.classify(&event.text))
    }

    pub fn classify(&self, text: &str) -> Intent {
        self.rules
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(intent, _)| *intent)
            .unwrap_or(Intent::Unknown)
    }
}
