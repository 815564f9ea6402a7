use anyhow::{anyhow, Result};
use chrono::{NaiveTime, Weekday};
use std::env;
use std::fmt;

use crate::poll::ChannelId;
use crate::services::scheduler::MatchSchedule;
use crate::slack::client::DEFAULT_API_BASE_URL;

const DEFAULT_HTTP_PORT: &str = "8081";
const DEFAULT_MATCH_WEEKDAY: &str = "tue";
const DEFAULT_KICKOFF_TIME: &str = "18:30";

#[derive(Clone)]
pub struct Config {
    pub slack_bot_token: String,
    pub football_channel: ChannelId,
    pub http_port: u16,
    pub slack_api_base_url: String,
    pub match_weekday: Weekday,
    pub kickoff_time: NaiveTime,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("slack_bot_token", &"[REDACTED]")
            .field("football_channel", &self.football_channel)
            .field("http_port", &self.http_port)
            .field("slack_api_base_url", &self.slack_api_base_url)
            .field("match_weekday", &self.match_weekday)
            .field("kickoff_time", &self.kickoff_time)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let token = required("SLACK_BOT_TOKEN")?;
        let channel = required("FOOTBALL_CHANNEL_ID")?;

        let http_port = with_default("HTTP_PORT", DEFAULT_HTTP_PORT)
            .parse()
            .map_err(|_| anyhow!("Invalid HTTP_PORT"))?;

        let slack_api_base_url = with_default("SLACK_API_BASE_URL", DEFAULT_API_BASE_URL);

        let match_weekday = with_default("MATCH_WEEKDAY", DEFAULT_MATCH_WEEKDAY)
            .parse::<Weekday>()
            .map_err(|_| anyhow!("Invalid MATCH_WEEKDAY"))?;

        let kickoff_time = NaiveTime::parse_from_str(
            &with_default("KICKOFF_TIME", DEFAULT_KICKOFF_TIME),
            "%H:%M",
        )
        .map_err(|_| anyhow!("Invalid KICKOFF_TIME"))?;

        Ok(Config {
            slack_bot_token: token,
            football_channel: ChannelId::new(channel),
            http_port,
            slack_api_base_url,
            match_weekday,
            kickoff_time,
        })
    }

    pub fn schedule(&self) -> MatchSchedule {
        MatchSchedule::new(self.match_weekday, self.kickoff_time)
    }
}

fn required(name: &str) -> Result<String> {
    let value = env::var(name).map_err(|_| anyhow!("{} must be set", name))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(anyhow!("{} must be set", name));
    }
    Ok(value.to_string())
}

/// Trimmed value of `name`, or `default` when unset or blank.
fn with_default(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
