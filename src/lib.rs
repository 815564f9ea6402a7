//! # Footy Roster Bot
//!
//! A Slack bot that runs the weekly football poll for one channel.
//!
//! ## Features
//! - Answer `help`, `when`, `poll` and `teams` mentions
//! - Poll every channel member with Sure!/Nah buttons, edited in place as people answer
//! - Split the players who said yes into two balanced teams
//! - Discard the poll automatically at kickoff each week

/// Mention interpretation, the session coordinator, message copy and webhook routes
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Transport and coordinator error types
pub mod error;
/// Poll roster, responses and team allocation
pub mod poll;
/// Background services: weekly reset, health checks and the match schedule
pub mod services;
/// Slack Web API client and webhook payloads
pub mod slack;
/// Utility functions for datetime formatting and logging
pub mod utils;
