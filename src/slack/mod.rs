//! Slack surface: Web API client, Block Kit builders, inbound payloads.

pub mod blocks;
pub mod client;
pub mod events;
pub mod home;

pub use client::SlackClient;
