//! Parrot - a Discord bot that turns `author > text` messages into citations.

pub mod config;
pub mod discord;
pub mod discord_log;
pub mod listing;
pub mod quote;
pub mod setup;
