//! Capabilities the quote pipeline needs from the chat platform.

use std::fmt;

use async_trait::async_trait;

use super::citation::Citation;
use super::message::{ChannelMessage, ChannelRef};

/// Errors reported by a platform capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The bot lacks the rights for this action.
    PermissionDenied(String),
    /// Anything else (network, unknown channel, API errors).
    Other(String),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied(msg) => write!(f, "permission denied: {}", msg),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for PlatformError {}

#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Up to `limit` messages strictly older than `before`, newest first.
    async fn fetch_history(
        &self,
        channel: ChannelRef,
        before: u64,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, PlatformError>;

    /// Whether the bot may post in `channel`.
    async fn can_send(&self, channel: ChannelRef) -> Result<bool, PlatformError>;

    async fn send_citation(&self, channel: ChannelRef, citation: &Citation) -> Result<(), PlatformError>;

    async fn delete_message(&self, channel: ChannelRef, message_id: u64) -> Result<(), PlatformError>;
}
