//! Chat message types shared by the quote pipeline and platform adapters.

use chrono::{DateTime, Utc};

use super::identity::MemberIdentity;

/// Where a message lives. `guild_id` is `None` for direct messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelRef {
    pub id: u64,
    pub guild_id: Option<u64>,
}

/// A message as seen by the quote pipeline. Never mutated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub id: u64,
    pub channel: ChannelRef,
    pub author: MemberIdentity,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub edited_timestamp: Option<DateTime<Utc>>,
}

impl ChannelMessage {
    pub fn is_edited(&self) -> bool {
        self.edited_timestamp.is_some()
    }
}
