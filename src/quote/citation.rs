//! Citation embed built from a resolved quote.

use chrono::{DateTime, Utc};

use super::identity::MemberIdentity;
use super::message::ChannelMessage;

/// Platform-neutral description of the citation embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub author_name: String,
    pub author_icon_url: String,
    pub description: String,
    pub footer_text: String,
    pub footer_icon_url: String,
    /// Creation time of the quoted message.
    pub timestamp: DateTime<Utc>,
}

impl Citation {
    pub fn build(quoted: &ChannelMessage, quoting_user: &MemberIdentity) -> Self {
        let mut footer_text = format!("Quoted by {}.", quoting_user.display_name);
        if quoted.is_edited() {
            footer_text.push_str(" Edited.");
        }

        Self {
            author_name: quoted.author.display_name.clone(),
            author_icon_url: quoted.author.avatar_url.clone(),
            description: quoted.content.clone(),
            footer_text,
            footer_icon_url: quoting_user.avatar_url.clone(),
            timestamp: quoted.timestamp,
        }
    }
}
