//! Discord adapter using serenity.

pub mod handler;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::all::{
    Cache, ChannelId, ChannelType, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, CreateMessage,
    GetMessages, Guild, GuildId, Http, Member, Message, MessageId, Timestamp, User,
};
use serenity::model::ModelError;
use tracing::{debug, warn};

use crate::quote::{ChannelMessage, ChannelRef, ChatPlatform, Citation, MemberIdentity, PlatformError};

pub use handler::Handler;

/// Quote capabilities backed by the Discord HTTP API and the gateway cache.
pub struct DiscordPlatform {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl DiscordPlatform {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }

    /// Send permission from the cached channel overwrites and the bot's own roles.
    fn cached_send_permission(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<bool, PlatformError> {
        let bot_id = self.cache.current_user().id;
        let guild = self
            .cache
            .guild(guild_id)
            .ok_or_else(|| PlatformError::Other(format!("guild {} not cached", guild_id)))?;

        let Some(member) = guild.members.get(&bot_id) else {
            warn!("Own member not cached in guild {}", guild_id);
            return Ok(false);
        };
        match member_may_post(&guild, channel_id, member) {
            Some(allowed) => Ok(allowed),
            None => {
                warn!("Channel {} not found in guild {} cache", channel_id, guild_id);
                Ok(false)
            }
        }
    }
}

/// Whether `member` may post in `channel_id`. Threads carry no overwrites of
/// their own: they take the parent channel's and need the thread send right.
/// `None` when the channel (or a thread's parent) is not in `guild`.
fn member_may_post(guild: &Guild, channel_id: ChannelId, member: &Member) -> Option<bool> {
    let channel = guild
        .channels
        .get(&channel_id)
        .or_else(|| guild.threads.iter().find(|t| t.id == channel_id))?;

    if is_thread(channel.kind) {
        let parent = channel.parent_id.and_then(|id| guild.channels.get(&id))?;
        Some(guild.user_permissions_in(parent, member).send_messages_in_threads())
    } else {
        Some(guild.user_permissions_in(channel, member).send_messages())
    }
}

fn is_thread(kind: ChannelType) -> bool {
    matches!(
        kind,
        ChannelType::PublicThread | ChannelType::PrivateThread | ChannelType::NewsThread
    )
}

#[async_trait]
impl ChatPlatform for DiscordPlatform {
    async fn fetch_history(
        &self,
        channel: ChannelRef,
        before: u64,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>, PlatformError> {
        let builder = GetMessages::new().before(MessageId::new(before)).limit(limit);
        let messages = ChannelId::new(channel.id)
            .messages(&self.http, builder)
            .await
            .map_err(platform_error)?;

        // History responses carry no guild id or member data
        let guild_id = channel.guild_id.map(GuildId::new);
        Ok(messages
            .iter()
            .map(|m| channel_message(&self.cache, guild_id, m))
            .collect())
    }

    async fn can_send(&self, channel: ChannelRef) -> Result<bool, PlatformError> {
        match channel.guild_id {
            Some(guild_id) => self.cached_send_permission(GuildId::new(guild_id), ChannelId::new(channel.id)),
            // Direct messages have no role grants
            None => Ok(true),
        }
    }

    async fn send_citation(&self, channel: ChannelRef, citation: &Citation) -> Result<(), PlatformError> {
        let mut embed = CreateEmbed::new()
            .author(CreateEmbedAuthor::new(&citation.author_name).icon_url(&citation.author_icon_url))
            .description(&citation.description)
            .footer(CreateEmbedFooter::new(&citation.footer_text).icon_url(&citation.footer_icon_url));
        match Timestamp::from_unix_timestamp(citation.timestamp.timestamp()) {
            Ok(ts) => embed = embed.timestamp(ts),
            Err(e) => warn!("Dropping citation timestamp {}: {e}", citation.timestamp),
        }

        ChannelId::new(channel.id)
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await
            .map_err(platform_error)?;

        debug!("Citation sent to channel {}", channel.id);
        Ok(())
    }

    async fn delete_message(&self, channel: ChannelRef, message_id: u64) -> Result<(), PlatformError> {
        ChannelId::new(channel.id)
            .delete_message(&self.http, MessageId::new(message_id))
            .await
            .map_err(platform_error)
    }
}

/// Map serenity failures, singling out missing rights.
fn platform_error(err: serenity::Error) -> PlatformError {
    let denied = match &err {
        serenity::Error::Http(e) => e.status_code().map(|s| s.as_u16()) == Some(403),
        serenity::Error::Model(ModelError::InvalidPermissions { .. }) => true,
        _ => false,
    };
    if denied {
        PlatformError::PermissionDenied(err.to_string())
    } else {
        PlatformError::Other(err.to_string())
    }
}

fn to_datetime(ts: &Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.unix_timestamp(), 0).unwrap_or_default()
}

/// Build a member identity. Nickname lookup order: explicit nick, member
/// cache, global name, account name.
pub fn member_identity(cache: &Cache, guild_id: Option<GuildId>, user: &User, nick: Option<&str>) -> MemberIdentity {
    let display_name = nick
        .map(str::to_string)
        .or_else(|| {
            guild_id
                .and_then(|g| cache.guild(g))
                .and_then(|g| g.members.get(&user.id).and_then(|m| m.nick.clone()))
        })
        .or_else(|| user.global_name.clone())
        .unwrap_or_else(|| user.name.clone());

    MemberIdentity {
        id: user.id.get(),
        name: user.name.clone(),
        discriminator: user.discriminator.map(|d| format!("{:04}", d.get())),
        display_name,
        avatar_url: user.face(),
    }
}

/// Convert a serenity message. `guild_id` fills in for messages fetched over HTTP.
pub fn channel_message(cache: &Cache, guild_id: Option<GuildId>, msg: &Message) -> ChannelMessage {
    let guild_id = msg.guild_id.or(guild_id);
    let nick = msg.member.as_ref().and_then(|m| m.nick.as_deref());

    ChannelMessage {
        id: msg.id.get(),
        channel: ChannelRef {
            id: msg.channel_id.get(),
            guild_id: guild_id.map(|g| g.get()),
        },
        author: member_identity(cache, guild_id, &msg.author, nick),
        content: msg.content.clone(),
        timestamp: to_datetime(&msg.timestamp),
        edited_timestamp: msg.edited_timestamp.as_ref().map(to_datetime),
    }
}
