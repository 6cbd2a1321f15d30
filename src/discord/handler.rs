//! Gateway event handler wiring lifecycle events to the quote responder and
//! the listing notifier.

use async_trait::async_trait;
use serenity::all::{ActivityData, Context, EventHandler, Guild, GuildId, Message, Ready, UnavailableGuild};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::discord::{DiscordPlatform, channel_message};
use crate::listing::ListingNotifier;
use crate::quote::{QuotePattern, QuoteResponder};

pub struct Handler {
    responder: QuoteResponder,
    listing: ListingNotifier,
    server_list: bool,
    presence: Option<String>,
}

impl Handler {
    pub fn new(config: &Config) -> Self {
        Self {
            responder: QuoteResponder::new(config.scan_window),
            listing: ListingNotifier::from_config(config),
            server_list: config.server_list,
            presence: config.presence.clone(),
        }
    }

    /// Fire-and-forget; never blocks event handling.
    fn report_server_count(&self, ctx: &Context, server_count: usize) {
        if self.listing.sites().is_empty() {
            return;
        }
        let bot_id = ctx.cache.current_user().id.get();
        let listing = self.listing.clone();
        tokio::spawn(async move {
            listing.post_server_count(bot_id, server_count).await;
        });
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🦜 Parrot is ready as {}", ready.user.name);
        info!("Connected servers: {}", ready.guilds.len());

        if let Some(ref presence) = self.presence {
            ctx.set_activity(Some(ActivityData::playing(presence)));
        }
    }

    /// Guild names are only known once the cache has them.
    async fn cache_ready(&self, ctx: Context, guilds: Vec<GuildId>) {
        if self.server_list {
            for guild_id in &guilds {
                let name = ctx
                    .cache
                    .guild(*guild_id)
                    .map(|g| g.name.clone())
                    .unwrap_or_default();
                info!("{} - {}", guild_id, name);
            }
        }
        self.report_server_count(&ctx, guilds.len());
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, is_new: Option<bool>) {
        // Startup replays every guild; only genuine joins count
        if is_new != Some(true) {
            return;
        }
        let count = ctx.cache.guild_count();
        info!("➕ Joined server {} -- {}. Connected servers: {}", guild.id, guild.name, count);
        self.report_server_count(&ctx, count);
    }

    async fn guild_delete(&self, ctx: Context, incomplete: UnavailableGuild, full: Option<Guild>) {
        // An unavailable guild is an outage, not a removal
        if incomplete.unavailable {
            return;
        }
        let name = full.map(|g| g.name).unwrap_or_default();
        let count = ctx.cache.guild_count();
        info!("➖ Left server {} -- {}. Connected servers: {}", incomplete.id, name, count);
        self.report_server_count(&ctx, count);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let bot_id = ctx.cache.current_user().id;
        if msg.author.id == bot_id {
            return;
        }
        let Some(pattern) = QuotePattern::parse(&msg.content) else {
            return;
        };

        let trigger = channel_message(&ctx.cache, msg.guild_id, &msg);
        let platform = DiscordPlatform::new(ctx.http.clone(), ctx.cache.clone());
        match self.responder.respond_to(&platform, &trigger, &pattern).await {
            Ok(outcome) => debug!("Quote trigger {} in channel {}: {:?}", trigger.id, trigger.channel.id, outcome),
            Err(e) => error!("Quote trigger {} in channel {} failed: {e}", trigger.id, trigger.channel.id),
        }
    }
}
