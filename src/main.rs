use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serenity::all::{ChannelId, Client, GatewayIntents, Http};
use serenity::gateway::GatewayError;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use parrot::config::Config;
use parrot::discord::Handler;
use parrot::discord_log::DiscordLogLayer;
use parrot::setup;

/// Pause before reconnecting after the session drops.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

const NOTICE: &str = "\
Parrot  Copyright (C) 2017  Martin W.

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.
";

fn intents(config: &Config) -> GatewayIntents {
    let mut intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;
    if config.guild_members_intent {
        intents |= GatewayIntents::GUILD_MEMBERS;
    }
    intents
}

/// Session errors that reconnecting cannot fix.
fn fatal_reason(err: &serenity::Error) -> Option<&'static str> {
    match err {
        serenity::Error::Gateway(GatewayError::InvalidAuthentication) => {
            Some("Discord rejected the bot token")
        }
        serenity::Error::Gateway(
            GatewayError::DisallowedGatewayIntents | GatewayError::InvalidGatewayIntents,
        ) => Some(
            "Discord rejected the gateway intents. Enable the Server Members intent \
             in the developer portal or set guild_members_intent to false",
        ),
        _ => None,
    }
}

#[tokio::main]
async fn main() {
    println!("{NOTICE}");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config = match setup::run(Path::new(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("parrot.log"))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file in {}: {e}", log_dir.display());
            std::process::exit(1);
        }
    };
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    let registry = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        );

    if let Some(log_channel_id) = config.log_channel_id {
        let http = Arc::new(Http::new(&config.discord_token));
        let discord_layer = DiscordLogLayer::new(http, ChannelId::new(log_channel_id));
        registry.with(discord_layer).init();
    } else {
        registry.init();
    }

    info!("🚀 Starting parrot...");
    info!("Loaded config from {config_path}");
    info!("Scan window: {} message(s)", config.scan_window);

    loop {
        let mut client = match Client::builder(&config.discord_token, intents(&config))
            .event_handler(Handler::new(&config))
            .await
        {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to create Discord client: {e}");
                return;
            }
        };

        let shard_manager = client.shard_manager.clone();

        info!("Starting bot session");
        let result = tokio::select! {
            result = client.start() => result,
            Ok(()) = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                shard_manager.shutdown_all().await;
                return;
            }
        };

        match result {
            Ok(()) => {
                info!("Bot session ended");
                return;
            }
            Err(e) => match fatal_reason(&e) {
                Some(reason) => {
                    error!("{reason}");
                    return;
                }
                None => warn!(
                    "Lost connection: {e}. Retrying in {} seconds...",
                    RECONNECT_DELAY.as_secs()
                ),
            },
        }

        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}
