//! Server count reporting to bot directory sites.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;

const DISCORDBOTS_ORG_STATS: &str = "https://discordbots.org/api/bots/{id}/stats";
const BOTS_DISCORD_PW_STATS: &str = "https://bots.discord.pw/api/bots/{id}/stats";

/// A directory site the bot reports to.
#[derive(Debug, Clone)]
pub struct ListingSite {
    pub name: &'static str,
    /// Stats endpoint; `{id}` is replaced with the bot's user id.
    pub stats_url: String,
    pub token: String,
}

impl ListingSite {
    pub fn stats_url_for(&self, bot_id: u64) -> String {
        self.stats_url.replace("{id}", &bot_id.to_string())
    }
}

#[derive(Serialize)]
struct ServerCount {
    server_count: usize,
}

#[derive(Debug)]
pub enum Error {
    Http(String),
    Api(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Api(e) => write!(f, "API error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

/// Best-effort notifier. Failures are logged, never returned.
#[derive(Clone)]
pub struct ListingNotifier {
    http: reqwest::Client,
    sites: Vec<ListingSite>,
}

impl ListingNotifier {
    /// Sites with an empty token are skipped.
    pub fn new(sites: Vec<ListingSite>) -> Self {
        Self {
            http: reqwest::Client::new(),
            sites: sites.into_iter().filter(|s| !s.token.trim().is_empty()).collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(vec![
            ListingSite {
                name: "discordbots.org",
                stats_url: DISCORDBOTS_ORG_STATS.to_string(),
                token: config.discordbots_org_token.clone(),
            },
            ListingSite {
                name: "bots.discord.pw",
                stats_url: BOTS_DISCORD_PW_STATS.to_string(),
                token: config.bots_discord_pw_token.clone(),
            },
        ])
    }

    pub fn sites(&self) -> &[ListingSite] {
        &self.sites
    }

    /// Report `server_count` to every configured site.
    pub async fn post_server_count(&self, bot_id: u64, server_count: usize) {
        for site in &self.sites {
            match self.post_to(site, bot_id, server_count).await {
                Ok(()) => info!("📊 Posted server count {} to {}", server_count, site.name),
                Err(e) => warn!("Failed to post server count to {}: {e}", site.name),
            }
        }
    }

    async fn post_to(&self, site: &ListingSite, bot_id: u64, server_count: usize) -> Result<(), Error> {
        // Resolve redirects with a GET first; a redirected POST would turn into a GET
        let resolved = self
            .http
            .get(site.stats_url_for(bot_id))
            .header("Authorization", &site.token)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        let target = resolved.url().clone();

        let response = self
            .http
            .post(target)
            .header("Authorization", &site.token)
            .json(&ServerCount { server_count })
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }
        Ok(())
    }
}
