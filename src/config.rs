use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::quote::DEFAULT_SCAN_WINDOW;

/// Upper bound for `scan_window`. Each 100 messages cost one history request.
pub const MAX_SCAN_WINDOW: usize = 1000;

/// Errors that can occur when loading or writing configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Failed to write the config file.
    WriteFile { path: PathBuf, source: std::io::Error },
    /// Interactive setup could not read an answer.
    Prompt(String),
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::WriteFile { path, source } => {
                write!(f, "failed to write config file '{}': {}", path.display(), source)
            }
            Self::Prompt(msg) => write!(f, "setup aborted: {}", msg),
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::WriteFile { source, .. } => Some(source),
            Self::Prompt(_) | Self::Validation(_) => None,
        }
    }
}

/// On-disk layout. Every key is optional so setup can tell which are missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ConfigFile {
    #[serde(rename = "discord-token", default, skip_serializing_if = "Option::is_none")]
    pub discord_token: Option<String>,
    /// Leave empty to skip discordbots.org
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discordbots_org_token: Option<String>,
    /// Leave empty to skip bots.discord.pw
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bots_discord_pw_token: Option<String>,
    /// Game status shown on the bot's profile. Empty disables it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence: Option<String>,
    /// List every connected server on startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_list: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_window: Option<usize>,
    /// Request the privileged members intent so nicknames resolve in history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_members_intent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_channel_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Unknown keys survive a rewrite.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile { path: path.to_path_buf(), source: e })?;
        serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: path.to_path_buf(), source: e })
    }

    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseJson { path: path.to_path_buf(), source: e })?;
        std::fs::write(path, json)
            .map_err(|e| ConfigError::WriteFile { path: path.to_path_buf(), source: e })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the config file (for rewriting during setup)
    pub config_path: PathBuf,
    pub discord_token: String,
    pub discordbots_org_token: String,
    pub bots_discord_pw_token: String,
    pub presence: Option<String>,
    pub server_list: bool,
    /// Maximum number of prior messages inspected per quote.
    pub scan_window: usize,
    pub guild_members_intent: bool,
    /// Channel that receives forwarded log lines.
    pub log_channel_id: Option<u64>,
    /// Directory for state files (logs).
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let file = ConfigFile::read(&config_path)?;
        Self::from_file(config_path, file)
    }

    pub(crate) fn from_file(config_path: PathBuf, file: ConfigFile) -> Result<Self, ConfigError> {
        let discord_token = file.discord_token.unwrap_or_default().trim().to_string();
        if discord_token.is_empty() {
            return Err(ConfigError::Validation("discord-token is required".into()));
        }

        let scan_window = file.scan_window.unwrap_or(DEFAULT_SCAN_WINDOW);
        if scan_window == 0 || scan_window > MAX_SCAN_WINDOW {
            return Err(ConfigError::Validation(format!(
                "scan_window must be between 1 and {}, got {}",
                MAX_SCAN_WINDOW, scan_window
            )));
        }

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            config_path,
            discord_token,
            discordbots_org_token: file.discordbots_org_token.unwrap_or_default(),
            bots_discord_pw_token: file.bots_discord_pw_token.unwrap_or_default(),
            presence: file.presence.filter(|p| !p.trim().is_empty()),
            server_list: file.server_list.unwrap_or(true),
            scan_window,
            guild_members_intent: file.guild_members_intent.unwrap_or(false),
            log_channel_id: file.log_channel_id,
            data_dir,
        })
    }
}
