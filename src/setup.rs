//! First-run setup - asks for missing config keys and rewrites the file.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigError, ConfigFile};

/// Complete the config file interactively on the terminal, then load it.
pub fn run(config_path: &Path) -> Result<Config, ConfigError> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    ensure_config(
        config_path,
        &legacy_token_path(config_path),
        &mut input,
        &mut output,
    )?;
    Config::load(config_path)
}

/// Older installs kept the bot token in `token.txt` next to the config.
pub fn legacy_token_path(config_path: &Path) -> PathBuf {
    config_path.with_file_name("token.txt")
}

/// Fill in every missing key. Returns true if the file was (re)written.
pub fn ensure_config<R: BufRead, W: Write>(
    config_path: &Path,
    token_path: &Path,
    input: &mut R,
    output: &mut W,
) -> Result<bool, ConfigError> {
    let mut needs_update = false;

    let mut file = match ConfigFile::read(config_path) {
        Ok(file) => file,
        Err(ConfigError::ReadFile { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            say(output, "Configuration file not found!")?;
            needs_update = true;
            ConfigFile::default()
        }
        Err(e) => return Err(e),
    };

    if let Some(token) = read_legacy_token(token_path) {
        say(
            output,
            "token.txt found. This file is deprecated; its token moves into the configuration file.",
        )?;
        if file.discord_token.is_none() {
            file.discord_token = Some(token);
            needs_update = true;
        }
    }

    if file.discord_token.is_none() {
        file.discord_token = Some(ask(
            input,
            output,
            "Discord API token not found. Please enter your API token: ",
        )?);
        needs_update = true;
    }

    if file.discordbots_org_token.is_none() {
        file.discordbots_org_token = Some(ask(
            input,
            output,
            "discordbots.org API token not found. Please enter your API token \
             (leave empty to ignore discordbots.org): ",
        )?);
        needs_update = true;
    }

    if file.bots_discord_pw_token.is_none() {
        file.bots_discord_pw_token = Some(ask(
            input,
            output,
            "bots.discord.pw API token not found. Please enter your API token \
             (leave empty to ignore bots.discord.pw): ",
        )?);
        needs_update = true;
    }

    if file.presence.is_none() {
        file.presence = Some(ask(
            input,
            output,
            "Please specify a presence or game status shown in the bot's profile \
             (leave empty to disable): ",
        )?);
        needs_update = true;
    }

    if file.server_list.is_none() {
        file.server_list = Some(ask_yes_no(
            input,
            output,
            "Should the bot list all connected servers on startup? [Y/n]: ",
            true,
        )?);
        needs_update = true;
    }

    if file.guild_members_intent.is_none() {
        say(
            output,
            "Without the Server Members intent, quoted authors who have not spoken since startup \
             are shown and matched by their global name instead of their server nickname. \
             The intent must also be enabled in the Discord developer portal.",
        )?;
        file.guild_members_intent = Some(ask_yes_no(
            input,
            output,
            "Request the Server Members intent? [y/N]: ",
            false,
        )?);
        needs_update = true;
    }

    if needs_update {
        file.write(config_path)?;
        say(output, "Configuration file updated.")?;
    }

    Ok(needs_update)
}

fn read_legacy_token(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let token = content.lines().next()?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn say<W: Write>(output: &mut W, text: &str) -> Result<(), ConfigError> {
    writeln!(output, "{text}").map_err(|e| ConfigError::Prompt(e.to_string()))
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> Result<String, ConfigError> {
    write!(output, "{prompt}")
        .and_then(|_| output.flush())
        .map_err(|e| ConfigError::Prompt(e.to_string()))?;

    let mut buf = String::new();
    let read = input
        .read_line(&mut buf)
        .map_err(|e| ConfigError::Prompt(e.to_string()))?;
    if read == 0 {
        return Err(ConfigError::Prompt("unexpected end of input".into()));
    }
    Ok(buf.trim().to_string())
}

/// An empty answer picks `default`.
fn ask_yes_no<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    loop {
        let answer = ask(input, output, prompt)?.to_lowercase();
        match answer.as_str() {
            "" => return Ok(default),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => say(output, "\nPlease answer with either yes or no.\n")?,
        }
    }
}
