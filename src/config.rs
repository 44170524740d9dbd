// src/config.rs

//! Configuration loading utilities.
//!
//! The TOML file supplies defaults; deployment secrets and per-host settings
//! come from the environment and override the file.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;

/// Environment variables honoured by [`apply_env`].
pub const ENV_DISCORD_TOKEN: &str = "DISCORD_TOKEN";
pub const ENV_CHANNEL_ID: &str = "CHANNEL_ID";
pub const ENV_ROLE_MENTION: &str = "ROLE_MENTION";
pub const ENV_PREFERRED_MIRROR: &str = "PREFERRED_MIRROR";
pub const ENV_PRIMARY_TIMELINE_URL: &str = "PRIMARY_TIMELINE_URL";
pub const ENV_POLL_INTERVAL_SECS: &str = "POLL_INTERVAL_SECS";

/// Load configuration from a TOML file, then apply environment overrides.
///
/// A missing file falls back to defaults; a file that exists but cannot be
/// read or parsed is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// [`load_config`] with an explicit variable lookup.
pub fn load_config_with<F>(path: &Path, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = if path.exists() {
        Config::load(path)?
    } else {
        Config::default()
    };
    apply_env(&mut config, lookup)?;
    Ok(config)
}

/// Apply overrides from `lookup` (normally the process environment).
///
/// Blank values are ignored.
pub fn apply_env<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(token) = get(ENV_DISCORD_TOKEN) {
        config.discord.token = Some(token);
    }
    if let Some(channel_id) = get(ENV_CHANNEL_ID) {
        if channel_id.parse::<u64>().is_err() {
            return Err(AppError::config(format!(
                "{ENV_CHANNEL_ID} must be a numeric id, got {channel_id:?}"
            )));
        }
        config.discord.channel_id = Some(channel_id);
    }
    if let Some(mention) = get(ENV_ROLE_MENTION) {
        config.relay.role_mention = mention;
    }
    if let Some(preferred) = get(ENV_PREFERRED_MIRROR) {
        config.mirrors.preferred = Some(preferred);
    }
    if let Some(url) = get(ENV_PRIMARY_TIMELINE_URL) {
        config.primary.timeline_url = Some(url);
    }
    if let Some(secs) = get(ENV_POLL_INTERVAL_SECS) {
        config.relay.poll_interval_secs = secs.parse().map_err(|_| {
            AppError::config(format!("{ENV_POLL_INTERVAL_SECS} must be an integer, got {secs:?}"))
        })?;
    }
    Ok(())
}
