// src/services/sink.rs

//! Delivery sinks for rendered announcements.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{DiscordConfig, MAX_MESSAGE_CHARS};

/// Destination for outbound messages.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, message: &str) -> Result<()>;
}

/// Posts messages to a Discord channel through the bot REST API.
pub struct DiscordChannelSink {
    client: Client,
    url: String,
    token: String,
}

impl DiscordChannelSink {
    pub fn new(client: Client, config: &DiscordConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::config("discord.token is not set"))?;
        let channel_id = config
            .channel_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::config("discord.channel_id is not set"))?;

        let url = format!(
            "{}/channels/{}/messages",
            config.api_base.trim_end_matches('/'),
            channel_id
        );
        Ok(Self { client, url, token })
    }
}

#[async_trait]
impl DeliverySink for DiscordChannelSink {
    async fn deliver(&self, message: &str) -> Result<()> {
        let length = message.chars().count();
        if length > MAX_MESSAGE_CHARS {
            return Err(AppError::delivery(format!(
                "message is {length} characters, limit is {MAX_MESSAGE_CHARS}"
            )));
        }

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(&json!({
                "content": message,
                "allowed_mentions": { "parse": ["roles"] },
            }))
            .send()
            .await
            .map_err(AppError::delivery)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::delivery(format!("{status}: {body}")));
        }
        Ok(())
    }
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl DeliverySink for LogSink {
    async fn deliver(&self, message: &str) -> Result<()> {
        log::info!("[dry-run] would deliver:\n{}", message);
        Ok(())
    }
}
