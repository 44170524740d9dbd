// src/services/primary.rs

//! Primary timeline source.
//!
//! The authoritative "recent posts for account X" capability. Any failure is
//! reported as [`AppError::SourceUnavailable`]; the caller falls through to the
//! mirror pool for the rest of the cycle and retries on the next tick.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Candidate, Config};

/// Source of the account's most recent posts, newest first.
#[async_trait]
pub trait PrimarySource: Send + Sync {
    /// Label used in logs.
    fn name(&self) -> &str;

    /// Fetch up to the configured cap of recent items.
    async fn fetch(&self) -> Result<Vec<Candidate>>;
}

/// Probe for a primary binding. `None` means the relay runs mirror-only.
pub fn probe_primary(config: &Config, client: &Client) -> Option<Arc<dyn PrimarySource>> {
    let Some(template) = config.primary.timeline_url.as_deref() else {
        log::info!("No primary timeline configured; using mirror feeds only");
        return None;
    };

    match TimelineSource::new(
        client.clone(),
        template,
        &config.relay.account,
        config.relay.primary_scan_limit,
    ) {
        Ok(source) => {
            log::info!("Primary timeline source: {}", source.url);
            Some(Arc::new(source))
        }
        Err(e) => {
            log::warn!("Primary timeline disabled: {}", e);
            None
        }
    }
}

/// HTTP binding that reads a JSON timeline.
///
/// Accepts either a bare array or an object with a `data` array. Each item
/// needs an `id` (string or integer) and a `text` or `content` field.
pub struct TimelineSource {
    client: Client,
    url: String,
    limit: usize,
}

impl TimelineSource {
    /// Create a source from a URL template where `{account}` is substituted.
    pub fn new(client: Client, template: &str, account: &str, limit: usize) -> Result<Self> {
        let url = template.replace("{account}", account);
        url::Url::parse(&url)?;
        Ok(Self { client, url, limit })
    }
}

impl fmt::Debug for TimelineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineSource")
            .field("url", &self.url)
            .field("limit", &self.limit)
            .finish()
    }
}

#[async_trait]
impl PrimarySource for TimelineSource {
    fn name(&self) -> &str {
        "timeline"
    }

    async fn fetch(&self) -> Result<Vec<Candidate>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(AppError::unavailable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::unavailable(format!(
                "{} answered {}",
                self.url, status
            )));
        }

        let body: TimelineBody = response.json().await.map_err(AppError::unavailable)?;
        let candidates = body
            .into_items()
            .into_iter()
            .filter_map(TimelineItem::into_candidate)
            .take(self.limit)
            .collect();
        Ok(candidates)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimelineBody {
    Items(Vec<TimelineItem>),
    Wrapped { data: Vec<TimelineItem> },
}

impl TimelineBody {
    fn into_items(self) -> Vec<TimelineItem> {
        match self {
            TimelineBody::Items(items) | TimelineBody::Wrapped { data: items } => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TimelineItem {
    id: ItemId,
    #[serde(default, alias = "content")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemId {
    Number(u64),
    Text(String),
}

impl TimelineItem {
    fn into_candidate(self) -> Option<Candidate> {
        let id = match self.id {
            ItemId::Number(n) => n.to_string(),
            ItemId::Text(s) => s.trim().to_string(),
        };
        if id.is_empty() {
            return None;
        }
        Some(Candidate::new(id, self.text.unwrap_or_default()))
    }
}
