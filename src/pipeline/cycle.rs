// src/pipeline/cycle.rs

//! One acquisition cycle.
//!
//! Primary source first; on failure the mirror pool. The chosen candidate is
//! checked against the dedup state, rendered, and handed to the sink.

use std::sync::Arc;

use reqwest::Client;
use serde::Serialize;

use crate::models::{
    Announcement, CandidateOrigin, Config, DeliveryOrder, RelayConfig, SourcedCandidate, defaults,
};
use crate::pipeline::DedupState;
use crate::services::{
    ContentMatcher, DeliverySink, FeedFetcher, HttpFeedFetcher, MirrorPool, PrimarySource,
    probe_primary,
};

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// A new announcement was handed to the sink
    Delivered { id: String, origin: CandidateOrigin },
    /// The newest announcement was already relayed
    AlreadyDelivered { id: String },
    /// Neither path produced an announcement
    NoMatch,
    /// The sink rejected the message
    DeliveryFailed { id: String, error: String },
    /// The cycle panicked
    Aborted,
}

/// The sources consulted by a cycle.
pub struct Acquisition {
    primary: Option<Arc<dyn PrimarySource>>,
    pool: MirrorPool,
    fetcher: Arc<dyn FeedFetcher>,
    primary_scan_limit: usize,
    matcher: ContentMatcher,
}

impl Acquisition {
    pub fn new(
        primary: Option<Arc<dyn PrimarySource>>,
        pool: MirrorPool,
        fetcher: Arc<dyn FeedFetcher>,
    ) -> Self {
        Self {
            primary,
            pool,
            fetcher,
            primary_scan_limit: defaults::primary_scan_limit(),
            matcher: ContentMatcher::new(),
        }
    }

    /// Probe the primary binding and build the mirror pool from config.
    pub fn from_config(config: &Config, client: &Client) -> Self {
        let mut acquisition = Self::new(
            probe_primary(config, client),
            MirrorPool::from_config(config),
            Arc::new(HttpFeedFetcher::new(client.clone())),
        );
        acquisition.primary_scan_limit = config.relay.primary_scan_limit;
        acquisition
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Find the newest announcement, or `None` when nothing matches.
    ///
    /// A primary that answers is authoritative: if none of its items match,
    /// the mirrors are not consulted.
    pub async fn acquire(&self) -> Option<SourcedCandidate> {
        if let Some(primary) = &self.primary {
            match primary.fetch().await {
                Ok(items) => {
                    let found = items
                        .into_iter()
                        .take(self.primary_scan_limit)
                        .find(|item| self.matcher.is_match(&item.raw_text));
                    if found.is_none() {
                        log::info!("No matching post in the {} timeline", primary.name());
                    }
                    return found.map(|candidate| SourcedCandidate {
                        candidate,
                        origin: CandidateOrigin::Primary,
                    });
                }
                Err(e) => {
                    log::warn!("{}; falling back to mirrors", e);
                }
            }
        }
        self.pool.fetch(self.fetcher.as_ref()).await
    }
}

/// Run one cycle against `state`.
pub async fn run_cycle(
    acquisition: &Acquisition,
    state: &mut DedupState,
    sink: &dyn DeliverySink,
    relay: &RelayConfig,
) -> CycleOutcome {
    let Some(found) = acquisition.acquire().await else {
        return CycleOutcome::NoMatch;
    };
    let SourcedCandidate { candidate, origin } = found;

    if state.is_delivered(&candidate.id) {
        log::info!("Announcement {} already posted", candidate.id);
        return CycleOutcome::AlreadyDelivered { id: candidate.id };
    }

    let body = acquisition
        .matcher
        .extract(&candidate.raw_text)
        .unwrap_or_else(|| candidate.raw_text.clone());
    let message = Announcement::new(relay, body).render(relay.max_message_len);

    if relay.delivery_order == DeliveryOrder::MarkThenSend {
        state.mark(candidate.id.as_str());
    }

    match sink.deliver(&message).await {
        Ok(()) => {
            if relay.delivery_order == DeliveryOrder::SendThenMark {
                state.mark(candidate.id.as_str());
            }
            log::info!("Posted announcement {} from {}", candidate.id, origin);
            CycleOutcome::Delivered {
                id: candidate.id,
                origin,
            }
        }
        Err(e) => {
            log::error!("Failed to post announcement {}: {}", candidate.id, e);
            CycleOutcome::DeliveryFailed {
                id: candidate.id,
                error: e.to_string(),
            }
        }
    }
}
