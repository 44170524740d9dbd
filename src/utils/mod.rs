//! Utility functions and helpers.

pub mod feed;
pub mod http;

use std::sync::LazyLock;

use regex::Regex;

use crate::models::FeedEntry;

static STATUS_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/status/(\d+)").expect("valid status id pattern"));

/// Extract the numeric post id following `/status/` in a URL.
pub fn extract_status_id(url: &str) -> Option<String> {
    STATUS_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
}

/// Identifier for a feed entry.
///
/// Prefers the status id from the link, then from the guid, then the raw
/// link or guid. Returns `None` when all of them are empty.
pub fn entry_identifier(entry: &FeedEntry) -> Option<String> {
    extract_status_id(&entry.link)
        .or_else(|| extract_status_id(&entry.guid))
        .or_else(|| {
            [entry.link.trim(), entry.guid.trim()]
                .into_iter()
                .find(|raw| !raw.is_empty())
                .map(str::to_string)
        })
}
