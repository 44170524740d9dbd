// src/services/mirror.rs

//! Mirror feed source.
//!
//! A mirror serves a lightweight feed for the account at
//! `{base_url}/{account}/rss`. One call to [`MirrorSource::fetch_once`] is a
//! single attempt; retry and rotation live in [`crate::services::MirrorPool`].

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{Candidate, FeedResponse, MirrorEndpoint, RetryPolicy};
use crate::services::ContentMatcher;
use crate::utils::entry_identifier;
use crate::utils::feed::parse_entries;

/// Performs the raw GET of a feed URL.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Request-level failures are errors; any HTTP status is a response.
    async fn fetch_feed(&self, url: &str) -> Result<FeedResponse>;
}

/// [`FeedFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch_feed(&self, url: &str) -> Result<FeedResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FeedResponse { status, body })
    }
}

/// One mirror endpoint bound to the watched account.
#[derive(Debug, Clone)]
pub struct MirrorSource<'a> {
    endpoint: &'a MirrorEndpoint,
    account: &'a str,
}

impl<'a> MirrorSource<'a> {
    pub fn new(endpoint: &'a MirrorEndpoint, account: &'a str) -> Self {
        Self { endpoint, account }
    }

    /// Make one attempt against the endpoint.
    ///
    /// - `Ok(Some(_))`: a matching entry was found
    /// - `Ok(None)`: the feed was read but nothing matched
    /// - `Err(TransientEndpoint)`: retryable status
    /// - `Err(PermanentEndpoint | MissingIdentifier)`: abandon the endpoint
    pub async fn fetch_once(
        &self,
        fetcher: &dyn FeedFetcher,
        policy: &RetryPolicy,
        matcher: &ContentMatcher,
        scan_limit: usize,
    ) -> Result<Option<Candidate>> {
        let url = self.endpoint.feed_url(self.account);
        let response = fetcher
            .fetch_feed(&url)
            .await
            .map_err(|e| AppError::permanent(&self.endpoint.base_url, e))?;

        if response.is_ok() {
            return self.scan(&response.body, matcher, scan_limit);
        }
        if policy.is_transient(response.status) {
            return Err(AppError::TransientEndpoint {
                endpoint: self.endpoint.base_url.clone(),
                status: response.status,
            });
        }
        Err(AppError::permanent(
            &self.endpoint.base_url,
            format!("status {}", response.status),
        ))
    }

    /// Return the first matching entry among the first `scan_limit`.
    fn scan(
        &self,
        body: &str,
        matcher: &ContentMatcher,
        scan_limit: usize,
    ) -> Result<Option<Candidate>> {
        for entry in parse_entries(body, scan_limit) {
            let text = [&entry.title, &entry.description]
                .into_iter()
                .find(|field| matcher.is_match(field));

            if let Some(text) = text {
                let id = entry_identifier(&entry).ok_or_else(|| AppError::MissingIdentifier {
                    endpoint: self.endpoint.base_url.clone(),
                })?;
                return Ok(Some(Candidate::new(id, text.clone())));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedFetcher, feed_item, rss};

    fn endpoint() -> MirrorEndpoint {
        MirrorEndpoint::new("https://m1.example")
    }

    async fn attempt(fetcher: &ScriptedFetcher) -> Result<Option<Candidate>> {
        let endpoint = endpoint();
        MirrorSource::new(&endpoint, "FUTBIN")
            .fetch_once(fetcher, &RetryPolicy::default(), &ContentMatcher::new(), 9)
            .await
    }

    #[tokio::test]
    async fn test_returns_first_match() {
        let body = rss(&[
            feed_item("Squad builder", "https://m1.example/FUTBIN/status/556#m"),
            feed_item("🚨 6pm Content: Icons", "https://m1.example/FUTBIN/status/555#m"),
            feed_item("🚨 6pm Content: Older", "https://m1.example/FUTBIN/status/550#m"),
        ]);
        let fetcher = ScriptedFetcher::new().respond("https://m1.example", 200, &body);

        let candidate = attempt(&fetcher).await.unwrap().unwrap();
        assert_eq!(candidate, Candidate::new("555", "🚨 6pm Content: Icons"));
        assert_eq!(fetcher.calls(), vec!["https://m1.example/FUTBIN/rss"]);
    }

    #[tokio::test]
    async fn test_only_scans_limit() {
        let mut items: Vec<String> = (0..9)
            .map(|i| feed_item("filler", &format!("https://m1.example/x/status/{i}")))
            .collect();
        items.push(feed_item("🚨 6pm Content: late", "https://m1.example/x/status/99"));
        let fetcher = ScriptedFetcher::new().respond("https://m1.example", 200, &rss(&items));

        assert_eq!(attempt(&fetcher).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_description_is_fallback_text() {
        let body = "<item><title>Image post</title>\
            <description>&lt;p&gt;🚨 6pm Content: Heroes&lt;/p&gt;</description>\
            <guid>https://m1.example/FUTBIN/status/777</guid></item>";
        let fetcher = ScriptedFetcher::new().respond("https://m1.example", 200, body);

        let candidate = attempt(&fetcher).await.unwrap().unwrap();
        assert_eq!(candidate, Candidate::new("777", "🚨 6pm Content: Heroes"));
    }

    #[tokio::test]
    async fn test_classifies_statuses() {
        let fetcher = ScriptedFetcher::new()
            .respond("https://m1.example", 429, "")
            .respond("https://m1.example", 404, "")
            .fail("https://m1.example");

        assert!(attempt(&fetcher).await.unwrap_err().is_transient());
        assert!(matches!(
            attempt(&fetcher).await.unwrap_err(),
            AppError::PermanentEndpoint { .. }
        ));
        assert!(matches!(
            attempt(&fetcher).await.unwrap_err(),
            AppError::PermanentEndpoint { .. }
        ));
    }

    #[tokio::test]
    async fn test_match_without_identifier_is_error() {
        let body = "<item><title>🚨 6pm Content: Icons</title></item>";
        let fetcher = ScriptedFetcher::new().respond("https://m1.example", 200, body);

        assert!(matches!(
            attempt(&fetcher).await.unwrap_err(),
            AppError::MissingIdentifier { .. }
        ));
    }

    #[tokio::test]
    async fn test_http_fetcher_reports_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/FUTBIN/rss")
            .with_status(503)
            .with_body("busy")
            .create_async()
            .await;

        let fetcher = HttpFeedFetcher::new(Client::new());
        let url = MirrorEndpoint::new(server.url()).feed_url("FUTBIN");
        let response = fetcher.fetch_feed(&url).await.unwrap();
        assert_eq!(response, FeedResponse::new(503, "busy"));
    }
}
