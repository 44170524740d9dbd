// src/services/pool.rs

//! Mirror pool with per-endpoint retry.
//!
//! Endpoints are tried one at a time, never in parallel. The preferred
//! endpoint (if any) goes first; the rest are shuffled every cycle. Each
//! endpoint gets up to `max_attempts` tries: transient statuses back off and
//! retry the same endpoint, anything else abandons it immediately. The first
//! matching entry ends the whole rotation.

use crate::error::{AppError, Result};
use crate::models::{
    Candidate, CandidateOrigin, Config, MirrorEndpoint, RetryPolicy, SourcedCandidate, defaults,
};
use crate::services::{ContentMatcher, FeedFetcher, MirrorSource};

/// Ordered set of mirror endpoints sharing one retry policy.
#[derive(Debug, Clone)]
pub struct MirrorPool {
    preferred: Option<MirrorEndpoint>,
    endpoints: Vec<MirrorEndpoint>,
    shuffle: bool,
    policy: RetryPolicy,
    account: String,
    scan_limit: usize,
    matcher: ContentMatcher,
}

impl MirrorPool {
    /// Create a pool that tries `endpoints` in the given order.
    pub fn new(endpoints: Vec<MirrorEndpoint>, policy: RetryPolicy, account: &str) -> Self {
        Self {
            preferred: None,
            endpoints,
            shuffle: false,
            policy,
            account: account.to_string(),
            scan_limit: defaults::mirror_scan_limit(),
            matcher: ContentMatcher::new(),
        }
    }

    /// Build the pool described by the `mirrors`, `retry` and `relay` sections.
    pub fn from_config(config: &Config) -> Self {
        let preferred = config
            .mirrors
            .preferred
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .map(MirrorEndpoint::new);

        let endpoints = config
            .mirror_endpoints()
            .into_iter()
            .map(MirrorEndpoint::new)
            .filter(|endpoint| Some(endpoint) != preferred.as_ref())
            .collect();

        Self {
            preferred,
            endpoints,
            shuffle: config.mirrors.shuffle,
            policy: config.retry.clone(),
            account: config.relay.account.clone(),
            scan_limit: config.relay.mirror_scan_limit,
            matcher: ContentMatcher::new(),
        }
    }

    pub fn with_preferred(mut self, preferred: MirrorEndpoint) -> Self {
        self.endpoints.retain(|endpoint| *endpoint != preferred);
        self.preferred = Some(preferred);
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_scan_limit(mut self, scan_limit: usize) -> Self {
        self.scan_limit = scan_limit;
        self
    }

    pub fn len(&self) -> usize {
        self.endpoints.len() + usize::from(self.preferred.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Order for this cycle: preferred first, then the (optionally shuffled) rest.
    pub fn rotation(&self) -> Vec<MirrorEndpoint> {
        let mut rest = self.endpoints.clone();
        if self.shuffle {
            fastrand::shuffle(&mut rest);
        }
        self.preferred.iter().cloned().chain(rest).collect()
    }

    /// Walk the rotation until an endpoint yields a matching entry.
    ///
    /// `None` is the normal "nothing new" outcome, not an error.
    pub async fn fetch(&self, fetcher: &dyn FeedFetcher) -> Option<SourcedCandidate> {
        for endpoint in self.rotation() {
            match self.try_endpoint(fetcher, &endpoint).await {
                Ok(Some(candidate)) => {
                    log::info!(
                        "Mirror {} returned announcement {}",
                        endpoint.base_url,
                        candidate.id
                    );
                    return Some(SourcedCandidate {
                        candidate,
                        origin: CandidateOrigin::Mirror {
                            endpoint: endpoint.base_url,
                        },
                    });
                }
                Ok(None) => {
                    log::debug!("Mirror {}: no matching entry", endpoint.base_url);
                }
                Err(error) => {
                    log::warn!("{}", error);
                }
            }
        }
        log::info!("No mirror produced an announcement this cycle");
        None
    }

    /// Attempt one endpoint with backoff on transient statuses.
    async fn try_endpoint(
        &self,
        fetcher: &dyn FeedFetcher,
        endpoint: &MirrorEndpoint,
    ) -> Result<Option<Candidate>> {
        let source = MirrorSource::new(endpoint, &self.account);

        for attempt in 1..=self.policy.max_attempts {
            match source
                .fetch_once(fetcher, &self.policy, &self.matcher, self.scan_limit)
                .await
            {
                Err(error) if error.is_transient() => {
                    let delay = self.policy.backoff(attempt);
                    log::warn!(
                        "{} (attempt {}/{}), backing off {}s",
                        error,
                        attempt,
                        self.policy.max_attempts,
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }

        Err(AppError::permanent(
            &endpoint.base_url,
            format!("still failing after {} attempts", self.policy.max_attempts),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::testing::{ScriptedFetcher, feed_item, rss};

    const M1: &str = "https://m1.example";
    const M2: &str = "https://m2.example";

    fn pool() -> MirrorPool {
        MirrorPool::new(
            vec![MirrorEndpoint::new(M1), MirrorEndpoint::new(M2)],
            RetryPolicy::default(),
            "FUTBIN",
        )
    }

    fn matching_feed(id: u64) -> String {
        rss(&[feed_item(
            "🚨 6pm Content: Icons drop today",
            &format!("https://m2.example/FUTBIN/status/{id}#m"),
        )])
    }

    fn feed_with_match_at(position: usize) -> String {
        let items: Vec<String> = (1..=10)
            .map(|n| {
                let title = if n == position {
                    "🚨 6pm Content: Icons drop today".to_string()
                } else {
                    format!("Post {n}")
                };
                feed_item(&title, &format!("https://m1.example/FUTBIN/status/{n}#m"))
            })
            .collect();
        rss(&items)
    }

    #[tokio::test]
    async fn test_default_pool_scans_nine_entries() {
        let fetcher = ScriptedFetcher::new().respond(M1, 200, &feed_with_match_at(9));
        let found = pool().fetch(&fetcher).await.unwrap();
        assert_eq!(found.candidate.id, "9");

        let fetcher = ScriptedFetcher::new()
            .respond(M1, 200, &feed_with_match_at(10))
            .fail(M2);
        assert!(pool().fetch(&fetcher).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_status_retries_with_doubling_backoff() {
        let fetcher = ScriptedFetcher::new()
            .respond(M1, 429, "")
            .respond(M1, 429, "")
            .respond(M1, 429, "")
            .respond(M2, 200, &matching_feed(555));

        let start = Instant::now();
        let found = pool().fetch(&fetcher).await.unwrap();

        assert_eq!(fetcher.calls_to(M1), 3);
        assert_eq!(fetcher.calls_to(M2), 1);
        assert_eq!(start.elapsed(), Duration::from_secs(3 + 6 + 12));
        assert_eq!(found.candidate.id, "555");
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_status_abandons_after_one_attempt() {
        let fetcher = ScriptedFetcher::new()
            .respond(M1, 404, "")
            .respond(M2, 200, &matching_feed(555));

        let start = Instant::now();
        let found = pool().fetch(&fetcher).await.unwrap();

        assert_eq!(fetcher.calls_to(M1), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(
            found.origin,
            CandidateOrigin::Mirror {
                endpoint: M2.to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_error_abandons_endpoint() {
        let fetcher = ScriptedFetcher::new()
            .fail(M1)
            .respond(M2, 200, &matching_feed(7));

        let found = pool().fetch(&fetcher).await.unwrap();
        assert_eq!(fetcher.calls_to(M1), 1);
        assert_eq!(found.candidate.id, "7");
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_match_short_circuits_rotation() {
        let fetcher = ScriptedFetcher::new()
            .respond(M1, 200, &matching_feed(1))
            .respond(M2, 200, &matching_feed(2));

        let found = pool().fetch(&fetcher).await.unwrap();
        assert_eq!(found.candidate.id, "1");
        assert_eq!(fetcher.calls_to(M2), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_found_is_none() {
        let fetcher = ScriptedFetcher::new()
            .respond(M1, 200, &rss(&[feed_item("Squad builder", "https://m1.example/x/status/3")]))
            .respond(M2, 500, "");

        assert!(pool().fetch(&fetcher).await.is_none());
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_identifier_moves_to_next_endpoint() {
        let fetcher = ScriptedFetcher::new()
            .respond(M1, 200, "<item><title>🚨 6pm Content: no id</title></item>")
            .respond(M2, 200, &matching_feed(9));

        let found = pool().fetch(&fetcher).await.unwrap();
        assert_eq!(found.candidate.id, "9");
    }

    #[test]
    fn test_preferred_always_first() {
        let pool = pool()
            .with_preferred(MirrorEndpoint::new(M2))
            .with_shuffle(true);

        for _ in 0..20 {
            let rotation = pool.rotation();
            assert_eq!(rotation[0], MirrorEndpoint::new(M2));
            assert_eq!(rotation.len(), 2);
        }
    }

    #[test]
    fn test_shuffle_keeps_every_endpoint() {
        let endpoints: Vec<_> = (0..7)
            .map(|i| MirrorEndpoint::new(format!("https://m{i}.example")))
            .collect();
        let pool = MirrorPool::new(endpoints.clone(), RetryPolicy::default(), "FUTBIN")
            .with_shuffle(true);

        let mut rotation = pool.rotation();
        rotation.sort_by(|a, b| a.base_url.cmp(&b.base_url));
        assert_eq!(rotation, endpoints);
    }

    #[test]
    fn test_from_config_separates_preferred() {
        let mut config = Config::default();
        config.mirrors.endpoints = vec![M1.to_string(), M2.to_string()];
        config.mirrors.preferred = Some(format!("{M2}/"));
        config.mirrors.shuffle = false;

        let pool = MirrorPool::from_config(&config);
        assert_eq!(pool.len(), 2);
        assert_eq!(
            pool.rotation(),
            vec![MirrorEndpoint::new(M2), MirrorEndpoint::new(M1)]
        );
    }
}
