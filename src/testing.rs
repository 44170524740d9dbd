//! In-memory fakes shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Candidate, FeedResponse};
use crate::services::{DeliverySink, FeedFetcher, PrimarySource};

enum Scripted {
    Respond(FeedResponse),
    Fail,
}

/// Feed fetcher answering from per-endpoint queues.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, base_url: &str, status: u16, body: &str) -> Self {
        self.push(base_url, Scripted::Respond(FeedResponse::new(status, body)))
    }

    pub fn fail(self, base_url: &str) -> Self {
        self.push(base_url, Scripted::Fail)
    }

    fn push(self, base_url: &str, script: Scripted) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(base_url.to_string())
            .or_default()
            .push_back(script);
        self
    }

    /// Every URL requested, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, base_url: &str) -> usize {
        self.calls()
            .iter()
            .filter(|url| url.starts_with(base_url))
            .count()
    }
}

#[async_trait]
impl FeedFetcher for ScriptedFetcher {
    async fn fetch_feed(&self, url: &str) -> Result<FeedResponse> {
        self.calls.lock().unwrap().push(url.to_string());

        let mut scripts = self.scripts.lock().unwrap();
        let next = scripts
            .iter_mut()
            .find(|(base, _)| url.starts_with(base.as_str()))
            .and_then(|(_, queue)| queue.pop_front());

        match next {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail) => Err(AppError::config("connection reset")),
            None => Err(AppError::config(format!("no scripted response for {url}"))),
        }
    }
}

/// Primary source with a fixed answer.
pub struct FakePrimary {
    items: Option<Vec<Candidate>>,
    fetches: AtomicUsize,
}

impl FakePrimary {
    pub fn returning(items: Vec<Candidate>) -> Self {
        Self {
            items: Some(items),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            items: None,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PrimarySource for FakePrimary {
    fn name(&self) -> &str {
        "fake"
    }

    async fn fetch(&self) -> Result<Vec<Candidate>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.items
            .clone()
            .ok_or_else(|| AppError::unavailable("integration not installed"))
    }
}

/// Sink that records messages and can be told to reject them.
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
    reject: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliverySink for RecordingSink {
    async fn deliver(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.reject {
            return Err(AppError::delivery("channel not found"));
        }
        Ok(())
    }
}

/// One `<item>` block.
pub fn feed_item(title: &str, link: &str) -> String {
    format!("<item><title>{title}</title><link>{link}</link></item>")
}

/// Wrap items in a minimal RSS document.
pub fn rss(items: &[String]) -> String {
    let body: String = items.concat();
    format!("<?xml version=\"1.0\"?><rss><channel><title>feed</title>{body}</channel></rss>")
}
