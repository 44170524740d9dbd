//! Mirror feed structures.

/// One entry block of a mirror feed. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub description: String,
    pub link: String,
    pub guid: String,
}

/// Raw HTTP answer from a mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResponse {
    pub status: u16,
    pub body: String,
}

impl FeedResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Only a plain 200 counts as success.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// A mirror base URL serving `{base_url}/{account}/rss`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MirrorEndpoint {
    pub base_url: String,
}

impl MirrorEndpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Feed URL for the given account.
    pub fn feed_url(&self, account: &str) -> String {
        format!("{}/{}/rss", self.base_url.trim_end_matches('/'), account)
    }
}
