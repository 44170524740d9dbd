// src/services/matcher.rs

//! Announcement marker recognition.

use std::sync::LazyLock;

use regex::Regex;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^🚨\s*6pm\s*Content:\s*(.*)$").expect("valid marker pattern")
});

/// Recognizes `🚨 6pm Content:` posts and extracts the text after the marker.
///
/// Matching is case-insensitive and anchored at the start of the text; the
/// payload may span multiple lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentMatcher;

impl ContentMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Announcement text with surrounding whitespace trimmed, or `None`.
    pub fn extract(&self, text: &str) -> Option<String> {
        MARKER
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|payload| payload.as_str().trim().to_string())
    }

    pub fn is_match(&self, text: &str) -> bool {
        MARKER.is_match(text)
    }
}
