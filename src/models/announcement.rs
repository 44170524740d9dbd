//! Outbound announcement message.

use serde::{Deserialize, Serialize};

use crate::models::RelayConfig;

/// Longest message the chat channel accepts.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// An announcement ready to be rendered for the chat channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Announcement {
    /// Role mention line, e.g. `<@&1234>`; omitted when empty
    pub role_mention: String,

    /// Fixed header line
    pub header: String,

    /// Extracted announcement text
    pub body: String,
}

impl Announcement {
    /// Build an announcement using the relay's mention and header.
    pub fn new(relay: &RelayConfig, body: impl Into<String>) -> Self {
        Self {
            role_mention: relay.role_mention.clone(),
            header: relay.header.clone(),
            body: body.into(),
        }
    }

    /// Render as `mention\nheader\n\nbody`, cut to `max_len` characters.
    pub fn render(&self, max_len: usize) -> String {
        let message = if self.role_mention.trim().is_empty() {
            format!("{}\n\n{}", self.header, self.body)
        } else {
            format!("{}\n{}\n\n{}", self.role_mention, self.header, self.body)
        };
        truncate_chars(&message, max_len)
    }
}

/// Keep at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
