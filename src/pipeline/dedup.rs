//! Duplicate suppression for delivered announcements.
//!
//! Only the last delivered id is remembered, and only for the lifetime of the
//! process. A restart may relay the most recent announcement once more.

use serde::{Deserialize, Serialize};

/// The single remembered identifier of the last delivered announcement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupState {
    last_delivered_id: Option<String>,
}

impl DedupState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State that already remembers `id`.
    pub fn with_last(id: impl Into<String>) -> Self {
        Self {
            last_delivered_id: Some(id.into()),
        }
    }

    pub fn last_delivered_id(&self) -> Option<&str> {
        self.last_delivered_id.as_deref()
    }

    /// Whether `id` is the announcement most recently delivered.
    pub fn is_delivered(&self, id: &str) -> bool {
        self.last_delivered_id.as_deref() == Some(id)
    }

    /// Remember `id`, returning the previous value.
    pub fn mark(&mut self, id: impl Into<String>) -> Option<String> {
        self.last_delivered_id.replace(id.into())
    }
}
