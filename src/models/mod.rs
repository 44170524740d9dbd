// src/models/mod.rs

//! Domain models for the relay.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod announcement;
mod candidate;
mod config;
mod feed;

// Re-export all public types
pub use announcement::{Announcement, MAX_MESSAGE_CHARS, truncate_chars};
pub use candidate::{Candidate, CandidateOrigin, SourcedCandidate};
pub use config::{
    Config, DeliveryOrder, DiscordConfig, HttpConfig, LoggingConfig, MirrorConfig, PrimaryConfig,
    RelayConfig, RetryPolicy,
};
pub(crate) use config::defaults;
pub use feed::{FeedEntry, FeedResponse, MirrorEndpoint};
