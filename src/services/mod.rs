//! Business logic services.
//!
//! - `ContentMatcher`: recognizes announcement posts
//! - `PrimarySource`: authoritative timeline for the account
//! - `MirrorSource` / `MirrorPool`: fallback feeds with retry and rotation
//! - `DeliverySink`: where rendered announcements go

pub mod matcher;
pub mod mirror;
pub mod pool;
pub mod primary;
pub mod sink;

pub use matcher::ContentMatcher;
pub use mirror::{FeedFetcher, HttpFeedFetcher, MirrorSource};
pub use pool::MirrorPool;
pub use primary::{PrimarySource, TimelineSource, probe_primary};
pub use sink::{DeliverySink, DiscordChannelSink, LogSink};
