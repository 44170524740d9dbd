//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::MAX_MESSAGE_CHARS;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Polling and message settings
    #[serde(default)]
    pub relay: RelayConfig,

    /// Optional primary timeline binding
    #[serde(default)]
    pub primary: PrimaryConfig,

    /// Mirror feed endpoints
    #[serde(default)]
    pub mirrors: MirrorConfig,

    /// Per-endpoint retry behavior
    #[serde(default)]
    pub retry: RetryPolicy,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Chat delivery settings
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.relay.account.trim().is_empty() {
            return Err(AppError::validation("relay.account is empty"));
        }
        if self.relay.poll_interval_secs == 0 {
            return Err(AppError::validation("relay.poll_interval_secs must be > 0"));
        }
        if self.relay.primary_scan_limit == 0 || self.relay.mirror_scan_limit == 0 {
            return Err(AppError::validation("relay scan limits must be > 0"));
        }
        if self.relay.max_message_len == 0 || self.relay.max_message_len > MAX_MESSAGE_CHARS {
            return Err(AppError::validation(format!(
                "relay.max_message_len must be between 1 and {MAX_MESSAGE_CHARS}"
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::validation("retry.max_attempts must be > 0"));
        }
        if self.retry.backoff_multiplier == 0 {
            return Err(AppError::validation("retry.backoff_multiplier must be >= 1"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }

        let preferred = self.mirrors.preferred.iter();
        for base_url in preferred.chain(self.mirrors.endpoints.iter()) {
            let parsed = Url::parse(base_url)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::validation(format!(
                    "mirror {base_url} must use http or https"
                )));
            }
        }
        if self.primary.timeline_url.is_none() && self.mirror_endpoints().is_empty() {
            return Err(AppError::validation(
                "No primary timeline and no mirror endpoints configured",
            ));
        }
        Ok(())
    }

    /// Validate the settings live delivery needs on top of [`Config::validate`].
    pub fn validate_delivery(&self) -> Result<()> {
        self.validate()?;
        if self.discord.token.as_deref().is_none_or(|t| t.trim().is_empty()) {
            return Err(AppError::validation("discord.token (DISCORD_TOKEN) is not set"));
        }
        if self
            .discord
            .channel_id
            .as_deref()
            .is_none_or(|id| id.trim().is_empty())
        {
            return Err(AppError::validation("discord.channel_id (CHANNEL_ID) is not set"));
        }
        Ok(())
    }

    /// Static mirror list with the preferred endpoint prepended, duplicates removed.
    pub fn mirror_endpoints(&self) -> Vec<String> {
        let mut endpoints: Vec<String> = Vec::new();
        let preferred = self.mirrors.preferred.iter();
        for base_url in preferred.chain(self.mirrors.endpoints.iter()) {
            let normalized = base_url.trim().trim_end_matches('/').to_string();
            if !normalized.is_empty() && !endpoints.contains(&normalized) {
                endpoints.push(normalized);
            }
        }
        endpoints
    }
}

/// Polling, scanning and message settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Account whose posts are watched
    #[serde(default = "defaults::account")]
    pub account: String,

    /// Seconds between poll cycles
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_secs: u64,

    /// Items scanned from the primary timeline per cycle
    #[serde(default = "defaults::primary_scan_limit")]
    pub primary_scan_limit: usize,

    /// Entries scanned per mirror feed
    #[serde(default = "defaults::mirror_scan_limit")]
    pub mirror_scan_limit: usize,

    /// Maximum outbound message length in characters
    #[serde(default = "defaults::max_message_len")]
    pub max_message_len: usize,

    /// Fixed header line placed under the role mention
    #[serde(default = "defaults::header")]
    pub header: String,

    /// Role mention placed on the first line, e.g. `<@&1234>`
    #[serde(default)]
    pub role_mention: String,

    /// Whether dedup state advances before or after the send
    #[serde(default)]
    pub delivery_order: DeliveryOrder,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            account: defaults::account(),
            poll_interval_secs: defaults::poll_interval(),
            primary_scan_limit: defaults::primary_scan_limit(),
            mirror_scan_limit: defaults::mirror_scan_limit(),
            max_message_len: defaults::max_message_len(),
            header: defaults::header(),
            role_mention: String::new(),
            delivery_order: DeliveryOrder::default(),
        }
    }
}

/// Ordering of the dedup update relative to delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryOrder {
    /// Advance state, then send. A failed send is not retried.
    #[default]
    MarkThenSend,
    /// Send, then advance state only if the sink accepted the message.
    SendThenMark,
}

/// Primary timeline binding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrimaryConfig {
    /// JSON timeline URL; `{account}` is substituted
    #[serde(default)]
    pub timeline_url: Option<String>,
}

/// Mirror feed endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Operator-preferred mirror, always tried first
    #[serde(default)]
    pub preferred: Option<String>,

    /// Static mirror list
    #[serde(default = "defaults::mirror_endpoints")]
    pub endpoints: Vec<String>,

    /// Shuffle the non-preferred endpoints every cycle
    #[serde(default = "defaults::enabled")]
    pub shuffle: bool,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            preferred: None,
            endpoints: defaults::mirror_endpoints(),
            shuffle: true,
        }
    }
}

/// Per-endpoint retry and backoff policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts per endpoint before it is abandoned
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Delay after the first transient response
    #[serde(default = "defaults::initial_backoff")]
    pub initial_backoff_secs: u64,

    /// Growth factor applied after each transient response
    #[serde(default = "defaults::backoff_multiplier")]
    pub backoff_multiplier: u32,

    /// Statuses that trigger backoff-and-retry on the same endpoint
    #[serde(default = "defaults::transient_statuses")]
    pub transient_statuses: Vec<u16>,
}

impl RetryPolicy {
    /// Whether `status` should be retried.
    pub fn is_transient(&self, status: u16) -> bool {
        self.transient_statuses.contains(&status)
    }

    /// Backoff after the given 1-based attempt: 3s, 6s, 12s with the defaults.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = u64::from(self.backoff_multiplier).saturating_pow(exponent);
        Duration::from_secs(self.initial_backoff_secs.saturating_mul(factor))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            initial_backoff_secs: defaults::initial_backoff(),
            backoff_multiplier: defaults::backoff_multiplier(),
            transient_statuses: defaults::transient_statuses(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Chat delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// REST API base
    #[serde(default = "defaults::discord_api_base")]
    pub api_base: String,

    /// Bot token
    #[serde(default)]
    pub token: Option<String>,

    /// Target channel
    #[serde(default)]
    pub channel_id: Option<String>,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::discord_api_base(),
            token: None,
            channel_id: None,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

pub(crate) mod defaults {
    // Relay defaults
    pub fn account() -> String {
        "FUTBIN".into()
    }
    pub fn poll_interval() -> u64 {
        120
    }
    pub fn primary_scan_limit() -> usize {
        10
    }
    pub fn mirror_scan_limit() -> usize {
        9
    }
    pub fn max_message_len() -> usize {
        super::MAX_MESSAGE_CHARS
    }
    pub fn header() -> String {
        "**6pm Content:**".into()
    }

    // Mirror defaults
    pub fn enabled() -> bool {
        true
    }
    pub fn mirror_endpoints() -> Vec<String> {
        vec![
            "https://nitter.net".into(),
            "https://nitter.poast.org".into(),
            "https://nitter.privacydev.net".into(),
            "https://nitter.tiekoetter.com".into(),
            "https://xcancel.com".into(),
            "https://nitter.space".into(),
        ]
    }

    // Retry defaults
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn initial_backoff() -> u64 {
        3
    }
    pub fn backoff_multiplier() -> u32 {
        2
    }
    pub fn transient_statuses() -> Vec<u16> {
        vec![403, 429, 502, 503, 520, 522]
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; content-relay/0.1)".into()
    }
    pub fn timeout() -> u64 {
        15
    }

    pub fn discord_api_base() -> String {
        "https://discord.com/api/v10".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
