// src/error.rs

//! Unified error handling for the relay.

use std::fmt;

use thiserror::Error;

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Primary source could not be initialized or its request failed
    #[error("Primary source unavailable: {0}")]
    SourceUnavailable(String),

    /// Mirror answered with a retryable status
    #[error("Transient status {status} from {endpoint}")]
    TransientEndpoint { endpoint: String, status: u16 },

    /// Mirror failed in a way that is not worth retrying
    #[error("Endpoint {endpoint} abandoned: {reason}")]
    PermanentEndpoint { endpoint: String, reason: String },

    /// A matched feed entry carried neither a link nor a guid
    #[error("Matched entry from {endpoint} has no usable identifier")]
    MissingIdentifier { endpoint: String },

    /// Delivery sink rejected the message
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a primary-source error.
    pub fn unavailable(message: impl fmt::Display) -> Self {
        Self::SourceUnavailable(message.to_string())
    }

    /// Create a permanent endpoint error with context.
    pub fn permanent(endpoint: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::PermanentEndpoint {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a delivery error.
    pub fn delivery(message: impl fmt::Display) -> Self {
        Self::Delivery(message.to_string())
    }

    /// Whether the mirror pool should retry the same endpoint.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientEndpoint { .. })
    }
}
