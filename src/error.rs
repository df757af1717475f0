//! Error types for the connector gateway

use reqwest::StatusCode;
use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Errors surfaced by connectors and the configuration layer
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Transport-level failure (connect, TLS, timeout, interrupted body)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("backend returned {status}: {message}")]
    Backend { status: StatusCode, message: String },

    /// Backend answered 2xx but the payload did not match the expected shape
    #[error("unexpected backend response: {0}")]
    InvalidResponse(String),

    /// Raised by the retry policy once all attempts are spent
    #[error("retries exhausted after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ConnectorError>,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("connector not found: {0}")]
    ConnectorNotFound(String),
}

impl ConnectorError {
    /// Whether a retry can plausibly succeed.
    ///
    /// Transport failures and availability-class statuses (5xx, 408, 429)
    /// are transient; everything else fails identically on re-attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ConnectorError::HttpClient(e) => !e.is_builder(),
            ConnectorError::Backend { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::TOO_MANY_REQUESTS
                    || *status == StatusCode::REQUEST_TIMEOUT
            }
            _ => false,
        }
    }
}
