//! Error types for completion backends

use thiserror::Error;

/// Errors that can occur while talking to a completion backend
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed (connection refused, non-2xx status, ...)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request exceeded the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Backend answered with something we could not read
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No transport exists for the configured provider name
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Provider profile is missing something the transport needs
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Http(e.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(e: serde_json::Error) -> Self {
        LlmError::InvalidResponse(e.to_string())
    }
}
