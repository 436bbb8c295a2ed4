//! # ForumError
//!
//! Centralized error handling for the schoolboard crates.
//! Transport, backend and client-side failures all land in one taxonomy so
//! pages can decide between degrading, alerting or redirecting.

use std::time::Duration;
use thiserror::Error;

/// The primary error type for all sb-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForumError {
    /// Connection refused, DNS failure and similar.
    #[error("Network error: Unable to connect to {base_url}. Please check if the API server is running and accessible. ({reason})")]
    Network { base_url: String, reason: String },

    /// The request budget elapsed before a response arrived.
    #[error("request timed out after {}s", after.as_secs())]
    Timeout { after: Duration },

    /// Non-2xx response from the backend or the proxy.
    #[error("HTTP error! status: {status}, message: {message}")]
    Http { status: u16, message: String },

    /// Client-side rejection before any request is sent (e.g. language filter)
    #[error("validation error: {0}")]
    Validation(String),

    /// Role gate failure; pages turn this into a redirect.
    #[error("unauthorized: {0}")]
    Authorization(String),

    /// The backend answered with `{"status": "error"}`. Message is verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Response was not JSON or did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Persisted client state could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ForumError {
    /// True for failures of the transport itself rather than of the request.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }

    /// The text shown to a user in an alert.
    ///
    /// Backend rejections and HTTP errors surface their message untouched;
    /// everything else falls back to the display form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) => message.clone(),
            Self::Http { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for ForumError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

/// A specialized Result type for schoolboard logic.
pub type Result<T> = std::result::Result<T, ForumError>;
