//! Error types for the endpoint clients.

use thiserror::Error;

/// Error returned by an endpoint client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport level failure (connect, timeout, body read).
    #[error("request to {url} failed: {source}")]
    Http {
        /// Endpoint the request was sent to.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Endpoint answered with a non-success HTTP status.
    #[error("endpoint {url} returned status {status}")]
    Status {
        /// Endpoint the request was sent to.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Response body could not be decoded.
    #[error("failed to decode response from {url}: {reason}")]
    Decode {
        /// Endpoint the request was sent to.
        url: String,
        /// Decoder message.
        reason: String,
    },

    /// Endpoint base URL is malformed.
    #[error("invalid endpoint url {url}: {source}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Builder(String),
}

impl ClientError {
    /// Whether the failure is transient and the request may be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Decode { .. } | Self::InvalidUrl { .. } | Self::Builder(_) => false,
        }
    }
}
