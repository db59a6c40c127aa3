//! Transport error type

use super::ApiCode;
use crate::cancel::CancelReason;

/// Errors that can occur while sending a request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backend answered with a non-zero envelope status.
    #[error("API error {status}: {message}")]
    Api {
        /// Envelope status.
        status: i64,
        /// Envelope message, empty if absent.
        message: String,
    },

    /// Non-2xx HTTP response.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body as text.
        body: String,
    },

    /// Network error during the request.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request was cancelled or timed out.
    #[error("Request {0}")]
    Cancelled(CancelReason),

    /// The response body is not a status envelope.
    #[error("Malformed response envelope: {body}")]
    MalformedEnvelope {
        /// Response body as text.
        body: String,
    },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A header name or value cannot be sent.
    #[error("Invalid header '{name}'")]
    InvalidHeader {
        /// Header name.
        name: String,
    },

    /// Credential storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] async_sqlite::Error),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates a new API error.
    pub fn api(status: i64, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a new HTTP error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Creates a new malformed envelope error.
    pub fn malformed_envelope(body: impl Into<String>) -> Self {
        Self::MalformedEnvelope { body: body.into() }
    }

    /// Creates a new invalid header error.
    pub fn invalid_header(name: impl Into<String>) -> Self {
        Self::InvalidHeader { name: name.into() }
    }

    /// Returns the envelope status if this is an API error.
    pub fn status_code(&self) -> Option<i64> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the HTTP status if this is an HTTP error.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Returns the known status code, if any.
    pub fn api_code(&self) -> Option<ApiCode> {
        self.status_code().and_then(ApiCode::from_status)
    }

    /// Returns `true` if the request was cancelled, including timeouts.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Returns `true` if the request timed out.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Cancelled(CancelReason::TimedOut(_)) => true,
            Self::Network(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` if the user has to sign in again.
    pub fn requires_reauth(&self) -> bool {
        self.api_code().is_some_and(ApiCode::requires_reauth)
    }

    /// Returns the page this error sends the user to, if any.
    pub fn navigation_target(&self) -> Option<&'static str> {
        self.api_code().and_then(ApiCode::navigation_target)
    }
}
