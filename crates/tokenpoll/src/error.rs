//! Token polling error types.

use reqwest::StatusCode;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, TokenError>;

/// Errors that can occur while fetching or decoding access tokens.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid base URL `{input}`: {reason}")]
    InvalidBaseUrl { input: String, reason: String },

    #[error("invalid location `{location}`: {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("request failed with HTTP {status} during {operation}")]
    HttpStatus {
        status: StatusCode,
        operation: &'static str,
    },

    /// The service answered with an `{"err": ...}` body, e.g. for an
    /// unknown location.
    #[error("service error: {message}")]
    Api { message: String },

    /// The service answered with an empty body. Happens while the server
    /// rotates tokens; retried without counting as a failure.
    #[error("empty response body")]
    EmptyResponse,

    #[error("malformed response: {reason}")]
    MalformedResponse { reason: String },
}

impl TokenError {
    pub fn invalid_base_url(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBaseUrl {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_location(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLocation {
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    /// Transient errors are retried after a short fixed delay and do not
    /// count toward the failure threshold. Everything else escalates.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::EmptyResponse)
    }
}
