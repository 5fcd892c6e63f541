//! Error types for the storage controller client.

use thiserror::Error;

/// Errors raised while talking to the storage controller.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    /// Raised when the controller rejects a request. Carries the HTTP status
    /// and the controller's message body.
    #[error("controller returned {status}: {message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Message body returned by the controller.
        message: String,
    },
    /// Raised when the request never produces a response, including when the
    /// per-call timeout expires.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },
    /// Raised when a successful response cannot be decoded.
    #[error("invalid response body: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },
    /// Raised when a request fails validation before being sent.
    #[error("invalid request: {0}")]
    Request(#[from] crate::resource::RequestError),
}

impl ApiError {
    /// Returns true when the controller reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    pub(super) fn transport(err: &reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }

    pub(super) fn decode(err: &serde_json::Error) -> Self {
        Self::Decode {
            message: err.to_string(),
        }
    }
}
