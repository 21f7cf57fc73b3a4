//! Errors raised by the Mirador client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while talking to Mirador Core.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client could not be built from its configuration.
    #[error("{0}")]
    Config(String),

    /// The request could not be sent or the response could not be read.
    /// Deadline expiry lands here too.
    #[error("mirador transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a status of 400 or above.
    #[error("mirador {operation} failed: {status}")]
    Upstream {
        /// The operation that failed (`request` or `health check`).
        operation: &'static str,
        /// The upstream status line.
        status: StatusCode,
    },

    /// The response body was not the expected JSON document.
    #[error("invalid mirador response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The caller cancelled the request.
    #[error("mirador request cancelled")]
    Cancelled,
}

impl ClientError {
    /// Returns true for errors raised before any request was attempted.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns the upstream status, if the upstream answered with an error.
    #[must_use]
    pub fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}
