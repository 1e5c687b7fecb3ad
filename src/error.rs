//! Error kinds observable by callers of the API layer.
//!
//! Transport and resource clients never return these through `Result`; they
//! travel inside a failed [`crate::transport::Envelope`] so callers branch on
//! success instead of unwinding. The `Display` text is what ends up in a
//! controller's `error` field.

use thiserror::Error;

use crate::models::{ReferralStatus, StatusAction};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Request timeout")]
    Timeout,

    #[error("Unable to connect to server. Please check if the API server is running.")]
    Unreachable,

    #[error("{0}")]
    Network(String),

    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    /// 404 from the backend, kept apart from other HTTP failures.
    #[error("HTTP error! status: 404 (not found)")]
    NotFound,

    /// Response body was not valid JSON.
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// JSON was valid but did not have the expected shape (e.g. not an array).
    #[error("Unexpected response shape: {0}")]
    Shape(String),

    /// A scoped request was attempted without a signed-in identity.
    #[error("No signed-in user for this request")]
    MissingIdentity,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }
}

/// Rejected referrer action on an applied referral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {action} a referral that is {from}")]
    NotAllowed {
        from: ReferralStatus,
        action: StatusAction,
    },
}

/// Failures persisting or restoring the signed-in session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}
