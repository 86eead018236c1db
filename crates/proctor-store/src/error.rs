//! Error types for proctor-store

use thiserror::Error;

/// Errors surfaced by session and event stores.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The session id is unknown to the backend
    #[error("session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// The backend could not be reached (connect error, timeout, 5xx)
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// The backend answered with an unexpected status
    #[error("backend returned {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The request could not be built (bad URL, bad body)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The response body could not be decoded
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    /// The event references a session that is no longer accepting events
    #[error("session {session_id} is {status}, expected active")]
    SessionClosed { session_id: String, status: String },

    /// Serialization error
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Whether the failure is transport-level and may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Unreachable(_))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            StorageError::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            StorageError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            StorageError::UnexpectedStatus {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            StorageError::Unreachable(err.to_string())
        }
    }
}
