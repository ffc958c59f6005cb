use taskflow_core::{TaskId, ValidationError};
use thiserror::Error;

use crate::storage::StorageError;

/// Failures surfaced by the API client and the services built on it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No session is active, so no request was sent.
    #[error("No auth token found")]
    NotAuthenticated,
    /// The server answered `401`; the session has been invalidated.
    #[error("Session expired. Please log in again.")]
    Unauthorized,
    /// Input rejected before any request was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Non-success HTTP status.
    #[error("{message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or the operation's fallback.
        message: String,
    },
    /// A 2xx response carrying `success: false`.
    #[error("{0}")]
    Rejected(String),
    /// The request never produced a response.
    #[error("{context}")]
    Network {
        /// Operation fallback message shown to the user.
        context: &'static str,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The response body could not be decoded.
    #[error("unexpected response from server: {0}")]
    Decode(#[from] serde_json::Error),
    /// The session store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The task is not part of the loaded collection.
    #[error("Task not found: {0}")]
    UnknownTask(TaskId),
}

impl ApiError {
    /// Returns true for the errors that mean "log in again".
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::Unauthorized)
    }

    /// Text suitable for a one-line notification.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
