//! Error types for publishing.

use thiserror::Error;

/// Result type for publish operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while publishing.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Broker or network error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// Delivery was not acknowledged before the deadline.
    #[error("operation timed out")]
    Timeout,

    /// Not connected.
    #[error("not connected to broker")]
    NotConnected,

    /// Local log error, including JSON encoding of an entry.
    #[error("log error: {0}")]
    Log(#[from] edgelog_core::CoreError),
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Timeout => true,
            _ => false,
        }
    }
}
