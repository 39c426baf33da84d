//! Error types for edgelog core.

use crate::executor::ExecutorError;
use edgelog_codec::CodecError;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in edgelog core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Binary codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The log file is structurally invalid.
    #[error("invalid log format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// The header carries an unexpected magic number or version.
    #[error("protocol mismatch: magic {magic:#010x}, version {version}")]
    ProtocolMismatch {
        /// Magic number found in the header.
        magic: u32,
        /// Version found in the header.
        version: u32,
    },

    /// A JSON document is missing a required field or has the wrong shape.
    #[error("JSON field `{field}`: {message}")]
    JsonShape {
        /// Name of the offending field.
        field: String,
        /// Description of the problem.
        message: String,
    },

    /// The execution engine rejected a statement.
    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),

    /// Upstream history disagrees with this log's own sequence numbers.
    #[error("merge integrity failure for client {client_id} at seq {upstream_seq}: {reason}")]
    MergeIntegrity {
        /// Client whose sequence is inconsistent.
        client_id: String,
        /// Sequence number carried by the upstream entry.
        upstream_seq: u64,
        /// Description of the mismatch.
        reason: String,
    },

    /// Another session holds the log file.
    #[error("log locked: another session has exclusive access")]
    LogLocked,

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates a JSON shape error.
    pub fn json_shape(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonShape {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a merge integrity error.
    pub fn merge_integrity(
        client_id: impl Into<String>,
        upstream_seq: u64,
        reason: impl Into<String>,
    ) -> Self {
        Self::MergeIntegrity {
            client_id: client_id.into(),
            upstream_seq,
            reason: reason.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true if the error means stored or inbound data is malformed.
    pub fn is_format_error(&self) -> bool {
        match self {
            Self::Codec(e) => !e.is_shortfall(),
            Self::InvalidFormat { .. } | Self::ProtocolMismatch { .. } | Self::JsonShape { .. } => {
                true
            }
            _ => false,
        }
    }

    /// Returns true if the error means data was missing or the device failed.
    pub fn is_shortfall(&self) -> bool {
        match self {
            Self::Codec(e) => e.is_shortfall(),
            Self::Io(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let short = CoreError::from(CodecError::ShortRead {
            needed: 8,
            available: 2,
        });
        assert!(short.is_shortfall());
        assert!(!short.is_format_error());

        let utf8 = CoreError::from(CodecError::InvalidUtf8);
        assert!(utf8.is_format_error());
        assert!(!utf8.is_shortfall());

        assert!(CoreError::ProtocolMismatch {
            magic: 0,
            version: 9
        }
        .is_format_error());
        assert!(CoreError::json_shape("type", "missing").is_format_error());
        assert!(!CoreError::LogLocked.is_format_error());
        assert!(!CoreError::merge_integrity("A", 9, "ahead").is_shortfall());
    }

    #[test]
    fn display() {
        let err = CoreError::ProtocolMismatch {
            magic: 0x2e43_514c,
            version: 7,
        };
        assert_eq!(
            err.to_string(),
            "protocol mismatch: magic 0x2e43514c, version 7"
        );
        assert_eq!(
            CoreError::json_shape("block_id", "field not found").to_string(),
            "JSON field `block_id`: field not found"
        );
    }
}
