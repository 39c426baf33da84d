//! Error types for the codec crate.

use std::io;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while staging, flushing, encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Not enough bytes were available to satisfy a read.
    #[error("short read: needed {needed} bytes, only {available} available")]
    ShortRead {
        /// Number of bytes requested.
        needed: usize,
        /// Number of unread bytes that were available.
        available: usize,
    },

    /// The buffer has no backing stream to refill from or flush to.
    #[error("buffer is not bound to a stream")]
    Unbound,

    /// The underlying stream reported an error.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O failure.
        message: String,
    },

    /// A length prefix exceeds the configured ceiling.
    #[error("length {claimed} exceeds maximum of {max_allowed} bytes")]
    SizeLimitExceeded {
        /// Length advertised by the input.
        claimed: u64,
        /// Maximum permitted length.
        max_allowed: u64,
    },

    /// A string field did not contain valid UTF-8.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// The decoded bytes are structurally invalid.
    #[error("invalid structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },
}

impl CodecError {
    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Returns true if the error means data was missing or the device failed,
    /// as opposed to the data being malformed.
    pub fn is_shortfall(&self) -> bool {
        matches!(self, Self::ShortRead { .. } | Self::Unbound | Self::Io { .. })
    }
}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortfall_classification() {
        assert!(CodecError::ShortRead {
            needed: 4,
            available: 1
        }
        .is_shortfall());
        assert!(CodecError::Unbound.is_shortfall());
        assert!(CodecError::from(io::Error::new(io::ErrorKind::Other, "disk")).is_shortfall());
        assert!(!CodecError::InvalidUtf8.is_shortfall());
        assert!(!CodecError::invalid_structure("bad tag").is_shortfall());
    }

    #[test]
    fn error_display() {
        let err = CodecError::SizeLimitExceeded {
            claimed: 10,
            max_allowed: 4,
        };
        assert_eq!(err.to_string(), "length 10 exceeds maximum of 4 bytes");
    }
}
