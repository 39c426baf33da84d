//! # edgelog codec
//!
//! Streaming buffer and big-endian binary codec for the edgelog
//! write-ahead log.
//!
//! Every multi-byte integer is big-endian, floats travel as their IEEE bit
//! patterns, and strings and blobs carry a `u32` length prefix with no
//! terminator. The [`Buffer`] stages bytes in memory and can be bound to a
//! file or any other [`Stream`] for paged reads and explicit flushes.
//!
//! ## Usage
//!
//! ```
//! use edgelog_codec::Buffer;
//!
//! let mut buf = Buffer::new();
//! buf.put_u32(7);
//! buf.put_str("INSERT INTO t VALUES (1)").unwrap();
//!
//! let mut reader = Buffer::from_bytes(buf.into_bytes());
//! assert_eq!(reader.get_u32().unwrap(), 7);
//! assert_eq!(reader.get_string().unwrap(), "INSERT INTO t VALUES (1)");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod decoder;
mod encoder;
mod error;

pub use buffer::{Buffer, Stream, DEFAULT_MAX_LENGTH, PAGE_SIZE};
pub use error::{CodecError, CodecResult};

/// Types with a binary representation on the log's wire format.
pub trait Encode {
    /// Append this value to `buf`.
    fn encode(&self, buf: &mut Buffer<'_>) -> CodecResult<()>;

    /// Encode this value into a fresh byte vector.
    fn to_bytes(&self) -> CodecResult<Vec<u8>> {
        let mut buf = Buffer::new();
        self.encode(&mut buf)?;
        Ok(buf.into_bytes())
    }
}

/// Types that can be read back from the log's wire format.
pub trait Decode: Sized {
    /// Consume one value from `buf`.
    fn decode(buf: &mut Buffer<'_>) -> CodecResult<Self>;

    /// Decode a value from a complete byte slice.
    ///
    /// Trailing bytes are an error.
    fn from_bytes(bytes: &[u8]) -> CodecResult<Self> {
        let mut buf = Buffer::from_bytes(bytes.to_vec());
        let value = Self::decode(&mut buf)?;
        if buf.unread() != 0 {
            return Err(CodecError::invalid_structure(format!(
                "{} trailing bytes",
                buf.unread()
            )));
        }
        Ok(value)
    }
}
