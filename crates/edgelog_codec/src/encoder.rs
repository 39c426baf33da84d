//! Fixed-width big-endian encoders.

use crate::buffer::Buffer;
use crate::error::{CodecError, CodecResult};

impl Buffer<'_> {
    /// Appends a single byte.
    pub fn put_u8(&mut self, value: u8) {
        self.write(&[value]);
    }

    /// Appends a big-endian `u16`.
    pub fn put_u16(&mut self, value: u16) {
        self.write(&value.to_be_bytes());
    }

    /// Appends a big-endian `u32`.
    pub fn put_u32(&mut self, value: u32) {
        self.write(&value.to_be_bytes());
    }

    /// Appends a big-endian `u64`.
    pub fn put_u64(&mut self, value: u64) {
        self.write(&value.to_be_bytes());
    }

    /// Appends an `f32` as its IEEE bit pattern.
    pub fn put_f32(&mut self, value: f32) {
        self.put_u32(value.to_bits());
    }

    /// Appends an `f64` as its IEEE bit pattern.
    ///
    /// NaN payloads and the sign of zero survive a round trip unchanged.
    pub fn put_f64(&mut self, value: f64) {
        self.put_u64(value.to_bits());
    }

    /// Appends a `u32` length prefix followed by the raw UTF-8 bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is longer than `u32::MAX` bytes.
    pub fn put_str(&mut self, value: &str) -> CodecResult<()> {
        self.put_blob(value.as_bytes())
    }

    /// Appends a `u32` length prefix followed by the opaque bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is longer than `u32::MAX` bytes.
    pub fn put_blob(&mut self, value: &[u8]) -> CodecResult<()> {
        let len = u32::try_from(value.len()).map_err(|_| CodecError::SizeLimitExceeded {
            claimed: value.len() as u64,
            max_allowed: u64::from(u32::MAX),
        })?;
        self.put_u32(len);
        self.write(value);
        Ok(())
    }
}
