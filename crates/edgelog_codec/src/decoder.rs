//! Fixed-width big-endian decoders.

use crate::buffer::Buffer;
use crate::error::{CodecError, CodecResult};

impl Buffer<'_> {
    #[inline]
    fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let bytes = self.read(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads a single byte.
    pub fn get_u8(&mut self) -> CodecResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads a big-endian `u16`.
    pub fn get_u16(&mut self) -> CodecResult<u16> {
        self.read_array().map(u16::from_be_bytes)
    }

    /// Reads a big-endian `u32`.
    pub fn get_u32(&mut self) -> CodecResult<u32> {
        self.read_array().map(u32::from_be_bytes)
    }

    /// Reads a big-endian `u64`.
    pub fn get_u64(&mut self) -> CodecResult<u64> {
        self.read_array().map(u64::from_be_bytes)
    }

    /// Reads an `f32` from its IEEE bit pattern.
    pub fn get_f32(&mut self) -> CodecResult<f32> {
        self.get_u32().map(f32::from_bits)
    }

    /// Reads an `f64` from its IEEE bit pattern.
    pub fn get_f64(&mut self) -> CodecResult<f64> {
        self.get_u64().map(f64::from_bits)
    }

    /// Reads a length-prefixed opaque byte sequence.
    ///
    /// The advertised length is checked against [`Buffer::max_length`] before
    /// anything is allocated.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::SizeLimitExceeded`] for an oversized prefix and a
    /// shortfall error if fewer bytes than advertised are available.
    pub fn get_blob(&mut self) -> CodecResult<Vec<u8>> {
        let len = self.get_u32()?;
        if len > self.max_length() {
            return Err(CodecError::SizeLimitExceeded {
                claimed: u64::from(len),
                max_allowed: u64::from(self.max_length()),
            });
        }
        Ok(self.read(len as usize)?.to_vec())
    }

    /// Reads a length-prefixed UTF-8 string.
    ///
    /// # Errors
    ///
    /// As [`Buffer::get_blob`], plus [`CodecError::InvalidUtf8`].
    pub fn get_string(&mut self) -> CodecResult<String> {
        let bytes = self.get_blob()?;
        String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encoded(f: impl FnOnce(&mut Buffer<'_>)) -> Buffer<'static> {
        let mut buf = Buffer::new();
        f(&mut buf);
        Buffer::from_bytes(buf.into_bytes())
    }

    #[test]
    fn integers_roundtrip() {
        let mut buf = encoded(|b| {
            b.put_u8(u8::MAX);
            b.put_u16(0xBEEF);
            b.put_u32(0xDEAD_BEEF);
            b.put_u64(u64::MAX - 1);
        });
        assert_eq!(buf.get_u8().unwrap(), u8::MAX);
        assert_eq!(buf.get_u16().unwrap(), 0xBEEF);
        assert_eq!(buf.get_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(buf.get_u64().unwrap(), u64::MAX - 1);
    }

    #[test]
    fn special_floats_keep_their_bits() {
        let nan_with_payload = f64::from_bits(0x7FF8_0000_0000_1234);
        let subnormal = f64::from_bits(1);
        let mut buf = encoded(|b| {
            b.put_f64(nan_with_payload);
            b.put_f64(-0.0);
            b.put_f64(subnormal);
            b.put_f32(f32::NEG_INFINITY);
        });
        assert_eq!(buf.get_f64().unwrap().to_bits(), nan_with_payload.to_bits());
        assert_eq!(buf.get_f64().unwrap().to_bits(), (-0.0f64).to_bits());
        assert_eq!(buf.get_f64().unwrap().to_bits(), 1);
        assert_eq!(buf.get_f32().unwrap(), f32::NEG_INFINITY);
    }

    #[test]
    fn strings_and_blobs_roundtrip() {
        let mut buf = encoded(|b| {
            b.put_str("").unwrap();
            b.put_str("SELECT 1").unwrap();
            b.put_blob(&[0, 159, 146, 150]).unwrap();
        });
        assert_eq!(buf.get_string().unwrap(), "");
        assert_eq!(buf.get_string().unwrap(), "SELECT 1");
        assert_eq!(buf.get_blob().unwrap(), vec![0, 159, 146, 150]);
    }

    #[test]
    fn truncated_string_is_a_shortfall() {
        let mut bytes = encoded(|b| b.put_str("hello").unwrap()).into_bytes();
        bytes.pop();
        let err = Buffer::from_bytes(bytes).get_string().unwrap_err();
        assert!(err.is_shortfall());
    }

    #[test]
    fn truncated_integer_is_a_shortfall() {
        let mut buf = Buffer::from_bytes(vec![0, 0, 1]);
        assert!(buf.get_u32().unwrap_err().is_shortfall());
    }

    #[test]
    fn oversized_length_rejected_before_reading() {
        let mut buf = Buffer::from_bytes(vec![0xFF, 0xFF, 0xFF, 0xFF]).with_max_length(1024);
        assert_eq!(
            buf.get_blob().unwrap_err(),
            CodecError::SizeLimitExceeded {
                claimed: u64::from(u32::MAX),
                max_allowed: 1024,
            }
        );
    }

    #[test]
    fn invalid_utf8_rejected() {
        let mut buf = encoded(|b| b.put_blob(&[0xFF, 0xFE]).unwrap());
        assert_eq!(buf.get_string().unwrap_err(), CodecError::InvalidUtf8);
    }

    proptest! {
        #[test]
        fn any_f64_bit_pattern_roundtrips(bits in any::<u64>()) {
            let mut buf = encoded(|b| b.put_f64(f64::from_bits(bits)));
            prop_assert_eq!(buf.get_f64().unwrap().to_bits(), bits);
        }

        #[test]
        fn any_f32_bit_pattern_roundtrips(bits in any::<u32>()) {
            let mut buf = encoded(|b| b.put_f32(f32::from_bits(bits)));
            prop_assert_eq!(buf.get_f32().unwrap().to_bits(), bits);
        }
    }
}
