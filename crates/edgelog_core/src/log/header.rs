//! Fixed-size file header.

use crate::error::{CoreError, CoreResult};
use crate::types::BlockPosition;
use edgelog_codec::{Buffer, CodecResult, Decode, Encode};

/// Magic number at offset 0 of every local log.
pub const LOCAL_LOG_MAGIC: u32 = 0x2e43_514c;

/// Current local log format version.
pub const LOCAL_LOG_VERSION: u32 = 1;

/// Encoded header size in bytes.
/// magic (4) + version (4) + block position (16) + next_publish (8)
/// + sequence (8) + entries (4) + salt (2) + checksum (2) = 48 bytes
pub const HEADER_SIZE: usize = 48;

/// File-level metadata stored at offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalLogHeader {
    /// Format identifier, [`LOCAL_LOG_MAGIC`].
    pub magic: u32,
    /// Format version.
    pub version: u32,
    /// Last upstream block this log is reconciled against.
    pub block_id: u64,
    /// Index within `block_id`.
    pub block_index: u64,
    /// Sequence number of the next entry to publish.
    pub next_publish: u64,
    /// Sequence number for the next appended entry.
    pub sequence: u64,
    /// Number of entries following the header.
    pub entries: u32,
    /// Reserved, always written as 0.
    pub salt: u16,
    /// Reserved, always written as 0.
    pub checksum: u16,
}

impl LocalLogHeader {
    /// Creates the header of an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            magic: LOCAL_LOG_MAGIC,
            version: LOCAL_LOG_VERSION,
            block_id: 0,
            block_index: 0,
            next_publish: 0,
            sequence: 0,
            entries: 0,
            salt: 0,
            checksum: 0,
        }
    }

    /// Returns the reconciled block position.
    #[must_use]
    pub const fn position(&self) -> BlockPosition {
        BlockPosition::new(self.block_id, self.block_index)
    }

    /// Number of appended entries not yet published.
    #[must_use]
    pub const fn unpublished(&self) -> u64 {
        self.sequence.saturating_sub(self.next_publish)
    }

    /// Checks the format identifiers and counters.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProtocolMismatch`] for a foreign magic number or
    /// an unsupported version, and [`CoreError::InvalidFormat`] if the
    /// counters contradict each other.
    pub fn validate(&self) -> CoreResult<()> {
        if self.magic != LOCAL_LOG_MAGIC || !(1..=LOCAL_LOG_VERSION).contains(&self.version) {
            return Err(CoreError::ProtocolMismatch {
                magic: self.magic,
                version: self.version,
            });
        }
        if self.next_publish > self.sequence {
            return Err(CoreError::invalid_format(format!(
                "publish cursor {} is past sequence {}",
                self.next_publish, self.sequence
            )));
        }
        if u64::from(self.entries) > self.sequence {
            return Err(CoreError::invalid_format(format!(
                "{} entries but sequence is only {}",
                self.entries, self.sequence
            )));
        }
        Ok(())
    }
}

impl Default for LocalLogHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl Encode for LocalLogHeader {
    fn encode(&self, buf: &mut Buffer<'_>) -> CodecResult<()> {
        buf.put_u32(self.magic);
        buf.put_u32(self.version);
        buf.put_u64(self.block_id);
        buf.put_u64(self.block_index);
        buf.put_u64(self.next_publish);
        buf.put_u64(self.sequence);
        buf.put_u32(self.entries);
        buf.put_u16(self.salt);
        buf.put_u16(self.checksum);
        Ok(())
    }
}

impl Decode for LocalLogHeader {
    fn decode(buf: &mut Buffer<'_>) -> CodecResult<Self> {
        Ok(Self {
            magic: buf.get_u32()?,
            version: buf.get_u32()?,
            block_id: buf.get_u64()?,
            block_index: buf.get_u64()?,
            next_publish: buf.get_u64()?,
            sequence: buf.get_u64()?,
            entries: buf.get_u32()?,
            salt: buf.get_u16()?,
            checksum: buf.get_u16()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_size_and_layout() {
        let header = LocalLogHeader {
            block_id: 1,
            sequence: 2,
            entries: 2,
            ..LocalLogHeader::new()
        };
        let bytes = header.to_bytes().unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[..8], &[0x2e, 0x43, 0x51, 0x4c, 0, 0, 0, 1]);
        assert_eq!(LocalLogHeader::from_bytes(&bytes).unwrap(), header);
    }

    #[test]
    fn fresh_header_is_valid() {
        let header = LocalLogHeader::new();
        header.validate().unwrap();
        assert!(header.position().is_zero());
        assert_eq!(header.unpublished(), 0);
    }

    #[test]
    fn foreign_magic_rejected() {
        let header = LocalLogHeader {
            magic: 0xDEAD_BEEF,
            ..LocalLogHeader::new()
        };
        assert!(matches!(
            header.validate(),
            Err(CoreError::ProtocolMismatch {
                magic: 0xDEAD_BEEF,
                version: 1
            })
        ));
    }

    #[test]
    fn unsupported_versions_rejected() {
        for version in [0, LOCAL_LOG_VERSION + 1] {
            let header = LocalLogHeader {
                version,
                ..LocalLogHeader::new()
            };
            assert!(matches!(
                header.validate(),
                Err(CoreError::ProtocolMismatch { .. })
            ));
        }
    }

    #[test]
    fn cursor_past_sequence_rejected() {
        let header = LocalLogHeader {
            next_publish: 3,
            sequence: 2,
            entries: 2,
            ..LocalLogHeader::new()
        };
        assert!(matches!(
            header.validate(),
            Err(CoreError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn truncated_header_is_a_shortfall() {
        let bytes = LocalLogHeader::new().to_bytes().unwrap();
        let err = LocalLogHeader::from_bytes(&bytes[..HEADER_SIZE - 1]).unwrap_err();
        assert!(err.is_shortfall());
    }
}
