//! Core type definitions for edgelog.

use std::fmt;

/// Position of an entry in the upstream chain.
///
/// Positions order by `block_id` first, then `block_index`. The zero
/// position means "not yet confirmed".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockPosition {
    /// Upstream block identifier.
    pub block_id: u64,
    /// Index within the block.
    pub block_index: u64,
}

impl BlockPosition {
    /// The unconfirmed position.
    pub const ZERO: Self = Self::new(0, 0);

    /// Creates a new block position.
    #[must_use]
    pub const fn new(block_id: u64, block_index: u64) -> Self {
        Self {
            block_id,
            block_index,
        }
    }

    /// Returns true for the unconfirmed position.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.block_id == 0 && self.block_index == 0
    }
}

impl fmt::Display for BlockPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block:{}.{}", self.block_id, self.block_index)
    }
}
