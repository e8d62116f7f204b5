//! Arena configuration

use super::block::{HEADER_SIZE, max_start_offset};
use crate::core::KB;
use crate::error::{MemoryError, MemoryResult};

/// Arena configuration builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Bytes requested from the backing allocator per block, header included
    pub block_size: usize,
    /// Whether to zero every new block before carving from it
    pub zero_blocks: bool,
    /// Whether to track statistics
    pub track_stats: bool,
}

impl ArenaConfig {
    /// Block size used by [`ArenaConfig::new`]
    pub const DEFAULT_BLOCK_SIZE: usize = 4 * KB;

    /// Creates new config with default values
    pub fn new() -> Self {
        Self {
            block_size: Self::DEFAULT_BLOCK_SIZE,
            zero_blocks: false,
            track_stats: cfg!(debug_assertions),
        }
    }

    /// Production configuration - larger blocks, no bookkeeping
    pub fn production() -> Self {
        Self {
            block_size: 64 * KB,
            zero_blocks: false,
            track_stats: false,
        }
    }

    /// Debug configuration - small zeroed blocks, full statistics
    pub fn debug() -> Self {
        Self {
            block_size: KB,
            zero_blocks: true,
            track_stats: true,
        }
    }

    /// Sets the block size (header included)
    #[must_use = "builder methods must be chained or built"]
    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    /// Enables or disables statistics
    #[must_use = "builder methods must be chained or built"]
    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.track_stats = enabled;
        self
    }

    /// Enables or disables zeroing of new blocks
    #[must_use = "builder methods must be chained or built"]
    pub fn with_zeroing(mut self, enabled: bool) -> Self {
        self.zero_blocks = enabled;
        self
    }

    /// Bytes of each block available to allocations
    pub fn usable_block_size(&self) -> usize {
        self.block_size.saturating_sub(HEADER_SIZE)
    }

    /// Largest request at `align` that fits any fresh block, or `None` if
    /// not even an empty request does.
    ///
    /// Equals [`usable_block_size`](Self::usable_block_size) for small
    /// alignments. Above `MAX_ALIGN` it assumes the worst base address a
    /// backing may return, so a block that happens to be better aligned is
    /// not relied on.
    pub fn max_request_size(&self, align: usize) -> Option<usize> {
        max_start_offset(align).and_then(|offset| self.block_size.checked_sub(offset))
    }

    /// Checks that a block can hold its header plus at least one byte.
    pub fn validate(&self) -> MemoryResult<()> {
        if self.block_size <= HEADER_SIZE {
            return Err(MemoryError::invalid_config(format!(
                "arena block size {} must exceed the {HEADER_SIZE}-byte block header",
                self.block_size
            )));
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new()
    }
}
