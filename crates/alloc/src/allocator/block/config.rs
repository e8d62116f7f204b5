//! Block allocator configuration

/// Configuration for [`BlockAllocator`](super::BlockAllocator)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockConfig {
    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill pattern byte for newly allocated slots (for debugging).
    /// The free-list link bytes are still cleared to zero afterwards.
    pub alloc_pattern: Option<u8>,
    /// Fill pattern byte for freed slots (for debugging)
    pub dealloc_pattern: Option<u8>,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            track_stats: cfg!(debug_assertions),
            alloc_pattern: if cfg!(debug_assertions) {
                Some(0xBB)
            } else {
                None
            },
            dealloc_pattern: if cfg!(debug_assertions) {
                Some(0xDD)
            } else {
                None
            },
        }
    }
}

impl BlockConfig {
    /// Production configuration - no fills, no counters
    #[must_use]
    pub fn production() -> Self {
        Self {
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }

    /// Debug configuration - fills and counters on regardless of build
    #[must_use]
    pub fn debug() -> Self {
        Self {
            track_stats: true,
            alloc_pattern: Some(0xBB),
            dealloc_pattern: Some(0xDD),
        }
    }
}
