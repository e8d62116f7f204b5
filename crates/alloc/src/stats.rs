//! Allocation statistics
//!
//! Allocators in this crate are single-owner, so counters live in a plain
//! [`Cell`] instead of atomics. Collection is opt-in per allocator config; when
//! disabled every `record_*` call is a branch on a bool.

use core::cell::Cell;

/// Snapshot of allocator activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Successful allocations
    pub allocations: u64,
    /// Allocation requests that returned an error
    pub failed_allocations: u64,
    /// Slots returned to a block allocator
    pub frees: u64,
    /// Frees ignored because the pointer was not a slot of the allocator
    pub ignored_frees: u64,
    /// Bytes currently handed out (alignment padding excluded)
    pub bytes_in_use: usize,
    /// Highest `bytes_in_use` observed since the statistics were reset
    pub peak_bytes: usize,
    /// Bytes skipped to satisfy alignment
    pub padding_bytes: usize,
    /// Bulk resets or clears
    pub resets: u64,
    /// Blocks obtained from a backing allocator
    pub blocks_acquired: u64,
    /// Blocks handed back to a backing allocator
    pub blocks_released: u64,
}

/// Conditionally collected statistics
#[derive(Debug, Default)]
pub(crate) struct OptionalStats {
    enabled: bool,
    stats: Cell<AllocatorStats>,
}

impl OptionalStats {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            stats: Cell::new(AllocatorStats::default()),
        }
    }

    #[inline]
    fn update(&self, f: impl FnOnce(&mut AllocatorStats)) {
        if self.enabled {
            let mut stats = self.stats.get();
            f(&mut stats);
            self.stats.set(stats);
        }
    }

    #[inline]
    pub(crate) fn record_allocation(&self, size: usize, padding: usize) {
        self.update(|s| {
            s.allocations += 1;
            s.bytes_in_use += size;
            s.padding_bytes += padding;
            s.peak_bytes = s.peak_bytes.max(s.bytes_in_use);
        });
    }

    #[inline]
    pub(crate) fn record_failure(&self) {
        self.update(|s| s.failed_allocations += 1);
    }

    #[inline]
    pub(crate) fn record_free(&self, size: usize) {
        self.update(|s| {
            s.frees += 1;
            s.bytes_in_use = s.bytes_in_use.saturating_sub(size);
        });
    }

    #[inline]
    pub(crate) fn record_ignored_free(&self) {
        self.update(|s| s.ignored_frees += 1);
    }

    pub(crate) fn record_reset(&self) {
        self.update(|s| {
            s.resets += 1;
            s.bytes_in_use = 0;
        });
    }

    pub(crate) fn record_block_acquired(&self) {
        self.update(|s| s.blocks_acquired += 1);
    }

    pub(crate) fn record_blocks_released(&self, count: usize) {
        self.update(|s| s.blocks_released += count as u64);
    }

    pub(crate) fn snapshot(&self) -> AllocatorStats {
        self.stats.get()
    }

    pub(crate) fn reset(&self) {
        self.stats.set(AllocatorStats::default());
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }
}
