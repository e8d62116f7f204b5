//! Block-chained bump arena
//!
//! # Safety
//!
//! Single-threaded bump allocation over a chain of blocks:
//! - `Cell` holds the newest block, no synchronization
//! - blocks are linked newest-first through their headers
//! - only the newest block is ever bumped; older blocks are never revisited
//!
//! ## Invariants
//!
//! - every block in the chain was acquired from `backing` and is released to
//!   it exactly once, in `clear` (also run on drop)
//! - the chain is acyclic: a block is only ever prepended while fresh
//! - regions handed out through `&self` are disjoint and live until
//!   `clear(&mut self)`, so the typed helpers can return references tied to
//!   the arena borrow

use core::cell::Cell;
use core::fmt;
use core::ptr::NonNull;

#[cfg(feature = "logging")]
use tracing::debug;

use super::ArenaConfig;
use super::block::Block;
use crate::backing::{BackingAllocator, SystemBacking};
use crate::core::traits::validate_alignment;
use crate::core::{Allocator, MAX_ALIGN, MemoryUsage, Resettable, StatisticsProvider};
use crate::error::{MemoryError, MemoryResult};
use crate::stats::{AllocatorStats, OptionalStats};

/// Growable arena of fixed-size blocks
///
/// ```
/// use strata_alloc::{Allocator, Arena, ArenaConfig};
///
/// let mut arena = Arena::with_config(ArenaConfig::new().with_block_size(1024)).unwrap();
/// let name = arena.alloc_str("block chain").unwrap();
/// assert_eq!(name, "block chain");
/// assert_eq!(arena.block_count(), 1);
///
/// arena.clear();
/// assert_eq!(arena.block_count(), 0);
/// ```
pub struct Arena<B: BackingAllocator = SystemBacking> {
    /// Newest block, head of the chain
    head: Cell<Option<Block>>,
    block_count: Cell<usize>,
    config: ArenaConfig,
    backing: B,
    stats: OptionalStats,
}

impl Arena {
    /// Creates an empty arena over the system heap with default config.
    pub fn new() -> Self {
        Self::from_parts(SystemBacking, ArenaConfig::default())
    }

    /// Creates an empty arena over the system heap.
    pub fn with_config(config: ArenaConfig) -> MemoryResult<Self> {
        Self::with_backing(SystemBacking, config)
    }

    /// Creates an arena whose blocks are `block_size` bytes, header included.
    pub fn with_block_size(block_size: usize) -> MemoryResult<Self> {
        Self::with_config(ArenaConfig::default().with_block_size(block_size))
    }

    /// Creates arena with production config - optimized for performance
    pub fn production() -> Self {
        Self::from_parts(SystemBacking, ArenaConfig::production())
    }

    /// Creates arena with debug config - optimized for debugging
    pub fn debug() -> Self {
        Self::from_parts(SystemBacking, ArenaConfig::debug())
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: BackingAllocator> Arena<B> {
    /// Creates an empty arena that grows from `backing`.
    ///
    /// No block is acquired until the first allocation.
    pub fn with_backing(backing: B, config: ArenaConfig) -> MemoryResult<Self> {
        config.validate()?;
        Ok(Self::from_parts(backing, config))
    }

    fn from_parts(backing: B, config: ArenaConfig) -> Self {
        Self {
            head: Cell::new(None),
            block_count: Cell::new(0),
            config,
            backing,
            stats: OptionalStats::new(config.track_stats),
        }
    }

    /// Hands out `size` bytes aligned to `align`.
    ///
    /// Tries the newest block first. If it cannot hold the request, one new
    /// block is acquired, prepended and tried; older blocks are never
    /// rescanned.
    ///
    /// # Errors
    /// - [`MemoryError::InvalidAlignment`] if `align` is not a power of two
    /// - [`MemoryError::RequestTooLarge`] if the request cannot fit an empty
    ///   block (see [`ArenaConfig::max_request_size`]); no block is acquired
    /// - [`MemoryError::OutOfMemory`] if the backing allocator fails
    pub fn alloc(&self, size: usize, align: usize) -> MemoryResult<NonNull<[u8]>> {
        validate_alignment(align)?;

        let max = self.config.max_request_size(align);
        if max.is_none_or(|max| size > max) {
            self.stats.record_failure();
            return Err(MemoryError::request_too_large(size, max.unwrap_or(0)));
        }

        if let Some(block) = self.head.get() {
            // SAFETY: The head block is live until clear(&mut self).
            if let Some((region, padding)) = unsafe { block.bump(size, align) } {
                self.stats.record_allocation(size, padding);
                return Ok(region);
            }
        }

        let block = self.grow()?;
        // SAFETY: Freshly initialized block owned by this arena.
        match unsafe { block.bump(size, align) } {
            Some((region, padding)) => {
                self.stats.record_allocation(size, padding);
                Ok(region)
            }
            None => {
                // Only a backing that returns short or under-aligned regions
                // gets here. The block is still empty, so it goes straight back.
                self.discard_head(block);
                self.stats.record_failure();
                Err(MemoryError::request_too_large(size, max.unwrap_or(0)))
            }
        }
    }

    /// Unlinks and releases a block that was just prepended and never used.
    fn discard_head(&self, block: Block) {
        debug_assert_eq!(self.head.get(), Some(block));
        debug_assert_eq!(block.used(), 0);
        self.head.set(block.next());
        self.block_count.set(self.block_count.get() - 1);
        let region = block.region();
        // SAFETY: The block came from `backing` in this call, left the chain
        // above and nothing was carved from it.
        unsafe { self.backing.release(region) };
        self.stats.record_blocks_released(1);
    }

    /// Acquires a block from the backing and makes it the head of the chain.
    fn grow(&self) -> MemoryResult<Block> {
        let size = self.config.block_size;
        let region = self.backing.acquire(size).map_err(|_| {
            self.stats.record_failure();
            MemoryError::out_of_memory(size, MAX_ALIGN)
        })?;

        if self.config.zero_blocks {
            // SAFETY: The region was just acquired and is exclusively ours.
            unsafe { region.cast::<u8>().as_ptr().write_bytes(0, region.len()) };
        }

        // SAFETY: Backing regions are writable, unaliased, at least
        // block_size > HEADER_SIZE bytes long and MAX_ALIGN aligned.
        let block = unsafe { Block::init(region, self.head.get()) };
        self.head.set(Some(block));
        self.block_count.set(self.block_count.get() + 1);
        self.stats.record_block_acquired();

        #[cfg(feature = "logging")]
        debug!(
            blocks = self.block_count.get(),
            size = region.len(),
            "arena grew a block"
        );

        Ok(block)
    }

    /// Releases every block to the backing allocator. O(blocks).
    ///
    /// The arena stays usable and grows again on the next allocation.
    /// Clearing an empty arena does nothing.
    pub fn clear(&mut self) {
        let mut released = 0usize;
        let mut cursor = self.head.take();

        while let Some(block) = cursor {
            cursor = block.next();
            let region = block.region();
            // SAFETY: The block was acquired from `backing` and leaves the
            // chain here, so it is released exactly once. No allocation from
            // it is alive (&mut self).
            unsafe { self.backing.release(region) };
            released += 1;
        }

        self.block_count.set(0);
        if released > 0 {
            self.stats.record_blocks_released(released);
            self.stats.record_reset();

            #[cfg(feature = "logging")]
            debug!(released, "arena cleared");
        }
    }

    /// Number of blocks in the chain
    pub fn block_count(&self) -> usize {
        self.block_count.get()
    }

    /// Bytes of each block available to allocations
    pub fn usable_block_size(&self) -> usize {
        self.config.usable_block_size()
    }

    /// Bytes left in the newest block (0 when the arena is empty)
    pub fn current_block_remaining(&self) -> usize {
        self.head.get().map_or(0, Block::remaining)
    }

    /// Configuration the arena was created with
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Backing allocator blocks come from
    pub fn backing(&self) -> &B {
        &self.backing
    }

    fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        core::iter::successors(self.head.get(), |block| block.next())
    }
}

impl<B: BackingAllocator> Drop for Arena<B> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<B: BackingAllocator + fmt::Debug> fmt::Debug for Arena<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("block_count", &self.block_count.get())
            .field("config", &self.config)
            .field("backing", &self.backing)
            .finish()
    }
}

// SAFETY: The arena exclusively owns its blocks; moving it moves that
// ownership along with B. It stays !Sync through Cell.
unsafe impl<B: BackingAllocator + Send> Send for Arena<B> {}

// SAFETY: Regions are carved from owned blocks without overlap and stay valid
// until clear(&mut self) or drop.
unsafe impl<B: BackingAllocator> Allocator for Arena<B> {
    #[inline]
    fn allocate(&self, size: usize, align: usize) -> MemoryResult<NonNull<[u8]>> {
        self.alloc(size, align)
    }
}

/// An arena can back another arena. Blocks handed out this way are reclaimed
/// when the outer arena is cleared.
// SAFETY: Regions are MAX_ALIGN aligned, disjoint and live until clear.
unsafe impl<B: BackingAllocator> BackingAllocator for Arena<B> {
    fn acquire(&self, size: usize) -> MemoryResult<NonNull<[u8]>> {
        self.alloc(size, MAX_ALIGN)
    }

    unsafe fn release(&self, _region: NonNull<[u8]>) {}
}

impl<B: BackingAllocator> Resettable for Arena<B> {
    fn reset(&mut self) {
        self.clear();
    }
}

impl<B: BackingAllocator> MemoryUsage for Arena<B> {
    fn used_memory(&self) -> usize {
        self.blocks().map(Block::used).sum()
    }

    /// Unbounded: the arena grows as long as its backing does.
    fn available_memory(&self) -> Option<usize> {
        None
    }
}

impl<B: BackingAllocator> StatisticsProvider for Arena<B> {
    fn statistics(&self) -> AllocatorStats {
        self.stats.snapshot()
    }

    fn reset_statistics(&self) {
        self.stats.reset();
    }

    fn statistics_enabled(&self) -> bool {
        self.stats.is_enabled()
    }
}
