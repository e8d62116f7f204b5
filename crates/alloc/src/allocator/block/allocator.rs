//! Block allocator implementation
//!
//! # Safety
//!
//! Free slots store a [`FreeLink`] in their first [`LINK_SIZE`] bytes:
//! - the link holds the *index* of the next free slot plus one, zero ends
//!   the list, so no pointer is ever reconstructed from slot contents
//! - slots need not be aligned for `usize` (item sizes like 36 are allowed),
//!   so links are always accessed with unaligned reads and writes
//! - a link is only read for slots reachable from `free_head`, and its bytes
//!   are cleared before a slot is handed out
//!
//! ## Invariants
//!
//! - `item_size >= LINK_SIZE`
//! - every index on the free list is `< item_count` and appears once
//! - `free_count` equals the length of the free list
//! - `free` accepts only pointers at a slot boundary inside
//!   `[start, start + item_count * item_size)`; anything else is ignored
//!
//! Double free is not detected in release builds. Debug builds assert that a
//! freed slot is not already on the free list.

use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ptr::NonNull;

#[cfg(feature = "logging")]
use tracing::debug;

use super::BlockConfig;
use crate::core::traits::validate_alignment;
use crate::core::{Allocator, LINK_SIZE, MemoryUsage, Resettable, StatisticsProvider};
use crate::error::{MemoryError, MemoryResult};
use crate::stats::{AllocatorStats, OptionalStats};
use crate::utils::natural_alignment;

/// Node in the free list
///
/// When a slot is free its first bytes hold the index (plus one) of the next
/// free slot.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FreeLink(usize);

impl FreeLink {
    const END: Self = Self(0);

    fn to(index: usize) -> Self {
        Self(index + 1)
    }

    fn target(self) -> Option<usize> {
        self.0.checked_sub(1)
    }
}

/// Pool of equally sized slots carved from one borrowed buffer
///
/// # Memory Layout
/// ```text
/// [Slot0][Slot1][Slot2][Slot3]...[SlotN-1][waste]
///    ↓       ↓              ↓
/// head → [free] → [free] → [free] → end
/// ```
///
/// The initial free list runs in ascending address order: the first
/// allocation returns the start of the buffer and fresh slots come out
/// upwards. Free lists built by pushing each slot in turn come out the other
/// way, highest slot first; this one deliberately does not. Only the LIFO
/// reuse of freed slots is part of the contract, so callers should not depend
/// on the order in which never-used slots are handed out.
pub struct BlockAllocator<'buf> {
    start: NonNull<u8>,
    buffer_len: usize,
    item_size: usize,
    item_count: usize,

    /// Head of the free list
    free_head: Cell<FreeLink>,
    free_count: Cell<usize>,

    config: BlockConfig,
    stats: OptionalStats,
    _buffer: PhantomData<&'buf mut [MaybeUninit<u8>]>,
}

impl<'buf> BlockAllocator<'buf> {
    /// Partitions `buffer` into slots of `item_size` bytes.
    ///
    /// # Errors
    /// [`MemoryError::InvalidConfig`] if `item_size` cannot hold a free-list
    /// link.
    pub fn new(buffer: &'buf mut [u8], item_size: usize) -> MemoryResult<Self> {
        Self::with_config(buffer, item_size, BlockConfig::default())
    }

    /// Partitions `buffer` with custom configuration.
    pub fn with_config(
        buffer: &'buf mut [u8],
        item_size: usize,
        config: BlockConfig,
    ) -> MemoryResult<Self> {
        let len = buffer.len();
        let start = NonNull::from(buffer).cast::<u8>();
        Self::from_raw_parts(start, len, item_size, config)
    }

    /// Partitions uninitialized storage.
    pub fn from_uninit(
        buffer: &'buf mut [MaybeUninit<u8>],
        item_size: usize,
        config: BlockConfig,
    ) -> MemoryResult<Self> {
        let len = buffer.len();
        let start = NonNull::from(buffer).cast::<u8>();
        Self::from_raw_parts(start, len, item_size, config)
    }

    fn from_raw_parts(
        start: NonNull<u8>,
        buffer_len: usize,
        item_size: usize,
        config: BlockConfig,
    ) -> MemoryResult<Self> {
        if item_size < LINK_SIZE {
            return Err(MemoryError::invalid_config(format!(
                "item size {item_size} is smaller than a free-list link ({LINK_SIZE} bytes)"
            )));
        }

        let allocator = Self {
            start,
            buffer_len,
            item_size,
            item_count: buffer_len / item_size,
            free_head: Cell::new(FreeLink::END),
            free_count: Cell::new(0),
            config,
            stats: OptionalStats::new(config.track_stats),
            _buffer: PhantomData,
        };
        allocator.link_all();

        #[cfg(feature = "logging")]
        debug!(
            item_size,
            slots = allocator.item_count,
            wasted = allocator.wasted_bytes(),
            "block allocator partitioned"
        );

        Ok(allocator)
    }

    /// Threads every slot into the free list in ascending order.
    fn link_all(&self) {
        for index in 0..self.item_count {
            let next = if index + 1 < self.item_count {
                FreeLink::to(index + 1)
            } else {
                FreeLink::END
            };
            // SAFETY: index < item_count.
            unsafe { self.write_link(index, next) };
        }

        let head = if self.item_count == 0 {
            FreeLink::END
        } else {
            FreeLink::to(0)
        };
        self.free_head.set(head);
        self.free_count.set(self.item_count);
    }

    /// # Safety
    /// `index < item_count`
    #[inline]
    unsafe fn slot_ptr(&self, index: usize) -> NonNull<u8> {
        debug_assert!(index < self.item_count);
        // SAFETY: index * item_size < item_count * item_size <= buffer_len.
        unsafe { self.start.add(index * self.item_size) }
    }

    /// # Safety
    /// `index < item_count` and the slot is not handed out.
    #[inline]
    unsafe fn read_link(&self, index: usize) -> FreeLink {
        // SAFETY: The slot holds at least LINK_SIZE bytes inside the buffer.
        unsafe {
            self.slot_ptr(index)
                .cast::<FreeLink>()
                .as_ptr()
                .read_unaligned()
        }
    }

    /// # Safety
    /// `index < item_count` and the slot is not handed out.
    #[inline]
    unsafe fn write_link(&self, index: usize, link: FreeLink) {
        // SAFETY: The slot holds at least LINK_SIZE bytes inside the buffer.
        unsafe {
            self.slot_ptr(index)
                .cast::<FreeLink>()
                .as_ptr()
                .write_unaligned(link);
        }
    }

    /// Index of the slot starting exactly at `ptr`, if any.
    fn slot_index(&self, ptr: *const u8) -> Option<usize> {
        let offset = ptr.addr().checked_sub(self.start.as_ptr().addr())?;
        let index = offset / self.item_size;
        (index < self.item_count && offset.is_multiple_of(self.item_size)).then_some(index)
    }

    /// Detaches the head of the free list.
    ///
    /// The first [`LINK_SIZE`] bytes of the returned slot are zero; the rest
    /// holds whatever was there before (or the configured fill pattern).
    ///
    /// # Errors
    /// [`MemoryError::PoolExhausted`] when every slot is handed out.
    pub fn alloc(&self) -> MemoryResult<NonNull<[u8]>> {
        let Some(index) = self.free_head.get().target() else {
            self.stats.record_failure();
            return Err(MemoryError::pool_exhausted(self.item_count));
        };

        // SAFETY: Free-list indices are < item_count and the slot is free.
        let slot = unsafe {
            self.free_head.set(self.read_link(index));
            self.slot_ptr(index)
        };
        self.free_count.set(self.free_count.get() - 1);

        // SAFETY: The slot is item_size bytes inside the buffer and now
        // exclusively owned by this call.
        unsafe {
            if let Some(pattern) = self.config.alloc_pattern {
                slot.as_ptr().write_bytes(pattern, self.item_size);
            }
            slot.as_ptr().write_bytes(0, LINK_SIZE);
        }

        self.stats.record_allocation(self.item_size, 0);
        Ok(NonNull::slice_from_raw_parts(slot, self.item_size))
    }

    /// Returns a slot to the head of the free list.
    ///
    /// Pointers that are not the start of a slot of this allocator are
    /// ignored. Returns whether the slot was accepted.
    ///
    /// # Safety
    ///
    /// If `ptr` is the start of one of this allocator's slots, that slot must
    /// currently be handed out and nothing may access it after this call.
    pub unsafe fn free(&self, ptr: NonNull<u8>) -> bool {
        let Some(index) = self.slot_index(ptr.as_ptr()) else {
            self.stats.record_ignored_free();
            return false;
        };
        debug_assert!(!self.is_on_free_list(index), "double free of slot {index}");

        // SAFETY: index < item_count and the caller hands the slot back.
        unsafe {
            if let Some(pattern) = self.config.dealloc_pattern {
                self.slot_ptr(index)
                    .as_ptr()
                    .write_bytes(pattern, self.item_size);
            }
            self.write_link(index, self.free_head.get());
        }
        self.free_head.set(FreeLink::to(index));
        self.free_count.set(self.free_count.get() + 1);

        self.stats.record_free(self.item_size);
        true
    }

    fn is_on_free_list(&self, index: usize) -> bool {
        self.free_indices().any(|free| free == index)
    }

    /// Walks the free list from its head.
    fn free_indices(&self) -> impl Iterator<Item = usize> + '_ {
        let mut cursor = self.free_head.get();
        core::iter::from_fn(move || {
            let index = cursor.target()?;
            // SAFETY: Free-list indices are < item_count and free.
            cursor = unsafe { self.read_link(index) };
            Some(index)
        })
    }

    /// Re-partitions the buffer, making every slot free again. O(item_count).
    pub fn reset(&mut self) {
        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: The slotted span lies inside the buffer and no slot is
            // referenced (&mut self).
            unsafe {
                self.start
                    .as_ptr()
                    .write_bytes(pattern, self.item_count * self.item_size);
            }
        }
        self.link_all();
        self.stats.record_reset();

        #[cfg(feature = "logging")]
        debug!(slots = self.item_count, "block allocator reset");
    }

    /// Size of every slot
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    /// Number of slots carved from the buffer
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Trailing bytes too short to form a slot
    pub fn wasted_bytes(&self) -> usize {
        self.buffer_len - self.item_count * self.item_size
    }

    /// Slots currently free
    pub fn free_count(&self) -> usize {
        self.free_count.get()
    }

    /// Slots currently handed out
    pub fn allocated_count(&self) -> usize {
        self.item_count - self.free_count.get()
    }

    /// Length of the free list, counted by walking it. O(free slots).
    pub fn free_list_len(&self) -> usize {
        self.free_indices().count()
    }

    /// Whether every slot is handed out
    pub fn is_exhausted(&self) -> bool {
        self.free_count.get() == 0
    }

    /// Whether `ptr` is the start of one of this allocator's slots
    pub fn contains(&self, ptr: *const u8) -> bool {
        self.slot_index(ptr).is_some()
    }

    /// Largest alignment every slot is guaranteed to satisfy
    pub fn slot_align(&self) -> usize {
        natural_alignment(self.start.as_ptr().addr() | self.item_size)
    }
}

impl fmt::Debug for BlockAllocator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockAllocator")
            .field("start", &self.start)
            .field("item_size", &self.item_size)
            .field("item_count", &self.item_count)
            .field("free_count", &self.free_count.get())
            .field("config", &self.config)
            .finish()
    }
}

// SAFETY: Unique borrow of the buffer plus Cells; stays !Sync through Cell.
unsafe impl Send for BlockAllocator<'_> {}

// SAFETY: Each handed-out slot is disjoint from every other slot and from the
// free list. A slot only returns to circulation through the unsafe `free`
// (whose caller guarantees it is no longer referenced) or `reset(&mut self)`.
unsafe impl Allocator for BlockAllocator<'_> {
    fn allocate(&self, size: usize, align: usize) -> MemoryResult<NonNull<[u8]>> {
        validate_alignment(align)?;
        if size > self.item_size {
            self.stats.record_failure();
            return Err(MemoryError::request_too_large(size, self.item_size));
        }
        if align > self.slot_align() {
            self.stats.record_failure();
            return Err(MemoryError::invalid_alignment(align));
        }
        self.alloc()
    }
}

impl Resettable for BlockAllocator<'_> {
    fn reset(&mut self) {
        BlockAllocator::reset(self);
    }
}

impl MemoryUsage for BlockAllocator<'_> {
    fn used_memory(&self) -> usize {
        self.allocated_count() * self.item_size
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.free_count() * self.item_size)
    }
}

impl StatisticsProvider for BlockAllocator<'_> {
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
