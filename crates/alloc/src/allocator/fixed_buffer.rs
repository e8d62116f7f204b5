//! Linear allocator over a caller-supplied buffer
//!
//! # Safety
//!
//! The allocator borrows the buffer mutably for `'buf` and never reads it:
//! - `head` is an offset into the buffer, `0 <= head <= capacity`
//! - every allocation is carved from `[head, capacity)` and moves `head`
//!   forward, so regions of one generation never overlap
//! - `reset` takes `&mut self`, so no region handed out through `&self` can
//!   outlive the generation it belongs to
//!
//! There is no per-allocation free. Dropping the allocator leaves the buffer
//! untouched.

use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ptr::NonNull;

#[cfg(feature = "logging")]
use tracing::trace;

use super::bump::bump;
use crate::backing::BackingAllocator;
use crate::core::traits::validate_alignment;
use crate::core::{Allocator, MAX_ALIGN, MemoryUsage, Resettable, StatisticsProvider};
use crate::error::{MemoryError, MemoryResult};
use crate::stats::{AllocatorStats, OptionalStats};

/// Configuration for [`FixedBufferAllocator`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedBufferConfig {
    /// Enable statistics tracking
    pub track_stats: bool,
    /// Byte written over the used span on reset (for catching use after reset)
    pub reset_pattern: Option<u8>,
}

impl FixedBufferConfig {
    /// No statistics, O(1) reset
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Statistics on, used span poisoned with `0xDD` on reset
    #[must_use]
    pub fn debug() -> Self {
        Self {
            track_stats: true,
            reset_pattern: Some(0xDD),
        }
    }
}

/// Bump allocator over one borrowed buffer
///
/// ```
/// use strata_alloc::FixedBufferAllocator;
///
/// let mut buf = [0u8; 256];
/// let mut fba = FixedBufferAllocator::new(&mut buf);
/// let a = fba.alloc(48, 1).unwrap();
/// assert_eq!(a.len(), 48);
/// assert_eq!(fba.used(), 48);
/// fba.reset();
/// assert_eq!(fba.used(), 0);
/// ```
pub struct FixedBufferAllocator<'buf> {
    start: NonNull<u8>,
    capacity: usize,
    head: Cell<usize>,
    config: FixedBufferConfig,
    stats: OptionalStats,
    _buffer: PhantomData<&'buf mut [MaybeUninit<u8>]>,
}

impl<'buf> FixedBufferAllocator<'buf> {
    /// Binds the allocator to `buffer`; the head starts at its first byte.
    pub fn new(buffer: &'buf mut [u8]) -> Self {
        Self::with_config(buffer, FixedBufferConfig::default())
    }

    /// Binds the allocator to `buffer` with custom configuration.
    pub fn with_config(buffer: &'buf mut [u8], config: FixedBufferConfig) -> Self {
        let len = buffer.len();
        let start = NonNull::from(buffer).cast::<u8>();
        Self::from_raw_parts(start, len, config)
    }

    /// Binds the allocator to uninitialized storage.
    pub fn from_uninit(buffer: &'buf mut [MaybeUninit<u8>]) -> Self {
        let len = buffer.len();
        let start = NonNull::from(buffer).cast::<u8>();
        Self::from_raw_parts(start, len, FixedBufferConfig::default())
    }

    fn from_raw_parts(start: NonNull<u8>, capacity: usize, config: FixedBufferConfig) -> Self {
        Self {
            start,
            capacity,
            head: Cell::new(0),
            config,
            stats: OptionalStats::new(config.track_stats),
            _buffer: PhantomData,
        }
    }

    /// Hands out `size` bytes aligned to `align` from the unused tail.
    ///
    /// Fails with [`MemoryError::OutOfSpace`] when the aligned request would
    /// run past the end of the buffer, including requests whose end address
    /// is not representable.
    pub fn alloc(&self, size: usize, align: usize) -> MemoryResult<NonNull<[u8]>> {
        validate_alignment(align)?;

        let head = self.head.get();
        let Some(b) = bump(self.start.as_ptr().addr(), head, self.capacity, size, align) else {
            self.stats.record_failure();
            return Err(MemoryError::out_of_space(size, self.remaining()));
        };

        self.head.set(b.next);
        self.stats.record_allocation(size, b.padding(head));

        // SAFETY: b.start <= b.next <= capacity, so the offset stays inside
        // (or one past) the borrowed buffer.
        let ptr = unsafe { self.start.add(b.start) };
        Ok(NonNull::slice_from_raw_parts(ptr, size))
    }

    /// Hands out `size` bytes aligned for any fundamental type.
    pub fn alloc_default(&self, size: usize) -> MemoryResult<NonNull<[u8]>> {
        self.alloc(size, MAX_ALIGN)
    }

    /// Rewinds the head to the start of the buffer in O(1).
    ///
    /// With a `reset_pattern` configured the used span is overwritten first.
    pub fn reset(&mut self) {
        let used = self.head.get();

        if let Some(pattern) = self.config.reset_pattern {
            // SAFETY: [start, start + used) lies inside the buffer and no
            // region from the previous generation is alive (&mut self).
            unsafe { self.start.as_ptr().write_bytes(pattern, used) };
        }

        self.head.set(0);
        self.stats.record_reset();

        #[cfg(feature = "logging")]
        trace!(reclaimed = used, "fixed buffer reset");
    }

    /// Bytes consumed so far, alignment padding included
    pub fn used(&self) -> usize {
        self.head.get()
    }

    /// Bytes between the head and the end of the buffer
    pub fn remaining(&self) -> usize {
        self.capacity - self.head.get()
    }

    /// Length of the underlying buffer
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether `ptr` points into the underlying buffer
    pub fn contains(&self, ptr: *const u8) -> bool {
        let start = self.start.as_ptr().addr();
        let addr = ptr.addr();
        addr >= start && addr - start < self.capacity
    }
}

impl fmt::Debug for FixedBufferAllocator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedBufferAllocator")
            .field("start", &self.start)
            .field("capacity", &self.capacity)
            .field("head", &self.head.get())
            .field("config", &self.config)
            .finish()
    }
}

// SAFETY: The allocator is a unique borrow of the buffer plus a Cell; moving
// it to another thread moves that unique borrow. It stays !Sync through Cell.
unsafe impl Send for FixedBufferAllocator<'_> {}

// SAFETY: Regions are disjoint within a generation, lie inside the borrowed
// buffer and stay valid until `reset(&mut self)` or drop.
unsafe impl Allocator for FixedBufferAllocator<'_> {
    #[inline]
    fn allocate(&self, size: usize, align: usize) -> MemoryResult<NonNull<[u8]>> {
        self.alloc(size, align)
    }
}

/// A fixed buffer can back an arena. Blocks are never given back
/// individually; they return to the buffer when it is reset.
// SAFETY: Blocks are MAX_ALIGN aligned, disjoint and live until reset.
unsafe impl BackingAllocator for FixedBufferAllocator<'_> {
    fn acquire(&self, size: usize) -> MemoryResult<NonNull<[u8]>> {
        self.alloc_default(size)
    }

    unsafe fn release(&self, _region: NonNull<[u8]>) {}
}

impl Resettable for FixedBufferAllocator<'_> {
    fn reset(&mut self) {
        FixedBufferAllocator::reset(self);
    }
}

impl MemoryUsage for FixedBufferAllocator<'_> {
    fn used_memory(&self) -> usize {
        self.used()
    }

    fn available_memory(&self) -> Option<usize> {
        Some(self.remaining())
    }
}

impl StatisticsProvider for FixedBufferAllocator<'_> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C, align(16))]
    struct Aligned<const N: usize>([u8; N]);

    fn offset(fba: &FixedBufferAllocator<'_>, region: NonNull<[u8]>) -> usize {
        region.cast::<u8>().as_ptr().addr() - fba.start.as_ptr().addr()
    }

    #[test]
    fn test_sequential_allocations() {
        let mut buf = Aligned([0u8; 1024]);
        let fba = FixedBufferAllocator::new(&mut buf.0);

        let a = fba.alloc(48, 4).unwrap();
        let b = fba.alloc(128, 4).unwrap();
        assert_eq!(offset(&fba, a), 0);
        assert_eq!(offset(&fba, b), 48);
        assert_eq!(fba.used(), 176);

        let err = fba.alloc(900, 4).unwrap_err();
        assert_eq!(err, MemoryError::out_of_space(900, 848));
        assert_eq!(fba.used(), 176, "failed alloc must not move the head");
    }

    #[test]
    fn test_alignment_padding() {
        let mut buf = Aligned([0u8; 64]);
        let fba = FixedBufferAllocator::new(&mut buf.0);

        fba.alloc(1, 1).unwrap();
        let b = fba.alloc(8, 8).unwrap();
        assert_eq!(offset(&fba, b), 8);
        assert_eq!(fba.used(), 16);
    }

    #[test]
    fn test_invalid_alignment() {
        let mut buf = [0u8; 64];
        let fba = FixedBufferAllocator::new(&mut buf);
        assert_eq!(fba.alloc(8, 3), Err(MemoryError::invalid_alignment(3)));
        assert_eq!(fba.alloc(8, 0), Err(MemoryError::invalid_alignment(0)));
        assert_eq!(fba.used(), 0);
    }

    #[test]
    fn test_huge_request_reports_out_of_space() {
        let mut buf = [0u8; 64];
        let fba = FixedBufferAllocator::new(&mut buf);
        fba.alloc(8, 1).unwrap();
        assert!(matches!(
            fba.alloc(usize::MAX, 1),
            Err(MemoryError::OutOfSpace { .. })
        ));
    }

    #[test]
    fn test_zero_size_allocations() {
        let mut buf = [0u8; 8];
        let fba = FixedBufferAllocator::new(&mut buf);
        fba.alloc(8, 1).unwrap();
        let empty = fba.alloc(0, 1).unwrap();
        assert_eq!(empty.len(), 0);
        assert_eq!(fba.remaining(), 0);
    }

    #[test]
    fn test_reset_rewinds_and_poisons() {
        let mut buf = Aligned([0u8; 32]);
        let mut fba = FixedBufferAllocator::with_config(&mut buf.0, FixedBufferConfig::debug());

        fba.alloc_slice(&[1u8, 2, 3, 4]).unwrap();
        fba.reset();
        assert_eq!(fba.used(), 0);
        assert_eq!(fba.statistics().resets, 1);

        let first = fba.alloc(4, 1).unwrap();
        assert_eq!(offset(&fba, first), 0);
        drop(fba);
        assert_eq!(&buf.0[..4], &[0xDD; 4]);
        assert_eq!(buf.0[4], 0);
    }

    #[test]
    fn test_typed_helpers() {
        let mut buf = Aligned([0u8; 128]);
        let fba = FixedBufferAllocator::new(&mut buf.0);

        let n = fba.alloc_value(0xDEAD_BEEF_u64).unwrap();
        *n += 1;
        let s = fba.alloc_str("strata").unwrap();
        let xs = fba.alloc_slice(&[1u32, 2, 3]).unwrap();

        assert_eq!(*n, 0xDEAD_BEEF_u64 + 1);
        assert_eq!(s, "strata");
        assert_eq!(xs, &[1, 2, 3]);
        assert_eq!(xs.as_ptr().addr() % core::mem::align_of::<u32>(), 0);
    }

    #[test]
    fn test_from_uninit() {
        let mut buf = [MaybeUninit::<u8>::uninit(); 32];
        let fba = FixedBufferAllocator::from_uninit(&mut buf);
        let v = fba.alloc_value([7u8; 16]).unwrap();
        assert_eq!(v, &[7u8; 16]);
        assert_eq!(fba.capacity(), 32);
    }

    #[test]
    fn test_contains() {
        let mut buf = [0u8; 16];
        let fba = FixedBufferAllocator::new(&mut buf);
        let a = fba.alloc(4, 1).unwrap();
        assert!(fba.contains(a.cast::<u8>().as_ptr()));
        let outside = 0u8;
        assert!(!fba.contains(&raw const outside));
    }

    #[test]
    fn test_stats_tracking() {
        let mut buf = Aligned([0u8; 64]);
        let fba = FixedBufferAllocator::with_config(
            &mut buf.0,
            FixedBufferConfig {
                track_stats: true,
                reset_pattern: None,
            },
        );
        fba.alloc(3, 1).unwrap();
        fba.alloc(8, 8).unwrap();
        let _ = fba.alloc(100, 1);

        let stats = fba.statistics();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.failed_allocations, 1);
        assert_eq!(stats.bytes_in_use, 11);
        assert_eq!(stats.padding_bytes, 5);
    }

    #[test]
    fn test_memory_usage() {
        let mut buf = [0u8; 200];
        let fba = FixedBufferAllocator::new(&mut buf);
        fba.alloc(50, 1).unwrap();
        let usage = fba.memory_usage();
        assert_eq!(usage.used, 50);
        assert_eq!(usage.total, Some(200));
        assert_eq!(usage.usage_percent, Some(25.0));
    }
}
