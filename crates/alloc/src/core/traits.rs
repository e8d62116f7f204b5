//! Core traits for allocation
//!
//! [`Allocator`] is the capability every allocator in this crate provides.
//! Bulk reclamation is expressed through [`Resettable`], which takes
//! `&mut self`: the borrow checker then proves that no reference handed out by
//! the typed helpers survives a reset.

use core::alloc::Layout;
use core::ptr::NonNull;

use crate::error::{MemoryError, MemoryResult};
use crate::stats::AllocatorStats;

/// Raw allocation capability
///
/// # Safety
///
/// Implementors must guarantee, for every `Ok(region)` returned by
/// [`allocate`](Allocator::allocate):
/// - `region` is valid for reads and writes of `region.len() >= size` bytes
/// - `region` starts at an address that is a multiple of `align`
/// - `region` does not overlap any other region handed out by the same
///   allocator that is still live
/// - `region` stays valid until the allocator is mutably borrowed (reset,
///   clear), dropped, or the region is explicitly given back through an
///   `unsafe` release API of the implementor
///
/// The typed helpers below rely on these guarantees to hand out `&mut`
/// references tied to `&self`.
pub unsafe trait Allocator {
    /// Allocates `size` bytes aligned to `align`.
    ///
    /// `align` must be a power of two, otherwise
    /// [`MemoryError::InvalidAlignment`] is returned.
    fn allocate(&self, size: usize, align: usize) -> MemoryResult<NonNull<[u8]>>;

    /// Allocates memory fitting `layout`.
    #[inline]
    fn allocate_layout(&self, layout: Layout) -> MemoryResult<NonNull<[u8]>> {
        self.allocate(layout.size(), layout.align())
    }

    /// Moves `value` into the allocator and returns a reference to it.
    ///
    /// The value is never dropped: its storage is reclaimed in bulk.
    fn alloc_value<T>(&self, value: T) -> MemoryResult<&mut T> {
        let ptr = self.allocate_layout(Layout::new::<T>())?.cast::<T>();
        // SAFETY: The region is valid, aligned for T and exclusively ours
        // (trait contract), and lives as long as `&self`.
        unsafe {
            ptr.as_ptr().write(value);
            Ok(&mut *ptr.as_ptr())
        }
    }

    /// Copies `src` into the allocator.
    fn alloc_slice<T: Copy>(&self, src: &[T]) -> MemoryResult<&mut [T]> {
        let layout = Layout::for_value(src);
        let ptr = self.allocate_layout(layout)?.cast::<T>();
        // SAFETY: Destination holds `src.len()` properly aligned T slots and
        // cannot overlap `src`, which is borrowed from outside the allocator's
        // live regions.
        unsafe {
            core::ptr::copy_nonoverlapping(src.as_ptr(), ptr.as_ptr(), src.len());
            Ok(core::slice::from_raw_parts_mut(ptr.as_ptr(), src.len()))
        }
    }

    /// Copies `s` into the allocator.
    fn alloc_str(&self, s: &str) -> MemoryResult<&mut str> {
        let bytes = self.alloc_slice(s.as_bytes())?;
        // SAFETY: Bytes were copied verbatim from a valid &str.
        Ok(unsafe { core::str::from_utf8_unchecked_mut(bytes) })
    }
}

/// Bulk reclamation
///
/// Resetting invalidates every region previously handed out. Taking
/// `&mut self` makes that statically safe for references obtained through the
/// [`Allocator`] helpers.
pub trait Resettable {
    /// Returns the allocator to its freshly initialized state.
    fn reset(&mut self);
}

/// Memory usage tracking trait
///
/// Implemented by all allocators. Values are in bytes of the region the
/// allocator hands out, excluding bookkeeping such as arena block headers.
pub trait MemoryUsage {
    /// Get currently used memory in bytes
    fn used_memory(&self) -> usize;

    /// Get available memory in bytes (if bounded)
    fn available_memory(&self) -> Option<usize>;

    /// Get total memory capacity in bytes (if bounded)
    fn total_memory(&self) -> Option<usize> {
        self.available_memory()
            .map(|available| self.used_memory() + available)
    }

    /// Returns memory usage as a percentage (0.0 to 100.0)
    fn memory_usage_percent(&self) -> Option<f32> {
        self.total_memory().map(|total| {
            if total == 0 {
                0.0
            } else {
                (self.used_memory() as f32 / total as f32) * 100.0
            }
        })
    }

    /// Returns a snapshot of the figures above
    fn memory_usage(&self) -> BasicMemoryUsage {
        BasicMemoryUsage {
            used: self.used_memory(),
            available: self.available_memory(),
            total: self.total_memory(),
            usage_percent: self.memory_usage_percent(),
        }
    }
}

/// Basic memory usage information
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicMemoryUsage {
    /// Currently used memory in bytes
    pub used: usize,
    /// Available memory in bytes (None if unbounded)
    pub available: Option<usize>,
    /// Total memory capacity in bytes (None if unbounded)
    pub total: Option<usize>,
    /// Memory usage as percentage (None if cannot be calculated)
    pub usage_percent: Option<f32>,
}

impl core::fmt::Display for BasicMemoryUsage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "used: {} bytes", self.used)?;

        if let Some(total) = self.total {
            write!(f, ", total: {total} bytes")?;
        }

        if let Some(percent) = self.usage_percent {
            write!(f, " ({percent:.1}%)")?;
        }

        Ok(())
    }
}

/// Statistics provider trait
pub trait StatisticsProvider {
    /// Get current statistics (all zero when collection is disabled)
    fn statistics(&self) -> AllocatorStats;

    /// Reset statistics
    fn reset_statistics(&self);

    /// Check if statistics collection is enabled
    fn statistics_enabled(&self) -> bool {
        true
    }
}

/// Rejects alignments that are not a power of two.
#[inline]
pub(crate) fn validate_alignment(align: usize) -> MemoryResult<()> {
    if align.is_power_of_two() {
        Ok(())
    } else {
        Err(MemoryError::invalid_alignment(align))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        used: usize,
        cap: usize,
    }

    impl MemoryUsage for Fixed {
        fn used_memory(&self) -> usize {
            self.used
        }

        fn available_memory(&self) -> Option<usize> {
            Some(self.cap - self.used)
        }
    }

    #[test]
    fn test_memory_usage_defaults() {
        let usage = Fixed { used: 256, cap: 1024 }.memory_usage();
        assert_eq!(usage.total, Some(1024));
        assert_eq!(usage.available, Some(768));
        assert_eq!(usage.usage_percent, Some(25.0));
        assert_eq!(usage.to_string(), "used: 256 bytes, total: 1024 bytes (25.0%)");
    }

    #[test]
    fn test_empty_capacity_reports_zero_percent() {
        let usage = Fixed { used: 0, cap: 0 };
        assert_eq!(usage.memory_usage_percent(), Some(0.0));
    }

    #[test]
    fn test_validate_alignment() {
        assert!(validate_alignment(1).is_ok());
        assert!(validate_alignment(64).is_ok());
        assert_eq!(validate_alignment(0), Err(MemoryError::invalid_alignment(0)));
        assert_eq!(validate_alignment(12), Err(MemoryError::invalid_alignment(12)));
    }
}
