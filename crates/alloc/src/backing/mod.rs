//! Backing allocators
//!
//! An [`Arena`](crate::arena::Arena) never talks to the operating system
//! directly: it acquires whole blocks from a [`BackingAllocator`] and hands
//! them back on clear. Swapping the backing is how an arena is placed on the
//! heap, on mapped pages, or inside another allocator.

use core::ptr::NonNull;

use crate::error::MemoryResult;

#[cfg(all(unix, feature = "mmap"))]
#[cfg_attr(docsrs, doc(cfg(all(unix, feature = "mmap"))))]
mod page;
mod system;

#[cfg(all(unix, feature = "mmap"))]
pub use page::PageBacking;
pub use system::SystemBacking;

/// Source of raw memory blocks
///
/// # Safety
///
/// For every `Ok(region)` returned by [`acquire`](BackingAllocator::acquire),
/// implementors must guarantee that:
/// - `region.len() >= size`
/// - `region` is aligned to at least [`MAX_ALIGN`](crate::core::MAX_ALIGN)
/// - `region` is valid for reads and writes and not aliased by anything else
///   until it is passed to [`release`](BackingAllocator::release) or the
///   backing itself is reset or dropped
pub unsafe trait BackingAllocator {
    /// Obtains a region of at least `size` bytes.
    fn acquire(&self, size: usize) -> MemoryResult<NonNull<[u8]>>;

    /// Gives a region back.
    ///
    /// # Safety
    ///
    /// `region` must have been returned by `acquire` on this backing, with
    /// its length unchanged, and must not have been released already.
    unsafe fn release(&self, region: NonNull<[u8]>);
}

// SAFETY: Forwards to B, which upholds the contract.
unsafe impl<B: BackingAllocator + ?Sized> BackingAllocator for &B {
    #[inline]
    fn acquire(&self, size: usize) -> MemoryResult<NonNull<[u8]>> {
        (**self).acquire(size)
    }

    #[inline]
    unsafe fn release(&self, region: NonNull<[u8]>) {
        // SAFETY: Caller contract is forwarded unchanged.
        unsafe { (**self).release(region) }
    }
}
