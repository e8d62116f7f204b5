//! Global heap backing

use std::alloc::{GlobalAlloc, Layout, System};
use std::ptr::NonNull;

use super::BackingAllocator;
use crate::core::MAX_ALIGN;
use crate::error::{MemoryError, MemoryResult};

/// Backing that takes blocks from the system heap (`malloc`/`free` on Unix).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemBacking;

impl SystemBacking {
    /// Layout used for a block of `size` bytes
    fn layout(size: usize) -> MemoryResult<Layout> {
        Layout::from_size_align(size, MAX_ALIGN)
            .map_err(|_| MemoryError::out_of_memory(size, MAX_ALIGN))
    }
}

// SAFETY: System returns unaliased memory aligned to the requested layout
// (MAX_ALIGN) until it is deallocated with the same layout in `release`.
unsafe impl BackingAllocator for SystemBacking {
    fn acquire(&self, size: usize) -> MemoryResult<NonNull<[u8]>> {
        if size == 0 {
            return Err(MemoryError::invalid_config("backing block size must be non-zero"));
        }
        let layout = Self::layout(size)?;

        // SAFETY: layout has non-zero size (checked above).
        let ptr = unsafe { System.alloc(layout) };
        let ptr = NonNull::new(ptr).ok_or_else(|| MemoryError::out_of_memory(size, MAX_ALIGN))?;
        Ok(NonNull::slice_from_raw_parts(ptr, size))
    }

    unsafe fn release(&self, region: NonNull<[u8]>) {
        // SAFETY: region came from `acquire`, which built the same layout
        // from the same length, so it cannot fail here.
        unsafe {
            let layout = Layout::from_size_align_unchecked(region.len(), MAX_ALIGN);
            System.dealloc(region.cast::<u8>().as_ptr(), layout);
        }
    }
}
