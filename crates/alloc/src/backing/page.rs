//! Anonymous page mapping backing
//!
//! # Safety
//!
//! Blocks come straight from `mmap(MAP_PRIVATE | MAP_ANONYMOUS)`:
//! - the kernel returns page-aligned, zero-filled memory, so MAX_ALIGN holds
//! - sizes are rounded up to whole pages and the rounded length is what the
//!   region reports, so `munmap` in `release` covers exactly one mapping
//! - each mapping is private to the caller until unmapped

use std::ptr::{self, NonNull};

use super::BackingAllocator;
use crate::core::{MAX_ALIGN, PAGE_SIZE};
use crate::error::{MemoryError, MemoryResult};
use crate::utils::checked_align_up;

/// Backing that maps fresh anonymous pages for every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBacking {
    page_size: usize,
}

impl PageBacking {
    /// Creates a page backing using the system page size.
    pub fn new() -> Self {
        // SAFETY: sysconf has no memory-safety preconditions.
        let reported = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        let page_size = usize::try_from(reported)
            .ok()
            .filter(|size| size.is_power_of_two())
            .unwrap_or(PAGE_SIZE);
        Self { page_size }
    }

    /// Granularity blocks are rounded up to
    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

impl Default for PageBacking {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: See module docs. Page alignment is a multiple of MAX_ALIGN.
unsafe impl BackingAllocator for PageBacking {
    fn acquire(&self, size: usize) -> MemoryResult<NonNull<[u8]>> {
        if size == 0 {
            return Err(MemoryError::invalid_config("backing block size must be non-zero"));
        }
        let len = checked_align_up(size, self.page_size)
            .ok_or_else(|| MemoryError::out_of_memory(size, self.page_size))?;

        // SAFETY: Anonymous private mapping, fd = -1 and offset = 0, kernel
        // picks the address. MAP_FAILED is checked below.
        let raw = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if raw == libc::MAP_FAILED {
            return Err(MemoryError::out_of_memory(size, MAX_ALIGN));
        }

        let ptr = NonNull::new(raw.cast::<u8>())
            .ok_or_else(|| MemoryError::out_of_memory(size, MAX_ALIGN))?;
        Ok(NonNull::slice_from_raw_parts(ptr, len))
    }

    unsafe fn release(&self, region: NonNull<[u8]>) {
        // SAFETY: region is exactly one mapping created by `acquire`.
        // munmap can only fail for invalid arguments, which the caller
        // contract rules out.
        let _ = unsafe { libc::munmap(region.cast::<libc::c_void>().as_ptr(), region.len()) };
    }
}
