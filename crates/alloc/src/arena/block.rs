//! Arena block layout
//!
//! Each block is a single region from the backing allocator:
//!
//! ```text
//! base                                                     base + len
//! ├──────────── header ────────────┼──── inline bump span ────┤
//! │ next │ len │ head │            │ used ... │ free ...      │
//! ```
//!
//! `len` and `head` are offsets from `base`; `head` starts at `HEADER_SIZE`.
//! The header is written once at block creation and read back through the
//! same pointer the region was acquired with, so every inline allocation keeps
//! the provenance of the whole region.

use core::ptr::NonNull;

use crate::allocator::bump;
use crate::core::MAX_ALIGN;
use crate::utils::align_up;

/// Header stored at the front of every arena block
#[repr(C)]
struct BlockHeader {
    /// Previously created block (older), or `None` for the first block
    next: Option<Block>,
    /// Total length of the region, header included
    len: usize,
    /// Offset of the first free byte
    head: usize,
}

/// Bytes at the start of each block taken by the header
pub(crate) const HEADER_SIZE: usize = size_of::<BlockHeader>();

/// Largest offset from the block base at which an `align`-aligned
/// allocation can start in a fresh block.
///
/// Backings only promise `MAX_ALIGN`, so above that the padding depends on
/// where the base lands; this is the worst case over all such bases. `None`
/// if the offset overflows.
pub(crate) const fn max_start_offset(align: usize) -> Option<usize> {
    if align <= MAX_ALIGN {
        return Some(align_up(HEADER_SIZE, align));
    }
    // base + HEADER_SIZE keeps this residue modulo MAX_ALIGN whatever the base.
    let residue = match HEADER_SIZE % MAX_ALIGN {
        0 => MAX_ALIGN,
        r => r,
    };
    HEADER_SIZE.checked_add(align - residue)
}

/// Handle to an initialized block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct Block(NonNull<BlockHeader>);

impl Block {
    /// Writes a fresh header at the front of `region`.
    ///
    /// # Safety
    /// `region` is writable, exclusively owned by the caller, longer than
    /// `HEADER_SIZE` and aligned for the header.
    pub(crate) unsafe fn init(region: NonNull<[u8]>, next: Option<Block>) -> Self {
        debug_assert!(region.len() > HEADER_SIZE);
        let header = region.cast::<BlockHeader>();
        debug_assert!(header.is_aligned());
        // SAFETY: Caller guarantees the region is writable and aligned.
        unsafe {
            header.write(BlockHeader {
                next,
                len: region.len(),
                head: HEADER_SIZE,
            });
        }
        Self(header)
    }

    #[inline]
    fn header(&self) -> &BlockHeader {
        // SAFETY: Block handles only exist for initialized, live blocks.
        unsafe { self.0.as_ref() }
    }

    /// Older neighbour in the chain
    pub(crate) fn next(self) -> Option<Block> {
        self.header().next
    }

    /// Bytes consumed by allocations, padding included
    pub(crate) fn used(self) -> usize {
        self.header().head - HEADER_SIZE
    }

    /// Bytes left between the head and the block end
    pub(crate) fn remaining(self) -> usize {
        let header = self.header();
        header.len - header.head
    }

    /// Carves `size` bytes aligned to `align` from the inline span.
    ///
    /// Returns the region and the padding skipped, or `None` if it does not
    /// fit. `align` must be a power of two.
    ///
    /// # Safety
    /// The block is live and no reference into its header is held.
    pub(crate) unsafe fn bump(self, size: usize, align: usize) -> Option<(NonNull<[u8]>, usize)> {
        let base = self.0.cast::<u8>();
        // SAFETY: Live block; the header is only accessed through this handle.
        let header = unsafe { &mut *self.0.as_ptr() };
        let b = bump(base.as_ptr().addr(), header.head, header.len, size, align)?;
        let padding = b.padding(header.head);
        header.head = b.next;

        // SAFETY: HEADER_SIZE <= b.start <= len, inside the block's region.
        let ptr = unsafe { base.add(b.start) };
        Some((NonNull::slice_from_raw_parts(ptr, size), padding))
    }

    /// The full region as it was acquired, for handing back to the backing.
    pub(crate) fn region(self) -> NonNull<[u8]> {
        NonNull::slice_from_raw_parts(self.0.cast::<u8>(), self.header().len)
    }
}
