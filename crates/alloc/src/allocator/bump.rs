//! Bump arithmetic shared by [`FixedBufferAllocator`] and arena blocks
//!
//! Positions are kept as offsets from the start of a region, so the only
//! address-level operation is the alignment round-up. Every step is checked:
//! a request whose end would not fit in `usize` fails like any other request
//! that does not fit.
//!
//! [`FixedBufferAllocator`]: super::FixedBufferAllocator

use crate::utils::checked_align_up;

/// Outcome of a successful bump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bump {
    /// Offset of the first byte handed out
    pub start: usize,
    /// New head offset (one past the last byte handed out)
    pub next: usize,
}

impl Bump {
    /// Bytes skipped between the previous head and `start`
    #[inline]
    pub fn padding(&self, head: usize) -> usize {
        self.start - head
    }
}

/// Computes the placement of `size` bytes aligned to `align` in the region
/// `[base, base + capacity)` whose current head is `base + head`.
///
/// `align` must be a power of two and `head <= capacity`. Returns `None` when
/// the aligned request does not fit.
#[inline]
pub(crate) fn bump(
    base: usize,
    head: usize,
    capacity: usize,
    size: usize,
    align: usize,
) -> Option<Bump> {
    debug_assert!(head <= capacity);
    let current = base.checked_add(head)?;
    let aligned = checked_align_up(current, align)?;
    let start = aligned - base;
    let next = start.checked_add(size)?;
    (next <= capacity).then_some(Bump { start, next })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_fit_at_aligned_base() {
        let b = bump(0x1000, 0, 1024, 48, 4).unwrap();
        assert_eq!(b, Bump { start: 0, next: 48 });
    }

    #[test]
    fn test_padding_from_unaligned_head() {
        let b = bump(0x1000, 4, 1024, 16, 16).unwrap();
        assert_eq!(b.start, 16);
        assert_eq!(b.next, 32);
        assert_eq!(b.padding(4), 12);
    }

    #[test]
    fn test_alignment_follows_address_not_offset() {
        // base is 8 past a 16-byte boundary
        let b = bump(0x1008, 0, 64, 8, 16).unwrap();
        assert_eq!(b.start, 8);
    }

    #[test]
    fn test_exact_fit() {
        assert_eq!(bump(0, 1000, 1024, 24, 1), Some(Bump { start: 1000, next: 1024 }));
        assert_eq!(bump(0, 1000, 1024, 25, 1), None);
    }

    #[test]
    fn test_zero_size_at_full_region() {
        assert_eq!(bump(0, 1024, 1024, 0, 1), Some(Bump { start: 1024, next: 1024 }));
    }

    #[test]
    fn test_overflow_is_a_miss() {
        assert_eq!(bump(0, 0, 1024, usize::MAX, 1), None);
        assert_eq!(bump(usize::MAX - 8, 0, 8, 1, 64), None);
        assert_eq!(bump(0, 16, 1024, usize::MAX - 8, 1), None);
    }
}
