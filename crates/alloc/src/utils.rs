//! Address arithmetic helpers

/// Checks if a value is a power of two
#[inline(always)]
#[must_use]
pub const fn is_power_of_two(n: usize) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

/// Rounds `value` up to the next multiple of `align`.
///
/// `align` must be a power of two. Wraps on overflow in release builds; use
/// [`checked_align_up`] on untrusted input.
#[inline(always)]
#[must_use]
pub const fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(is_power_of_two(align), "alignment must be a power of two");
    (value.wrapping_add(align - 1)) & !(align - 1)
}

/// Rounds `value` up to the next multiple of `align`, or `None` if the
/// rounded value does not fit in `usize`.
#[inline(always)]
#[must_use]
pub const fn checked_align_up(value: usize, align: usize) -> Option<usize> {
    debug_assert!(is_power_of_two(align), "alignment must be a power of two");
    match value.checked_add(align - 1) {
        Some(v) => Some(v & !(align - 1)),
        None => None,
    }
}

/// Checks if an address is aligned to `align`
#[inline(always)]
#[must_use]
pub const fn is_aligned(addr: usize, align: usize) -> bool {
    debug_assert!(is_power_of_two(align), "alignment must be a power of two");
    addr & (align - 1) == 0
}

/// Largest power of two dividing `addr`. Zero is treated as aligned to the
/// highest representable power of two.
#[inline]
#[must_use]
pub const fn natural_alignment(addr: usize) -> usize {
    if addr == 0 {
        1 << (usize::BITS - 1)
    } else {
        1 << addr.trailing_zeros()
    }
}
