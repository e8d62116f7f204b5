//! Common constants for allocator arithmetic

/// Memory alignment requirements
pub mod alignment {
    /// Largest fundamental alignment of the platform (`max_align_t`).
    ///
    /// Backing allocators hand out regions aligned to at least this value, and
    /// it is the alignment used when the caller does not ask for one.
    pub const MAX_ALIGN: usize = 16;

    /// Page size (platform dependent, this is common default)
    pub const PAGE_SIZE: usize = 4096;
}

/// Memory size constants
pub mod size {
    /// 1 Kilobyte
    pub const KB: usize = 1024;
}

pub use alignment::{MAX_ALIGN, PAGE_SIZE};
pub use size::KB;

/// Size of one free-list link stored inside a free pool slot.
pub const LINK_SIZE: usize = core::mem::size_of::<usize>();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_align_covers_fundamental_types() {
        assert!(MAX_ALIGN >= core::mem::align_of::<u64>());
        assert!(MAX_ALIGN >= core::mem::align_of::<f64>());
        assert!(MAX_ALIGN >= core::mem::align_of::<usize>());
        assert!(MAX_ALIGN.is_power_of_two());
    }
}
