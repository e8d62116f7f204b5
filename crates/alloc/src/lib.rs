//! # strata-alloc
//!
//! Custom memory allocators for performance-sensitive and GC-less code:
//! - [`FixedBufferAllocator`] bumps through one caller-supplied buffer
//! - [`Arena`] chains fixed-size blocks taken from a pluggable
//!   [`BackingAllocator`] and frees them all at once
//! - [`BlockAllocator`] recycles equally sized slots through an intrusive
//!   free list
//!
//! ## Quick Start
//!
//! ```rust
//! use strata_alloc::prelude::*;
//!
//! # fn main() -> strata_alloc::MemoryResult<()> {
//! // Bulk allocation, freed when the arena is cleared or dropped
//! let mut arena = Arena::new();
//! let ids = arena.alloc_slice(&[1u32, 2, 3])?;
//! assert_eq!(ids, &[1, 2, 3]);
//! arena.clear();
//!
//! // Scratch space on the stack
//! let mut scratch = [0u8; 256];
//! let fba = FixedBufferAllocator::new(&mut scratch);
//! let greeting = fba.alloc_str("hello")?;
//! assert_eq!(greeting, "hello");
//! # Ok(())
//! # }
//! ```
//!
//! ## Ownership
//!
//! Every allocator hands out memory through `&self` and reclaims it in bulk
//! through `&mut self` ([`Resettable`]), so the borrow checker rules out use
//! after reset for everything obtained through the typed helpers of
//! [`Allocator`]. None of the allocators is `Sync`; wrap one in [`Locked`] to
//! share it between threads.
//!
//! ## Features
//!
//! - `logging` (default): lifecycle events through `tracing`
//! - `mmap` (default): [`backing::PageBacking`] on Unix via `libc`

#![cfg_attr(docsrs, feature(doc_cfg))]
// Raw regions, intrusive links and block headers are the point of this crate
#![allow(unsafe_code)]
// Typed helpers return `&mut T` from `&self`; regions are disjoint per call
#![allow(clippy::mut_from_ref)]

pub mod allocator;
pub mod arena;
pub mod backing;
pub mod core;
pub mod error;
pub mod stats;
pub mod sync;
pub mod utils;

pub use crate::allocator::{
    BlockAllocator, BlockConfig, FixedBufferAllocator, FixedBufferConfig, SlotBox,
};
pub use crate::arena::{Arena, ArenaConfig};
pub use crate::backing::{BackingAllocator, SystemBacking};
pub use crate::core::{Allocator, MemoryUsage, Resettable, StatisticsProvider};
pub use crate::error::{MemoryError, MemoryResult, Result};
pub use crate::stats::AllocatorStats;
pub use crate::sync::Locked;

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::allocator::{BlockAllocator, FixedBufferAllocator, SlotBox};
    pub use crate::arena::{Arena, ArenaConfig};
    pub use crate::backing::{BackingAllocator, SystemBacking};
    pub use crate::core::{Allocator, MemoryUsage, Resettable, StatisticsProvider};
    pub use crate::error::{MemoryError, MemoryResult};
    pub use crate::sync::Locked;
}
