//! Growable arena allocator
//!
//! An [`Arena`] is a chain of fixed-size blocks, each an independent bump
//! region. Blocks come from a pluggable [`BackingAllocator`] (the system heap
//! by default) and all go back at once when the arena is cleared or dropped.
//! There is no per-allocation free.
//!
//! ```
//! use strata_alloc::arena::{Arena, ArenaConfig};
//! use strata_alloc::backing::SystemBacking;
//!
//! let config = ArenaConfig::new().with_block_size(1024);
//! let arena = Arena::with_backing(SystemBacking, config).unwrap();
//! assert_eq!(arena.usable_block_size(), 1024 - 3 * size_of::<usize>());
//! ```
//!
//! [`BackingAllocator`]: crate::backing::BackingAllocator

#[allow(clippy::module_inception)]
mod arena;
mod block;
mod config;

pub use self::arena::Arena;
pub use self::config::ArenaConfig;

/// Bytes at the start of every block reserved for the block header
pub const BLOCK_HEADER_SIZE: usize = block::HEADER_SIZE;
