//! Fixed-size block allocator
//!
//! A caller-supplied buffer is cut into `floor(len / item_size)` equal slots.
//! Free slots are threaded into an intrusive free list, so allocate, free and
//! reuse are all O(1) and the allocator needs no storage of its own.

mod allocator;
mod config;
mod slot_box;

pub use allocator::BlockAllocator;
pub use config::BlockConfig;
pub use slot_box::SlotBox;
