//! Allocators over caller-supplied buffers

pub mod block;
mod bump;
mod fixed_buffer;

pub(crate) use bump::bump;
pub use block::{BlockAllocator, BlockConfig, SlotBox};
pub use fixed_buffer::{FixedBufferAllocator, FixedBufferConfig};
