//! Core building blocks shared by every allocator:
//! - The allocation capability traits
//! - Alignment and size constants

pub mod traits;
pub mod types;

pub use traits::{Allocator, BasicMemoryUsage, MemoryUsage, Resettable, StatisticsProvider};
pub use types::*;
