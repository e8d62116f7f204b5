//! Mutex-guarded allocator wrapper
//!
//! The allocators themselves are single-owner. [`Locked`] is the external
//! synchronization layer for sharing one between threads: every operation
//! takes the lock, and typed access goes through the guard so references
//! cannot outlive it.

use core::ptr::NonNull;

use parking_lot::{Mutex, MutexGuard};

use crate::core::{Allocator, Resettable};
use crate::error::MemoryResult;

/// An allocator behind a [`parking_lot::Mutex`]
///
/// `Locked<A>` is `Sync` whenever `A` is `Send`.
///
/// ```
/// use strata_alloc::{Arena, Locked};
///
/// let shared = Locked::new(Arena::new());
/// std::thread::scope(|s| {
///     for _ in 0..4 {
///         s.spawn(|| {
///             shared.allocate(64, 8).unwrap();
///         });
///     }
/// });
/// assert_eq!(shared.lock().block_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Locked<A> {
    inner: Mutex<A>,
}

impl<A> Locked<A> {
    /// Wraps `allocator`
    pub const fn new(allocator: A) -> Self {
        Self {
            inner: Mutex::new(allocator),
        }
    }

    /// Locks the allocator for exclusive use
    pub fn lock(&self) -> MutexGuard<'_, A> {
        self.inner.lock()
    }

    /// Locks the allocator if no other thread holds it
    pub fn try_lock(&self) -> Option<MutexGuard<'_, A>> {
        self.inner.try_lock()
    }

    /// Direct access without locking (the `&mut` proves exclusivity)
    pub fn get_mut(&mut self) -> &mut A {
        self.inner.get_mut()
    }

    /// Unwraps the allocator
    pub fn into_inner(self) -> A {
        self.inner.into_inner()
    }
}

impl<A: Allocator> Locked<A> {
    /// Allocates under the lock.
    ///
    /// The region stays valid until the wrapped allocator is reset, cleared
    /// or dropped; dereferencing it is up to the caller.
    pub fn allocate(&self, size: usize, align: usize) -> MemoryResult<NonNull<[u8]>> {
        self.inner.lock().allocate(size, align)
    }
}

impl<A: Resettable> Locked<A> {
    /// Resets the wrapped allocator under the lock.
    pub fn reset(&self) {
        self.inner.lock().reset();
    }
}
