//! Owning pointer to a value stored in one pool slot

use core::alloc::Layout;
use core::fmt;
use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};

use super::BlockAllocator;
use crate::core::Allocator;
use crate::error::MemoryResult;

/// RAII pointer to a value living in a [`BlockAllocator`] slot
///
/// Drops the value and returns the slot to the pool when dropped. The borrow
/// of the pool keeps it from being reset while any `SlotBox` is alive.
///
/// ```
/// use strata_alloc::{BlockAllocator, SlotBox};
///
/// #[repr(align(16))]
/// struct Storage([u8; 256]);
///
/// let mut storage = Storage([0; 256]);
/// let pool = BlockAllocator::new(&mut storage.0, 32).unwrap();
/// {
///     let mut pair = SlotBox::new_in((1u32, 2u32), &pool).unwrap();
///     pair.0 += 10;
///     assert_eq!(*pair, (11, 2));
///     assert_eq!(pool.allocated_count(), 1);
/// }
/// assert_eq!(pool.allocated_count(), 0);
/// ```
pub struct SlotBox<'pool, 'buf, T> {
    ptr: NonNull<T>,
    pool: &'pool BlockAllocator<'buf>,
}

impl<'pool, 'buf, T> SlotBox<'pool, 'buf, T> {
    /// Moves `value` into a free slot of `pool`.
    ///
    /// Fails when the pool is exhausted, when `T` does not fit in a slot, or
    /// when `T` needs a stricter alignment than the slots provide.
    pub fn new_in(value: T, pool: &'pool BlockAllocator<'buf>) -> MemoryResult<Self> {
        let ptr = pool.allocate_layout(Layout::new::<T>())?.cast::<T>();
        // SAFETY: The slot fits T, is aligned for it and is exclusively ours.
        unsafe { ptr.as_ptr().write(value) };
        Ok(Self { ptr, pool })
    }

    /// Consumes the box, returning the value and freeing the slot.
    #[must_use]
    pub fn into_inner(self) -> T {
        let this = ManuallyDrop::new(self);
        // SAFETY: ptr holds an initialized T that nothing else references.
        // ManuallyDrop keeps Drop from reading it a second time.
        unsafe {
            let value = ptr::read(this.ptr.as_ptr());
            this.pool.free(this.ptr.cast());
            value
        }
    }
}

impl<T> Deref for SlotBox<'_, '_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: ptr holds an initialized T owned by this box.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> DerefMut for SlotBox<'_, '_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: ptr holds an initialized T; &mut self is exclusive.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T: fmt::Debug> fmt::Debug for SlotBox<'_, '_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SlotBox").field(&**self).finish()
    }
}

impl<T> Drop for SlotBox<'_, '_, T> {
    fn drop(&mut self) {
        // SAFETY: The value is dropped exactly once, then its slot (handed out
        // by new_in and referenced by nothing else) goes back to the pool.
        unsafe {
            ptr::drop_in_place(self.ptr.as_ptr());
            self.pool.free(self.ptr.cast());
        }
    }
}
