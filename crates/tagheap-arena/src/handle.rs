//! Typed element handles.
//!
//! A [`Ptr`] is the arena's stand-in for a raw pointer: a byte offset into
//! the arena buffer tagged with the element type. Handles carry no borrow of
//! the arena, so they can be stored freely; every operation that uses one
//! validates it against the current block layout first.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem;

/// Handle to a `T` slot inside an [`Arena`](crate::Arena).
///
/// Returned by [`Arena::allocate`](crate::Arena::allocate), pointing at the
/// first payload byte of the allocated block. Use [`Ptr::add`] to address
/// later elements of a multi-element allocation.
pub struct Ptr<T> {
    offset: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Ptr<T> {
    pub(crate) fn new(offset: usize) -> Self {
        Self {
            offset,
            _marker: PhantomData,
        }
    }

    /// Byte offset into the arena buffer.
    pub fn offset(self) -> usize {
        self.offset
    }

    /// Handle to the element `count` slots further on.
    ///
    /// Saturates instead of overflowing; an out-of-range handle is rejected
    /// when used.
    pub fn add(self, count: usize) -> Self {
        let bytes = count.saturating_mul(mem::size_of::<T>());
        self.byte_add(bytes)
    }

    /// Handle `bytes` bytes further on, without regard to element size.
    pub fn byte_add(self, bytes: usize) -> Self {
        Self::new(self.offset.saturating_add(bytes))
    }

    /// Handle `bytes` bytes earlier, or `None` before the buffer start.
    pub fn byte_sub(self, bytes: usize) -> Option<Self> {
        self.offset.checked_sub(bytes).map(Self::new)
    }
}

impl<T> Clone for Ptr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Ptr<T> {}

impl<T> PartialEq for Ptr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
    }
}

impl<T> Eq for Ptr<T> {}

impl<T> PartialOrd for Ptr<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Ptr<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.offset.cmp(&other.offset)
    }
}

impl<T> Hash for Ptr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.offset.hash(state);
    }
}

impl<T> fmt::Debug for Ptr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ptr").field(&self.offset).finish()
    }
}

impl<T> fmt::Display for Ptr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{}", self.offset)
    }
}
