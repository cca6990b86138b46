//! Checked storage primitives for the arena buffer.
//!
//! [`TagBuffer`] owns the arena's bytes and is the only place in the crate
//! that reinterprets them. Tags go through bounds-checked reads and writes.
//! Element values go through a small set of functions that track which
//! offsets hold an initialised `T`, so that every unaligned read is of a
//! value that was actually written and has not been overwritten since.
//!
//! Every writer evicts live values that overlap the bytes it is about to
//! touch. Eviction forgets a value without dropping it.

#![allow(unsafe_code)]

use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::mem;
use std::ops::Range;
use std::ptr;

use tagheap_core::{BlockState, Tag, TAG_SIZE};

/// Fixed-length byte buffer holding boundary tags and element values.
pub(crate) struct TagBuffer<T> {
    /// Allocated once at construction and never resized.
    bytes: Box<[u8]>,
    /// Start offsets of initialised `T` values. No two overlap, and no tag
    /// overlaps any of them.
    live: BTreeSet<usize>,
    _marker: PhantomData<T>,
}

impl<T> TagBuffer<T> {
    /// Create a zeroed buffer of `len` bytes.
    pub(crate) fn new(len: usize) -> Self {
        Self {
            bytes: vec![0u8; len].into_boxed_slice(),
            live: BTreeSet::new(),
            _marker: PhantomData,
        }
    }

    /// Buffer length in bytes.
    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Read the tag at `offset`, or `None` if it would run past the end.
    pub(crate) fn read_tag(&self, offset: usize) -> Option<Tag> {
        let end = offset.checked_add(TAG_SIZE)?;
        let raw: [u8; TAG_SIZE] = self.bytes.get(offset..end)?.try_into().ok()?;
        Some(Tag::from_bytes(raw))
    }

    /// Write a tag at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the tag does not fit inside the buffer.
    pub(crate) fn write_tag(&mut self, offset: usize, tag: Tag) {
        let range = offset..offset + TAG_SIZE;
        self.evict(range.clone());
        self.bytes[range].copy_from_slice(&tag.to_bytes());
    }

    /// Write the leading and trailing tags of a block starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the block does not fit inside the buffer.
    pub(crate) fn write_block(&mut self, offset: usize, state: BlockState) {
        let tag = Tag::encode(state)
            .expect("payload sizes are bounded by the arena capacity, which fits in a tag");
        self.write_tag(offset, tag);
        self.write_tag(offset + TAG_SIZE + state.size(), tag);
    }

    /// Store `value` at `offset`, returning the value previously stored at
    /// exactly that offset, if any.
    ///
    /// # Panics
    ///
    /// Panics if the value does not fit inside the buffer.
    pub(crate) fn put(&mut self, offset: usize, value: T) -> Option<T> {
        let range = offset..offset + mem::size_of::<T>();
        assert!(
            range.end <= self.bytes.len(),
            "value at offset {offset} overruns the {}-byte buffer",
            self.bytes.len()
        );
        let previous = self.take(offset);
        self.evict(range.clone());
        let dst = &mut self.bytes[range];
        // SAFETY: `dst` is exactly `size_of::<T>()` bytes owned by this
        // buffer, and `write_unaligned` has no alignment requirement.
        unsafe { ptr::write_unaligned(dst.as_mut_ptr().cast::<T>(), value) };
        self.live.insert(offset);
        previous
    }

    /// Move the value stored at `offset` out of the buffer.
    pub(crate) fn take(&mut self, offset: usize) -> Option<T> {
        if !self.live.remove(&offset) {
            return None;
        }
        let src = &self.bytes[offset..offset + mem::size_of::<T>()];
        // SAFETY: `offset` was live, so `put` wrote a `T` there and every
        // later writer would have evicted it before touching these bytes.
        // Removing it from `live` transfers ownership to the caller.
        Some(unsafe { ptr::read_unaligned(src.as_ptr().cast::<T>()) })
    }

    /// Copy out the value stored at `offset`.
    pub(crate) fn get(&self, offset: usize) -> Option<T>
    where
        T: Copy,
    {
        if !self.live.contains(&offset) {
            return None;
        }
        let src = &self.bytes[offset..offset + mem::size_of::<T>()];
        // SAFETY: as in `take`; `T: Copy` so the stored value stays valid.
        Some(unsafe { ptr::read_unaligned(src.as_ptr().cast::<T>()) })
    }

    /// Whether an initialised value starts at `offset`.
    #[cfg(test)]
    pub(crate) fn is_live(&self, offset: usize) -> bool {
        self.live.contains(&offset)
    }

    /// Number of initialised values in the buffer.
    pub(crate) fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Forget every value overlapping `range` without dropping it.
    ///
    /// Returns the number of values forgotten.
    pub(crate) fn evict(&mut self, range: Range<usize>) -> usize {
        let size = mem::size_of::<T>();
        if size == 0 || range.is_empty() || self.live.is_empty() {
            return 0;
        }
        // A value at `s` overlaps `range` iff `s + size > range.start`
        // and `s < range.end`.
        let first = (range.start + 1).saturating_sub(size);
        let doomed: Vec<usize> = self.live.range(first..range.end).copied().collect();
        for offset in &doomed {
            self.live.remove(offset);
        }
        doomed.len()
    }
}

impl<T> Drop for TagBuffer<T> {
    fn drop(&mut self) {
        if !mem::needs_drop::<T>() {
            return;
        }
        while let Some(offset) = self.live.first().copied() {
            drop(self.take(offset));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn tags_round_trip_through_bytes() {
        let mut buf = TagBuffer::<u8>::new(16);
        buf.write_tag(4, Tag(-7));
        assert_eq!(buf.read_tag(4), Some(Tag(-7)));
        assert_eq!(buf.read_tag(0), Some(Tag(0)));
    }

    #[test]
    fn read_tag_past_end_is_none() {
        let buf = TagBuffer::<u8>::new(10);
        assert!(buf.read_tag(6).is_some());
        assert!(buf.read_tag(7).is_none());
        assert!(buf.read_tag(usize::MAX).is_none());
    }

    #[test]
    #[should_panic]
    fn write_tag_past_end_panics() {
        let mut buf = TagBuffer::<u8>::new(10);
        buf.write_tag(8, Tag(1));
    }

    #[test]
    fn write_block_frames_payload() {
        let mut buf = TagBuffer::<u8>::new(20);
        buf.write_block(0, BlockState::Allocated(12));
        assert_eq!(buf.read_tag(0), Some(Tag(-12)));
        assert_eq!(buf.read_tag(16), Some(Tag(-12)));
    }

    #[test]
    fn put_take_moves_value() {
        let mut buf = TagBuffer::<u64>::new(32);
        assert!(buf.put(5, 0xdead_beef).is_none());
        assert!(buf.is_live(5));
        assert_eq!(buf.get(5), Some(0xdead_beef));
        assert_eq!(buf.take(5), Some(0xdead_beef));
        assert!(buf.take(5).is_none());
        assert_eq!(buf.live_count(), 0);
    }

    #[test]
    fn put_returns_previous_value() {
        let mut buf = TagBuffer::<u32>::new(16);
        buf.put(4, 1);
        assert_eq!(buf.put(4, 2), Some(1));
        assert_eq!(buf.get(4), Some(2));
    }

    #[test]
    fn tag_write_evicts_overlapping_value() {
        let mut buf = TagBuffer::<u32>::new(16);
        buf.put(4, 99);
        buf.write_tag(6, Tag(3));
        assert!(!buf.is_live(4));
        assert!(buf.get(4).is_none());
    }

    #[test]
    fn evict_leaves_disjoint_values() {
        let mut buf = TagBuffer::<u32>::new(32);
        buf.put(0, 1);
        buf.put(4, 2);
        buf.put(8, 3);
        assert_eq!(buf.evict(4..8), 1);
        assert_eq!(buf.get(0), Some(1));
        assert_eq!(buf.get(8), Some(3));
    }

    #[test]
    fn drop_releases_live_values() {
        let counter = Rc::new(Cell::new(0));
        struct Bump(Rc<Cell<u32>>);
        impl Drop for Bump {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }
        {
            let mut buf = TagBuffer::<Bump>::new(64);
            buf.put(0, Bump(Rc::clone(&counter)));
            buf.put(16, Bump(Rc::clone(&counter)));
        }
        assert_eq!(counter.get(), 2);
    }
}
