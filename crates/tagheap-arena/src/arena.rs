//! The fixed-capacity boundary-tag arena.
//!
//! [`Arena`] carves one byte buffer into blocks framed by boundary tags and
//! serves typed allocations from it with a first-fit scan. Freed blocks are
//! merged with free neighbours immediately, so the layout never holds two
//! free blocks side by side.

use std::fmt;
use std::mem;

use tagheap_core::{ArenaError, BlockState, InvariantViolation, Tag, BLOCK_OVERHEAD};
use tracing::{debug, warn};

use crate::block::{Block, Blocks};
use crate::check;
use crate::config::ArenaConfig;
use crate::handle::Ptr;
use crate::raw::TagBuffer;
use crate::stats::ArenaStats;

/// Fixed-capacity allocator for values of type `T`.
///
/// The buffer is sized once at construction and never grows. Each block is
/// laid out as `[tag][payload][tag]`, where both tags hold the payload size,
/// positive when free and negative when allocated.
///
/// Callers receive [`Ptr`] handles instead of raw addresses. Handles are
/// validated against the block layout on every use, so a stale or forged
/// handle yields [`ArenaError::InvalidPointer`] rather than corrupting tags.
///
/// Every mutation is followed by a full layout check when
/// [`ArenaConfig::checks`] is enabled for the build.
pub struct Arena<T> {
    buffer: TagBuffer<T>,
    config: ArenaConfig,
}

impl<T> Arena<T> {
    /// Size of one element in bytes.
    pub const ELEMENT_SIZE: usize = mem::size_of::<T>();

    /// Smallest legal block: one element plus both tags.
    pub const MIN_BLOCK_SIZE: usize = mem::size_of::<T>() + BLOCK_OVERHEAD;

    /// Largest capacity whose initial free block fits in a tag.
    pub const MAX_CAPACITY: usize = Tag::MAX_PAYLOAD + BLOCK_OVERHEAD;

    /// Create an arena of `capacity` bytes with default configuration.
    pub fn new(capacity: usize) -> Result<Self, ArenaError> {
        Self::with_config(ArenaConfig::new(capacity))
    }

    /// Create an arena from an explicit configuration.
    ///
    /// The whole buffer starts as a single free block of
    /// `capacity - 2 * TAG_SIZE` payload bytes.
    pub fn with_config(config: ArenaConfig) -> Result<Self, ArenaError> {
        let capacity = config.capacity;
        if capacity < Self::MIN_BLOCK_SIZE {
            return Err(ArenaError::Capacity {
                capacity,
                minimum: Self::MIN_BLOCK_SIZE,
            });
        }
        if capacity > Self::MAX_CAPACITY {
            return Err(ArenaError::TagOverflow {
                capacity,
                limit: Self::MAX_CAPACITY,
            });
        }

        let mut buffer = TagBuffer::new(capacity);
        buffer.write_block(0, BlockState::Free(capacity - BLOCK_OVERHEAD));
        let arena = Self { buffer, config };
        arena.assert_valid();
        debug!(
            capacity,
            element_size = Self::ELEMENT_SIZE,
            "arena created"
        );
        Ok(arena)
    }

    /// Reserve space for `count` contiguous elements.
    ///
    /// Takes the first free block (in address order) whose payload can hold
    /// the request. If the leftover would still make a legal block, the
    /// block is split; otherwise the caller receives the whole block.
    pub fn allocate(&mut self, count: usize) -> Result<Ptr<T>, ArenaError> {
        let requested = count
            .checked_mul(Self::ELEMENT_SIZE)
            .filter(|&bytes| bytes > 0)
            .ok_or(ArenaError::InvalidSize {
                count,
                element_size: Self::ELEMENT_SIZE,
            })?;

        let Some(block) = self
            .blocks()
            .find(|b| b.is_free() && b.size() >= requested)
        else {
            return Err(ArenaError::OutOfMemory {
                requested,
                largest_free: self.stats().largest_free,
            });
        };

        let old = block.size();
        let remainder = old
            .checked_sub(requested + BLOCK_OVERHEAD)
            .filter(|&rest| rest >= Self::MIN_BLOCK_SIZE);
        match remainder {
            Some(rest) => {
                self.buffer
                    .write_block(block.offset, BlockState::Allocated(requested));
                self.buffer.write_block(
                    block.offset + requested + BLOCK_OVERHEAD,
                    BlockState::Free(rest),
                );
                debug!(offset = block.offset, requested, rest, "split free block");
            }
            None => {
                self.buffer
                    .write_block(block.offset, BlockState::Allocated(old));
                debug!(
                    offset = block.offset,
                    requested,
                    granted = old,
                    "granted whole block"
                );
            }
        }

        self.assert_valid();
        Ok(Ptr::new(block.payload_offset()))
    }

    /// Initialise the element at `ptr` with `value`.
    ///
    /// `ptr` must address a whole element slot inside an allocated block.
    /// A value already constructed at that slot is dropped and replaced.
    /// Block tags are not touched.
    pub fn construct(&mut self, ptr: Ptr<T>, value: T) -> Result<(), ArenaError> {
        let offset = self.slot(ptr)?;
        let previous = self.buffer.put(offset, value);
        self.assert_valid();
        drop(previous);
        Ok(())
    }

    /// Release the block whose payload starts at `ptr`.
    ///
    /// `count` is advisory unless [`ArenaConfig::strict_deallocate`] is
    /// set; the size stored in the block's tags is what gets released.
    /// The freed block is merged with a free left neighbour, then with a
    /// free right neighbour. Values still constructed inside the block are
    /// forgotten without being dropped.
    pub fn deallocate(&mut self, ptr: Ptr<T>, count: usize) -> Result<(), ArenaError> {
        let offset = ptr.offset();
        let block = match self.block_for(ptr) {
            Some(block) if !block.is_free() => block,
            found => {
                warn!(
                    offset,
                    already_free = found.is_some(),
                    "rejected deallocation"
                );
                return Err(ArenaError::InvalidPointer { offset });
            }
        };
        if self.config.strict_deallocate {
            self.check_count(&block, count)?;
        }

        let forgotten = self.buffer.evict(block.payload());

        let mut merged = Block {
            offset: block.offset,
            state: BlockState::Free(block.size()),
        };
        if let Some(left) = self.buffer.prev_block(&block).filter(Block::is_free) {
            merged = Block {
                offset: left.offset,
                state: BlockState::Free(left.size() + merged.size() + BLOCK_OVERHEAD),
            };
        }
        if let Some(right) = self.buffer.next_block(&merged).filter(Block::is_free) {
            merged.state = BlockState::Free(merged.size() + right.size() + BLOCK_OVERHEAD);
        }
        self.buffer.write_block(merged.offset, merged.state);

        debug!(
            offset,
            released = block.size(),
            merged_offset = merged.offset,
            merged_size = merged.size(),
            forgotten,
            "deallocated block"
        );
        self.assert_valid();
        Ok(())
    }

    /// Drop the value constructed at `ptr`.
    ///
    /// Fails with [`ArenaError::InvalidPointer`] if `ptr` is not an element
    /// slot of an allocated block or holds no constructed value.
    pub fn destroy(&mut self, ptr: Ptr<T>) -> Result<(), ArenaError> {
        let value = self.take(ptr)?;
        drop(value);
        Ok(())
    }

    /// Move the value constructed at `ptr` out of the arena.
    ///
    /// The slot stays allocated and can be constructed again.
    pub fn take(&mut self, ptr: Ptr<T>) -> Result<T, ArenaError> {
        let offset = self.slot(ptr)?;
        let value = self
            .buffer
            .take(offset)
            .ok_or(ArenaError::InvalidPointer { offset })?;
        self.assert_valid();
        Ok(value)
    }

    /// Copy out the value constructed at `ptr`.
    pub fn read(&self, ptr: Ptr<T>) -> Result<T, ArenaError>
    where
        T: Copy,
    {
        let offset = self.slot(ptr)?;
        self.buffer
            .get(offset)
            .ok_or(ArenaError::InvalidPointer { offset })
    }

    /// Whether `ptr` is exactly the first payload byte of some block.
    ///
    /// The block may be free or allocated.
    pub fn pointer_valid(&self, ptr: Ptr<T>) -> bool {
        self.block_for(ptr).is_some()
    }

    /// Whether the block layout satisfies every invariant.
    pub fn valid(&self) -> bool {
        self.check().is_ok()
    }

    /// Verify the block layout, reporting the first violation found.
    pub fn check(&self) -> Result<(), InvariantViolation> {
        check::check(&self.buffer, Self::ELEMENT_SIZE)
    }

    /// Iterate over the blocks in address order.
    pub fn blocks(&self) -> Blocks<'_, T> {
        Blocks::new(&self.buffer)
    }

    /// Summarise the current block layout.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats::collect(self.capacity(), self.blocks())
    }

    /// Raw tag stored at `offset`, if a whole tag fits there.
    pub fn tag_at(&self, offset: usize) -> Option<Tag> {
        self.buffer.read_tag(offset)
    }

    /// Buffer size in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of values currently constructed in the arena.
    pub fn live_values(&self) -> usize {
        self.buffer.live_count()
    }

    /// The configuration this arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Find the block whose first payload byte is `ptr`.
    fn block_for(&self, ptr: Ptr<T>) -> Option<Block> {
        let offset = ptr.offset();
        self.blocks()
            .take_while(|b| b.payload_offset() <= offset)
            .find(|b| b.payload_offset() == offset)
    }

    /// Resolve `ptr` to an element slot inside an allocated payload.
    fn slot(&self, ptr: Ptr<T>) -> Result<usize, ArenaError> {
        let offset = ptr.offset();
        let invalid = || ArenaError::InvalidPointer { offset };

        let block = self
            .blocks()
            .take_while(|b| b.offset <= offset)
            .last()
            .filter(|b| !b.is_free())
            .ok_or_else(invalid)?;
        let payload = block.payload();
        let index = offset.checked_sub(payload.start).ok_or_else(invalid)?;
        let on_boundary = index.checked_rem(Self::ELEMENT_SIZE) == Some(0);
        let fits = offset
            .checked_add(Self::ELEMENT_SIZE)
            .is_some_and(|end| end <= payload.end);
        if on_boundary && fits {
            Ok(offset)
        } else {
            Err(invalid())
        }
    }

    /// Whether `count` elements could have been allocated as `block`.
    fn check_count(&self, block: &Block, count: usize) -> Result<(), ArenaError> {
        let stored = block.size();
        let plausible = count
            .checked_mul(Self::ELEMENT_SIZE)
            .filter(|&bytes| bytes > 0 && bytes <= stored)
            .is_some_and(|bytes| stored - bytes < Self::MIN_BLOCK_SIZE + BLOCK_OVERHEAD);
        if plausible {
            return Ok(());
        }
        warn!(
            offset = block.payload_offset(),
            count,
            stored,
            "rejected deallocation with mismatched size"
        );
        Err(ArenaError::SizeMismatch {
            offset: block.payload_offset(),
            count,
            stored,
        })
    }

    fn assert_valid(&self) {
        if !self.config.checks.enabled() {
            return;
        }
        if let Err(violation) = self.check() {
            panic!("arena invariant violated: {violation}");
        }
    }
}

/// Any two arenas of the same element type are interchangeable as
/// allocators, so they always compare equal.
impl<T> PartialEq for Arena<T> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<T> Eq for Arena<T> {}

impl<T> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("element_size", &Self::ELEMENT_SIZE)
            .field("blocks", &self.blocks().collect::<Vec<_>>())
            .finish()
    }
}
