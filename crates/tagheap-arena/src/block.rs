//! Block views and traversal over the implicit boundary-tag list.
//!
//! There are no stored links between blocks: the next block starts right
//! after the current block's trailing tag, and the previous block's trailing
//! tag sits right before the current block's leading tag. The helpers here
//! do that stepping on bounds-checked offsets.

use std::fmt;
use std::ops::Range;

use tagheap_core::{BlockState, TAG_SIZE};

use crate::raw::TagBuffer;

/// A block decoded from its leading tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    /// Offset of the leading tag.
    pub offset: usize,
    /// Decoded state and payload size.
    pub state: BlockState,
}

impl Block {
    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.state.size()
    }

    /// Whether the block is free.
    pub fn is_free(&self) -> bool {
        self.state.is_free()
    }

    /// Offset of the first payload byte.
    pub fn payload_offset(&self) -> usize {
        self.offset + TAG_SIZE
    }

    /// Payload byte range.
    pub fn payload(&self) -> Range<usize> {
        let start = self.payload_offset();
        start..start + self.size()
    }

    /// Offset of the trailing tag.
    pub fn trailing_offset(&self) -> usize {
        self.offset + TAG_SIZE + self.size()
    }

    /// Offset one past the trailing tag, where the next block starts.
    pub fn end(&self) -> usize {
        self.offset + self.state.span()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.state, self.offset)
    }
}

/// Iterator over the blocks of an arena in address order.
///
/// Stops at the end of the buffer, or early if a tag cannot be read.
/// It does not verify the layout; see [`Arena::check`](crate::Arena::check).
pub struct Blocks<'a, T> {
    buffer: &'a TagBuffer<T>,
    offset: usize,
}

impl<'a, T> Blocks<'a, T> {
    pub(crate) fn new(buffer: &'a TagBuffer<T>) -> Self {
        Self { buffer, offset: 0 }
    }
}

impl<T> Iterator for Blocks<'_, T> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        let block = self.buffer.block_at(self.offset)?;
        self.offset = block.end();
        Some(block)
    }
}

impl<T> TagBuffer<T> {
    /// Decode the block whose leading tag is at `offset`.
    pub(crate) fn block_at(&self, offset: usize) -> Option<Block> {
        if offset >= self.len() {
            return None;
        }
        let tag = self.read_tag(offset)?;
        Some(Block {
            offset,
            state: tag.state(),
        })
    }

    /// The block immediately after `block`, if it lies within the buffer.
    pub(crate) fn next_block(&self, block: &Block) -> Option<Block> {
        self.block_at(block.end())
    }

    /// The block immediately before `block`, found through its trailing tag.
    pub(crate) fn prev_block(&self, block: &Block) -> Option<Block> {
        let trailing = block.offset.checked_sub(TAG_SIZE)?;
        let state = self.read_tag(trailing)?.state();
        let offset = block.offset.checked_sub(state.span())?;
        Some(Block { offset, state })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// free(10) | allocated(4) | free(6), 44 bytes.
    fn three_blocks() -> TagBuffer<u8> {
        let mut buf = TagBuffer::new(44);
        buf.write_block(0, BlockState::Free(10));
        buf.write_block(18, BlockState::Allocated(4));
        buf.write_block(30, BlockState::Free(6));
        buf
    }

    #[test]
    fn walk_visits_every_block_in_order() {
        let buf = three_blocks();
        let blocks: Vec<_> = Blocks::new(&buf).collect();
        assert_eq!(
            blocks,
            vec![
                Block { offset: 0, state: BlockState::Free(10) },
                Block { offset: 18, state: BlockState::Allocated(4) },
                Block { offset: 30, state: BlockState::Free(6) },
            ]
        );
    }

    #[test]
    fn geometry_accessors() {
        let block = Block {
            offset: 18,
            state: BlockState::Allocated(4),
        };
        assert_eq!(block.payload_offset(), 22);
        assert_eq!(block.payload(), 22..26);
        assert_eq!(block.trailing_offset(), 26);
        assert_eq!(block.end(), 30);
    }

    #[test]
    fn step_forward_and_back() {
        let buf = three_blocks();
        let middle = buf.block_at(18).unwrap();
        assert_eq!(buf.prev_block(&middle).unwrap().offset, 0);
        assert_eq!(buf.next_block(&middle).unwrap().offset, 30);
    }

    #[test]
    fn no_neighbours_past_the_edges() {
        let buf = three_blocks();
        let first = buf.block_at(0).unwrap();
        let last = buf.block_at(30).unwrap();
        assert!(buf.prev_block(&first).is_none());
        assert!(buf.next_block(&last).is_none());
    }
}
