//! Boundary tag encoding.
//!
//! Every block in an arena is framed by two identical [`Tag`]s: one at the
//! first byte of the block and one at its last `TAG_SIZE` bytes. A tag is a
//! signed 32-bit integer whose magnitude is the payload size in bytes and
//! whose sign is the block state (positive free, negative allocated).
//!
//! Code outside this module never inspects the sign directly; it decodes a
//! tag once into a [`BlockState`] and matches on that.

use std::fmt;

/// Width of one boundary tag in bytes.
pub const TAG_SIZE: usize = std::mem::size_of::<i32>();

/// Bytes of bookkeeping per block (leading plus trailing tag).
pub const BLOCK_OVERHEAD: usize = 2 * TAG_SIZE;

/// Decoded state of a block, carrying its payload size in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockState {
    /// Available for allocation.
    Free(usize),
    /// Handed out to a caller.
    Allocated(usize),
}

impl BlockState {
    /// Payload size in bytes, excluding both tags.
    pub fn size(self) -> usize {
        match self {
            Self::Free(size) | Self::Allocated(size) => size,
        }
    }

    /// Whether this block is free.
    pub fn is_free(self) -> bool {
        matches!(self, Self::Free(_))
    }

    /// Whether this block is allocated.
    pub fn is_allocated(self) -> bool {
        matches!(self, Self::Allocated(_))
    }

    /// Total span of the block in the buffer, tags included.
    pub fn span(self) -> usize {
        self.size() + BLOCK_OVERHEAD
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free(size) => write!(f, "free({size})"),
            Self::Allocated(size) => write!(f, "allocated({size})"),
        }
    }
}

/// A raw boundary tag as stored in the arena buffer.
///
/// Tags are stored little-endian so that arena images are byte-identical
/// across hosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tag(pub i32);

impl Tag {
    /// Largest payload a single tag can describe.
    pub const MAX_PAYLOAD: usize = i32::MAX as usize;

    /// Encode a block state.
    ///
    /// Returns `None` if the size exceeds [`Tag::MAX_PAYLOAD`], or for an
    /// allocated block of size zero (which has no distinct negative form).
    pub fn encode(state: BlockState) -> Option<Self> {
        let magnitude = i32::try_from(state.size()).ok()?;
        match state {
            BlockState::Free(_) => Some(Self(magnitude)),
            BlockState::Allocated(0) => None,
            BlockState::Allocated(_) => Some(Self(-magnitude)),
        }
    }

    /// Decode into a block state. A zero tag decodes as an empty free block.
    pub fn state(self) -> BlockState {
        let size = self.0.unsigned_abs() as usize;
        if self.0 < 0 {
            BlockState::Allocated(size)
        } else {
            BlockState::Free(size)
        }
    }

    /// Payload size in bytes.
    pub fn size(self) -> usize {
        self.0.unsigned_abs() as usize
    }

    /// Serialise to the on-buffer byte representation.
    pub fn to_bytes(self) -> [u8; TAG_SIZE] {
        self.0.to_le_bytes()
    }

    /// Deserialise from the on-buffer byte representation.
    pub fn from_bytes(bytes: [u8; TAG_SIZE]) -> Self {
        Self(i32::from_le_bytes(bytes))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Tag> for BlockState {
    fn from(tag: Tag) -> Self {
        tag.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_encodes_state() {
        assert_eq!(Tag::encode(BlockState::Free(12)), Some(Tag(12)));
        assert_eq!(Tag::encode(BlockState::Allocated(12)), Some(Tag(-12)));
        assert_eq!(Tag(12).state(), BlockState::Free(12));
        assert_eq!(Tag(-12).state(), BlockState::Allocated(12));
    }

    #[test]
    fn zero_tag_is_empty_free_block() {
        assert_eq!(Tag(0).state(), BlockState::Free(0));
        assert_eq!(Tag::encode(BlockState::Free(0)), Some(Tag(0)));
        assert_eq!(Tag::encode(BlockState::Allocated(0)), None);
    }

    #[test]
    fn oversized_payload_is_not_encodable() {
        assert!(Tag::encode(BlockState::Free(Tag::MAX_PAYLOAD)).is_some());
        assert!(Tag::encode(BlockState::Free(Tag::MAX_PAYLOAD + 1)).is_none());
        assert!(Tag::encode(BlockState::Allocated(Tag::MAX_PAYLOAD + 1)).is_none());
    }

    #[test]
    fn bytes_are_little_endian() {
        assert_eq!(Tag(1).to_bytes(), [1, 0, 0, 0]);
        assert_eq!(Tag(-1).to_bytes(), [0xff; 4]);
        assert_eq!(Tag::from_bytes([0xf6, 0xff, 0xff, 0xff]), Tag(-10));
    }

    #[test]
    fn span_includes_both_tags() {
        assert_eq!(BlockState::Free(10).span(), 10 + 2 * TAG_SIZE);
        assert_eq!(BLOCK_OVERHEAD, 8);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_state() -> impl Strategy<Value = BlockState> {
            prop_oneof![
                (0..=Tag::MAX_PAYLOAD).prop_map(BlockState::Free),
                (1..=Tag::MAX_PAYLOAD).prop_map(BlockState::Allocated),
            ]
        }

        proptest! {
            #[test]
            fn encode_then_decode_preserves_state(state in arb_state()) {
                let tag = Tag::encode(state).unwrap();
                prop_assert_eq!(tag.state(), state);
                prop_assert_eq!(tag.size(), state.size());
                prop_assert_eq!(Tag::from_bytes(tag.to_bytes()), tag);
            }
        }
    }
}
