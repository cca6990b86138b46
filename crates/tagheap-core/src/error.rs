//! Error types for the tagheap allocator.
//!
//! [`ArenaError`] is returned to callers of the public operations.
//! [`InvariantViolation`] is diagnostic only: it describes which block
//! layout invariant a consistency check found broken, and never surfaces
//! from `allocate`/`deallocate` as a recoverable error.

use std::error::Error;
use std::fmt;

/// Errors returned by arena operations.
///
/// Every variant leaves the arena exactly as it was before the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The requested capacity cannot hold even one minimal block.
    Capacity {
        /// Requested capacity in bytes.
        capacity: usize,
        /// Smallest capacity that would have been accepted.
        minimum: usize,
    },
    /// The requested capacity is too large to be described by a boundary tag.
    TagOverflow {
        /// Requested capacity in bytes.
        capacity: usize,
        /// Largest capacity that would have been accepted.
        limit: usize,
    },
    /// The element count yields a zero (or unrepresentable) byte size.
    InvalidSize {
        /// Element count passed to `allocate`.
        count: usize,
        /// Size of one element in bytes.
        element_size: usize,
    },
    /// No free block is large enough for the request.
    OutOfMemory {
        /// Requested payload size in bytes.
        requested: usize,
        /// Largest free payload currently available.
        largest_free: usize,
    },
    /// The handle does not name a live allocation.
    ///
    /// Raised for handles that are not exactly at a block's first payload
    /// byte, for blocks that are already free (double free), and for
    /// element accesses that fall outside an allocated payload.
    InvalidPointer {
        /// Byte offset carried by the rejected handle.
        offset: usize,
    },
    /// The element count passed to `deallocate` cannot have produced the
    /// block being released. Only raised when strict deallocation is on.
    SizeMismatch {
        /// Byte offset of the block's payload.
        offset: usize,
        /// Element count passed to `deallocate`.
        count: usize,
        /// Payload size recorded in the block's tags.
        stored: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capacity { capacity, minimum } => {
                write!(
                    f,
                    "arena capacity {capacity} bytes is below the minimum block size of {minimum} bytes"
                )
            }
            Self::TagOverflow { capacity, limit } => {
                write!(
                    f,
                    "arena capacity {capacity} bytes exceeds the tag limit of {limit} bytes"
                )
            }
            Self::InvalidSize {
                count,
                element_size,
            } => {
                write!(
                    f,
                    "invalid size: {count} elements of {element_size} bytes"
                )
            }
            Self::OutOfMemory {
                requested,
                largest_free,
            } => {
                write!(
                    f,
                    "out of memory: requested {requested} bytes, largest free block {largest_free} bytes"
                )
            }
            Self::InvalidPointer { offset } => {
                write!(f, "invalid pointer at offset {offset}")
            }
            Self::SizeMismatch {
                offset,
                count,
                stored,
            } => {
                write!(
                    f,
                    "size mismatch at offset {offset}: {count} elements released, block holds {stored} bytes"
                )
            }
        }
    }
}

impl Error for ArenaError {}

/// A broken block layout invariant, located by block offset.
///
/// Offsets are the position of the offending block's leading tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A block's span runs past the end of the buffer, or the chain does
    /// not end exactly at the buffer's end.
    Overrun {
        /// Leading tag offset of the block that overran.
        offset: usize,
        /// Buffer length in bytes.
        capacity: usize,
    },
    /// Leading and trailing tags disagree.
    TagMismatch {
        /// Leading tag offset.
        offset: usize,
        /// Raw value of the leading tag.
        leading: i32,
        /// Raw value of the trailing tag.
        trailing: i32,
    },
    /// Two neighbouring blocks are both free.
    AdjacentFree {
        /// Leading tag offset of the second free block.
        offset: usize,
    },
    /// A free block cannot hold a single element.
    FreeTooSmall {
        /// Leading tag offset.
        offset: usize,
        /// Payload size of the block.
        size: usize,
        /// Size of one element.
        element_size: usize,
    },
}

impl InvariantViolation {
    /// Offset of the block at which the violation was detected.
    pub fn offset(&self) -> usize {
        match *self {
            Self::Overrun { offset, .. }
            | Self::TagMismatch { offset, .. }
            | Self::AdjacentFree { offset }
            | Self::FreeTooSmall { offset, .. } => offset,
        }
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overrun { offset, capacity } => {
                write!(
                    f,
                    "block at offset {offset} overruns the {capacity}-byte buffer"
                )
            }
            Self::TagMismatch {
                offset,
                leading,
                trailing,
            } => {
                write!(
                    f,
                    "block at offset {offset} has mismatched tags: leading {leading}, trailing {trailing}"
                )
            }
            Self::AdjacentFree { offset } => {
                write!(f, "free block at offset {offset} follows another free block")
            }
            Self::FreeTooSmall {
                offset,
                size,
                element_size,
            } => {
                write!(
                    f,
                    "free block at offset {offset} holds {size} bytes, less than one {element_size}-byte element"
                )
            }
        }
    }
}

impl Error for InvariantViolation {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offset() {
        let err = ArenaError::InvalidPointer { offset: 13 };
        assert_eq!(err.to_string(), "invalid pointer at offset 13");
    }

    #[test]
    fn out_of_memory_reports_largest_free() {
        let err = ArenaError::OutOfMemory {
            requested: 64,
            largest_free: 40,
        };
        let msg = err.to_string();
        assert!(msg.contains("64"));
        assert!(msg.contains("40"));
    }

    #[test]
    fn violation_offset_accessor() {
        let v = InvariantViolation::TagMismatch {
            offset: 24,
            leading: 8,
            trailing: -8,
        };
        assert_eq!(v.offset(), 24);
        assert_eq!(InvariantViolation::AdjacentFree { offset: 7 }.offset(), 7);
    }

    #[test]
    fn errors_are_std_errors() {
        fn assert_error<E: Error + Send + Sync + 'static>() {}
        assert_error::<ArenaError>();
        assert_error::<InvariantViolation>();
    }
}
