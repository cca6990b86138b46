//! Core types for the tagheap allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! on-buffer boundary tag encoding, the decoded block state, and the error
//! types shared by the arena and its callers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod tag;

pub use error::{ArenaError, InvariantViolation};
pub use tag::{BlockState, Tag, BLOCK_OVERHEAD, TAG_SIZE};
