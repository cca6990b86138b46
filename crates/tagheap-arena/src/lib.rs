//! Fixed-capacity boundary-tag arena allocation.
//!
//! An [`Arena`] owns one byte buffer, sized at construction and never
//! resized, and hands out typed element slots from it. This crate is the
//! only one in the workspace that may contain `unsafe` code, and only in
//! `raw.rs`.
//!
//! # Layout
//!
//! ```text
//! offset 0                                                   capacity
//! ├──────────────┬──────────────────┬────────────────────────────┤
//! │ +10 [10B] +10│ -5 [5B] -5       │ +36 [36B] +36              │
//! └──────────────┴──────────────────┴────────────────────────────┘
//!   free block     allocated block    free block
//! ```
//!
//! Each block is `[tag][payload][tag]`. Both tags hold the payload size,
//! positive when the block is free and negative when it is allocated.
//! Blocks tile the buffer with no gaps, free blocks are never adjacent,
//! and every free block can hold at least one element.
//!
//! # Operations
//!
//! - [`Arena::allocate`]: first-fit scan, split when the leftover is a
//!   legal block, whole-block grant otherwise.
//! - [`Arena::deallocate`]: validate the handle, free the block, merge
//!   with free neighbours.
//! - [`Arena::construct`] / [`Arena::destroy`]: place and drop values in
//!   allocated slots without touching the block layout.
//! - [`Arena::valid`] / [`Arena::check`]: full layout consistency walk,
//!   also run after every mutation when enabled by [`ArenaConfig`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod block;
mod check;
pub mod config;
pub mod handle;
mod raw;
pub mod stats;

// Public re-exports for the primary API surface.
pub use arena::Arena;
pub use block::{Block, Blocks};
pub use config::{ArenaConfig, InvariantChecks};
pub use handle::Ptr;
pub use stats::ArenaStats;
pub use tagheap_core::{ArenaError, BlockState, InvariantViolation, Tag, BLOCK_OVERHEAD, TAG_SIZE};
