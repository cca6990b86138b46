//! tagheap: a fixed-capacity boundary-tag allocator.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the tagheap sub-crates. For most users, adding `tagheap` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tagheap::prelude::*;
//!
//! let mut arena = Arena::<u32>::new(256).unwrap();
//! let ptr = arena.allocate(4).unwrap();
//! arena.construct(ptr, 7).unwrap();
//! arena.construct(ptr.add(1), 11).unwrap();
//! assert_eq!(arena.read(ptr.add(1)).unwrap(), 11);
//!
//! arena.destroy(ptr).unwrap();
//! arena.destroy(ptr.add(1)).unwrap();
//! arena.deallocate(ptr, 4).unwrap();
//!
//! // Everything coalesced back into one free block.
//! assert_eq!(arena.stats().free_blocks, 1);
//! assert!(arena.valid());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `tagheap-arena` | `Arena`, `Ptr`, configuration, block iteration, statistics |
//! | [`types`] | `tagheap-core` | Tag encoding, block states, error types |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// The allocator itself (`tagheap-arena`).
///
/// Most users only need [`arena::Arena`] and [`arena::Ptr`], which are also
/// available in the [`prelude`].
pub use tagheap_arena as arena;

/// Tag encoding, block states, and error types (`tagheap-core`).
pub use tagheap_core as types;

/// Common imports for typical tagheap usage.
///
/// ```rust
/// use tagheap::prelude::*;
/// ```
pub mod prelude {
    // Allocator
    pub use tagheap_arena::{Arena, ArenaConfig, InvariantChecks, Ptr};

    // Inspection
    pub use tagheap_arena::{ArenaStats, Block};
    pub use tagheap_core::BlockState;

    // Errors
    pub use tagheap_core::{ArenaError, InvariantViolation};
}
