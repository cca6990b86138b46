//! Reusable arena fixtures.
//!
//! - [`LayoutBuilder`]: builds an `Arena<u8>` whose blocks match a given
//!   sequence of free and allocated sizes, using only the public API.
//! - [`DropLog`] / [`Tracked`]: an element type that records its drops.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tagheap_arena::{Arena, ArenaConfig, InvariantChecks, Ptr};
use tagheap_core::BlockState;

/// Label of the allocated block appended after every built layout.
pub const GUARD: &str = "guard";

/// Payload size of the guard block.
///
/// Its 17-byte span guarantees every allocation made before it leaves a
/// remainder of at least one minimal `u8` block, so each one splits.
pub const GUARD_SIZE: usize = 9;

/// Builds an `Arena<u8>` with an exact block layout.
///
/// Blocks are listed in address order. The built arena has exactly these
/// blocks followed by an allocated [`GUARD`] block, and runs with
/// [`InvariantChecks::Always`].
///
/// ```
/// use tagheap_test_utils::LayoutBuilder;
///
/// let fx = LayoutBuilder::new()
///     .free("a", 10)
///     .allocated("b", 5)
///     .free("c", 8)
///     .build();
/// assert_eq!(fx.arena.stats().free_blocks, 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct LayoutBuilder {
    blocks: Vec<(&'static str, BlockState)>,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a free block of `size` payload bytes.
    pub fn free(mut self, label: &'static str, size: usize) -> Self {
        self.blocks.push((label, BlockState::Free(size)));
        self
    }

    /// Append an allocated block of `size` payload bytes.
    pub fn allocated(mut self, label: &'static str, size: usize) -> Self {
        self.blocks.push((label, BlockState::Allocated(size)));
        self
    }

    /// Capacity of the arena this builder will produce.
    pub fn capacity(&self) -> usize {
        self.blocks.iter().map(|(_, s)| s.span()).sum::<usize>()
            + BlockState::Allocated(GUARD_SIZE).span()
    }

    /// Build the arena.
    ///
    /// # Panics
    ///
    /// Panics on an empty block, a duplicate label, or two adjacent free
    /// blocks (which the arena would coalesce).
    pub fn build(self) -> Fixture {
        for (label, state) in &self.blocks {
            assert!(state.size() > 0, "block '{label}' has zero size");
            assert!(*label != GUARD, "label '{GUARD}' is reserved");
        }
        for pair in self.blocks.windows(2) {
            assert!(
                !(pair[0].1.is_free() && pair[1].1.is_free()),
                "blocks '{}' and '{}' are both free",
                pair[0].0,
                pair[1].0,
            );
        }

        let config = ArenaConfig::new(self.capacity()).with_checks(InvariantChecks::Always);
        let mut arena = Arena::<u8>::with_config(config).expect("layout capacity is valid");
        let mut ptrs = IndexMap::with_capacity(self.blocks.len() + 1);
        for (label, state) in &self.blocks {
            let ptr = arena
                .allocate(state.size())
                .unwrap_or_else(|e| panic!("allocating block '{label}': {e}"));
            let duplicate = ptrs.insert(*label, ptr);
            assert!(duplicate.is_none(), "duplicate label '{label}'");
        }
        let guard = arena
            .allocate(GUARD_SIZE)
            .unwrap_or_else(|e| panic!("allocating guard block: {e}"));
        ptrs.insert(GUARD, guard);

        for (label, state) in &self.blocks {
            if state.is_free() {
                arena
                    .deallocate(ptrs[label], state.size())
                    .unwrap_or_else(|e| panic!("freeing block '{label}': {e}"));
            }
        }

        let fixture = Fixture { arena, ptrs };
        let expected: Vec<_> = self
            .blocks
            .iter()
            .map(|(_, s)| *s)
            .chain([BlockState::Allocated(GUARD_SIZE)])
            .collect();
        assert_eq!(fixture.states(), expected, "built layout differs");
        fixture
    }
}

/// An arena built by [`LayoutBuilder`], with handles to every block.
pub struct Fixture {
    pub arena: Arena<u8>,
    /// Payload handle of each block, keyed by label, in address order.
    pub ptrs: IndexMap<&'static str, Ptr<u8>>,
}

impl Fixture {
    /// Handle to the payload of the block labelled `label`.
    pub fn ptr(&self, label: &str) -> Ptr<u8> {
        *self
            .ptrs
            .get(label)
            .unwrap_or_else(|| panic!("no block labelled '{label}'"))
    }

    /// Current block states in address order.
    pub fn states(&self) -> Vec<BlockState> {
        self.arena.blocks().map(|b| b.state).collect()
    }

    /// Label of the block whose payload starts at `ptr`, if any.
    pub fn label_of(&self, ptr: Ptr<u8>) -> Option<&'static str> {
        self.ptrs
            .iter()
            .find(|(_, p)| **p == ptr)
            .map(|(label, _)| *label)
    }
}

/// Shared record of [`Tracked`] drops, in drop order.
#[derive(Clone, Debug, Default)]
pub struct DropLog(Rc<RefCell<Vec<u32>>>);

impl DropLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new element that records `id` here when dropped.
    pub fn tracked(&self, id: u32) -> Tracked {
        Tracked {
            id,
            log: self.clone(),
        }
    }

    /// Ids dropped so far, in order.
    pub fn dropped(&self) -> Vec<u32> {
        self.0.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.0.borrow().len()
    }
}

/// Element type whose drop is observable through a [`DropLog`].
#[derive(Debug)]
pub struct Tracked {
    pub id: u32,
    log: DropLog,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.log.0.borrow_mut().push(self.id);
    }
}
