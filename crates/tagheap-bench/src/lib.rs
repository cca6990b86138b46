//! Workload profiles for benchmarking the tagheap allocator.
//!
//! - [`churn_profile`]: interleaved allocate/free traffic over a bounded
//!   live set
//! - [`fragmented_arena`]: an arena whose free space is scattered across
//!   many small holes ahead of one large tail block
//! - [`request_sizes`]: deterministic request sizes derived from a seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tagheap_arena::{Arena, ArenaConfig, InvariantChecks, Ptr};

/// One step of an allocation workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Allocate this many elements.
    Allocate(usize),
    /// Free the live allocation at this index of the live set.
    Free(usize),
}

/// Generate `n` deterministic request sizes in `1..=max`.
pub fn request_sizes(n: usize, max: usize, seed: u64) -> Vec<usize> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as usize % max.max(1) + 1
        })
        .collect()
}

/// Build an allocate/free trace that keeps at most `live` allocations.
///
/// Every allocation beyond the limit is preceded by a free of a slot
/// chosen from the seed, so the trace exercises both splitting and
/// coalescing.
pub fn churn_profile(ops: usize, live: usize, max_request: usize, seed: u64) -> Vec<Op> {
    let sizes = request_sizes(ops, max_request, seed);
    let mut trace = Vec::with_capacity(ops * 2);
    let mut outstanding = 0usize;
    for (i, size) in sizes.into_iter().enumerate() {
        if outstanding == live.max(1) {
            let victim = (seed as usize).wrapping_add(i.wrapping_mul(31)) % outstanding;
            trace.push(Op::Free(victim));
            outstanding -= 1;
        }
        trace.push(Op::Allocate(size));
        outstanding += 1;
    }
    trace
}

/// Replay `trace` against `arena`, returning the allocations still live.
///
/// Requests that do not fit are skipped.
pub fn replay(arena: &mut Arena<u64>, trace: &[Op]) -> Vec<(Ptr<u64>, usize)> {
    let mut live: Vec<(Ptr<u64>, usize)> = Vec::new();
    for op in trace {
        match *op {
            Op::Allocate(count) => {
                if let Ok(ptr) = arena.allocate(count) {
                    live.push((ptr, count));
                }
            }
            Op::Free(index) => {
                if live.is_empty() {
                    continue;
                }
                let (ptr, count) = live.swap_remove(index % live.len());
                arena
                    .deallocate(ptr, count)
                    .unwrap_or_else(|e| panic!("replayed free of {ptr} failed: {e}"));
            }
        }
    }
    live
}

/// Arena with `holes` free single-element blocks, each followed by an
/// allocated one, ahead of a large free tail block.
///
/// A first-fit request for more than one element has to walk past every
/// hole before it lands in the tail.
pub fn fragmented_arena(holes: usize, tail_elements: usize) -> Arena<u64> {
    let pair = 2 * Arena::<u64>::MIN_BLOCK_SIZE;
    let capacity = holes * pair + tail_elements * 8 + 2 * Arena::<u64>::MIN_BLOCK_SIZE;
    let config = ArenaConfig::new(capacity).with_checks(InvariantChecks::DebugOnly);
    let mut arena = Arena::<u64>::with_config(config)
        .unwrap_or_else(|e| panic!("fragmented arena of {capacity} bytes: {e}"));

    let mut holes_to_free = Vec::with_capacity(holes);
    for _ in 0..holes {
        let hole = arena.allocate(1).unwrap_or_else(|e| panic!("hole: {e}"));
        arena.allocate(1).unwrap_or_else(|e| panic!("separator: {e}"));
        holes_to_free.push(hole);
    }
    for hole in holes_to_free {
        arena
            .deallocate(hole, 1)
            .unwrap_or_else(|e| panic!("freeing hole {hole}: {e}"));
    }
    arena
}
