//! Occupancy statistics.

use tagheap_core::BlockState;

use crate::block::Block;

/// Point-in-time summary of an arena's block layout.
///
/// Byte counts are payload bytes; tag overhead is
/// `blocks * BLOCK_OVERHEAD`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Buffer length in bytes.
    pub capacity: usize,
    /// Total number of blocks.
    pub blocks: usize,
    /// Number of free blocks.
    pub free_blocks: usize,
    /// Sum of free payload sizes.
    pub free_bytes: usize,
    /// Sum of allocated payload sizes.
    pub allocated_bytes: usize,
    /// Largest single free payload; the biggest request that can succeed.
    pub largest_free: usize,
}

impl ArenaStats {
    pub(crate) fn collect(capacity: usize, blocks: impl Iterator<Item = Block>) -> Self {
        blocks.fold(
            Self {
                capacity,
                ..Self::default()
            },
            |mut stats, block| {
                stats.blocks += 1;
                match block.state {
                    BlockState::Free(size) => {
                        stats.free_blocks += 1;
                        stats.free_bytes += size;
                        stats.largest_free = stats.largest_free.max(size);
                    }
                    BlockState::Allocated(size) => stats.allocated_bytes += size,
                }
                stats
            },
        )
    }

    /// Fraction of free payload bytes outside the largest free block.
    ///
    /// 0.0 when all free space is contiguous (or there is none).
    pub fn fragmentation(&self) -> f64 {
        if self.free_bytes == 0 {
            return 0.0;
        }
        1.0 - self.largest_free as f64 / self.free_bytes as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_sums_by_state() {
        let blocks = [
            Block { offset: 0, state: BlockState::Free(10) },
            Block { offset: 18, state: BlockState::Allocated(4) },
            Block { offset: 30, state: BlockState::Free(30) },
        ];
        let stats = ArenaStats::collect(68, blocks.into_iter());
        assert_eq!(stats.blocks, 3);
        assert_eq!(stats.free_blocks, 2);
        assert_eq!(stats.free_bytes, 40);
        assert_eq!(stats.allocated_bytes, 4);
        assert_eq!(stats.largest_free, 30);
        assert!((stats.fragmentation() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn no_free_space_is_not_fragmented() {
        let stats = ArenaStats::collect(
            16,
            std::iter::once(Block { offset: 0, state: BlockState::Allocated(8) }),
        );
        assert_eq!(stats.fragmentation(), 0.0);
    }
}
