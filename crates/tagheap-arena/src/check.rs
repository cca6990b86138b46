//! Block layout consistency checking.
//!
//! Unlike [`Blocks`](crate::block::Blocks), the walk here trusts nothing:
//! it reads both tags of every block and reports the first broken
//! invariant it finds.

use tagheap_core::{InvariantViolation, TAG_SIZE};

use crate::raw::TagBuffer;

/// Walk the tag chain from offset 0 and verify the layout invariants:
///
/// 1. blocks tile the buffer exactly, with no gap, overlap or overrun;
/// 2. every block's leading and trailing tags are equal;
/// 3. no two neighbouring blocks are free;
/// 4. every free payload holds at least `element_size` bytes.
pub(crate) fn check<T>(
    buffer: &TagBuffer<T>,
    element_size: usize,
) -> Result<(), InvariantViolation> {
    let capacity = buffer.len();
    let overrun = |offset| InvariantViolation::Overrun { offset, capacity };

    let mut offset = 0;
    let mut prev_free = false;
    while offset < capacity {
        let leading = buffer.read_tag(offset).ok_or_else(|| overrun(offset))?;
        let state = leading.state();
        let trailing_offset = (offset + TAG_SIZE)
            .checked_add(state.size())
            .ok_or_else(|| overrun(offset))?;
        let trailing = buffer
            .read_tag(trailing_offset)
            .ok_or_else(|| overrun(offset))?;

        if trailing != leading {
            return Err(InvariantViolation::TagMismatch {
                offset,
                leading: leading.0,
                trailing: trailing.0,
            });
        }

        if state.is_free() {
            if prev_free {
                return Err(InvariantViolation::AdjacentFree { offset });
            }
            if state.size() < element_size {
                return Err(InvariantViolation::FreeTooSmall {
                    offset,
                    size: state.size(),
                    element_size,
                });
            }
        }

        prev_free = state.is_free();
        offset = trailing_offset + TAG_SIZE;
    }

    Ok(())
}
