//! Interval to bit-prefix decomposition over the 16-bit port space.
use std::fmt::{Display, Formatter};

pub const PORT_BITS: u32 = 16;
pub const PORT_MAX: u32 = (1 << PORT_BITS) - 1;

/// `PORT_BIT_MASK[i] = (2^i - 1, !(2^i - 1) & 0xffff)`: the offset mask of an `i`-bit block and
/// the mask of the bits that stay constant inside it.
const PORT_BIT_MASK: [(u32, u32); PORT_BITS as usize + 1] = port_bit_mask();

const fn port_bit_mask() -> [(u32, u32); PORT_BITS as usize + 1] {
    let mut table = [(0, 0); PORT_BITS as usize + 1];
    let mut i = 0;
    while i <= PORT_BITS as usize {
        let block = (1u32 << i) - 1;
        table[i] = (block, !block & PORT_MAX);
        i += 1;
    }
    table
}

/// One aligned bit-prefix block `[low, high]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrefixRange {
    pub low: u32,
    pub high: u32,
    pub prefix_len: u32,
}

impl Display for PrefixRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x}/{}", self.low, self.prefix_len)
    }
}

/// Decompose the port interval `[start, end]` into prefix blocks, taking the largest aligned
/// block at each position. Values above [PORT_MAX] are clamped, and `start > end` yields
/// nothing.
///
/// ```no_run
/// use pclass_core::prefix::{decompose, PrefixRange};
///
/// assert_eq!(
///     decompose(0, 5),
///     vec![
///         PrefixRange { low: 0, high: 3, prefix_len: 14 },
///         PrefixRange { low: 4, high: 5, prefix_len: 15 },
///     ]
/// );
/// ```
pub fn decompose(start: u32, end: u32) -> Vec<PrefixRange> {
    let end = end.min(PORT_MAX);
    let mut prefix = vec![];
    let mut pos = start;
    while pos <= end {
        let mut i = 1;
        while i <= PORT_BITS as usize {
            let (block, align) = PORT_BIT_MASK[i];
            let pos2 = pos + block;
            if pos2 > end || (pos & align) != (pos2 & align) {
                break;
            }
            i += 1;
        }
        let block = PORT_BIT_MASK[i - 1].0;
        prefix.push(PrefixRange {
            low: pos,
            high: pos + block,
            prefix_len: PORT_BITS - (i as u32 - 1),
        });
        pos += block + 1;
    }
    prefix
}
