use bitvec::prelude::*;
use tracing::debug;

use crate::error::TrieError;

type NodeId = u32;

/// The first `len` bits of the `width`-bit `key`, most significant first.
#[inline]
fn key_bits(key: &u32, width: u32, len: u32) -> &BitSlice<u32, Msb0> {
    let skip = (u32::BITS - width) as usize;
    &key.view_bits::<Msb0>()[skip..skip + len as usize]
}

const ROOT: NodeId = 0;

#[derive(Debug, Default, Clone)]
struct TrieNode {
    children: [Option<NodeId>; 2],
    priority: Option<u32>,
}

/// Binary trie over the top bits of a `width`-bit key.
///
/// Keys are passed as `u32`; for a width below 32 only the low `width` bits of the key are used,
/// e.g. a port trie is built with `PrefixTrie::new(16)` and queried with plain port numbers. All
/// nodes live in one arena owned by the trie, node 0 being the root sentinel that holds the
/// priority of a zero-length prefix.
///
/// ## Example
/// ```no_run
/// use pclass_trie::PrefixTrie;
///
/// let mut trie = PrefixTrie::new(32);
/// trie.insert(0xc0a8_0000, 24, 5).unwrap();
/// assert_eq!(trie.lookup(0xc0a8_0001, 32).unwrap(), 24);
/// assert_eq!(trie.longest_match(0xc0a8_0001, 32).unwrap(), Some((24, 5)));
/// assert_eq!(trie.lookup(0xc0a9_0000, 32).unwrap(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct PrefixTrie {
    nodes: Vec<TrieNode>,
    width: u32,
}

impl PrefixTrie {
    pub fn new(width: u32) -> Self {
        debug_assert!(width > 0 && width <= u32::BITS);
        PrefixTrie {
            nodes: vec![TrieNode::default()],
            width,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of nodes, root included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    fn check_len(&self, len: u32) -> Result<(), TrieError> {
        if len > self.width {
            Err(TrieError::PrefixTooLong {
                len,
                width: self.width,
            })
        } else {
            Ok(())
        }
    }

    /// Record `priority` at the node of `key/prefix_len`, keeping the maximum of all priorities
    /// inserted there.
    pub fn insert(&mut self, key: u32, prefix_len: u32, priority: u32) -> Result<(), TrieError> {
        self.check_len(prefix_len)?;
        let mut cur = ROOT;
        for bit in key_bits(&key, self.width, prefix_len).iter().by_vals() {
            let b = bit as usize;
            cur = match self.nodes[cur as usize].children[b] {
                Some(next) => next,
                None => {
                    let next = self.nodes.len() as NodeId;
                    self.nodes.push(TrieNode::default());
                    self.nodes[cur as usize].children[b] = Some(next);
                    next
                }
            };
        }
        let node = &mut self.nodes[cur as usize];
        node.priority = Some(node.priority.map_or(priority, |p| p.max(priority)));
        Ok(())
    }

    /// Deepest node carrying a priority along the first `max_bits` bits of `key`, as
    /// `(depth, priority)`.
    pub fn longest_match(&self, key: u32, max_bits: u32) -> Result<Option<(u32, u32)>, TrieError> {
        self.check_len(max_bits)?;
        let mut best = self.nodes[ROOT as usize].priority.map(|p| (0, p));
        let mut cur = ROOT;
        for (depth, bit) in key_bits(&key, self.width, max_bits).iter().by_vals().enumerate() {
            match self.nodes[cur as usize].children[bit as usize] {
                Some(next) => cur = next,
                None => break,
            }
            if let Some(p) = self.nodes[cur as usize].priority {
                best = Some((depth as u32 + 1, p));
            }
        }
        Ok(best)
    }

    /// Length of the longest stored prefix matching `key` within `max_bits` bits, 0 when nothing
    /// but (at most) the zero-length prefix matches.
    #[inline]
    pub fn lookup(&self, key: u32, max_bits: u32) -> Result<u32, TrieError> {
        Ok(self.longest_match(key, max_bits)?.map_or(0, |(len, _)| len))
    }

    /// Release every node but the root, which is reset.
    pub fn clear(&mut self) {
        debug!("clear trie of {} nodes", self.nodes.len());
        self.nodes.clear();
        self.nodes.shrink_to_fit();
        self.nodes.push(TrieNode::default());
    }
}
