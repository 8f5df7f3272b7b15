//! This crate provides the binary prefix trie used by the MegaFlow synthesizer, one instance per
//! classification dimension.
mod error;
mod trie;

pub use crate::{error::TrieError, trie::PrefixTrie};

#[allow(missing_docs)]
pub mod prelude {
    #[doc(hidden)]
    pub use crate::{PrefixTrie, TrieError};
}
