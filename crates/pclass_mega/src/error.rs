use thiserror::Error;

use pclass_io::IoError;
use pclass_trie::TrieError;

#[derive(Debug, Error)]
pub enum MegaError {
    #[error("rule does not fit the prefix trie")]
    Trie(#[from] TrieError),

    #[error(transparent)]
    Io(#[from] IoError),
}
