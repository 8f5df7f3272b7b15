use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrieError {
    #[error("prefix length {len} exceeds the {width}-bit key width")]
    PrefixTooLong { len: u32, width: u32 },
}
