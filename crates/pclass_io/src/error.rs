use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot open `{}`", path.display())]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Malformed(#[from] RecordError),
}

/// A record that could not be turned into a rule or a trace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct RecordError {
    /// 1-based line number in the input.
    pub line: usize,
    pub kind: RecordErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordErrorKind {
    #[error("expected at least {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("`{0}` is not a valid number")]
    Number(String),

    #[error("`{0}` is not a valid IPv4 address")]
    Ipv4(String),

    #[error("prefix length {len} exceeds {width} bits")]
    PrefixTooLong { len: u32, width: u32 },

    #[error("port {0} is out of range")]
    PortOutOfRange(u32),

    #[error("inverted range {low} : {high}")]
    InvertedRange { low: u32, high: u32 },
}

impl RecordErrorKind {
    #[inline]
    pub(crate) fn at(self, line: usize) -> RecordError {
        RecordError { line, kind: self }
    }
}
