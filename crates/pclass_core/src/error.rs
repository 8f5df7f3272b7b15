use thiserror::Error;

/// Errors raised while turning user-facing configuration into engine configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown dimension `{0}`, expected one of sip, dip, sport, dport, proto")]
    UnknownDimension(String),

    #[error("dimension `{0}` is listed more than once")]
    DuplicateDimension(&'static str),

    #[error("unknown engine `{0}`, expected `linear` or `tuple`")]
    UnknownEngine(String),

    #[error("unknown answer mode `{0}`, expected `skip`, `full` or `delete-quarter`")]
    UnknownAnswerMode(String),
}
