//! This module provides the rule model, port prefix decomposition, rule expansion and
//! deduplication, and the lookup engines used to answer traces.
pub mod answer;
pub mod dedup;
pub mod engine;
mod error;
pub mod expand;
pub mod prefix;
pub mod rule;

pub use crate::error::ConfigError;
pub use crate::rule::family::constant::DIM_NUM;

#[allow(missing_docs)]
pub mod prelude {
    #[doc(hidden)]
    pub use crate::{
        answer::{answer_traces, generate_answers, generate_traces, one_match_rules, AnswerMode},
        dedup::{dedup, dedup_ignore_protocol},
        engine::{
            Classifier, EngineConfig, EngineKind, LinearEngine, LookupEngine, TupleSpaceEngine,
        },
        expand::{expand, expand_all, expand_all_ref},
        prefix::{decompose, PrefixRange},
        rule::{
            family::{Dimension, DimensionDecl},
            normalize_prefix, Range, Rule, RuleKey, RuleKeyNoProto, Trace,
        },
        ConfigError,
    };
}
