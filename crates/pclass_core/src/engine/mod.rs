//! # Lookup engines
//!
//! A lookup engine answers "which is the highest priority rule matching this trace". Engines are
//! built once from an owned rule set and then queried any number of times. All of them share the
//! [LookupEngine] interface, and [Classifier] picks one by [EngineKind].
//!
//! ## Example
//! ```no_run
//! use pclass_core::{
//!     engine::{Classifier, EngineConfig, LookupEngine},
//!     rule::{family::Dimension, Rule, Trace},
//! };
//!
//! let mut rule = Rule::wildcard(2);
//! rule.set_prefix(Dimension::SrcIp, 0x0a00_0000, 8);
//! let rules = vec![rule, Rule::wildcard(1)];
//!
//! let engine = Classifier::build(rules, &EngineConfig::default());
//! assert_eq!(engine.lookup(&Trace::from([0x0a01_0203, 0, 0, 0, 0])), 2);
//! assert_eq!(engine.lookup(&Trace::from([0x0b01_0203, 0, 0, 0, 0])), 1);
//! let rules = engine.teardown(false).unwrap();
//! assert_eq!(rules.len(), 2);
//! ```
mod linear;
mod tuple;

use std::{fmt::Display, str::FromStr};

use crate::{
    error::ConfigError,
    rule::{family::Dimension, Rule, Trace},
};

pub use {linear::LinearEngine, tuple::TupleSpaceEngine};

/// The capability every lookup engine provides.
pub trait LookupEngine {
    /// Build the engine in one pass, taking ownership of `rules`.
    fn build(rules: Vec<Rule>, config: &EngineConfig) -> Self
    where
        Self: Sized;

    /// Priority of the highest priority rule matching `trace`, 0 if none matches.
    fn lookup(&self, trace: &Trace) -> u32;

    /// Remove one rule equal to `rule`. Returns false, leaving the engine untouched, if there is
    /// no such rule.
    fn delete_rule(&mut self, rule: &Rule) -> bool;

    /// Release the engine. With `release_rules` the rules are dropped as well, otherwise the
    /// rules still held by the engine are handed back.
    fn teardown(self, release_rules: bool) -> Option<Vec<Rule>>
    where
        Self: Sized;

    /// Number of rules currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum EngineKind {
    Linear,
    #[default]
    TupleSpace,
}

impl FromStr for EngineKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(EngineKind::Linear),
            "tuple" | "tss" => Ok(EngineKind::TupleSpace),
            _ => Err(ConfigError::UnknownEngine(s.to_owned())),
        }
    }
}

impl Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Linear => f.write_str("linear"),
            EngineKind::TupleSpace => f.write_str("tuple"),
        }
    }
}

/// Explicit engine configuration handed to [LookupEngine::build].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub kind: EngineKind,
    /// Dimensions a tuple-space engine hashes on. Ignored by the linear engine.
    pub prefix_dims: Vec<Dimension>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            kind: EngineKind::default(),
            prefix_dims: vec![Dimension::SrcIp, Dimension::DstIp],
        }
    }
}

impl EngineConfig {
    /// Build a configuration from a comma separated dimension list such as `"sip,dip"`.
    pub fn with_dims(kind: EngineKind, dims: &str) -> Result<Self, ConfigError> {
        let mut prefix_dims: Vec<Dimension> = vec![];
        for name in dims.split(',').filter(|s| !s.trim().is_empty()) {
            let d: Dimension = name.parse()?;
            if prefix_dims.contains(&d) {
                return Err(ConfigError::DuplicateDimension(d.name()));
            }
            prefix_dims.push(d);
        }
        Ok(EngineConfig { kind, prefix_dims })
    }
}

/// Engine selected by configuration.
pub enum Classifier {
    Linear(LinearEngine),
    TupleSpace(TupleSpaceEngine),
}

impl LookupEngine for Classifier {
    fn build(rules: Vec<Rule>, config: &EngineConfig) -> Self {
        match config.kind {
            EngineKind::Linear => Classifier::Linear(LinearEngine::build(rules, config)),
            EngineKind::TupleSpace => {
                Classifier::TupleSpace(TupleSpaceEngine::build(rules, config))
            }
        }
    }

    #[inline]
    fn lookup(&self, trace: &Trace) -> u32 {
        match self {
            Classifier::Linear(e) => e.lookup(trace),
            Classifier::TupleSpace(e) => e.lookup(trace),
        }
    }

    fn delete_rule(&mut self, rule: &Rule) -> bool {
        match self {
            Classifier::Linear(e) => e.delete_rule(rule),
            Classifier::TupleSpace(e) => e.delete_rule(rule),
        }
    }

    fn teardown(self, release_rules: bool) -> Option<Vec<Rule>> {
        match self {
            Classifier::Linear(e) => e.teardown(release_rules),
            Classifier::TupleSpace(e) => e.teardown(release_rules),
        }
    }

    fn len(&self) -> usize {
        match self {
            Classifier::Linear(e) => e.len(),
            Classifier::TupleSpace(e) => e.len(),
        }
    }
}
