//! Rule deduplication. Priority never takes part in the comparison.
use std::hash::Hash;

use fxhash::FxBuildHasher;
use indexmap::IndexSet;
use tracing::debug;

use crate::rule::Rule;

fn dedup_by<K, F>(rules: Vec<Rule>, key: F) -> Vec<Rule>
where
    K: Hash + Eq,
    F: Fn(&Rule) -> K,
{
    let before = rules.len();
    let mut seen = IndexSet::<K, FxBuildHasher>::with_capacity_and_hasher(
        before,
        FxBuildHasher::default(),
    );
    let unique: Vec<Rule> = rules.into_iter().filter(|r| seen.insert(key(r))).collect();
    debug!("dedup {} rules to {}", before, unique.len());
    unique
}

/// Keep the first rule of every group with equal ranges and prefix lengths.
pub fn dedup(rules: Vec<Rule>) -> Vec<Rule> {
    dedup_by(rules, Rule::key)
}

/// Same as [dedup], but rules differing only in the protocol dimension collapse too.
pub fn dedup_ignore_protocol(rules: Vec<Rule>) -> Vec<Rule> {
    dedup_by(rules, Rule::key_ignore_protocol)
}
