//! Rule expansion: rewrite arbitrary port ranges into prefix-aligned rules.
use tracing::debug;

use crate::{
    prefix::decompose,
    rule::{family::Dimension, Range, Rule},
};

/// Expand `rule` into one rule per (source port block x destination port block). Every other
/// field, priority and label included, is copied unchanged.
pub fn expand(rule: &Rule) -> Vec<Rule> {
    let sport = Dimension::SrcPort.index();
    let dport = Dimension::DstPort.index();
    let src_blocks = decompose(rule.range[sport].low, rule.range[sport].high);
    let dst_blocks = decompose(rule.range[dport].low, rule.range[dport].high);
    let mut expanded = Vec::with_capacity(src_blocks.len() * dst_blocks.len());
    for s in src_blocks.iter() {
        for d in dst_blocks.iter() {
            let mut r = *rule;
            r.range[sport] = Range::new(s.low, s.high);
            r.prefix_len[sport] = s.prefix_len;
            r.range[dport] = Range::new(d.low, d.high);
            r.prefix_len[dport] = d.prefix_len;
            expanded.push(r);
        }
    }
    expanded
}

/// Expand every rule, consuming the input collection.
pub fn expand_all(rules: Vec<Rule>) -> Vec<Rule> {
    let expanded = expand_all_ref(&rules);
    drop(rules);
    expanded
}

/// Expand every rule, leaving the input collection to the caller.
pub fn expand_all_ref(rules: &[Rule]) -> Vec<Rule> {
    let expanded: Vec<Rule> = rules.iter().flat_map(expand).collect();
    debug!("expanded {} rules into {}", rules.len(), expanded.len());
    expanded
}
