use std::path::Path;

use tracing::{debug, info};

use pclass_core::rule::{family::Dimension, Rule, Trace};
use pclass_io::{save_rules, MegaFlowFormat};
use pclass_trie::PrefixTrie;

use crate::{
    check::{check_containment, Containment},
    error::MegaError,
    FlowSynthesizer,
};

/// Dimensions a MegaFlow rule is built from. The protocol is never part of it.
pub(crate) const MEGA_DIMS: [Dimension; 4] = [
    Dimension::SrcIp,
    Dimension::DstIp,
    Dimension::SrcPort,
    Dimension::DstPort,
];

/// One prefix trie per [MEGA_DIMS] dimension, filled from the whole rule set.
///
/// Rules are expected to be expanded first: an unexpanded port range has prefix length 0 and
/// only registers a wildcard in its port trie.
pub struct MegaFlowSynthesizer {
    tries: [PrefixTrie; 4],
}

impl MegaFlowSynthesizer {
    pub fn new(rules: &[Rule]) -> Result<Self, MegaError> {
        let mut tries = MEGA_DIMS.map(|d| PrefixTrie::new(d.width()));
        for rule in rules {
            for (trie, d) in tries.iter_mut().zip(MEGA_DIMS) {
                let i = d.index();
                trie.insert(rule.range[i].low, rule.prefix_len[i], rule.priority)?;
            }
        }
        debug!(
            "megaflow tries over {} rules: {:?} nodes",
            rules.len(),
            tries.each_ref().map(PrefixTrie::node_count)
        );
        Ok(MegaFlowSynthesizer { tries })
    }
}

impl FlowSynthesizer for MegaFlowSynthesizer {
    fn clear(&mut self) {
        for trie in self.tries.iter_mut() {
            trie.clear();
        }
    }

    /// Every dimension masked to its longest matching prefix; the protocol is left at its
    /// default and the priority at 0.
    fn candidate(&self, trace: &Trace) -> Result<Rule, MegaError> {
        let mut rule = Rule::default();
        for (trie, d) in self.tries.iter().zip(MEGA_DIMS) {
            let key = trace.get(d);
            let len = trie.lookup(key, trie.width())?;
            rule.set_prefix(d, key, len);
        }
        Ok(rule)
    }
}

/// The synthesized rule set together with the containment violations found in it.
#[derive(Debug, Default)]
pub struct MegaFlowReport {
    pub rules: Vec<Rule>,
    pub containments: Vec<Containment>,
}

impl MegaFlowReport {
    pub fn save(&self, path: impl AsRef<Path>, with_priority: bool) -> Result<(), MegaError> {
        save_rules(path, &self.rules, &MegaFlowFormat, with_priority)?;
        Ok(())
    }
}

/// Full MegaFlow pipeline: build the tries from `rules`, synthesize one candidate per trace,
/// deduplicate, then run the containment check. Containment is reported, never fatal.
pub fn megaflow_rules(rules: &[Rule], traces: &[Trace]) -> Result<MegaFlowReport, MegaError> {
    let synthesizer = MegaFlowSynthesizer::new(rules)?;
    let mega = synthesizer.synthesize(traces)?;
    let containments = check_containment(&mega);
    info!(
        "{} rules and {} traces give {} megaflow rules, {} containments",
        rules.len(),
        traces.len(),
        mega.len(),
        containments.len()
    );
    Ok(MegaFlowReport {
        rules: mega,
        containments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pclass_core::{expand::expand_all, rule::Range};
    use pclass_trie::TrieError;

    #[test]
    fn test_single_rule_end_to_end() {
        let mut rule = Rule::wildcard(1);
        rule.set_prefix(Dimension::SrcIp, 0x0a00_0000, 8);
        let rules = expand_all(vec![rule]);
        let traces = [Trace::from([0x0a01_0203, 0x0808_0808, 1234, 80, 6])];
        let report = megaflow_rules(&rules, &traces).unwrap();
        assert_eq!(report.rules.len(), 1);
        let mega = report.rules[0];
        assert_eq!(mega.range[0], Range::new(0x0a00_0000, 0x0aff_ffff));
        assert_eq!(mega.prefix_len[0], 8);
        assert_eq!(mega.prefix_len[1], 0);
        assert_eq!(mega.range[2], Range::new(0, 0xffff));
        assert!(report.containments.is_empty());
    }

    #[test]
    fn test_dedup_candidates() {
        let mut a = Rule::wildcard(3);
        a.set_prefix(Dimension::SrcIp, 0x0a00_0000, 8);
        a.set_prefix(Dimension::DstPort, 80, 16);
        let mut b = Rule::wildcard(2);
        b.set_prefix(Dimension::SrcIp, 0x0a01_0000, 16);
        let rules = expand_all(vec![a, b, Rule::wildcard(1)]);
        let synthesizer = MegaFlowSynthesizer::new(&rules).unwrap();
        let traces = [
            Trace::from([0x0a01_0203, 1, 2, 80, 6]),
            Trace::from([0x0a01_0909, 3, 4, 80, 17]),
            Trace::from([0x0a02_0203, 1, 2, 80, 6]),
            Trace::from([0x0b00_0000, 1, 2, 443, 6]),
            Trace::from([0x0a01_0203, 1, 2, 80, 6]),
        ];
        let mega = synthesizer.synthesize(&traces).unwrap();
        let lens: Vec<[u32; 2]> = mega
            .iter()
            .map(|r| [r.prefix_len[0], r.prefix_len[3]])
            .collect();
        assert_eq!(lens, vec![[16, 16], [8, 16], [0, 0]]);
        assert_eq!(mega[0].range[0].low, 0x0a01_0000);
        assert_eq!(mega[2].range[0], Range::new(0, u32::MAX));

        // 10.1/16 sits inside 10/8 and 0/0 on every dimension
        let containments = check_containment(&mega);
        assert!(containments.contains(&Containment { outer: 1, inner: 0 }));
        assert!(containments.contains(&Containment { outer: 2, inner: 0 }));
        assert!(!containments.contains(&Containment { outer: 0, inner: 1 }));
    }

    #[test]
    fn test_clear() {
        let mut rule = Rule::wildcard(1);
        rule.set_prefix(Dimension::DstIp, 0xc0a8_0000, 16);
        let mut synthesizer = MegaFlowSynthesizer::new(&[rule]).unwrap();
        let trace = Trace::from([1, 0xc0a8_0101, 2, 3, 4]);
        assert_eq!(synthesizer.candidate(&trace).unwrap().prefix_len[1], 16);
        synthesizer.clear();
        assert_eq!(synthesizer.candidate(&trace).unwrap().prefix_len[1], 0);
    }

    #[test]
    fn test_malformed_rule() {
        let mut rule = Rule::wildcard(1);
        rule.prefix_len[Dimension::SrcPort.index()] = 20;
        assert!(matches!(
            MegaFlowSynthesizer::new(&[rule]),
            Err(MegaError::Trie(TrieError::PrefixTooLong { len: 20, width: 16 }))
        ));
    }
}
