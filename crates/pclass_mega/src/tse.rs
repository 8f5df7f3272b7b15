use pclass_core::rule::{family::Dimension, Rule};
use pclass_io::Shuffle;

use crate::synth::MEGA_DIMS;

/// Every MegaFlow prefix-length combination, `sip/32 dip/32 sport/16 dport/16` first and
/// `sip/1 dip/1 sport/1 dport/1` last, before `shuffle`. Each field holds the lowest bit its
/// prefix keeps, so no two rules share a tuple and the set stresses a tuple space search.
pub fn tse_megaflow_rules(shuffle: Shuffle) -> Vec<Rule> {
    let lens = |d: Dimension| (1..=d.width()).rev();
    let mut rules = Vec::with_capacity(MEGA_DIMS.iter().map(|d| d.width() as usize).product());
    for sip in lens(Dimension::SrcIp) {
        for dip in lens(Dimension::DstIp) {
            for sport in lens(Dimension::SrcPort) {
                for dport in lens(Dimension::DstPort) {
                    let mut rule = Rule::default();
                    for (d, len) in MEGA_DIMS.into_iter().zip([sip, dip, sport, dport]) {
                        rule.set_prefix(d, 1 << (d.width() - len), len);
                    }
                    rules.push(rule);
                }
            }
        }
    }
    shuffle.apply(&mut rules);
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use pclass_core::rule::Range;
    use pclass_io::{MegaFlowFormat, RuleFormat};

    #[test]
    fn test_tse_rules_in_order() {
        let rules = tse_megaflow_rules(Shuffle::Keep);
        assert_eq!(rules.len(), 32 * 32 * 16 * 16);

        let first = rules[0];
        assert_eq!(first.prefix_len[..4], [32, 32, 16, 16]);
        assert_eq!(first.range[0], Range::new(1, 1));
        assert_eq!(first.range[3], Range::new(1, 1));

        let last = rules[rules.len() - 1];
        assert_eq!(last.prefix_len[..4], [1, 1, 1, 1]);
        assert_eq!(last.range[1], Range::new(0x8000_0000, u32::MAX));
        assert_eq!(last.range[2], Range::new(0x8000, 0xffff));

        // dport varies fastest
        assert_eq!(rules[1].prefix_len[..4], [32, 32, 16, 15]);
        assert_eq!(rules[16].prefix_len[..4], [32, 32, 15, 16]);

        let mut buf = vec![];
        MegaFlowFormat
            .write_rules(&mut buf, &[first, last], false)
            .unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "@0.0.0.1/32\t0.0.0.1/32\t0x0001/16\t0x0001/16\t\n\
             @128.0.0.0/1\t128.0.0.0/1\t0x8000/1\t0x8000/1\t\n"
        );
    }

    #[test]
    fn test_tse_rules_shuffled() {
        let ordered = tse_megaflow_rules(Shuffle::Keep);
        let shuffled = tse_megaflow_rules(Shuffle::Seeded(3));
        assert_eq!(shuffled, tse_megaflow_rules(Shuffle::Seeded(3)));
        assert_ne!(shuffled, ordered);

        let mut sorted = shuffled;
        sorted.sort_by_key(|r| std::cmp::Reverse(r.prefix_len));
        assert_eq!(sorted, ordered);
    }
}
