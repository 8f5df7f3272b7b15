use std::{fs, path::Path};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::{debug, info, warn};

use pclass_core::rule::{family::Dimension, Range, Rule};

use crate::{
    basic::parser::{parse_c_uint, parse_field, parse_ipv4_dotted, parse_u32, tokenize},
    error::{IoError, RecordError, RecordErrorKind},
};

/// sip, sip-len, dip, dip-len, 4 port bounds, proto value, proto mask and the label.
pub const MIN_RULE_FIELDS: usize = 11;

/// Which labels a reader keeps.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LabelFilter {
    #[default]
    Any,
    Only(u32),
    Except(u32),
}

impl LabelFilter {
    #[inline]
    pub fn accepts(&self, label: u32) -> bool {
        match self {
            LabelFilter::Any => true,
            LabelFilter::Only(l) => *l == label,
            LabelFilter::Except(l) => *l != label,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Shuffle {
    #[default]
    Keep,
    Random,
    Seeded(u64),
}

impl Shuffle {
    pub fn apply<T>(&self, items: &mut [T]) {
        match *self {
            Shuffle::Keep => {}
            Shuffle::Random => items.shuffle(&mut rand::rng()),
            Shuffle::Seeded(seed) => items.shuffle(&mut StdRng::seed_from_u64(seed)),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub filter: LabelFilter,
    /// Applied to the accepted rules after parsing, priorities are left untouched.
    pub shuffle: Shuffle,
    /// Fail on the first malformed record instead of skipping it.
    pub strict: bool,
}

#[derive(Debug, Default)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
    pub skipped: Vec<RecordError>,
    /// Well-formed rules rejected by [ReadOptions::filter].
    pub filtered: usize,
}

fn ip_field(tokens: &[&str], i: usize) -> Result<(u32, u32), RecordErrorKind> {
    let ip = parse_field(parse_ipv4_dotted, tokens[i])
        .ok_or_else(|| RecordErrorKind::Ipv4(tokens[i].to_owned()))?;
    let len = parse_field(parse_u32, tokens[i + 1])
        .ok_or_else(|| RecordErrorKind::Number(tokens[i + 1].to_owned()))?;
    if len > u32::BITS {
        return Err(RecordErrorKind::PrefixTooLong {
            len,
            width: u32::BITS,
        });
    }
    Ok((ip, len))
}

fn port_field(tokens: &[&str], i: usize) -> Result<(u32, u32), RecordErrorKind> {
    let mut bounds = [0; 2];
    for (b, tok) in bounds.iter_mut().zip(&tokens[i..i + 2]) {
        *b = parse_field(parse_u32, *tok)
            .ok_or_else(|| RecordErrorKind::Number((*tok).to_owned()))?;
        if *b > u16::MAX as u32 {
            return Err(RecordErrorKind::PortOutOfRange(*b));
        }
    }
    let [low, high] = bounds;
    if low > high {
        return Err(RecordErrorKind::InvertedRange { low, high });
    }
    Ok((low, high))
}

fn byte_field(tok: &str) -> Result<u32, RecordErrorKind> {
    match parse_field(parse_c_uint, tok) {
        Some(v) if v <= u8::MAX as u32 => Ok(v),
        _ => Err(RecordErrorKind::Number(tok.to_owned())),
    }
}

fn parse_rule_fields(line: &str, priority: u32) -> Result<Rule, RecordErrorKind> {
    let tokens = tokenize(line.strip_prefix('@').unwrap_or(line));
    if tokens.len() < MIN_RULE_FIELDS {
        return Err(RecordErrorKind::FieldCount {
            expected: MIN_RULE_FIELDS,
            found: tokens.len(),
        });
    }
    let mut rule = Rule {
        priority,
        ..Default::default()
    };

    let (sip, sip_len) = ip_field(&tokens, 0)?;
    rule.set_prefix(Dimension::SrcIp, sip, sip_len);
    let (dip, dip_len) = ip_field(&tokens, 2)?;
    rule.set_prefix(Dimension::DstIp, dip, dip_len);

    let (low, high) = port_field(&tokens, 4)?;
    rule.set_range(Dimension::SrcPort, low, high);
    let (low, high) = port_field(&tokens, 6)?;
    rule.set_range(Dimension::DstPort, low, high);

    // the mask marks the bits that must match, it need not be contiguous
    let value = byte_field(tokens[8])?;
    let mask = byte_field(tokens[9])?;
    let dont_care = u8::MAX as u32 - mask;
    let low = value & mask;
    rule.range[Dimension::Proto.index()] = Range::new(low, low | dont_care);
    rule.prefix_len[Dimension::Proto.index()] = mask.count_ones();

    // decimal, unlike the protocol columns
    let last = tokens[tokens.len() - 1];
    rule.label =
        parse_field(parse_u32, last).ok_or_else(|| RecordErrorKind::Number(last.to_owned()))?;
    Ok(rule)
}

/// Parse one rule line of the form
/// `@sip/len dip/len sport_lo : sport_hi dport_lo : dport_hi proto/mask ... label`.
///
/// `line_no` is only used to locate the error.
pub fn parse_rule(line: &str, line_no: usize, priority: u32) -> Result<Rule, RecordError> {
    parse_rule_fields(line.trim_end(), priority).map_err(|kind| kind.at(line_no))
}

/// Parse a whole rule file. Blank lines are ignored; every other line takes one priority, the
/// first one the highest, whether it is accepted or not.
pub fn parse_rules(content: &str, opts: &ReadOptions) -> Result<RuleSet, RecordError> {
    let total = content.lines().filter(|l| !l.trim().is_empty()).count() as u32;
    let mut set = RuleSet::default();
    let lines = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());
    for (idx, (line_no, line)) in lines.enumerate() {
        let priority = total - idx as u32;
        match parse_rule(line, line_no + 1, priority) {
            Ok(rule) if opts.filter.accepts(rule.label) => set.rules.push(rule),
            Ok(_) => set.filtered += 1,
            Err(e) if opts.strict => return Err(e),
            Err(e) => {
                warn!("skip rule record, {}", e);
                set.skipped.push(e);
            }
        }
    }

    opts.shuffle.apply(&mut set.rules);
    debug!(
        "{} rule lines, {} accepted, {} filtered, {} skipped",
        total,
        set.rules.len(),
        set.filtered,
        set.skipped.len()
    );
    Ok(set)
}

/// Read and parse a rule file, see [parse_rules].
pub fn read_rules(path: impl AsRef<Path>, opts: &ReadOptions) -> Result<RuleSet, IoError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| IoError::FileUnavailable {
        path: path.to_owned(),
        source,
    })?;
    let set = parse_rules(&content, opts)?;
    info!(
        "read {} rules from {} ({} skipped)",
        set.rules.len(),
        path.display(),
        set.skipped.len()
    );
    Ok(set)
}

/// Split rules into the flat list (label 0) and the tree list (any other label), keeping order.
pub fn partition_by_label(rules: Vec<Rule>) -> (Vec<Rule>, Vec<Rule>) {
    rules.into_iter().partition(|r| r.label == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = "@10.0.0.0/8\t192.168.1.0/24\t0 : 65535\t80 : 80\t0x06/0xFF\t0x0000/0x0000\t0\n\
        @10.1.2.3/16\t0.0.0.0/0\t1024 : 65535\t0 : 65535\t0x00/0x00\t0x0000/0x0000\t1\n\
        @0.0.0.0/0\t0.0.0.0/0\t0 : 65535\t0 : 65535\t0x11/0xFF\t0x0000/0x0000\t0\n";

    #[test]
    fn test_priority_assignment() {
        let set = parse_rules(RULES, &ReadOptions::default()).unwrap();
        let priorities: Vec<u32> = set.rules.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![3, 2, 1]);
        assert!(set.skipped.is_empty());
    }

    #[test]
    fn test_parse_rule_fields() {
        let set = parse_rules(RULES, &ReadOptions::default()).unwrap();
        let r = &set.rules[1];
        assert_eq!(r.range[0], Range::new(0x0a01_0000, 0x0a01_ffff));
        assert_eq!(r.prefix_len[0], 16);
        assert_eq!(r.range[1], Range::new(0, u32::MAX));
        assert_eq!(r.range[2], Range::new(1024, 65535));
        assert_eq!(r.prefix_len[2], 0);
        assert_eq!(r.range[4], Range::new(0, 255));
        assert_eq!(r.prefix_len[4], 0);
        assert_eq!(r.label, 1);

        let r = &set.rules[0];
        assert_eq!(r.range[1], Range::new(0xc0a8_0100, 0xc0a8_01ff));
        assert_eq!(r.range[3], Range::new(80, 80));
        assert_eq!(r.range[4], Range::new(6, 6));
        assert_eq!(r.prefix_len[4], 8);
    }

    #[test]
    fn test_rule_with_priority_column() {
        let line = "@1.2.3.4/32 5.6.7.8/32 1 : 1 2 : 2 0x06/0xFF 0x0000/0x0000 77 2";
        let r = parse_rule(line, 1, 9).unwrap();
        assert_eq!(r.priority, 9);
        assert_eq!(r.label, 2);
        assert_eq!(r.range[0], Range::new(0x0102_0304, 0x0102_0304));
    }

    #[test]
    fn test_label_is_decimal() {
        let line = "@1.2.3.4/32 5.6.7.8/32 1 : 1 2 : 2 0x06/0xFF 0x0000/0x0000 010";
        assert_eq!(parse_rule(line, 1, 1).unwrap().label, 10);
        let line = "@1.2.3.4/32 5.6.7.8/32 1 : 1 2 : 2 0x06/0xFF 0x0000/0x0000 0x1";
        assert_eq!(
            parse_rule(line, 3, 1),
            Err(RecordError {
                line: 3,
                kind: RecordErrorKind::Number("0x1".to_owned())
            })
        );
    }

    #[test]
    fn test_malformed_records() {
        let bad = [
            ("@10.0.0.0/8 1.1.1.1/8 0 : 1", RecordErrorKind::FieldCount { expected: 11, found: 6 }),
            (
                "@10.0.0.0/33 0.0.0.0/0 0 : 1 0 : 1 0/0 0/0 0",
                RecordErrorKind::PrefixTooLong { len: 33, width: 32 },
            ),
            (
                "@10.0.0/8 0.0.0.0/0 0 : 1 0 : 1 0/0 0/0 0",
                RecordErrorKind::Ipv4("10.0.0".to_owned()),
            ),
            (
                "@10.0.0.0/8 0.0.0.0/0 0 : 70000 0 : 1 0/0 0/0 0",
                RecordErrorKind::PortOutOfRange(70000),
            ),
            (
                "@10.0.0.0/8 0.0.0.0/0 9 : 1 0 : 1 0/0 0/0 0",
                RecordErrorKind::InvertedRange { low: 9, high: 1 },
            ),
            (
                "@10.0.0.0/8 0.0.0.0/0 0 : 1 0 : 1 0x100/0 0/0 0",
                RecordErrorKind::Number("0x100".to_owned()),
            ),
        ];
        for (line, kind) in bad {
            assert_eq!(parse_rule(line, 4, 1), Err(RecordError { line: 4, kind }));
        }
    }

    #[test]
    fn test_skip_and_strict() {
        let content = format!("{RULES}\n@garbage\n");
        let set = parse_rules(&content, &ReadOptions::default()).unwrap();
        assert_eq!(set.rules.len(), 3);
        assert_eq!(set.rules[0].priority, 4);
        assert_eq!(set.skipped.len(), 1);
        assert_eq!(set.skipped[0].line, 5);

        let strict = ReadOptions {
            strict: true,
            ..Default::default()
        };
        assert_eq!(parse_rules(&content, &strict).unwrap_err().line, 5);
    }

    #[test]
    fn test_label_filter_and_partition() {
        let only = ReadOptions {
            filter: LabelFilter::Only(1),
            ..Default::default()
        };
        let set = parse_rules(RULES, &only).unwrap();
        assert_eq!(set.rules.len(), 1);
        assert_eq!(set.rules[0].priority, 2);
        assert_eq!(set.filtered, 2);

        let except = ReadOptions {
            filter: LabelFilter::Except(1),
            ..Default::default()
        };
        assert_eq!(parse_rules(RULES, &except).unwrap().rules.len(), 2);

        let all = parse_rules(RULES, &ReadOptions::default()).unwrap().rules;
        let (flat, tree) = partition_by_label(all);
        assert_eq!(flat.iter().map(|r| r.priority).collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(tree.iter().map(|r| r.priority).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_seeded_shuffle() {
        let seeded = ReadOptions {
            shuffle: Shuffle::Seeded(7),
            ..Default::default()
        };
        let a = parse_rules(RULES, &seeded).unwrap().rules;
        let b = parse_rules(RULES, &seeded).unwrap().rules;
        assert_eq!(a, b);
        let mut priorities: Vec<u32> = a.iter().map(|r| r.priority).collect();
        priorities.sort();
        assert_eq!(priorities, vec![1, 2, 3]);
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_rules("/nonexistent/pclass.rules", &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::FileUnavailable { .. }));
    }
}
