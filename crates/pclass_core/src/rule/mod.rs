//! # Rule
//!
//! ## Relations of important structs
//! ```text
//!   text line --parse--> Rule --project--> RuleKey / RuleKeyNoProto
//!                         |
//!                         v
//!          Range x 5 (sip, dip, sport, dport, proto)
//!                         ^
//!                         |
//!                  Trace (one value per dimension)
//! ```
//!
//! ## Example
//! ```no_run
//! use pclass_core::rule::{family::Dimension, Rule, Trace};
//!
//! let mut rule = Rule::wildcard(7);
//! rule.set_prefix(Dimension::SrcIp, 0x0a01_0203, 8);
//! rule.set_range(Dimension::DstPort, 80, 88);
//!
//! let trace = Trace::from([0x0a00_0001, 1, 1000, 80, 6]);
//! assert!(rule.matches(&trace));
//! assert_eq!(rule.range[0].low, 0x0a00_0000);
//! ```
pub mod family;

use std::{
    fmt::{Display, Formatter},
    net::Ipv4Addr,
};

use funty::Unsigned;

use family::{constant::DIM_NUM, Dimension};

/// Clamp `value` to the start of its `prefix_len`-bit block and return the block as
/// `(low, high)`. Any low-order bits set in `value` are masked off.
pub fn normalize_prefix<U: Unsigned>(value: U, prefix_len: u32) -> (U, U) {
    let mask = U::MAX.checked_shr(prefix_len).unwrap_or(U::ZERO);
    let low = value & !mask;
    (low, low | mask)
}

/// Closed interval `[low, high]` of one dimension.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Range {
    pub low: u32,
    pub high: u32,
}

impl Range {
    #[inline]
    pub fn new(low: u32, high: u32) -> Self {
        debug_assert!(low <= high, "{low} > {high}");
        Range { low, high }
    }

    #[inline]
    pub fn contains(&self, value: u32) -> bool {
        self.low <= value && value <= self.high
    }

    #[inline]
    pub fn is_single(&self) -> bool {
        self.low == self.high
    }

    /// Number of leading bits shared by every value of the range, i.e. the length of the
    /// shortest prefix block (in a `width`-bit space) that covers it.
    #[inline]
    pub fn covering_len(&self, width: u32) -> u32 {
        let diff = self.low ^ self.high;
        let len = diff.leading_zeros().saturating_sub(u32::BITS - width);
        len.min(width)
    }

    /// Whether the range is exactly the block sharing the top `prefix_len` bits of `low`.
    pub fn is_prefix_of_len(&self, prefix_len: u32, width: u32) -> bool {
        if prefix_len > width {
            return false;
        }
        let (low, high) = normalize_prefix(self.low << (u32::BITS - width), prefix_len);
        let shift = u32::BITS - width;
        low >> shift == self.low && (high >> shift) == self.high
    }
}

/// A classification rule: one range per dimension plus metadata.
///
/// For sip, dip and proto the ranges are always prefix aligned. For sport and dport the ranges
/// are arbitrary until the rule is expanded by [expand](crate::expand::expand), and their
/// `prefix_len` stays 0 before that.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rule {
    pub range: [Range; DIM_NUM],
    pub prefix_len: [u32; DIM_NUM],
    /// Larger is better, 0 means "no match".
    pub priority: u32,
    pub label: u32,
}

/// Projection of a [Rule] used as deduplication key: ranges and prefix lengths only.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RuleKey {
    pub range: [Range; DIM_NUM],
    pub prefix_len: [u32; DIM_NUM],
}

/// Same as [RuleKey] without the protocol dimension.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RuleKeyNoProto {
    pub range: [Range; DIM_NUM - 1],
    pub prefix_len: [u32; DIM_NUM - 1],
}

impl Rule {
    /// A rule matching every packet.
    pub fn wildcard(priority: u32) -> Self {
        let mut rule = Rule {
            priority,
            ..Default::default()
        };
        for d in Dimension::ALL {
            rule.range[d.index()] = Range::new(0, d.max_value());
        }
        rule
    }

    /// Set dimension `dim` to the block of `value/prefix_len`, normalizing `value`.
    pub fn set_prefix(&mut self, dim: Dimension, value: u32, prefix_len: u32) {
        let width = dim.width();
        debug_assert!(prefix_len <= width);
        let shift = u32::BITS - width;
        let (low, high) = normalize_prefix(value << shift, prefix_len);
        self.range[dim.index()] = Range::new(low >> shift, high >> shift);
        self.prefix_len[dim.index()] = prefix_len;
    }

    /// Set dimension `dim` to an arbitrary range; its prefix length is reset to 0.
    pub fn set_range(&mut self, dim: Dimension, low: u32, high: u32) {
        self.range[dim.index()] = Range::new(low, high);
        self.prefix_len[dim.index()] = 0;
    }

    #[inline]
    pub fn matches(&self, trace: &Trace) -> bool {
        self.range
            .iter()
            .zip(trace.key.iter())
            .all(|(r, v)| r.contains(*v))
    }

    #[inline]
    pub fn key(&self) -> RuleKey {
        RuleKey {
            range: self.range,
            prefix_len: self.prefix_len,
        }
    }

    #[inline]
    pub fn key_ignore_protocol(&self) -> RuleKeyNoProto {
        let mut range = [Range::default(); DIM_NUM - 1];
        let mut prefix_len = [0; DIM_NUM - 1];
        range.copy_from_slice(&self.range[..DIM_NUM - 1]);
        prefix_len.copy_from_slice(&self.prefix_len[..DIM_NUM - 1]);
        RuleKeyNoProto { range, prefix_len }
    }

    /// A trace sitting at the low corner of every range, which the rule always matches.
    pub fn low_corner(&self) -> Trace {
        let mut key = [0; DIM_NUM];
        for (k, r) in key.iter_mut().zip(self.range.iter()) {
            *k = r.low;
        }
        Trace { key, label: 0 }
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rule {{ sip: {}/{}, dip: {}/{}, sport: {}:{}, dport: {}:{}, proto: {}:{}, priority: {} }}",
            Ipv4Addr::from(self.range[0].low),
            self.prefix_len[0],
            Ipv4Addr::from(self.range[1].low),
            self.prefix_len[1],
            self.range[2].low,
            self.range[2].high,
            self.range[3].low,
            self.range[3].high,
            self.range[4].low,
            self.range[4].high,
            self.priority
        )
    }
}

/// A concrete packet header instance. `label` is the auxiliary column of a trace file and never
/// takes part in matching.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Trace {
    pub key: [u32; DIM_NUM],
    pub label: u32,
}

impl Trace {
    #[inline]
    pub fn get(&self, dim: Dimension) -> u32 {
        self.key[dim.index()]
    }

    #[inline]
    pub fn same_key(&self, other: &Trace) -> bool {
        self.key == other.key
    }
}

impl From<[u32; DIM_NUM]> for Trace {
    #[inline]
    fn from(key: [u32; DIM_NUM]) -> Self {
        Trace { key, label: 0 }
    }
}
