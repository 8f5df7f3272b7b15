use tracing::warn;

use pclass_core::rule::Rule;

/// `outer` properly contains `inner`, both being indices into the checked rule set.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Containment {
    pub outer: usize,
    pub inner: usize,
}

/// Whether every ip and port prefix of `outer` is a bit-prefix of the matching one of `inner`.
/// A rule contains itself.
pub fn contains(outer: &Rule, inner: &Rule) -> bool {
    (0..4).all(|d| {
        let (o, i) = (outer.range[d], inner.range[d]);
        outer.prefix_len[d] <= inner.prefix_len[d] && o.contains(i.low) && o.contains(i.high)
    })
}

/// Check every ordered pair of distinct MegaFlow rules for proper containment. Each finding is
/// logged as a warning and returned; a containment means the set is not minimal, it is not an
/// error.
pub fn check_containment(rules: &[Rule]) -> Vec<Containment> {
    let mut found = vec![];
    for (i, outer) in rules.iter().enumerate() {
        for (j, inner) in rules.iter().enumerate() {
            if i == j || outer.key() == inner.key() || !contains(outer, inner) {
                continue;
            }
            warn!("megaflow rule {} contains rule {}: {} > {}", i, j, outer, inner);
            found.push(Containment { outer: i, inner: j });
        }
    }
    found
}
