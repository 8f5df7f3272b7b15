use std::collections::HashMap;

use fxhash::{FxBuildHasher, FxHashMap};
use tracing::debug;

use crate::{
    engine::{EngineConfig, LookupEngine},
    rule::{family::Dimension, Rule, Trace},
};

/// Bucket key: the masked value of every configured dimension.
type TupleKey = Vec<u32>;

#[inline]
fn mask_to(value: u32, len: u32, width: u32) -> u32 {
    if len == 0 {
        0
    } else {
        value >> (width - len) << (width - len)
    }
}

/// All rules sharing the same prefix lengths over the configured dimensions.
struct Tuple {
    lens: Vec<u32>,
    buckets: FxHashMap<TupleKey, Vec<usize>>,
    // upper bound, deletions do not lower it
    max_priority: u32,
}

impl Tuple {
    #[inline]
    fn key_of(&self, dims: &[Dimension], values: impl Iterator<Item = u32>) -> TupleKey {
        dims.iter()
            .zip(self.lens.iter())
            .zip(values)
            .map(|((d, len), v)| mask_to(v, *len, d.width()))
            .collect()
    }
}

/// Tuple space search: rules are grouped by the prefix lengths they use on
/// [EngineConfig::prefix_dims], each group is an exact-match hash table on the masked values.
///
/// A rule dimension that is not prefix aligned (an unexpanded port range) is filed under the
/// shortest prefix covering it, and every bucket hit is verified against the full rule, so any
/// dimension may be configured.
pub struct TupleSpaceEngine {
    rules: Vec<Rule>,
    alive: Vec<bool>,
    n_alive: usize,
    dims: Vec<Dimension>,
    // probed in descending max_priority order
    tuples: Vec<Tuple>,
}

impl TupleSpaceEngine {
    pub fn tuple_count(&self) -> usize {
        self.tuples.len()
    }

    fn lens_of(&self, rule: &Rule) -> Vec<u32> {
        self.dims
            .iter()
            .map(|d| rule.range[d.index()].covering_len(d.width()))
            .collect()
    }

    fn locate(&self, rule: &Rule) -> Option<(usize, TupleKey)> {
        let lens = self.lens_of(rule);
        let t = self.tuples.iter().position(|t| t.lens == lens)?;
        let key = self.tuples[t].key_of(
            &self.dims,
            self.dims.iter().map(|d| rule.range[d.index()].low),
        );
        Some((t, key))
    }
}

impl LookupEngine for TupleSpaceEngine {
    fn build(rules: Vec<Rule>, config: &EngineConfig) -> Self {
        let n = rules.len();
        let mut engine = TupleSpaceEngine {
            rules,
            alive: vec![true; n],
            n_alive: n,
            dims: config.prefix_dims.clone(),
            tuples: vec![],
        };
        let mut index: HashMap<Vec<u32>, usize, FxBuildHasher> = HashMap::default();
        for (i, rule) in engine.rules.iter().enumerate() {
            let lens = engine.lens_of(rule);
            let t = *index.entry(lens.clone()).or_insert_with(|| {
                engine.tuples.push(Tuple {
                    lens,
                    buckets: FxHashMap::default(),
                    max_priority: 0,
                });
                engine.tuples.len() - 1
            });
            let tuple = &mut engine.tuples[t];
            let key = tuple.key_of(
                &engine.dims,
                engine.dims.iter().map(|d| rule.range[d.index()].low),
            );
            tuple.buckets.entry(key).or_default().push(i);
            tuple.max_priority = tuple.max_priority.max(rule.priority);
        }
        engine
            .tuples
            .sort_by(|a, b| b.max_priority.cmp(&a.max_priority));
        debug!(
            "tuple space engine: {} rules in {} tuples over {:?}",
            n,
            engine.tuples.len(),
            engine.dims
        );
        engine
    }

    fn lookup(&self, trace: &Trace) -> u32 {
        let mut best = 0;
        for tuple in self.tuples.iter() {
            if tuple.max_priority <= best {
                break;
            }
            let key = tuple.key_of(&self.dims, self.dims.iter().map(|d| trace.get(*d)));
            if let Some(bucket) = tuple.buckets.get(&key) {
                for &i in bucket {
                    let r = &self.rules[i];
                    if r.priority > best && r.matches(trace) {
                        best = r.priority;
                    }
                }
            }
        }
        best
    }

    fn delete_rule(&mut self, rule: &Rule) -> bool {
        let Some((t, key)) = self.locate(rule) else {
            return false;
        };
        let Some(bucket) = self.tuples[t].buckets.get_mut(&key) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|&i| self.rules[i] == *rule) else {
            return false;
        };
        let i = bucket.remove(pos);
        if bucket.is_empty() {
            self.tuples[t].buckets.remove(&key);
        }
        self.alive[i] = false;
        self.n_alive -= 1;
        true
    }

    fn teardown(self, release_rules: bool) -> Option<Vec<Rule>> {
        if release_rules {
            return None;
        }
        let TupleSpaceEngine { rules, alive, .. } = self;
        Some(
            rules
                .into_iter()
                .zip(alive)
                .filter_map(|(r, a)| a.then_some(r))
                .collect(),
        )
    }

    #[inline]
    fn len(&self) -> usize {
        self.n_alive
    }
}
