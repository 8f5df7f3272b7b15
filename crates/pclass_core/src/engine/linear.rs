use crate::{
    engine::{EngineConfig, LookupEngine},
    rule::{Rule, Trace},
};

/// Linear scan over the rules sorted by descending priority. The first hit is the answer.
pub struct LinearEngine {
    rules: Vec<Rule>,
}

impl LookupEngine for LinearEngine {
    fn build(mut rules: Vec<Rule>, _config: &EngineConfig) -> Self {
        // stable sort, so among equal priorities the later rule is probed first
        rules.reverse();
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        LinearEngine { rules }
    }

    #[inline]
    fn lookup(&self, trace: &Trace) -> u32 {
        self.rules
            .iter()
            .find(|r| r.matches(trace))
            .map_or(0, |r| r.priority)
    }

    fn delete_rule(&mut self, rule: &Rule) -> bool {
        match self.rules.iter().position(|r| r == rule) {
            Some(idx) => {
                self.rules.remove(idx);
                true
            }
            None => false,
        }
    }

    fn teardown(self, release_rules: bool) -> Option<Vec<Rule>> {
        if release_rules {
            None
        } else {
            Some(self.rules)
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.rules.len()
    }
}
