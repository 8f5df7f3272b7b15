//! Reference answers: run traces through a lookup engine and record the matched priorities.
use std::{fmt::Display, str::FromStr};

use tracing::{debug, info};

use crate::{
    engine::{Classifier, EngineConfig, LookupEngine},
    error::ConfigError,
    rule::{Rule, Trace},
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AnswerMode {
    /// Produce no answers at all.
    Skip,
    #[default]
    Full,
    /// Delete every fourth rule (the 1st, 5th, 9th, ...) from the engine before answering.
    DeleteQuarter,
}

impl FromStr for AnswerMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" | "0" => Ok(AnswerMode::Skip),
            "full" | "1" => Ok(AnswerMode::Full),
            "delete-quarter" | "2" => Ok(AnswerMode::DeleteQuarter),
            _ => Err(ConfigError::UnknownAnswerMode(s.to_owned())),
        }
    }
}

impl Display for AnswerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerMode::Skip => f.write_str("skip"),
            AnswerMode::Full => f.write_str("full"),
            AnswerMode::DeleteQuarter => f.write_str("delete-quarter"),
        }
    }
}

/// One trace per rule, at the low corner of every range.
pub fn generate_traces(rules: &[Rule]) -> Vec<Trace> {
    rules.iter().map(Rule::low_corner).collect()
}

/// Answer every trace with `engine`. A trace equal to its predecessor reuses the previous answer.
pub fn answer_traces<E: LookupEngine>(engine: &E, traces: &[Trace]) -> Vec<u32> {
    let mut answers: Vec<u32> = Vec::with_capacity(traces.len());
    let mut prev: Option<&Trace> = None;
    for t in traces {
        let priority = match (prev, answers.last()) {
            (Some(p), Some(&a)) if p.same_key(t) => a,
            _ => engine.lookup(t),
        };
        answers.push(priority);
        prev = Some(t);
    }
    answers
}

/// Build an engine over a copy of `rules` and answer `traces` according to `mode`.
pub fn generate_answers(
    rules: &[Rule],
    traces: &[Trace],
    config: &EngineConfig,
    mode: AnswerMode,
) -> Vec<u32> {
    if mode == AnswerMode::Skip {
        return vec![];
    }
    let mut engine = Classifier::build(rules.to_vec(), config);
    if mode == AnswerMode::DeleteQuarter {
        let deleted = rules
            .iter()
            .step_by(4)
            .filter(|r| engine.delete_rule(r))
            .count();
        debug!("deleted {} rules before answering", deleted);
    }
    let answers = answer_traces(&engine, traces);
    engine.teardown(true);

    let hits = answers.iter().filter(|a| **a != 0).count();
    info!(
        "answered {} traces with the {} engine, {} hits ({:.2})",
        answers.len(),
        config.kind,
        hits,
        if answers.is_empty() {
            0.0
        } else {
            hits as f64 / answers.len() as f64
        }
    );
    answers
}

/// Keep the rules that are the best match of their own low-corner trace, i.e. rules that are not
/// shadowed at that point by a higher priority rule.
pub fn one_match_rules(rules: Vec<Rule>, config: &EngineConfig) -> Vec<Rule> {
    let traces = generate_traces(&rules);
    let answers = generate_answers(&rules, &traces, config, AnswerMode::Full);
    let before = rules.len();
    let kept: Vec<Rule> = rules
        .into_iter()
        .zip(answers)
        .filter_map(|(r, a)| (a == r.priority).then_some(r))
        .collect();
    debug!("one-match filter kept {} of {} rules", kept.len(), before);
    kept
}
