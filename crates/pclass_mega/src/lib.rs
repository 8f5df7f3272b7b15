//! This module provides MegaFlow synthesis: from a rule set and the traffic actually observed,
//! build a compact set of longest-prefix rules that reproduces the per-dimension match decisions
//! of the rule set for that traffic.
mod check;
mod error;
mod synth;
mod tse;

use fxhash::FxBuildHasher;
use indexmap::IndexSet;
use tracing::debug;

use pclass_core::rule::{Rule, Trace};

pub use crate::{
    check::{check_containment, contains, Containment},
    error::MegaError,
    synth::{megaflow_rules, MegaFlowReport, MegaFlowSynthesizer},
    tse::tse_megaflow_rules,
};

/// FlowSynthesizer turns a single trace into a candidate rule. Candidates of a trace stream are
/// collapsed by structural equality.
pub trait FlowSynthesizer {
    // Required methods
    fn clear(&mut self);

    fn candidate(&self, trace: &Trace) -> Result<Rule, MegaError>;

    // Provided methods

    /// Distinct candidates of `traces`, in order of first appearance.
    fn synthesize<'t>(
        &self,
        traces: impl IntoIterator<Item = &'t Trace>,
    ) -> Result<Vec<Rule>, MegaError> {
        let mut seen = IndexSet::<Rule, FxBuildHasher>::default();
        let mut n = 0usize;
        for t in traces {
            seen.insert(self.candidate(t)?);
            n += 1;
        }
        debug!("{} traces synthesize {} distinct rules", n, seen.len());
        Ok(seen.into_iter().collect())
    }
}

#[allow(missing_docs)]
pub mod prelude {
    #[doc(hidden)]
    pub use crate::{
        check_containment, megaflow_rules, tse_megaflow_rules, FlowSynthesizer, MegaError,
        MegaFlowReport, MegaFlowSynthesizer,
    };
}
