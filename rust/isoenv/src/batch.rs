//! Data-parallel envelope computation.
//!
//! Envelopes for different formulas share no state, so a batch is a plain
//! rayon map: one generator per item, each drained on whatever worker
//! picks it up. The first error aborts the collection.

use rayon::prelude::*;
use tracing::info;

use crate::errors::Result;
use crate::models::envelope::{
    CoverageConfig,
    FixedEnvelope,
    ThresholdConfig,
};
use crate::models::iso::Iso;

/// Threshold envelopes for a batch of formula strings.
pub fn threshold_envelopes<S: AsRef<str> + Sync>(
    formulas: &[S],
    config: &ThresholdConfig,
) -> Result<Vec<FixedEnvelope>> {
    info!(count = formulas.len(), "computing threshold envelopes");
    formulas
        .par_iter()
        .map(|formula| {
            let iso = Iso::from_formula(formula.as_ref())?;
            FixedEnvelope::from_threshold(iso, config)
        })
        .collect()
}

/// Coverage envelopes for a batch of formula strings.
pub fn coverage_envelopes<S: AsRef<str> + Sync>(
    formulas: &[S],
    config: &CoverageConfig,
) -> Result<Vec<FixedEnvelope>> {
    info!(count = formulas.len(), "computing coverage envelopes");
    formulas
        .par_iter()
        .map(|formula| {
            let iso = Iso::from_formula(formula.as_ref())?;
            FixedEnvelope::from_coverage(iso, config)
        })
        .collect()
}
