use crate::errors::{
    IsoenvError,
    Result,
};
use crate::models::envelope::FixedEnvelope;

/// Total probabilities may disagree by at most this relative amount
/// before a distance is considered meaningless.
const NORMALIZATION_TOLERANCE: f64 = 0.001;

impl FixedEnvelope {
    /// First Wasserstein (earth-mover) distance between two envelopes
    /// treated as discrete mass distributions.
    ///
    /// Both envelopes must be pre-normalized to matching totals (within
    /// 0.1%); both are mass-sorted in place as a side effect. Empty
    /// envelopes are at distance 0 from anything with total 0.
    pub fn wasserstein_distance(&mut self, other: &mut FixedEnvelope) -> Result<f64> {
        self.cdf_sweep(other, false)
    }

    /// Signed variant: positive when `other` sits at higher mass than
    /// `self`, negative the other way around.
    pub fn oriented_wasserstein_distance(&mut self, other: &mut FixedEnvelope) -> Result<f64> {
        self.cdf_sweep(other, true)
    }

    fn cdf_sweep(&mut self, other: &mut FixedEnvelope, signed: bool) -> Result<f64> {
        let left_total = self.total_prob();
        let right_total = other.total_prob();
        if (left_total - right_total).abs()
            > NORMALIZATION_TOLERANCE * left_total.abs().max(right_total.abs())
        {
            return Err(IsoenvError::NotNormalized {
                left: left_total,
                right: right_total,
            });
        }
        if self.is_empty() || other.is_empty() {
            // totals agree, so the non-empty side carries no mass either
            return Ok(0.0);
        }

        self.sort_by_mass();
        other.sort_by_mass();

        // area between the two CDFs, swept over the merged mass axis
        let (am, ap) = (self.masses(), self.probs());
        let (bm, bp) = (other.masses(), other.probs());
        let mut i = 0;
        let mut j = 0;
        let mut cdf_gap = 0.0_f64;
        let mut distance = 0.0_f64;
        let mut last_mass: Option<f64> = None;

        while i < am.len() || j < bm.len() {
            let take_left = j >= bm.len() || (i < am.len() && am[i] <= bm[j]);
            let mass = if take_left { am[i] } else { bm[j] };
            if let Some(last) = last_mass {
                let segment = if signed { cdf_gap } else { cdf_gap.abs() };
                distance += segment * (mass - last);
            }
            if take_left {
                cdf_gap += ap[i];
                i += 1;
            } else {
                cdf_gap -= bp[j];
                j += 1;
            }
            last_mass = Some(mass);
        }
        Ok(distance)
    }
}
