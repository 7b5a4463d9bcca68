//! Threshold-pruned whole-molecule enumeration.
//!
//! # The counter machine
//!
//! Each dimension (element) owns a [`PrecalculatedMarginal`] sorted by
//! descending log-prob, and a counter indexing into it. The machine walks
//! the cross product like an odometer with dimension 0 least significant,
//! but prunes carries: `partial_lprobs[i]` caches the log-prob sum of
//! dimensions `i..`, and a carry into dimension `i` is only worth taking
//! when that partial sum plus the best possible contribution of the
//! dimensions below (`lcfmsv[i]`, precomputed) can still reach the
//! cutoff. Because every marginal is sorted, a failed check at one index
//! rules out the rest of that dimension, and an accepted carry with all
//! lower counters reset to their mode entries is guaranteed to be above
//! the cutoff.
//!
//! Dimensions are optionally reordered by decreasing marginal size before
//! the walk starts; the permutation changes only the iteration schedule,
//! never the emitted set, and is undone when signatures are written.

use std::cmp::Reverse;

use crate::models::iso::Iso;
use crate::models::marginal::PrecalculatedMarginal;
use crate::traits::PeakGenerator;

/// Relative margin subtracted from probability cutoffs so that float
/// noise in summed log-probs cannot drop configurations sitting exactly
/// on the threshold.
pub(crate) const CUTOFF_SAFETY: f64 = 1e-9;

pub struct ThresholdGenerator {
    dim: usize,
    lcutoff: f64,
    marginals: Vec<PrecalculatedMarginal>,
    /// machine position -> original dimension
    marginal_order: Vec<usize>,
    /// original dimension -> offset into the flattened signature
    signature_offsets: Vec<usize>,
    signature_len: usize,
    counters: Vec<usize>,
    partial_lprobs: Vec<f64>,
    partial_masses: Vec<f64>,
    partial_probs: Vec<f64>,
    /// lcutoff minus the summed mode lprobs of all lower dimensions
    lcfmsv: Vec<f64>,
    fresh: bool,
    exhausted: bool,
}

impl ThresholdGenerator {
    /// `threshold <= 0` accepts every configuration. With `absolute`
    /// unset the threshold is taken relative to the mode probability.
    pub fn new(iso: Iso, threshold: f64, absolute: bool, reorder_marginals: bool) -> Self {
        let signature_offsets = signature_offsets(iso.isotope_numbers());
        let signature_len = iso.conf_signature_len();
        let (_isotope_numbers, marginals, mode_lprob) = iso.into_marginals();
        let dim = marginals.len();

        let lcutoff = if threshold <= 0.0 {
            // lowest finite value rather than -inf: keeps the pruning
            // arithmetic free of NaNs
            f64::MIN
        } else {
            let safe = threshold * (1.0 - CUTOFF_SAFETY);
            if absolute {
                safe.ln()
            } else {
                safe.ln() + mode_lprob
            }
        };

        let precalculated: Vec<PrecalculatedMarginal> = marginals
            .into_iter()
            .map(|m| {
                let local_cutoff = lcutoff - mode_lprob + m.mode_lprob();
                PrecalculatedMarginal::new(m, local_cutoff, true)
            })
            .collect();

        let mut marginal_order: Vec<usize> = (0..dim).collect();
        if reorder_marginals {
            marginal_order.sort_by_key(|&i| Reverse(precalculated[i].len()));
        }
        let mut slots: Vec<Option<PrecalculatedMarginal>> =
            precalculated.into_iter().map(Some).collect();
        let marginals: Vec<PrecalculatedMarginal> = marginal_order
            .iter()
            .map(|&i| slots[i].take().expect("order is a permutation"))
            .collect();

        let mut lcfmsv = vec![lcutoff; dim];
        let mut prefix_mode_sum = 0.0;
        for i in 1..dim {
            prefix_mode_sum += marginals[i - 1].mode_lprob();
            lcfmsv[i] = lcutoff - prefix_mode_sum;
        }

        let mut generator = Self {
            dim,
            lcutoff,
            marginals,
            marginal_order,
            signature_offsets,
            signature_len,
            counters: vec![0; dim],
            partial_lprobs: vec![0.0; dim + 1],
            partial_masses: vec![0.0; dim + 1],
            partial_probs: vec![1.0; dim + 1],
            lcfmsv,
            fresh: true,
            exhausted: false,
        };
        generator.reset();
        generator
    }

    /// Rewind to the initial state without recomputing marginals.
    pub fn reset(&mut self) {
        if self.marginals.iter().any(|m| m.is_empty()) {
            self.exhausted = true;
            return;
        }
        self.exhausted = false;
        self.fresh = true;
        self.counters.fill(0);
        self.partial_lprobs[self.dim] = 0.0;
        self.partial_masses[self.dim] = 0.0;
        self.partial_probs[self.dim] = 1.0;
        self.recalc_partials_from(self.dim.saturating_sub(1));
    }

    /// Count the configurations a full drain would produce, without
    /// touching masses or probabilities, then rewind. Useful for sizing
    /// storage exactly before materializing.
    pub fn count_confs(&mut self) -> usize {
        self.reset();
        if self.exhausted {
            return 0;
        }

        let mut total = 0usize;
        if self.dim == 1 {
            let lcutoff = self.lcutoff;
            total = self.marginals[0]
                .lprobs()
                .partition_point(|&lp| lp >= lcutoff);
            self.reset();
            return total;
        }

        // Walk the upper dimensions with the same carry logic as
        // `advance`; per reachable upper assignment the dimension-0
        // acceptance boundary sits at a prefix of its sorted lprobs.
        loop {
            let p1 = self.partial_lprobs[1];
            let lcutoff = self.lcutoff;
            total += self.marginals[0]
                .lprobs()
                .partition_point(|&lp| p1 + lp >= lcutoff);

            let mut idx = 1;
            loop {
                let next = self.counters[idx] + 1;
                if next < self.marginals[idx].len() {
                    let lp = self.partial_lprobs[idx + 1] + self.marginals[idx].lprob(next);
                    if lp >= self.lcfmsv[idx] {
                        self.counters[idx] = next;
                        self.partial_lprobs[idx] = lp;
                        for ii in (1..idx).rev() {
                            self.counters[ii] = 0;
                            self.partial_lprobs[ii] =
                                self.partial_lprobs[ii + 1] + self.marginals[ii].lprob(0);
                        }
                        break;
                    }
                }
                self.counters[idx] = 0;
                idx += 1;
                if idx == self.dim {
                    self.reset();
                    return total;
                }
            }
        }
    }

    fn recalc_partials_from(&mut self, idx: usize) {
        for ii in (0..=idx).rev() {
            let c = self.counters[ii];
            self.partial_lprobs[ii] = self.partial_lprobs[ii + 1] + self.marginals[ii].lprob(c);
            self.partial_masses[ii] = self.partial_masses[ii + 1] + self.marginals[ii].mass(c);
            self.partial_probs[ii] = self.partial_probs[ii + 1] * self.marginals[ii].prob(c);
        }
    }
}

impl PeakGenerator for ThresholdGenerator {
    fn advance(&mut self) -> bool {
        if self.exhausted {
            return false;
        }

        let next0 = if self.fresh {
            self.fresh = false;
            self.counters[0]
        } else {
            self.counters[0] + 1
        };
        if next0 < self.marginals[0].len() {
            let lp = self.partial_lprobs[1] + self.marginals[0].lprob(next0);
            if lp >= self.lcutoff {
                self.counters[0] = next0;
                self.partial_lprobs[0] = lp;
                self.partial_masses[0] =
                    self.partial_masses[1] + self.marginals[0].mass(next0);
                self.partial_probs[0] = self.partial_probs[1] * self.marginals[0].prob(next0);
                return true;
            }
        }

        // carry
        let mut idx = 0;
        loop {
            self.counters[idx] = 0;
            idx += 1;
            if idx == self.dim {
                self.exhausted = true;
                return false;
            }
            let next = self.counters[idx] + 1;
            if next < self.marginals[idx].len() {
                let lp = self.partial_lprobs[idx + 1] + self.marginals[idx].lprob(next);
                if lp >= self.lcfmsv[idx] {
                    self.counters[idx] = next;
                    self.partial_lprobs[idx] = lp;
                    self.partial_masses[idx] =
                        self.partial_masses[idx + 1] + self.marginals[idx].mass(next);
                    self.partial_probs[idx] =
                        self.partial_probs[idx + 1] * self.marginals[idx].prob(next);
                    // all lower counters were zeroed on the way up; with
                    // every marginal sorted, landing them on their best
                    // entries keeps the total above the cutoff
                    self.recalc_partials_from(idx - 1);
                    return true;
                }
            }
        }
    }

    fn mass(&self) -> f64 {
        self.partial_masses[0]
    }

    fn lprob(&self) -> f64 {
        self.partial_lprobs[0]
    }

    fn prob(&self) -> f64 {
        self.partial_probs[0]
    }

    fn signature_len(&self) -> usize {
        self.signature_len
    }

    fn write_conf_signature(&self, out: &mut Vec<u32>) {
        let base = out.len();
        out.resize(base + self.signature_len, 0);
        for pos in 0..self.dim {
            let original = self.marginal_order[pos];
            let offset = base + self.signature_offsets[original];
            let conf = self.marginals[pos].conf(self.counters[pos]);
            out[offset..offset + conf.len()].copy_from_slice(conf);
        }
    }
}

pub(crate) fn signature_offsets(isotope_numbers: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(isotope_numbers.len());
    let mut acc = 0;
    for &n in isotope_numbers {
        offsets.push(acc);
        acc += n;
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::iso::Iso;

    fn drain(generator: &mut ThresholdGenerator) -> Vec<(f64, f64)> {
        let mut out = Vec::new();
        while generator.advance() {
            out.push((generator.mass(), generator.prob()));
        }
        out
    }

    #[test]
    fn test_full_enumeration_sums_to_one() {
        let iso = Iso::from_formula("C10H12N2O6S1").unwrap();
        let mut generator = ThresholdGenerator::new(iso, 0.0, true, true);
        let total: f64 = drain(&mut generator).iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9, "total {}", total);
    }

    #[test]
    fn test_first_configuration_is_mode() {
        let iso = Iso::from_formula("C20H30O5").unwrap();
        let mode_lprob = iso.mode_lprob();
        let mut generator = ThresholdGenerator::new(iso, 1e-6, true, true);
        assert!(generator.advance());
        assert!((generator.lprob() - mode_lprob).abs() < 1e-9);
    }

    #[test]
    fn test_count_matches_drain_and_resets() {
        let iso = Iso::from_formula("C15H24O2S2").unwrap();
        let mut generator = ThresholdGenerator::new(iso, 1e-7, true, true);
        let counted = generator.count_confs();
        let drained = drain(&mut generator).len();
        assert_eq!(counted, drained);
        // count again after a full drain: still consistent
        assert_eq!(generator.count_confs(), counted);
        assert_eq!(drain(&mut generator).len(), counted);
    }

    #[test]
    fn test_reordering_does_not_change_output_set() {
        let iso = Iso::from_formula("C5H5Se1").unwrap();
        let mut plain = ThresholdGenerator::new(iso.clone(), 1e-8, true, false);
        let mut reordered = ThresholdGenerator::new(iso, 1e-8, true, true);
        let mut a: Vec<(f64, f64)> = drain(&mut plain);
        let mut b: Vec<(f64, f64)> = drain(&mut reordered);
        assert_eq!(a.len(), b.len());
        let key = |x: &(f64, f64)| (x.0, x.1);
        a.sort_by(|x, y| key(x).partial_cmp(&key(y)).unwrap());
        b.sort_by(|x, y| key(x).partial_cmp(&key(y)).unwrap());
        for (pa, pb) in a.iter().zip(b.iter()) {
            assert!((pa.0 - pb.0).abs() < 1e-9);
            assert!((pa.1 - pb.1).abs() < 1e-12);
        }
    }

    #[test]
    fn test_every_emission_is_above_cutoff() {
        let threshold = 1e-4;
        let iso = Iso::from_formula("C30H50O10").unwrap();
        let mut generator = ThresholdGenerator::new(iso, threshold, true, true);
        while generator.advance() {
            assert!(generator.prob() >= threshold * (1.0 - 1e-6));
        }
    }

    #[test]
    fn test_relative_threshold() {
        let iso = Iso::from_formula("C10H10").unwrap();
        let mode_prob = iso.mode_lprob().exp();
        let mut generator = ThresholdGenerator::new(iso, 0.5, false, true);
        while generator.advance() {
            assert!(generator.prob() >= 0.5 * mode_prob * (1.0 - 1e-6));
        }
    }

    #[test]
    fn test_impossible_threshold_is_empty() {
        let iso = Iso::from_formula("C2H6O1").unwrap();
        let mut generator = ThresholdGenerator::new(iso, 2.0, true, true);
        assert!(!generator.advance());
        assert!(!generator.advance());
        assert_eq!(generator.count_confs(), 0);
    }

    #[test]
    fn test_signature_respects_original_order() {
        let iso = Iso::from_formula("O1C2H6").unwrap();
        let mut generator = ThresholdGenerator::new(iso, 0.0, true, true);
        assert!(generator.advance());
        let mut sig = Vec::new();
        generator.write_conf_signature(&mut sig);
        assert_eq!(sig.len(), 3 + 2 + 2);
        // per-element counts sum to the atom counts, in O, C, H order
        assert_eq!(sig[0] + sig[1] + sig[2], 1);
        assert_eq!(sig[3] + sig[4], 2);
        assert_eq!(sig[5] + sig[6], 6);
    }
}
