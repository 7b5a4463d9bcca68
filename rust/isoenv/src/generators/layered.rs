//! Total-probability-targeted enumeration.
//!
//! Nobody knows the right probability cutoff for "cover 99.9% of the
//! envelope" up front. This generator starts with the cutoff just above
//! the joint mode and lowers it one fixed step at a time; each layer
//! extends the per-element [`LayeredMarginal`]s, re-runs the pruned
//! counter walk of the threshold generator, and emits exactly the
//! configurations whose log-prob falls inside the new band
//! `[current_cutoff, last_cutoff)`. The consumer accumulates probability
//! and stops asking for layers once its target is reached.
//!
//! Within a layer the emission order is unspecified; callers must not
//! assume sorted output.

use tracing::{
    debug,
    trace,
};

use crate::generators::threshold::signature_offsets;
use crate::models::iso::Iso;
use crate::models::marginal::LayeredMarginal;
use crate::traits::PeakGenerator;

pub const DEFAULT_LAYER_STEP: f64 = -3.0;

pub struct LayeredGenerator {
    dim: usize,
    mode_lprob: f64,
    layer_step: f64,
    marginals: Vec<LayeredMarginal>,
    signature_offsets: Vec<usize>,
    signature_len: usize,
    counters: Vec<usize>,
    partial_lprobs: Vec<f64>,
    partial_masses: Vec<f64>,
    partial_probs: Vec<f64>,
    lcfmsv: Vec<f64>,
    current_lcutoff: f64,
    last_lcutoff: f64,
    /// summed least-achievable lprob over all dimensions; once the band
    /// has moved past this, everything has been emitted
    final_cutoff: f64,
    fresh: bool,
    exhausted: bool,
}

impl LayeredGenerator {
    pub fn new(iso: Iso) -> Self {
        Self::with_layer_step(iso, DEFAULT_LAYER_STEP)
    }

    /// `layer_step` is the (negative) log-prob decrement applied per
    /// layer; smaller magnitudes mean more, cheaper layers.
    pub fn with_layer_step(iso: Iso, layer_step: f64) -> Self {
        assert!(layer_step < 0.0, "layer step must lower the cutoff");
        let signature_offsets = signature_offsets(iso.isotope_numbers());
        let signature_len = iso.conf_signature_len();
        let (_isotope_numbers, marginals, mode_lprob) = iso.into_marginals();
        let dim = marginals.len();

        let layered: Vec<LayeredMarginal> =
            marginals.into_iter().map(LayeredMarginal::new).collect();
        let final_cutoff: f64 = layered.iter().map(|m| m.smallest_lprob()).sum();

        let mut generator = Self {
            dim,
            mode_lprob,
            layer_step,
            marginals: layered,
            signature_offsets,
            signature_len,
            counters: vec![0; dim],
            partial_lprobs: vec![0.0; dim + 1],
            partial_masses: vec![0.0; dim + 1],
            partial_probs: vec![1.0; dim + 1],
            lcfmsv: vec![0.0; dim],
            current_lcutoff: mode_lprob.next_up(),
            last_lcutoff: f64::INFINITY,
            final_cutoff,
            fresh: true,
            exhausted: false,
        };
        let opened = generator.next_layer();
        debug_assert!(opened, "the first layer always contains the mode");
        generator
    }

    /// Lower the cutoff by one step and prepare the next band. Returns
    /// false once the previous cutoff already lies below the least
    /// probable achievable configuration.
    pub fn next_layer(&mut self) -> bool {
        self.last_lcutoff = self.current_lcutoff;
        self.current_lcutoff += self.layer_step;
        if self.last_lcutoff < self.final_cutoff {
            trace!(
                final_cutoff = self.final_cutoff,
                "layer cutoff exhausted the configuration space"
            );
            return false;
        }
        debug!(
            last = self.last_lcutoff,
            current = self.current_lcutoff,
            "opening next layer"
        );

        for (i, marginal) in self.marginals.iter_mut().enumerate() {
            let local_cutoff = self.current_lcutoff - self.mode_lprob + marginal.mode_lprob();
            marginal.extend(local_cutoff);
            trace!(dim = i, confs = marginal.len(), "extended marginal");
        }

        self.lcfmsv[0] = self.current_lcutoff;
        let mut prefix_mode_sum = 0.0;
        for i in 1..self.dim {
            prefix_mode_sum += self.marginals[i - 1].mode_lprob();
            self.lcfmsv[i] = self.current_lcutoff - prefix_mode_sum;
        }

        self.counters.fill(0);
        for ii in (1..self.dim).rev() {
            self.partial_lprobs[ii] = self.partial_lprobs[ii + 1] + self.marginals[ii].lprob(0);
            self.partial_masses[ii] = self.partial_masses[ii + 1] + self.marginals[ii].mass(0);
            self.partial_probs[ii] = self.partial_probs[ii + 1] * self.marginals[ii].prob(0);
        }
        self.fresh = true;
        true
    }

    /// Advance within the current band only; returns false when the band
    /// is drained (the caller decides whether to open another layer).
    pub fn advance_within_layer(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        loop {
            let next0 = if self.fresh {
                self.fresh = false;
                // skip the row prefix emitted by earlier layers
                let p1 = self.partial_lprobs[1];
                let last = self.last_lcutoff;
                self.marginals[0]
                    .lprobs()
                    .partition_point(|&lp| p1 + lp >= last)
            } else {
                self.counters[0] + 1
            };

            if next0 < self.marginals[0].len() {
                let lp = self.partial_lprobs[1] + self.marginals[0].lprob(next0);
                if lp >= self.current_lcutoff {
                    self.counters[0] = next0;
                    self.partial_lprobs[0] = lp;
                    self.partial_masses[0] =
                        self.partial_masses[1] + self.marginals[0].mass(next0);
                    self.partial_probs[0] =
                        self.partial_probs[1] * self.marginals[0].prob(next0);
                    return true;
                }
            }

            if !self.carry() {
                return false;
            }
        }
    }

    fn carry(&mut self) -> bool {
        let mut idx = 0;
        loop {
            self.counters[idx] = 0;
            idx += 1;
            if idx == self.dim {
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
                    for ii in (1..idx).rev() {
                        self.counters[ii] = 0;
                        self.partial_lprobs[ii] =
                            self.partial_lprobs[ii + 1] + self.marginals[ii].lprob(0);
                        self.partial_masses[ii] =
                            self.partial_masses[ii + 1] + self.marginals[ii].mass(0);
                        self.partial_probs[ii] =
                            self.partial_probs[ii + 1] * self.marginals[ii].prob(0);
                    }
                    self.fresh = true;
                    return true;
                }
            }
        }
    }
}

impl PeakGenerator for LayeredGenerator {
    fn advance(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        loop {
            if self.advance_within_layer() {
                return true;
            }
            if !self.next_layer() {
                self.exhausted = true;
                return false;
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
            let offset = base + self.signature_offsets[pos];
            let conf = self.marginals[pos].conf(self.counters[pos]);
            out[offset..offset + conf.len()].copy_from_slice(conf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::threshold::ThresholdGenerator;
    use crate::models::iso::Iso;

    #[test]
    fn test_full_enumeration_sums_to_one() {
        let iso = Iso::from_formula("C8H10N4O2").unwrap();
        let mut generator = LayeredGenerator::new(iso);
        let mut total = 0.0;
        let mut count = 0usize;
        while generator.advance() {
            total += generator.prob();
            count += 1;
        }
        assert!((total - 1.0).abs() < 1e-9, "total {}", total);
        assert!(count > 100);
        // exhausted stays exhausted
        assert!(!generator.advance());
    }

    #[test]
    fn test_matches_threshold_generator_set() {
        let iso = Iso::from_formula("C6H6S1").unwrap();
        let mut layered = LayeredGenerator::new(iso.clone());
        let mut reference = ThresholdGenerator::new(iso, 0.0, true, false);

        let mut a = Vec::new();
        while layered.advance() {
            a.push((layered.mass(), layered.prob()));
        }
        let mut b = Vec::new();
        while reference.advance() {
            b.push((reference.mass(), reference.prob()));
        }
        assert_eq!(a.len(), b.len());
        let cmp = |x: &(f64, f64), y: &(f64, f64)| x.partial_cmp(y).unwrap();
        a.sort_by(cmp);
        b.sort_by(cmp);
        for (pa, pb) in a.iter().zip(b.iter()) {
            assert!((pa.0 - pb.0).abs() < 1e-9);
            assert!((pa.1 - pb.1).abs() < 1e-12);
        }
    }

    #[test]
    fn test_first_emission_is_mode() {
        let iso = Iso::from_formula("C12H22O11").unwrap();
        let mode_lprob = iso.mode_lprob();
        let mut generator = LayeredGenerator::new(iso);
        assert!(generator.advance());
        assert!((generator.lprob() - mode_lprob).abs() < 1e-9);
    }

    #[test]
    fn test_no_duplicates_across_layers() {
        let iso = Iso::from_formula("C4H4O4").unwrap();
        let mut generator = LayeredGenerator::new(iso);
        let mut signatures = Vec::new();
        while generator.advance() {
            let mut sig = Vec::new();
            generator.write_conf_signature(&mut sig);
            signatures.push(sig);
        }
        let n = signatures.len();
        signatures.sort();
        signatures.dedup();
        assert_eq!(signatures.len(), n, "layered generator emitted duplicates");
    }

    #[test]
    fn test_single_dimension() {
        let iso = Iso::from_formula("S30").unwrap();
        let mut generator = LayeredGenerator::new(iso);
        let mut total = 0.0;
        while generator.advance() {
            total += generator.prob();
        }
        assert!((total - 1.0).abs() < 1e-9);
    }
}
