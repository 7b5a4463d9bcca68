//! Materialized isotope envelopes.
//!
//! A [`FixedEnvelope`] is the array form of a drained generator: parallel
//! `masses`/`probs` vectors plus, on request, the flattened configuration
//! signatures. It remembers whether it is currently sorted by mass or by
//! probability (sorting by one invalidates the other) and caches its
//! total probability once computed.

mod binning;
mod distance;

use rand::Rng;
use serde::{
    Deserialize,
    Serialize,
};
use tracing::debug;

use crate::errors::{
    IsoenvError,
    Result,
};
use crate::generators::{
    LayeredGenerator,
    ThresholdGenerator,
};
use crate::models::iso::Iso;
use crate::traits::PeakGenerator;
use crate::utils::StableSum;

/// Knobs for threshold-based materialization.
///
/// `threshold` is an absolute minimum peak probability when `absolute` is
/// set, otherwise a fraction of the mode probability. `threshold <= 0`
/// enumerates everything.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub threshold: f64,
    #[serde(default)]
    pub absolute: bool,
    #[serde(default)]
    pub keep_confs: bool,
    #[serde(default = "default_true")]
    pub reorder_marginals: bool,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            threshold: 1e-4,
            absolute: false,
            keep_confs: false,
            reorder_marginals: true,
        }
    }
}

/// Knobs for coverage-based materialization.
///
/// `target_total_prob` is the fraction of total probability mass to
/// cover. With `optimize` set the result is trimmed to the exact minimal
/// peak set reaching the target; without it the drain stops as soon as
/// the accumulated probability crosses the target, wherever in the
/// current layer that happens to be.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoverageConfig {
    pub target_total_prob: f64,
    #[serde(default = "default_true")]
    pub optimize: bool,
    #[serde(default)]
    pub keep_confs: bool,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            target_total_prob: 0.9999,
            optimize: true,
            keep_confs: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixedEnvelope {
    masses: Vec<f64>,
    probs: Vec<f64>,
    confs: Option<Vec<u32>>,
    conf_stride: usize,
    sorted_by_mass: bool,
    sorted_by_prob: bool,
    total_prob: Option<f64>,
}

impl FixedEnvelope {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Materialize every configuration above the threshold. The exact
    /// peak count is known up front (a counting dry-run), so the arrays
    /// are reserved in one step and that reservation is the only
    /// allocation that can meaningfully fail.
    pub fn from_threshold(iso: Iso, config: &ThresholdConfig) -> Result<Self> {
        let signature_len = iso.conf_signature_len();
        let mut generator = ThresholdGenerator::new(
            iso,
            config.threshold,
            config.absolute,
            config.reorder_marginals,
        );
        let expected = generator.count_confs();
        debug!(confs = expected, "materializing threshold envelope");

        let mut envelope = Self::with_reserved(expected, config.keep_confs, signature_len)?;
        while generator.advance() {
            envelope.push_peak(&generator);
        }
        debug_assert_eq!(envelope.len(), expected);
        Ok(envelope)
    }

    /// Materialize the smallest high-probability peak set covering
    /// `target_total_prob` of the distribution (exactly minimal when
    /// `optimize` is set).
    pub fn from_coverage(iso: Iso, config: &CoverageConfig) -> Result<Self> {
        let target = config.target_total_prob;
        if target <= 0.0 {
            return Ok(Self::empty());
        }
        if target >= 1.0 {
            // no meaningful cutoff exists: fall back to full enumeration
            return Self::from_threshold(
                iso,
                &ThresholdConfig {
                    threshold: 0.0,
                    absolute: true,
                    keep_confs: config.keep_confs,
                    reorder_marginals: true,
                },
            );
        }

        let signature_len = iso.conf_signature_len();
        let mut generator = LayeredGenerator::new(iso);
        let mut envelope = Self::with_reserved(0, config.keep_confs, signature_len)?;
        let mut accumulated = StableSum::new();

        loop {
            if !generator.advance() {
                // the whole distribution is below the target; nothing to trim
                return Ok(envelope);
            }
            envelope.push_peak(&generator);
            accumulated.add(generator.prob());
            if accumulated.total() >= target {
                break;
            }
        }

        if config.optimize {
            // finish the layer so the trim selects over a superset of
            // every peak that could beat the ones already collected
            while generator.advance_within_layer() {
                envelope.push_peak(&generator);
            }
            debug!(
                collected = envelope.len(),
                target, "trimming coverage overshoot"
            );
            envelope.trim_to_target(target);
        }
        Ok(envelope)
    }

    /// Drain any generator to exhaustion.
    pub fn from_generator<G: PeakGenerator>(mut generator: G, keep_confs: bool) -> Self {
        let signature_len = generator.signature_len();
        let mut envelope =
            Self::with_reserved(0, keep_confs, signature_len).expect("empty reservation");
        while generator.advance() {
            envelope.push_peak(&generator);
        }
        envelope
    }

    fn with_reserved(expected: usize, keep_confs: bool, signature_len: usize) -> Result<Self> {
        let alloc_err = |_| IsoenvError::AllocationFailed { confs: expected };
        let mut masses = Vec::new();
        let mut probs = Vec::new();
        masses.try_reserve_exact(expected).map_err(alloc_err)?;
        probs.try_reserve_exact(expected).map_err(alloc_err)?;
        let confs = if keep_confs {
            let mut v = Vec::new();
            v.try_reserve_exact(expected * signature_len)
                .map_err(alloc_err)?;
            Some(v)
        } else {
            None
        };
        Ok(Self {
            masses,
            probs,
            confs,
            conf_stride: if keep_confs { signature_len } else { 0 },
            sorted_by_mass: false,
            sorted_by_prob: false,
            total_prob: None,
        })
    }

    fn push_peak<G: PeakGenerator>(&mut self, generator: &G) {
        self.masses.push(generator.mass());
        self.probs.push(generator.prob());
        if let Some(confs) = &mut self.confs {
            generator.write_conf_signature(confs);
        }
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    /// Flattened configuration signatures, present when the envelope was
    /// built with `keep_confs`.
    pub fn confs(&self) -> Option<&[u32]> {
        self.confs.as_deref()
    }

    pub fn conf_stride(&self) -> usize {
        self.conf_stride
    }

    /// Hand the arrays over to the caller.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>, Option<Vec<u32>>) {
        (self.masses, self.probs, self.confs)
    }

    pub fn total_prob(&mut self) -> f64 {
        if let Some(total) = self.total_prob {
            return total;
        }
        let total = self.probs.iter().copied().collect::<StableSum>().total();
        self.total_prob = Some(total);
        total
    }

    pub fn is_sorted_by_mass(&self) -> bool {
        self.sorted_by_mass
    }

    pub fn is_sorted_by_prob(&self) -> bool {
        self.sorted_by_prob
    }

    pub fn sort_by_mass(&mut self) {
        if self.sorted_by_mass {
            return;
        }
        self.apply_sort(|masses, _probs, a, b| masses[a].partial_cmp(&masses[b]).unwrap());
        self.sorted_by_mass = true;
        self.sorted_by_prob = false;
    }

    /// Sort by descending probability.
    pub fn sort_by_prob(&mut self) {
        if self.sorted_by_prob {
            return;
        }
        self.apply_sort(|_masses, probs, a, b| probs[b].partial_cmp(&probs[a]).unwrap());
        self.sorted_by_prob = true;
        self.sorted_by_mass = false;
    }

    fn apply_sort(
        &mut self,
        compare: impl Fn(&[f64], &[f64], usize, usize) -> std::cmp::Ordering,
    ) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| compare(&self.masses, &self.probs, a, b));

        let masses: Vec<f64> = order.iter().map(|&i| self.masses[i]).collect();
        let probs: Vec<f64> = order.iter().map(|&i| self.probs[i]).collect();
        self.masses = masses;
        self.probs = probs;
        if let Some(confs) = &self.confs {
            let stride = self.conf_stride;
            let mut reordered = Vec::with_capacity(confs.len());
            for &i in &order {
                reordered.extend_from_slice(&confs[i * stride..(i + 1) * stride]);
            }
            self.confs = Some(reordered);
        }
    }

    /// Multiply every probability by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for p in &mut self.probs {
            *p *= factor;
        }
        if let Some(total) = self.total_prob {
            self.total_prob = Some(total * factor);
        }
    }

    /// Scale so the probabilities sum to 1.
    pub fn normalize(&mut self) {
        let total = self.total_prob();
        if total > 0.0 && total != 1.0 {
            self.scale(1.0 / total);
            self.total_prob = Some(1.0);
        }
    }

    pub fn lightest_peak_mass(&self) -> Option<f64> {
        self.masses.iter().copied().reduce(f64::min)
    }

    pub fn heaviest_peak_mass(&self) -> Option<f64> {
        self.masses.iter().copied().reduce(f64::max)
    }

    /// Mass of the most probable peak.
    pub fn modal_peak_mass(&self) -> Option<f64> {
        let mut best: Option<usize> = None;
        for (i, &p) in self.probs.iter().enumerate() {
            if best.map_or(true, |b| p > self.probs[b]) {
                best = Some(i);
            }
        }
        best.map(|i| self.masses[i])
    }

    /// Probability-weighted mean mass.
    pub fn average_mass(&mut self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let total = self.total_prob();
        if total <= 0.0 {
            return None;
        }
        let weighted: f64 = self
            .masses
            .iter()
            .zip(self.probs.iter())
            .map(|(&m, &p)| m * p)
            .sum();
        Some(weighted / total)
    }

    pub fn mass_variance(&mut self) -> Option<f64> {
        let mean = self.average_mass()?;
        let total = self.total_prob();
        let weighted: f64 = self
            .masses
            .iter()
            .zip(self.probs.iter())
            .map(|(&m, &p)| (m - mean) * (m - mean) * p)
            .sum();
        Some(weighted / total)
    }

    pub fn mass_stddev(&mut self) -> Option<f64> {
        self.mass_variance().map(f64::sqrt)
    }

    /// Weighted mixture of several envelopes: masses concatenated,
    /// probabilities scaled by the matching weight.
    pub fn linear_combination(envelopes: &[&FixedEnvelope], weights: &[f64]) -> Result<Self> {
        if envelopes.len() != weights.len() {
            return Err(IsoenvError::MismatchedArrayLengths {
                what: "combination weights",
                expected: envelopes.len(),
                got: weights.len(),
            });
        }
        let total_len: usize = envelopes.iter().map(|e| e.len()).sum();
        let mut masses = Vec::with_capacity(total_len);
        let mut probs = Vec::with_capacity(total_len);
        for (envelope, &weight) in envelopes.iter().zip(weights.iter()) {
            masses.extend_from_slice(&envelope.masses);
            probs.extend(envelope.probs.iter().map(|&p| p * weight));
        }
        Ok(Self {
            masses,
            probs,
            confs: None,
            conf_stride: 0,
            sorted_by_mass: false,
            sorted_by_prob: false,
            total_prob: None,
        })
    }

    fn swap_peaks(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.masses.swap(a, b);
        self.probs.swap(a, b);
        if let Some(confs) = &mut self.confs {
            let stride = self.conf_stride;
            for t in 0..stride {
                confs.swap(a * stride + t, b * stride + t);
            }
        }
    }

    /// Quickselect-style trim: keep the minimal set of highest-probability
    /// peaks whose cumulative probability reaches `target`.
    ///
    /// Partitions around random pivots like a median-find, except the
    /// recursion side is decided by the cumulative probability of the
    /// high partition rather than its element count — expected linear
    /// time, no full sort.
    fn trim_to_target(&mut self, target: f64) {
        let mut rng = rand::thread_rng();
        let mut start = 0usize;
        let mut end = self.len();
        let mut sum_to_start = 0.0;

        while start < end {
            let pivot = start + rng.gen_range(0..end - start);
            let pivot_prob = self.probs[pivot];
            self.swap_peaks(pivot, end - 1);

            let mut cumulative = sum_to_start;
            let mut lower = start;
            for i in start..end - 1 {
                if self.probs[i] > pivot_prob {
                    self.swap_peaks(i, lower);
                    cumulative += self.probs[lower];
                    lower += 1;
                }
            }
            self.swap_peaks(end - 1, lower);

            if cumulative < target {
                sum_to_start = cumulative + self.probs[lower];
                start = lower + 1;
            } else {
                end = lower;
            }
        }

        self.masses.truncate(start);
        self.probs.truncate(start);
        if let Some(confs) = &mut self.confs {
            confs.truncate(start * self.conf_stride);
        }
        self.sorted_by_mass = false;
        self.sorted_by_prob = false;
        self.total_prob = None;
    }
}

/// Mixture of two envelopes (concatenation; probabilities untouched).
impl std::ops::Add for &FixedEnvelope {
    type Output = FixedEnvelope;

    fn add(self, other: &FixedEnvelope) -> FixedEnvelope {
        let mut masses = Vec::with_capacity(self.len() + other.len());
        masses.extend_from_slice(&self.masses);
        masses.extend_from_slice(&other.masses);
        let mut probs = Vec::with_capacity(self.len() + other.len());
        probs.extend_from_slice(&self.probs);
        probs.extend_from_slice(&other.probs);
        FixedEnvelope {
            masses,
            probs,
            confs: None,
            conf_stride: 0,
            sorted_by_mass: false,
            sorted_by_prob: false,
            total_prob: None,
        }
    }
}

/// Convolution of two independent envelopes: the Cartesian product with
/// masses summed and probabilities multiplied.
impl std::ops::Mul for &FixedEnvelope {
    type Output = FixedEnvelope;

    fn mul(self, other: &FixedEnvelope) -> FixedEnvelope {
        let n = self.len() * other.len();
        let mut masses = Vec::with_capacity(n);
        let mut probs = Vec::with_capacity(n);
        for (&ma, &pa) in self.masses.iter().zip(self.probs.iter()) {
            for (&mb, &pb) in other.masses.iter().zip(other.probs.iter()) {
                masses.push(ma + mb);
                probs.push(pa * pb);
            }
        }
        FixedEnvelope {
            masses,
            probs,
            confs: None,
            conf_stride: 0,
            sorted_by_mass: false,
            sorted_by_prob: false,
            total_prob: None,
        }
    }
}
