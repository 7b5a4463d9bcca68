//! Sampling-based envelope simulation.
//!
//! Simulates observing `n_molecules` molecules drawn from the isotope
//! distribution. Instead of drawing molecules one by one, the generator
//! walks the layered stream and draws each configuration's molecule count
//! from the conditional binomial `Binomial(remaining, p / prob_left)` —
//! the standard sequential decomposition of a multinomial sample, so the
//! counts are an exact multinomial draw over the enumerated support.

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Binomial;
use tracing::trace;

use crate::generators::layered::LayeredGenerator;
use crate::models::iso::Iso;
use crate::traits::PeakGenerator;

pub struct StochasticGenerator {
    layered: LayeredGenerator,
    to_sample: u64,
    prob_left: f64,
    current_count: u64,
    rng: StdRng,
}

impl StochasticGenerator {
    pub fn new(iso: Iso, n_molecules: u64) -> Self {
        Self::with_rng(iso, n_molecules, StdRng::from_entropy())
    }

    /// Deterministic variant for reproducible runs.
    pub fn with_seed(iso: Iso, n_molecules: u64, seed: u64) -> Self {
        Self::with_rng(iso, n_molecules, StdRng::seed_from_u64(seed))
    }

    fn with_rng(iso: Iso, n_molecules: u64, rng: StdRng) -> Self {
        Self {
            layered: LayeredGenerator::new(iso),
            to_sample: n_molecules,
            prob_left: 1.0,
            current_count: 0,
            rng,
        }
    }

    /// Molecule count assigned to the current configuration.
    pub fn count(&self) -> u64 {
        self.current_count
    }
}

impl PeakGenerator for StochasticGenerator {
    fn advance(&mut self) -> bool {
        while self.to_sample > 0 {
            if !self.layered.advance() {
                // float residue only: the enumerated support is spent
                trace!(
                    remaining = self.to_sample,
                    "distribution exhausted with samples left"
                );
                self.to_sample = 0;
                return false;
            }
            let p = self.layered.prob();
            let ratio = if self.prob_left > 0.0 {
                (p / self.prob_left).clamp(0.0, 1.0)
            } else {
                1.0
            };
            let drawn = if ratio >= 1.0 {
                self.to_sample
            } else {
                let binomial = Binomial::new(ratio, self.to_sample)
                    .expect("ratio is clamped to a valid probability");
                Distribution::<f64>::sample(&binomial, &mut self.rng) as u64
            };
            self.prob_left -= p;
            if drawn > 0 {
                self.to_sample -= drawn;
                self.current_count = drawn;
                return true;
            }
        }
        false
    }

    fn mass(&self) -> f64 {
        self.layered.mass()
    }

    fn lprob(&self) -> f64 {
        self.layered.lprob()
    }

    /// Reports the molecule count rather than a probability; divide by
    /// the total molecule count for relative intensities.
    fn prob(&self) -> f64 {
        self.current_count as f64
    }

    fn signature_len(&self) -> usize {
        self.layered.signature_len()
    }

    fn write_conf_signature(&self, out: &mut Vec<u32>) {
        self.layered.write_conf_signature(out)
    }
}
