//! Per-element isotope-count distributions.
//!
//! One chemical element with `n` atoms and `k` tracked isotopes follows a
//! `Multinomial(n; p_1..p_k)` over isotope-count vectors. [`Marginal`] is
//! the immutable model (masses, log-probabilities, the combinatorial
//! mode); the three enumeration strategies on top of it mirror how the
//! whole-molecule generators consume them:
//!
//! - [`PrecalculatedMarginal`] — eager, threshold-pruned, optionally
//!   sorted by descending probability.
//! - [`LayeredMarginal`] — the same exploration, resumable to ever-lower
//!   thresholds.
//! - [`MarginalTrek`] — lazy, strictly ordered by probability.

mod layered;
mod precalculated;
mod trek;

pub use layered::LayeredMarginal;
pub use precalculated::PrecalculatedMarginal;
pub use trek::MarginalTrek;

use statrs::function::gamma::ln_gamma;

use crate::errors::{
    IsoenvError,
    Result,
};

/// Immutable single-element model over isotope-count configurations.
#[derive(Debug, Clone)]
pub struct Marginal {
    masses: Vec<f64>,
    lprobs: Vec<f64>,
    atom_count: u32,
    mode_conf: Vec<u32>,
    mode_lprob: f64,
    mode_mass: f64,
    smallest_lprob: f64,
}

impl Marginal {
    /// Build the model for one element. Fails if any isotope probability
    /// falls outside (0, 1]; the probabilities are otherwise trusted to
    /// sum to 1 within the element.
    pub fn new(masses: Vec<f64>, probs: Vec<f64>, atom_count: u32) -> Result<Self> {
        if masses.len() != probs.len() {
            return Err(IsoenvError::MismatchedArrayLengths {
                what: "isotope probabilities",
                expected: masses.len(),
                got: probs.len(),
            });
        }
        if masses.is_empty() {
            return Err(IsoenvError::MismatchedArrayLengths {
                what: "isotopes per element",
                expected: 1,
                got: 0,
            });
        }
        for &p in &probs {
            if !(p > 0.0 && p <= 1.0) {
                return Err(IsoenvError::InvalidIsotopeProbability { value: p });
            }
        }

        let lprobs: Vec<f64> = probs.iter().map(|p| p.ln()).collect();
        let mode_conf = mode_configuration(&lprobs, atom_count);
        let mode_lprob = log_prob_of(&lprobs, atom_count, &mode_conf);
        let mode_mass = conf_mass_of(&masses, &mode_conf);
        let min_lprob = lprobs.iter().copied().fold(f64::INFINITY, f64::min);
        let smallest_lprob = atom_count as f64 * min_lprob;

        Ok(Self {
            masses,
            lprobs,
            atom_count,
            mode_conf,
            mode_lprob,
            mode_mass,
            smallest_lprob,
        })
    }

    pub fn isotope_count(&self) -> usize {
        self.masses.len()
    }

    pub fn atom_count(&self) -> u32 {
        self.atom_count
    }

    /// The most probable isotope-count assignment.
    pub fn mode_conf(&self) -> &[u32] {
        &self.mode_conf
    }

    pub fn mode_lprob(&self) -> f64 {
        self.mode_lprob
    }

    pub fn mode_mass(&self) -> f64 {
        self.mode_mass
    }

    /// Log-probability of the least probable achievable configuration
    /// (all atoms on the rarest isotope).
    pub fn smallest_lprob(&self) -> f64 {
        self.smallest_lprob
    }

    pub fn lightest_conf_mass(&self) -> f64 {
        let min = self.masses.iter().copied().fold(f64::INFINITY, f64::min);
        self.atom_count as f64 * min
    }

    pub fn heaviest_conf_mass(&self) -> f64 {
        let max = self.masses.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        self.atom_count as f64 * max
    }

    /// Mass with every atom on the most probable isotope.
    pub fn monoisotopic_conf_mass(&self) -> f64 {
        let mut best = 0;
        for (i, &lp) in self.lprobs.iter().enumerate() {
            if lp > self.lprobs[best] {
                best = i;
            }
        }
        self.atom_count as f64 * self.masses[best]
    }

    pub fn log_prob(&self, conf: &[u32]) -> f64 {
        log_prob_of(&self.lprobs, self.atom_count, conf)
    }

    pub fn conf_mass(&self, conf: &[u32]) -> f64 {
        conf_mass_of(&self.masses, conf)
    }
}

fn conf_mass_of(masses: &[f64], conf: &[u32]) -> f64 {
    conf.iter()
        .zip(masses.iter())
        .map(|(&c, &m)| c as f64 * m)
        .sum()
}

/// Multinomial log-probability:
/// `lgamma(n+1) + sum_j(c_j * lp_j - lgamma(c_j + 1))`.
fn log_prob_of(lprobs: &[f64], atom_count: u32, conf: &[u32]) -> f64 {
    let mut acc = ln_gamma(atom_count as f64 + 1.0);
    for (&c, &lp) in conf.iter().zip(lprobs.iter()) {
        acc += c as f64 * lp - ln_gamma(c as f64 + 1.0);
    }
    acc
}

/// Find the mode of `Multinomial(n; exp(lprobs))`.
///
/// Starts from the rounded expectation, repairs the count sum, then
/// hill-climbs over one-unit moves between ordered isotope pairs. Ties
/// are only taken when they move count toward a lower index, which
/// strictly decreases a secondary potential and so cannot cycle.
fn mode_configuration(lprobs: &[f64], atom_count: u32) -> Vec<u32> {
    let k = lprobs.len();
    let mut conf: Vec<i64> = lprobs
        .iter()
        .map(|&lp| (atom_count as f64 * lp.exp()) as i64 + 1)
        .collect();

    let mut diff = atom_count as i64 - conf.iter().sum::<i64>();
    if diff > 0 {
        conf[0] += diff;
    } else {
        let mut i = 0;
        while diff < 0 {
            let take = (-diff).min(conf[i]);
            conf[i] -= take;
            diff += take;
            i += 1;
        }
    }

    let mut conf: Vec<u32> = conf.into_iter().map(|c| c as u32).collect();
    let mut improved = true;
    while improved {
        improved = false;
        for src in 0..k {
            for dst in 0..k {
                if src == dst || conf[src] == 0 {
                    continue;
                }
                // Log-probability change of moving one count unit src -> dst.
                let delta = lprobs[dst] - lprobs[src] + (conf[src] as f64).ln()
                    - (conf[dst] as f64 + 1.0).ln();
                if delta > 0.0 || (delta == 0.0 && src > dst) {
                    conf[src] -= 1;
                    conf[dst] += 1;
                    improved = true;
                }
            }
        }
    }
    conf
}

/// Visit every configuration reachable from `conf` by moving one count
/// unit between an ordered isotope pair. `scratch` must have the same
/// length as `conf`; the callback sees each neighbor in `scratch`.
pub(crate) fn for_each_neighbor(
    conf: &[u32],
    scratch: &mut [u32],
    mut visit: impl FnMut(&[u32]),
) {
    let k = conf.len();
    for src in 0..k {
        if conf[src] == 0 {
            continue;
        }
        for dst in 0..k {
            if src == dst {
                continue;
            }
            scratch.copy_from_slice(conf);
            scratch[src] -= 1;
            scratch[dst] += 1;
            visit(scratch);
        }
    }
}
