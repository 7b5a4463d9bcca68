use std::collections::HashSet;

use crate::models::marginal::{
    for_each_neighbor,
    Marginal,
};
use crate::utils::ConfArena;

/// Eagerly enumerated single-element configurations above a log-prob
/// cutoff.
///
/// Exploration is a breadth-first walk outward from the mode: every
/// accepted configuration contributes its one-unit-move neighbors as
/// candidates. The superlevel set of a multinomial is connected through
/// such moves, so starting at the mode reaches everything above the
/// cutoff. If the mode itself misses the cutoff the marginal is empty and
/// the whole-molecule search short-circuits.
#[derive(Debug)]
pub struct PrecalculatedMarginal {
    marginal: Marginal,
    confs: ConfArena,
    lprobs: Vec<f64>,
    probs: Vec<f64>,
    masses: Vec<f64>,
}

impl PrecalculatedMarginal {
    pub fn new(marginal: Marginal, lcutoff: f64, sort_by_lprob: bool) -> Self {
        let k = marginal.isotope_count();
        let mut accepted: Vec<(f64, Box<[u32]>)> = Vec::new();

        if marginal.mode_lprob() >= lcutoff {
            let mode: Box<[u32]> = marginal.mode_conf().into();
            let mut visited: HashSet<Box<[u32]>> = HashSet::new();
            visited.insert(mode.clone());
            let mut queue: Vec<Box<[u32]>> = vec![mode.clone()];
            accepted.push((marginal.mode_lprob(), mode));
            let mut scratch = vec![0u32; k];

            while let Some(conf) = queue.pop() {
                let mut fresh: Vec<(f64, Box<[u32]>)> = Vec::new();
                for_each_neighbor(&conf, &mut scratch, |neighbor| {
                    if visited.contains(neighbor) {
                        return;
                    }
                    let lp = marginal.log_prob(neighbor);
                    if lp >= lcutoff {
                        let boxed: Box<[u32]> = neighbor.into();
                        visited.insert(boxed.clone());
                        fresh.push((lp, boxed));
                    }
                });
                for (lp, boxed) in fresh {
                    accepted.push((lp, boxed.clone()));
                    queue.push(boxed);
                }
            }
        }

        if sort_by_lprob {
            accepted.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
        }

        let mut confs = ConfArena::with_capacity(k, accepted.len());
        let mut lprobs = Vec::with_capacity(accepted.len());
        let mut probs = Vec::with_capacity(accepted.len());
        let mut masses = Vec::with_capacity(accepted.len());
        for (lp, conf) in accepted {
            masses.push(marginal.conf_mass(&conf));
            confs.alloc(&conf);
            lprobs.push(lp);
            probs.push(lp.exp());
        }

        Self {
            marginal,
            confs,
            lprobs,
            probs,
            masses,
        }
    }

    pub fn len(&self) -> usize {
        self.lprobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lprobs.is_empty()
    }

    pub fn lprob(&self, idx: usize) -> f64 {
        self.lprobs[idx]
    }

    pub fn prob(&self, idx: usize) -> f64 {
        self.probs[idx]
    }

    pub fn mass(&self, idx: usize) -> f64 {
        self.masses[idx]
    }

    pub fn conf(&self, idx: usize) -> &[u32] {
        self.confs.get(crate::utils::ConfId::from_index(idx))
    }

    pub fn lprobs(&self) -> &[f64] {
        &self.lprobs
    }

    pub fn isotope_count(&self) -> usize {
        self.marginal.isotope_count()
    }

    /// Mode log-prob of the underlying marginal; defined even when the
    /// enumerated set is empty.
    pub fn mode_lprob(&self) -> f64 {
        self.marginal.mode_lprob()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carbon(atoms: u32) -> Marginal {
        Marginal::new(vec![12.0, 13.00335483507], vec![0.9893, 0.0107], atoms).unwrap()
    }

    #[test]
    fn test_full_enumeration_covers_all_probability() {
        // With a 2-isotope element and n atoms there are exactly n+1 configurations.
        let pm = PrecalculatedMarginal::new(carbon(10), f64::MIN, true);
        assert_eq!(pm.len(), 11);
        let total: f64 = (0..pm.len()).map(|i| pm.prob(i)).sum();
        assert!((total - 1.0).abs() < 1e-9, "total {}", total);
    }

    #[test]
    fn test_sorted_descending() {
        let pm = PrecalculatedMarginal::new(carbon(40), (1e-9f64).ln(), true);
        for i in 1..pm.len() {
            assert!(pm.lprob(i - 1) >= pm.lprob(i));
        }
        // first entry is the mode
        assert_eq!(pm.lprob(0), pm.mode_lprob());
    }

    #[test]
    fn test_cutoff_prunes() {
        let all = PrecalculatedMarginal::new(carbon(40), f64::MIN, true);
        let strict = PrecalculatedMarginal::new(carbon(40), (1e-3f64).ln(), true);
        assert!(strict.len() < all.len());
        for i in 0..strict.len() {
            assert!(strict.lprob(i) >= (1e-3f64).ln());
        }
    }

    #[test]
    fn test_mode_below_cutoff_gives_empty() {
        let pm = PrecalculatedMarginal::new(carbon(10), 1.0, true);
        assert!(pm.is_empty());
    }
}
