use std::collections::HashSet;

use crate::models::marginal::{
    for_each_neighbor,
    Marginal,
};
use crate::utils::{
    ConfArena,
    ConfId,
};

/// Resumable threshold enumeration of one element's configurations.
///
/// Works like [`super::PrecalculatedMarginal`] but keeps the frontier of
/// seen-but-rejected configurations, so the threshold can be lowered
/// repeatedly without restarting the walk. Every `extend` appends the
/// newly qualifying configurations; because anything reachable at the old
/// threshold was already accepted, the new batch lies strictly below the
/// previous cutoff and sorting just that suffix keeps the whole list in
/// descending log-prob order.
#[derive(Debug)]
pub struct LayeredMarginal {
    marginal: Marginal,
    current_lcutoff: f64,
    confs: ConfArena,
    lprobs: Vec<f64>,
    probs: Vec<f64>,
    masses: Vec<f64>,
    fringe: Vec<(f64, Box<[u32]>)>,
    visited: HashSet<Box<[u32]>>,
}

impl LayeredMarginal {
    pub fn new(marginal: Marginal) -> Self {
        let k = marginal.isotope_count();
        let mode: Box<[u32]> = marginal.mode_conf().into();
        let mut visited = HashSet::new();
        visited.insert(mode.clone());
        let fringe = vec![(marginal.mode_lprob(), mode)];
        Self {
            marginal,
            current_lcutoff: f64::INFINITY,
            confs: ConfArena::new(k),
            lprobs: Vec::new(),
            probs: Vec::new(),
            masses: Vec::new(),
            fringe,
            visited,
        }
    }

    /// Lower the cutoff and pull everything newly above it out of the
    /// fringe. Raising the cutoff is a no-op.
    pub fn extend(&mut self, new_lcutoff: f64) {
        if new_lcutoff >= self.current_lcutoff {
            return;
        }

        let mut queue: Vec<(f64, Box<[u32]>)> = Vec::new();
        let mut kept: Vec<(f64, Box<[u32]>)> = Vec::new();
        for entry in self.fringe.drain(..) {
            if entry.0 >= new_lcutoff {
                queue.push(entry);
            } else {
                kept.push(entry);
            }
        }
        self.fringe = kept;

        let k = self.marginal.isotope_count();
        let mut scratch = vec![0u32; k];
        let mut batch: Vec<(f64, Box<[u32]>)> = Vec::new();
        while let Some((lp, conf)) = queue.pop() {
            let mut fresh: Vec<(f64, Box<[u32]>)> = Vec::new();
            for_each_neighbor(&conf, &mut scratch, |neighbor| {
                if self.visited.contains(neighbor) {
                    return;
                }
                let nlp = self.marginal.log_prob(neighbor);
                let boxed: Box<[u32]> = neighbor.into();
                self.visited.insert(boxed.clone());
                fresh.push((nlp, boxed));
            });
            for (nlp, boxed) in fresh {
                if nlp >= new_lcutoff {
                    queue.push((nlp, boxed));
                } else {
                    self.fringe.push((nlp, boxed));
                }
            }
            batch.push((lp, conf));
        }

        batch.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
        for (lp, conf) in batch {
            self.masses.push(self.marginal.conf_mass(&conf));
            self.confs.alloc(&conf);
            self.lprobs.push(lp);
            self.probs.push(lp.exp());
        }
        self.current_lcutoff = new_lcutoff;
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
        self.confs.get(ConfId::from_index(idx))
    }

    pub fn lprobs(&self) -> &[f64] {
        &self.lprobs
    }

    pub fn isotope_count(&self) -> usize {
        self.marginal.isotope_count()
    }

    pub fn mode_lprob(&self) -> f64 {
        self.marginal.mode_lprob()
    }

    pub fn smallest_lprob(&self) -> f64 {
        self.marginal.smallest_lprob()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::marginal::PrecalculatedMarginal;

    fn sulfur(atoms: u32) -> Marginal {
        Marginal::new(
            vec![31.9720711744, 32.9714589098, 33.967867004, 35.96708071],
            vec![0.9499, 0.0075, 0.0425, 0.0001],
            atoms,
        )
        .unwrap()
    }

    #[test]
    fn test_extend_is_incremental_and_sorted() {
        let mut lm = LayeredMarginal::new(sulfur(20));
        assert!(lm.is_empty());

        lm.extend((1e-2f64).ln());
        let after_first = lm.len();
        assert!(after_first > 0);

        lm.extend((1e-6f64).ln());
        assert!(lm.len() > after_first);

        for i in 1..lm.len() {
            assert!(lm.lprob(i - 1) >= lm.lprob(i), "not sorted at {}", i);
        }
    }

    #[test]
    fn test_matches_precalculated_at_same_cutoff() {
        let cutoff = (1e-5f64).ln();
        let mut lm = LayeredMarginal::new(sulfur(15));
        // approach the cutoff in several steps
        lm.extend((1e-1f64).ln());
        lm.extend((1e-3f64).ln());
        lm.extend(cutoff);

        let pm = PrecalculatedMarginal::new(sulfur(15), cutoff, true);
        assert_eq!(lm.len(), pm.len());
        for i in 0..lm.len() {
            assert!((lm.lprob(i) - pm.lprob(i)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_raising_cutoff_is_noop() {
        let mut lm = LayeredMarginal::new(sulfur(10));
        lm.extend((1e-3f64).ln());
        let len = lm.len();
        lm.extend((1e-1f64).ln());
        assert_eq!(lm.len(), len);
    }
}
