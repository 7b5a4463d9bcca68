//! Strictly probability-ordered whole-molecule enumeration.
//!
//! A global max-heap over joint configurations, each stored as a vector
//! of per-dimension indices into that dimension's [`MarginalTrek`] (which
//! itself hands out single-element configurations in probability order).
//! Popping the best configuration pushes at most one successor per
//! dimension, and only for dimensions up to and including the first
//! nonzero index — the bounded-fanout rule that reaches every joint
//! configuration exactly once: each configuration's unique parent is
//! itself minus one at its first nonzero coordinate.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::generators::threshold::signature_offsets;
use crate::models::iso::Iso;
use crate::models::marginal::MarginalTrek;
use crate::traits::PeakGenerator;
use crate::utils::{
    ConfArena,
    ConfId,
};

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    lprob: f64,
    seq: u64,
    id: ConfId,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.lprob == other.lprob && self.seq == other.seq
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lprob
            .partial_cmp(&other.lprob)
            .unwrap()
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

pub struct OrderedGenerator {
    dim: usize,
    treks: Vec<MarginalTrek>,
    heap: BinaryHeap<HeapEntry>,
    arena: ConfArena,
    next_seq: u64,
    /// per-dimension trek indices of the current configuration
    current: Vec<u32>,
    current_lprob: f64,
    current_mass: f64,
    current_prob: f64,
    signature_offsets: Vec<usize>,
    signature_len: usize,
}

impl OrderedGenerator {
    pub fn new(iso: Iso) -> Self {
        let signature_offsets = signature_offsets(iso.isotope_numbers());
        let signature_len = iso.conf_signature_len();
        let (_isotope_numbers, marginals, mode_lprob) = iso.into_marginals();
        let dim = marginals.len();

        let mut treks: Vec<MarginalTrek> = marginals.into_iter().map(MarginalTrek::new).collect();
        for trek in &mut treks {
            let ok = trek.probe_configuration(0);
            debug_assert!(ok, "every marginal has at least its mode");
        }

        let mut arena = ConfArena::new(dim);
        let joint_mode = arena.alloc_zeroed();
        let mut heap = BinaryHeap::new();
        heap.push(HeapEntry {
            lprob: mode_lprob,
            seq: 0,
            id: joint_mode,
        });

        Self {
            dim,
            treks,
            heap,
            arena,
            next_seq: 1,
            current: vec![0; dim],
            current_lprob: f64::NAN,
            current_mass: f64::NAN,
            current_prob: f64::NAN,
            signature_offsets,
            signature_len,
        }
    }

    fn combined_lprob(&self, id: ConfId) -> f64 {
        let conf = self.arena.get(id);
        let mut acc = 0.0;
        for (j, &idx) in conf.iter().enumerate() {
            acc += self.treks[j].lprob(idx as usize);
        }
        acc
    }
}

impl PeakGenerator for OrderedGenerator {
    fn advance(&mut self) -> bool {
        let Some(top) = self.heap.pop() else {
            return false;
        };

        self.current.copy_from_slice(self.arena.get(top.id));
        self.current_lprob = top.lprob;
        self.current_prob = top.lprob.exp();
        self.current_mass = self
            .current
            .iter()
            .enumerate()
            .map(|(j, &idx)| self.treks[j].mass(idx as usize))
            .sum();

        // expand successors under the bounded-fanout rule; the popped
        // slot is recycled for the first one
        let mut reused_top_slot = false;
        for j in 0..self.dim {
            let next_idx = self.current[j] as usize + 1;
            if self.treks[j].probe_configuration(next_idx) {
                let id = if reused_top_slot {
                    let id = self.arena.alloc(&self.current);
                    self.arena.get_mut(id)[j] += 1;
                    id
                } else {
                    reused_top_slot = true;
                    self.arena.get_mut(top.id)[j] += 1;
                    top.id
                };
                let lprob = self.combined_lprob(id);
                self.heap.push(HeapEntry {
                    lprob,
                    seq: self.next_seq,
                    id,
                });
                self.next_seq += 1;
            }
            if self.current[j] > 0 {
                break;
            }
        }
        true
    }

    fn mass(&self) -> f64 {
        self.current_mass
    }

    fn lprob(&self) -> f64 {
        self.current_lprob
    }

    fn prob(&self) -> f64 {
        self.current_prob
    }

    fn signature_len(&self) -> usize {
        self.signature_len
    }

    fn write_conf_signature(&self, out: &mut Vec<u32>) {
        let base = out.len();
        out.resize(base + self.signature_len, 0);
        for (j, &idx) in self.current.iter().enumerate() {
            let offset = base + self.signature_offsets[j];
            let conf = self.treks[j].conf(idx as usize);
            out[offset..offset + conf.len()].copy_from_slice(conf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::iso::Iso;

    #[test]
    fn test_strictly_non_increasing() {
        let iso = Iso::from_formula("C10H16N2O4").unwrap();
        let mut generator = OrderedGenerator::new(iso);
        let mut previous = f64::INFINITY;
        for _ in 0..5000 {
            assert!(generator.advance());
            assert!(
                generator.lprob() <= previous + 1e-12,
                "order violated: {} after {}",
                generator.lprob(),
                previous
            );
            previous = generator.lprob();
        }
    }

    #[test]
    fn test_first_is_mode() {
        let iso = Iso::from_formula("C2H6O1").unwrap();
        let mode_lprob = iso.mode_lprob();
        let mut generator = OrderedGenerator::new(iso);
        assert!(generator.advance());
        assert!((generator.lprob() - mode_lprob).abs() < 1e-9);
    }

    #[test]
    fn test_exhaustive_and_duplicate_free() {
        let iso = Iso::from_formula("C3H4O2").unwrap();
        // 4 * 5 * C(2+2,2) = 4 * 5 * 6 = 120 configurations
        let expected = 4 * 5 * 6;
        let mut generator = OrderedGenerator::new(iso);
        let mut signatures = Vec::new();
        let mut total = 0.0;
        while generator.advance() {
            let mut sig = Vec::new();
            generator.write_conf_signature(&mut sig);
            signatures.push(sig);
            total += generator.prob();
        }
        assert_eq!(signatures.len(), expected);
        signatures.sort();
        signatures.dedup();
        assert_eq!(signatures.len(), expected, "duplicate configurations");
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_dimension_matches_trek_order() {
        let iso = Iso::from_formula("O20").unwrap();
        let mut generator = OrderedGenerator::new(iso);
        let mut previous = f64::INFINITY;
        let mut count = 0;
        while generator.advance() {
            assert!(generator.lprob() <= previous + 1e-12);
            previous = generator.lprob();
            count += 1;
        }
        // 3 isotopes, 20 atoms: C(22, 2) = 231
        assert_eq!(count, 231);
    }
}
