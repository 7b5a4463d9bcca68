use crate::chem::elements::ElementRecord;
use crate::chem::formula::parse_formula;
use crate::chem::peptide::{
    sequence_composition,
    RESIDUE_ELEMENT_SYMBOLS,
};
use crate::chem::by_symbol;
use crate::errors::{
    IsoenvError,
    Result,
};
use crate::models::marginal::Marginal;

/// The chemical description a generator runs on: one [`Marginal`] per
/// element plus the bookkeeping shared by all generators.
///
/// An `Iso` is consumed by value when a generator is built, so a spent
/// description cannot be reused by accident — there is no "disowned"
/// state to check for at runtime.
#[derive(Debug, Clone)]
pub struct Iso {
    isotope_numbers: Vec<usize>,
    atom_counts: Vec<u32>,
    marginals: Vec<Marginal>,
    mode_lprob: f64,
}

impl Iso {
    /// Build from a formula string like `"C2H6O1"` using the built-in
    /// isotope table.
    pub fn from_formula(formula: &str) -> Result<Self> {
        Self::from_element_pairs(&parse_formula(formula)?, false)
    }

    /// Like [`Iso::from_formula`] but substituting integer nucleon counts
    /// for the exact isotope masses, for nominal-mass workflows.
    pub fn from_formula_nominal(formula: &str) -> Result<Self> {
        Self::from_element_pairs(&parse_formula(formula)?, true)
    }

    /// Build from an amino acid sequence, reducing residues to elemental
    /// counts. `add_water` accounts for the peptide's terminal H2O.
    pub fn from_fasta(sequence: &str, add_water: bool) -> Result<Self> {
        let composition = sequence_composition(sequence, add_water)?;
        let pairs: Vec<(&'static ElementRecord, u32)> = RESIDUE_ELEMENT_SYMBOLS
            .iter()
            .zip(composition.iter())
            .filter(|(_, &count)| count > 0)
            .map(|(symbol, &count)| {
                let record = by_symbol(symbol).expect("residue table only names known elements");
                (record, count)
            })
            .collect();
        if pairs.is_empty() {
            return Err(IsoenvError::InvalidFormula {
                formula: sequence.to_string(),
                reason: "empty sequence".to_string(),
            });
        }
        Self::from_element_pairs(&pairs, false)
    }

    /// Build from caller-supplied isotope data, one masses/probabilities
    /// pair per element. Used for custom labeling schemes where the
    /// built-in table does not apply.
    pub fn from_parts(
        atom_counts: &[u32],
        isotope_masses: &[Vec<f64>],
        isotope_probabilities: &[Vec<f64>],
    ) -> Result<Self> {
        if atom_counts.is_empty() {
            return Err(IsoenvError::MismatchedArrayLengths {
                what: "elements",
                expected: 1,
                got: 0,
            });
        }
        if isotope_masses.len() != atom_counts.len() {
            return Err(IsoenvError::MismatchedArrayLengths {
                what: "isotope mass arrays",
                expected: atom_counts.len(),
                got: isotope_masses.len(),
            });
        }
        if isotope_probabilities.len() != atom_counts.len() {
            return Err(IsoenvError::MismatchedArrayLengths {
                what: "isotope probability arrays",
                expected: atom_counts.len(),
                got: isotope_probabilities.len(),
            });
        }

        let mut marginals = Vec::with_capacity(atom_counts.len());
        for ((&count, masses), probs) in atom_counts
            .iter()
            .zip(isotope_masses.iter())
            .zip(isotope_probabilities.iter())
        {
            marginals.push(Marginal::new(masses.clone(), probs.clone(), count)?);
        }
        Ok(Self::from_marginals(atom_counts.to_vec(), marginals))
    }

    fn from_element_pairs(pairs: &[(&'static ElementRecord, u32)], nominal: bool) -> Result<Self> {
        let mut marginals = Vec::with_capacity(pairs.len());
        let mut atom_counts = Vec::with_capacity(pairs.len());
        for &(record, count) in pairs {
            let masses: Vec<f64> = if nominal {
                record.nucleon_numbers.iter().map(|&n| n as f64).collect()
            } else {
                record.masses.to_vec()
            };
            marginals.push(Marginal::new(masses, record.abundances.to_vec(), count)?);
            atom_counts.push(count);
        }
        Ok(Self::from_marginals(atom_counts, marginals))
    }

    fn from_marginals(atom_counts: Vec<u32>, marginals: Vec<Marginal>) -> Self {
        let isotope_numbers = marginals.iter().map(|m| m.isotope_count()).collect();
        let mode_lprob = marginals.iter().map(|m| m.mode_lprob()).sum();
        Self {
            isotope_numbers,
            atom_counts,
            marginals,
            mode_lprob,
        }
    }

    pub fn dim_number(&self) -> usize {
        self.marginals.len()
    }

    pub fn isotope_numbers(&self) -> &[usize] {
        &self.isotope_numbers
    }

    pub fn atom_counts(&self) -> &[u32] {
        &self.atom_counts
    }

    /// Length of a flattened configuration signature.
    pub fn conf_signature_len(&self) -> usize {
        self.isotope_numbers.iter().sum()
    }

    /// Log-probability of the joint mode configuration.
    pub fn mode_lprob(&self) -> f64 {
        self.mode_lprob
    }

    pub fn lightest_peak_mass(&self) -> f64 {
        self.marginals.iter().map(|m| m.lightest_conf_mass()).sum()
    }

    pub fn heaviest_peak_mass(&self) -> f64 {
        self.marginals.iter().map(|m| m.heaviest_conf_mass()).sum()
    }

    /// Mass with every atom on its element's most probable isotope.
    pub fn monoisotopic_peak_mass(&self) -> f64 {
        self.marginals
            .iter()
            .map(|m| m.monoisotopic_conf_mass())
            .sum()
    }

    pub(crate) fn into_marginals(self) -> (Vec<usize>, Vec<Marginal>, f64) {
        (self.isotope_numbers, self.marginals, self.mode_lprob)
    }
}
