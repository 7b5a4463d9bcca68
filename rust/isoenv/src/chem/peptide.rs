use crate::errors::{
    IsoenvError,
    Result,
};

/// Elemental composition in `[C, H, N, O, S, Se]` order.
pub type ResidueComposition = [u32; 6];

pub const RESIDUE_ELEMENT_SYMBOLS: [&str; 6] = ["C", "H", "N", "O", "S", "Se"];

/// Residue (amino acid minus water) composition for the 20 standard
/// residues plus selenocysteine.
pub fn residue_composition(residue: char) -> Option<ResidueComposition> {
    let comp = match residue {
        'G' => [2, 3, 1, 1, 0, 0],
        'A' => [3, 5, 1, 1, 0, 0],
        'S' => [3, 5, 1, 2, 0, 0],
        'P' => [5, 7, 1, 1, 0, 0],
        'V' => [5, 9, 1, 1, 0, 0],
        'T' => [4, 7, 1, 2, 0, 0],
        'C' => [3, 5, 1, 1, 1, 0],
        'L' | 'I' => [6, 11, 1, 1, 0, 0],
        'N' => [4, 6, 2, 2, 0, 0],
        'D' => [4, 5, 1, 3, 0, 0],
        'Q' => [5, 8, 2, 2, 0, 0],
        'K' => [6, 12, 2, 1, 0, 0],
        'E' => [5, 7, 1, 3, 0, 0],
        'M' => [5, 9, 1, 1, 1, 0],
        'H' => [6, 7, 3, 1, 0, 0],
        'F' => [9, 9, 1, 1, 0, 0],
        'R' => [6, 12, 4, 1, 0, 0],
        'Y' => [9, 9, 1, 2, 0, 0],
        'W' => [11, 10, 2, 1, 0, 0],
        'U' => [3, 5, 1, 1, 0, 1],
        _ => return None,
    };
    Some(comp)
}

/// Total elemental composition of an amino acid sequence.
///
/// `add_water` adds the terminal H2O of an intact peptide chain; leave it
/// off when the counts describe an internal fragment.
pub fn sequence_composition(sequence: &str, add_water: bool) -> Result<ResidueComposition> {
    let mut total: ResidueComposition = [0; 6];
    for residue in sequence.chars() {
        let comp = residue_composition(residue).ok_or(IsoenvError::UnknownResidue(residue))?;
        for (t, c) in total.iter_mut().zip(comp.iter()) {
            *t += c;
        }
    }
    if add_water {
        total[1] += 2;
        total[3] += 1;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_glycine_with_water() {
        // G + H2O = C2H5NO2
        let comp = sequence_composition("G", true).unwrap();
        assert_eq!(comp, [2, 5, 1, 2, 0, 0]);
    }

    #[test]
    fn test_dipeptide_counts_add() {
        let gg = sequence_composition("GG", false).unwrap();
        assert_eq!(gg, [4, 6, 2, 2, 0, 0]);
    }

    #[test]
    fn test_selenocysteine() {
        let comp = sequence_composition("U", false).unwrap();
        assert_eq!(comp[5], 1);
    }

    #[test]
    fn test_unknown_residue_fails() {
        assert!(sequence_composition("GXZ", false).is_err());
        assert!(sequence_composition("g", false).is_err());
    }
}
