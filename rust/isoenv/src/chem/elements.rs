//! Built-in isotope table.
//!
//! Per element: stable isotope nucleon numbers, exact masses (Da) and
//! natural abundances (CIAAW/NIST values). Covers the elements that show
//! up in biomolecules and common labeling/buffer chemistry; callers with
//! exotic isotope tables go through `Iso::from_parts` instead.

#[derive(Debug, Clone, Copy)]
pub struct ElementRecord {
    pub symbol: &'static str,
    pub atomic_number: u32,
    pub nucleon_numbers: &'static [u32],
    pub masses: &'static [f64],
    pub abundances: &'static [f64],
}

impl ElementRecord {
    pub fn isotope_count(&self) -> usize {
        self.masses.len()
    }

    /// Index of the most abundant isotope.
    pub fn most_abundant_index(&self) -> usize {
        let mut best = 0;
        for (i, &a) in self.abundances.iter().enumerate() {
            if a > self.abundances[best] {
                best = i;
            }
        }
        best
    }
}

pub static PERIODIC_TABLE: &[ElementRecord] = &[
    ElementRecord {
        symbol: "H",
        atomic_number: 1,
        nucleon_numbers: &[1, 2],
        masses: &[1.00782503207, 2.01410177785],
        abundances: &[0.999885, 0.000115],
    },
    ElementRecord {
        symbol: "Li",
        atomic_number: 3,
        nucleon_numbers: &[6, 7],
        masses: &[6.0151228874, 7.0160034366],
        abundances: &[0.0759, 0.9241],
    },
    ElementRecord {
        symbol: "B",
        atomic_number: 5,
        nucleon_numbers: &[10, 11],
        masses: &[10.01293695, 11.00930536],
        abundances: &[0.199, 0.801],
    },
    ElementRecord {
        symbol: "C",
        atomic_number: 6,
        nucleon_numbers: &[12, 13],
        masses: &[12.0, 13.00335483507],
        abundances: &[0.9893, 0.0107],
    },
    ElementRecord {
        symbol: "N",
        atomic_number: 7,
        nucleon_numbers: &[14, 15],
        masses: &[14.00307400443, 15.00010889888],
        abundances: &[0.99636, 0.00364],
    },
    ElementRecord {
        symbol: "O",
        atomic_number: 8,
        nucleon_numbers: &[16, 17, 18],
        masses: &[15.99491461957, 16.99913175650, 17.99915961286],
        abundances: &[0.99757, 0.00038, 0.00205],
    },
    ElementRecord {
        symbol: "F",
        atomic_number: 9,
        nucleon_numbers: &[19],
        masses: &[18.99840316273],
        abundances: &[1.0],
    },
    ElementRecord {
        symbol: "Na",
        atomic_number: 11,
        nucleon_numbers: &[23],
        masses: &[22.9897692820],
        abundances: &[1.0],
    },
    ElementRecord {
        symbol: "Mg",
        atomic_number: 12,
        nucleon_numbers: &[24, 25, 26],
        masses: &[23.985041697, 24.985836976, 25.982592968],
        abundances: &[0.7899, 0.1000, 0.1101],
    },
    ElementRecord {
        symbol: "Al",
        atomic_number: 13,
        nucleon_numbers: &[27],
        masses: &[26.98153853],
        abundances: &[1.0],
    },
    ElementRecord {
        symbol: "Si",
        atomic_number: 14,
        nucleon_numbers: &[28, 29, 30],
        masses: &[27.97692653465, 28.97649466490, 29.973770136],
        abundances: &[0.92223, 0.04685, 0.03092],
    },
    ElementRecord {
        symbol: "P",
        atomic_number: 15,
        nucleon_numbers: &[31],
        masses: &[30.97376199842],
        abundances: &[1.0],
    },
    ElementRecord {
        symbol: "S",
        atomic_number: 16,
        nucleon_numbers: &[32, 33, 34, 36],
        masses: &[31.9720711744, 32.9714589098, 33.967867004, 35.96708071],
        abundances: &[0.9499, 0.0075, 0.0425, 0.0001],
    },
    ElementRecord {
        symbol: "Cl",
        atomic_number: 17,
        nucleon_numbers: &[35, 37],
        masses: &[34.968852682, 36.965902602],
        abundances: &[0.7576, 0.2424],
    },
    ElementRecord {
        symbol: "K",
        atomic_number: 19,
        nucleon_numbers: &[39, 40, 41],
        masses: &[38.9637064864, 39.963998166, 40.9618252579],
        abundances: &[0.932581, 0.000117, 0.067302],
    },
    ElementRecord {
        symbol: "Ca",
        atomic_number: 20,
        nucleon_numbers: &[40, 42, 43, 44, 46, 48],
        masses: &[
            39.962590863,
            41.95861783,
            42.95876644,
            43.95548156,
            45.9536890,
            47.95252276,
        ],
        abundances: &[0.96941, 0.00647, 0.00135, 0.02086, 0.00004, 0.00187],
    },
    ElementRecord {
        symbol: "Fe",
        atomic_number: 26,
        nucleon_numbers: &[54, 56, 57, 58],
        masses: &[53.93960899, 55.93493633, 56.93539284, 57.93327443],
        abundances: &[0.05845, 0.91754, 0.02119, 0.00282],
    },
    ElementRecord {
        symbol: "Ni",
        atomic_number: 28,
        nucleon_numbers: &[58, 60, 61, 62, 64],
        masses: &[
            57.93534241,
            59.93078588,
            60.93105557,
            61.92834537,
            63.92796682,
        ],
        abundances: &[0.68077, 0.26223, 0.011399, 0.036346, 0.009255],
    },
    ElementRecord {
        symbol: "Cu",
        atomic_number: 29,
        nucleon_numbers: &[63, 65],
        masses: &[62.92959772, 64.92778970],
        abundances: &[0.6915, 0.3085],
    },
    ElementRecord {
        symbol: "Zn",
        atomic_number: 30,
        nucleon_numbers: &[64, 66, 67, 68, 70],
        masses: &[
            63.92914201,
            65.92603381,
            66.92712775,
            67.92484455,
            69.9253192,
        ],
        abundances: &[0.4917, 0.2773, 0.0404, 0.1845, 0.0061],
    },
    ElementRecord {
        symbol: "Se",
        atomic_number: 34,
        nucleon_numbers: &[74, 76, 77, 78, 80, 82],
        masses: &[
            73.922475934,
            75.919213704,
            76.919914154,
            77.91730928,
            79.9165218,
            81.9166995,
        ],
        abundances: &[0.0089, 0.0937, 0.0763, 0.2377, 0.4961, 0.0873],
    },
    ElementRecord {
        symbol: "Br",
        atomic_number: 35,
        nucleon_numbers: &[79, 81],
        masses: &[78.9183376, 80.9162897],
        abundances: &[0.5069, 0.4931],
    },
    ElementRecord {
        symbol: "I",
        atomic_number: 53,
        nucleon_numbers: &[127],
        masses: &[126.9044719],
        abundances: &[1.0],
    },
];

pub fn by_symbol(symbol: &str) -> Option<&'static ElementRecord> {
    PERIODIC_TABLE.iter().find(|rec| rec.symbol == symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(by_symbol("C").unwrap().atomic_number, 6);
        assert_eq!(by_symbol("Se").unwrap().isotope_count(), 6);
        assert!(by_symbol("Xx").is_none());
    }

    #[test]
    fn test_abundances_sum_to_one() {
        for rec in PERIODIC_TABLE {
            let total: f64 = rec.abundances.iter().sum();
            assert!(
                (total - 1.0).abs() < 1e-3,
                "{} abundances sum to {}",
                rec.symbol,
                total
            );
            assert_eq!(rec.masses.len(), rec.abundances.len());
            assert_eq!(rec.masses.len(), rec.nucleon_numbers.len());
        }
    }

    #[test]
    fn test_most_abundant() {
        assert_eq!(by_symbol("H").unwrap().most_abundant_index(), 0);
        // Se-80 is the dominant selenium isotope
        assert_eq!(by_symbol("Se").unwrap().most_abundant_index(), 4);
    }
}
