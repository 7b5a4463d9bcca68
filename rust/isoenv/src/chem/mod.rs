pub mod elements;
pub mod formula;
pub mod peptide;

pub use elements::{
    by_symbol,
    ElementRecord,
    PERIODIC_TABLE,
};
pub use formula::parse_formula;
