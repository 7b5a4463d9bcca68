#![doc = include_str!("../README.md")]

// Declare modules
pub mod batch;
pub mod chem;
pub mod errors;
pub mod generators;
pub mod models;
pub mod traits;
pub mod utils;

// Re-export main structures
pub use crate::models::envelope::{
    CoverageConfig,
    FixedEnvelope,
    ThresholdConfig,
};
pub use crate::models::iso::Iso;

pub use crate::generators::{
    LayeredGenerator,
    OrderedGenerator,
    StochasticGenerator,
    ThresholdGenerator,
};

// Re-export traits
pub use crate::traits::PeakGenerator;

// Re-export errors
pub use crate::errors::{
    IsoenvError,
    Result,
};
