pub mod envelope;
pub mod iso;
pub mod marginal;

pub use envelope::{
    CoverageConfig,
    FixedEnvelope,
    ThresholdConfig,
};
pub use iso::Iso;
pub use marginal::{
    LayeredMarginal,
    Marginal,
    MarginalTrek,
    PrecalculatedMarginal,
};
