use thiserror::Error;

/// Errors surfaced by envelope construction and the input-glue layer.
///
/// Everything here is a construction-time validation failure (or, for
/// [`IsoenvError::AllocationFailed`], a resource failure in the one spot
/// where the engine pre-sizes its output in a single reservation). The
/// generators themselves are infallible once built: a step either yields
/// the next configuration or reports exhaustion.
#[derive(Debug, Error)]
pub enum IsoenvError {
    #[error("invalid chemical formula '{formula}': {reason}")]
    InvalidFormula { formula: String, reason: String },

    #[error("isotope probability {value} outside the (0, 1] range")]
    InvalidIsotopeProbability { value: f64 },

    #[error("expected {expected} {what}, got {got}")]
    MismatchedArrayLengths {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("unknown residue '{0}' in amino acid sequence")]
    UnknownResidue(char),

    #[error(
        "envelopes are not normalized: total probabilities {left} and {right} \
         differ by more than 0.1%"
    )]
    NotNormalized { left: f64, right: f64 },

    #[error("failed to allocate storage for {confs} configurations")]
    AllocationFailed { confs: usize },
}

pub type Result<T> = std::result::Result<T, IsoenvError>;
