use lfcal_core::Real;
use thiserror::Error;

/// Failures of the flat parameter encoding.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    #[error("parameter vector has {actual} entries, layout expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("block {index} is `{found}`, layout expects `{expected}`")]
    BlockMismatch {
        index: usize,
        expected: String,
        found: String,
    },
    #[error("missing parameter block `{0}`")]
    MissingBlock(String),
    #[error("invalid bounds at parameter {index}: [{lower}, {upper}]")]
    InvalidBounds {
        index: usize,
        lower: Real,
        upper: Real,
    },
}

/// Failures of a refinement run.
#[derive(Debug, Error)]
pub enum RefineError {
    #[error("no valid observations in the refinement range")]
    NoValidObservations,
    #[error("observation count mismatch: expected {expected}, got {actual}")]
    ObservationCountMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
