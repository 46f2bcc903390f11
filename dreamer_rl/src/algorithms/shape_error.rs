//! Input-contract violations for the tensor algorithms.

use thiserror::Error;

/// Shape or argument violation detected before any tensor math runs.
///
/// These are unrecoverable caller errors: inputs are never truncated or
/// padded to make them fit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    /// Trailing dimension cannot be split into `discrete`-sized categories.
    #[error("trailing dimension {trailing} is not divisible by discrete size {discrete}")]
    NotDivisible { trailing: usize, discrete: usize },

    /// Requested output rank does not equal input rank + 1.
    #[error("output rank must be input rank + 1, got input {input} and output {output}")]
    RankMismatch { input: usize, output: usize },

    /// Two tensors that must agree on their trailing dimensions do not.
    #[error("{name} has trailing shape {actual:?}, expected {expected:?}")]
    TrailingMismatch {
        name: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A sequence is shorter than the requested horizon.
    #[error("{name} has {len} time steps, horizon needs {horizon}")]
    TooShort {
        name: &'static str,
        len: usize,
        horizon: usize,
    },

    /// Bootstrap must cover exactly one time step.
    #[error("bootstrap must have a leading dimension of 1, got {0}")]
    BootstrapSteps(usize),

    /// Scalar argument outside its valid domain.
    #[error("invalid argument {name}: {reason}")]
    InvalidArgument {
        name: &'static str,
        reason: String,
    },
}
