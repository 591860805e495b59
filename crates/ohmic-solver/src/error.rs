//! Error types for ohmic-solver.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("circuit matrix is singular")]
    SingularMatrix,

    #[error("invalid matrix dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("no convergence after {iterations} iterations")]
    ConvergenceFailed { iterations: usize },

    #[error("no ground node detected")]
    NoGround,

    #[error("no AC source found")]
    NoAcSource,

    #[error("circuit has no unknowns to solve for")]
    EmptyCircuit,

    #[error("timestep fell below minimum at t = {time:e} s")]
    TimestepUnderflow { time: f64 },

    #[error("sweep requires at least two points and a positive step")]
    DegenerateSweep,

    #[error(transparent)]
    Circuit(#[from] ohmic_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
