//! Error types for the sim crate.

use thiserror::Error;

/// Failure category of a [`SimError`].
///
/// Everything except [`ErrorKind::Persistence`] is fatal to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid parameters or input; raised before the loop starts.
    Configuration,
    /// Propagator non-convergence or non-finite amplitudes.
    Numerical,
    /// Measurement probabilities fail to normalize.
    Distribution,
    /// Checkpoint write failure.
    Persistence,
}

/// Errors produced by quantum-walk simulation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// A configuration value is out of its allowed domain.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The genotype space has no nodes.
    #[error("Genotype space is empty — nothing to walk on")]
    EmptyGenotypeSpace,

    /// The genotype space description is malformed.
    #[error("Invalid genotype space: {0}")]
    InvalidGenotypeSpace(String),

    /// A genotype index is outside `0..size`.
    #[error("Genotype {index} is out of range for a space of {size} genotypes")]
    GenotypeOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of genotypes in the space.
        size: usize,
    },

    /// A vector does not match the dimension of the generator.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Dimension of the generator matrix.
        expected: usize,
        /// Length of the supplied vector.
        found: usize,
    },

    /// The truncated Taylor series did not reach tolerance.
    #[error("Matrix exponential action did not converge within {max_terms} terms")]
    NotConverged {
        /// Term budget per sub-step.
        max_terms: usize,
    },

    /// A NaN or infinity appeared in a state vector.
    #[error("Non-finite value encountered: {0}")]
    NonFinite(String),

    /// Born-rule probabilities do not sum to one.
    #[error("Measurement probabilities sum to {total}, expected 1 (tolerance {tolerance})")]
    Unnormalized {
        /// Observed probability mass.
        total: f64,
        /// Accepted deviation from one.
        tolerance: f64,
    },

    /// Measurement was requested over an empty basis.
    #[error("Measurement basis is empty")]
    EmptyBasis,

    /// The checkpoint sink rejected a snapshot.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// IO error while persisting.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error while persisting.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    /// The failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimError::InvalidConfig(_)
            | SimError::EmptyGenotypeSpace
            | SimError::InvalidGenotypeSpace(_)
            | SimError::GenotypeOutOfRange { .. } => ErrorKind::Configuration,
            SimError::DimensionMismatch { .. }
            | SimError::NotConverged { .. }
            | SimError::NonFinite(_) => ErrorKind::Numerical,
            SimError::Unnormalized { .. } | SimError::EmptyBasis => ErrorKind::Distribution,
            SimError::Persistence(_) | SimError::Io(_) | SimError::Json(_) => {
                ErrorKind::Persistence
            }
        }
    }

    /// Only persistence failures are recovered by the simulation loop.
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::Persistence
    }
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
