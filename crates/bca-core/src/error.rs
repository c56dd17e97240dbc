//! Error types for BCa bootstrap analysis
//!
//! Provides a unified error type for all bca-stats crates. Only structural
//! failures surface here; per-replicate and per-alpha problems are reported
//! as diagnostics on the analysis result instead.

use thiserror::Error;

/// Core error type for bootstrap operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Insufficient data for the requested operation
    #[error("Insufficient data: expected at least {expected} samples, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// Too many estimator evaluations failed to trust the bootstrap distribution
    #[error("Estimator failure: {failed} of {total} evaluations failed (limit {max_fraction})")]
    EstimatorFailure {
        failed: usize,
        total: usize,
        max_fraction: f64,
    },

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Threading or parallelization error
    #[error("Execution error: {0}")]
    Execution(String),

    /// The analysis was cancelled or ran out of its time budget
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Create an error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::Computation(format!("{context} contains NaN or infinite values"))
    }

    /// Create an error for an alpha level outside (0, 1)
    pub fn invalid_alpha(alpha: f64) -> Self {
        Self::InvalidParameter(format!("Alpha {alpha} must be in (0, 1)"))
    }
}
