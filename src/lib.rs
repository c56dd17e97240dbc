//! BCa bootstrap confidence limits
//!
//! Umbrella crate re-exporting the workspace:
//!
//! - [`bca_core`]: errors, normal distribution and moment helpers, execution
//!   engines and cancellation
//! - [`bca_confidence`]: the BCa engine, its configuration and results
//!
//! # Example
//!
//! ```rust
//! use bca_stats::prelude::*;
//!
//! let data = [3.1, 4.7, 2.2, 8.9, 5.5, 3.3, 6.1, 2.8, 4.0, 7.2];
//! let result = bca_nonparametric(&data, &Mean, FAST_REPLICATES, Some(3)).unwrap();
//! let ci = result.interval(0.9).unwrap();
//! assert!(ci.lower < ci.upper);
//! ```

pub use bca_confidence;
pub use bca_core;

pub use bca_confidence::{
    bca_nonparametric, bca_parametric, BcaBootstrap, BcaConfig, BcaResult, ConfidenceInterval,
    Statistic,
};
pub use bca_core::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use bca_confidence::api::{
        bca_nonparametric, bca_parametric, DEFAULT_REPLICATES, FAST_REPLICATES,
        HIGH_PRECISION_REPLICATES,
    };
    pub use bca_confidence::{
        AccelerationMethod, BcaBootstrap, BcaConfig, BcaResult, Correlation, Diagnostic,
        DiagnosticFlags, Fallible, InternalSeMethod, Mean, QuantileInterpolation, Statistic,
        SufficientStatistics,
    };
    pub use bca_core::prelude::*;
}
