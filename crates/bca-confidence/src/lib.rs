//! Bias-corrected and accelerated (BCa) bootstrap confidence limits
//!
//! This crate turns a sample plus an estimator, or precomputed bootstrap
//! replicates plus their resampling design, into BCa confidence limits with
//! internal standard errors and diagnostics:
//!
//! - **Nonparametric**: multinomial resampling counts, replicate and
//!   jackknife evaluation, jackknife acceleration
//! - **Precomputed counts**: caller-supplied replicates aligned with their
//!   count rows
//! - **Parametric**: replicates regressed on sufficient statistics
//!
//! # Overview
//!
//! The BCa limit at level alpha is the replicate percentile
//! `Phi(z0 + (z0 + z_alpha) / (1 - a (z0 + z_alpha)))`, where z0 corrects
//! median bias and the acceleration `a` corrects for a standard error that
//! changes with the parameter. Standard normal-theory limits
//! `t0 + sd_boot * z_alpha` are reported alongside for comparison.
//!
//! # Examples
//!
//! ```rust
//! use bca_confidence::{BcaBootstrap, BcaConfig, Mean};
//! use bca_core::sequential;
//!
//! let data: Vec<f64> = (0..50).map(|i| ((i as f64) * 0.07).exp()).collect();
//! let config = BcaConfig::default()
//!     .with_replicates(1000)
//!     .with_confidence_levels(&[0.9, 0.95])
//!     .with_seed(42);
//!
//! let result = BcaBootstrap::new(sequential())
//!     .with_config(config)
//!     .nonparametric_seeded(&data, &Mean)
//!     .unwrap();
//!
//! let ci = result.interval(0.95).unwrap();
//! println!("{ci}");
//! println!("{result}");
//! ```

pub mod acceleration;
pub mod api;
mod bias;
mod bootstrap;
pub mod config;
mod design;
pub mod diagnostics;
pub mod internal_se;
pub mod limits;
mod replicates;
mod resampling;
mod result;
mod statistic;
mod types;

// Re-exports
pub use acceleration::{Acceleration, JackknifeAcceleration, RegressionFit};
pub use api::{bca_nonparametric, bca_parametric};
pub use bias::{BiasCorrection, BiasCorrector};
pub use bootstrap::BcaBootstrap;
pub use config::{
    AccelerationMethod, BcaConfig, InternalSeMethod, QuantileInterpolation, DEFAULT_ALPHAS,
    DEFAULT_REPLICATES, FAST_REPLICATES, HIGH_PRECISION_REPLICATES,
};
pub use design::{ResamplingDesign, ResamplingMode, SufficientStatistics};
pub use diagnostics::{Diagnostic, DiagnosticFlags, Diagnostics};
pub use internal_se::{jackknife_se, InternalErrors, SeInputs, StandardErrorEstimator};
pub use limits::{BcaParameters, LimitPoint, LimitSolver};
pub use replicates::{ReplicateEvaluator, ReplicateSet};
pub use resampling::{expand_counts, generate_counts, CountMatrix};
pub use result::{
    AssemblyParts, BcaResult, BcaStatistics, ExtendedDiagnostics, LimitRow, LimitsTable,
    RegressionStats, ResultAssembler, StatisticErrors, UStats,
};
pub use statistic::{Correlation, Fallible, Mean, Statistic};
pub use types::{ConfidenceInterval, ConfidenceLevel};
