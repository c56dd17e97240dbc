//! High-level API for BCa confidence limits
//!
//! Free functions running a full analysis with the default configuration
//! and the engine picked by [`auto_engine`].

use crate::bootstrap::BcaBootstrap;
use crate::config::BcaConfig;
use crate::design::SufficientStatistics;
use crate::result::BcaResult;
use crate::statistic::Statistic;
use bca_core::{auto_engine, Result};

pub use crate::config::{
    DEFAULT_ALPHAS, DEFAULT_REPLICATES, FAST_REPLICATES, HIGH_PRECISION_REPLICATES,
};

/// Nonparametric BCa limits for `statistic` on `data`
///
/// # Example
/// ```rust
/// use bca_confidence::api::{bca_nonparametric, FAST_REPLICATES};
/// use bca_confidence::Mean;
///
/// let data = [2.1, 3.4, 1.9, 5.6, 2.8, 4.4, 3.0, 2.2, 6.1, 3.3];
/// let result = bca_nonparametric(&data, &Mean, FAST_REPLICATES, Some(1)).unwrap();
/// assert_eq!(result.limits.len(), 9);
/// ```
pub fn bca_nonparametric<T, S>(
    data: &[T],
    statistic: &S,
    n_replicates: usize,
    seed: Option<u64>,
) -> Result<BcaResult>
where
    T: Clone + Sync,
    S: Statistic<T> + ?Sized,
{
    let mut config = BcaConfig::default().with_replicates(n_replicates);
    config.seed = seed;
    BcaBootstrap::new(auto_engine())
        .with_config(config)
        .nonparametric_seeded(data, statistic)
}

/// Parametric BCa limits from replicates and their sufficient statistics
pub fn bca_parametric(
    point_estimate: f64,
    replicates: &[f64],
    sufficient: SufficientStatistics,
) -> Result<BcaResult> {
    BcaBootstrap::new(auto_engine()).parametric(point_estimate, replicates, sufficient)
}
