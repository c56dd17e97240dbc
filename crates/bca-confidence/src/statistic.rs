//! The estimator interface evaluated on the original data, on each
//! bootstrap resample and on each leave-one-out subset

use crate::resampling::expand_counts;
use bca_core::{Error, Result};

/// A real-valued statistic of a sample
///
/// Implementations must be deterministic for a fixed input. A failure, or a
/// non-finite value, on a single resample excludes that replicate instead of
/// aborting the analysis.
pub trait Statistic<T>: Send + Sync {
    /// Evaluate the statistic on a sample
    fn evaluate(&self, sample: &[T]) -> Result<f64>;

    /// Evaluate on `observations` where observation `i` appears `counts[i]`
    /// times
    ///
    /// The default materialises the resample. Statistics with a natural
    /// weighted form should override this to skip the copy.
    fn evaluate_counts(&self, observations: &[T], counts: &[u32]) -> Result<f64>
    where
        T: Clone,
    {
        if counts.len() != observations.len() {
            return Err(Error::size_mismatch(
                observations.len(),
                counts.len(),
                "resampling counts",
            ));
        }
        let resample: Vec<T> = expand_counts(counts)
            .into_iter()
            .map(|i| observations[i].clone())
            .collect();
        self.evaluate(&resample)
    }
}

impl<T, F> Statistic<T> for F
where
    F: Fn(&[T]) -> f64 + Send + Sync,
{
    fn evaluate(&self, sample: &[T]) -> Result<f64> {
        Ok(self(sample))
    }
}

/// Adapter for closures that can fail
///
/// ```rust
/// use bca_confidence::{Fallible, Statistic};
/// use bca_core::Error;
///
/// let ratio = Fallible(|xs: &[(f64, f64)]| {
///     let den: f64 = xs.iter().map(|p| p.1).sum();
///     if den == 0.0 {
///         return Err(Error::Computation("zero denominator".to_string()));
///     }
///     Ok(xs.iter().map(|p| p.0).sum::<f64>() / den)
/// });
/// assert_eq!(ratio.evaluate(&[(1.0, 2.0), (3.0, 2.0)]).unwrap(), 1.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Fallible<F>(pub F);

impl<T, F> Statistic<T> for Fallible<F>
where
    F: Fn(&[T]) -> Result<f64> + Send + Sync,
{
    fn evaluate(&self, sample: &[T]) -> Result<f64> {
        (self.0)(sample)
    }
}

/// Arithmetic mean
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

impl Statistic<f64> for Mean {
    fn evaluate(&self, sample: &[f64]) -> Result<f64> {
        if sample.is_empty() {
            return Err(Error::InvalidInput("Empty sample".to_string()));
        }
        Ok(sample.iter().sum::<f64>() / sample.len() as f64)
    }

    fn evaluate_counts(&self, observations: &[f64], counts: &[u32]) -> Result<f64> {
        if counts.len() != observations.len() {
            return Err(Error::size_mismatch(
                observations.len(),
                counts.len(),
                "resampling counts",
            ));
        }
        let total: u64 = counts.iter().map(|&c| c as u64).sum();
        if total == 0 {
            return Err(Error::InvalidInput("Empty sample".to_string()));
        }
        let weighted: f64 = observations
            .iter()
            .zip(counts)
            .map(|(&x, &c)| x * c as f64)
            .sum();
        Ok(weighted / total as f64)
    }
}

/// Pearson correlation of paired observations
#[derive(Debug, Clone, Copy, Default)]
pub struct Correlation;

impl Statistic<(f64, f64)> for Correlation {
    fn evaluate(&self, sample: &[(f64, f64)]) -> Result<f64> {
        if sample.len() < 2 {
            return Err(Error::InsufficientData {
                expected: 2,
                actual: sample.len(),
            });
        }
        let n = sample.len() as f64;
        let mx = sample.iter().map(|p| p.0).sum::<f64>() / n;
        let my = sample.iter().map(|p| p.1).sum::<f64>() / n;
        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        for &(x, y) in sample {
            let (dx, dy) = (x - mx, y - my);
            sxx += dx * dx;
            syy += dy * dy;
            sxy += dx * dy;
        }
        if sxx <= 0.0 || syy <= 0.0 {
            return Err(Error::Computation(
                "Correlation undefined for a constant margin".to_string(),
            ));
        }
        Ok(sxy / (sxx * syy).sqrt())
    }
}
