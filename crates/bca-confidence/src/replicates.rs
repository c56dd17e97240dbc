//! Estimator evaluation on the original data, on every bootstrap resample and
//! on every leave-one-out subset

use crate::resampling::CountMatrix;
use crate::statistic::Statistic;
use bca_core::{CancellationToken, Error, ExecutionEngine, Result};
use tracing::{debug, warn};

/// Replicate statistics that survived evaluation
///
/// `values[k]` was computed from count row `rows[k]`, so the alignment
/// between replicates and the resampling design is preserved after failed
/// replicates are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicateSet {
    pub values: Vec<f64>,
    pub rows: Vec<usize>,
    pub failed: usize,
    pub total: usize,
}

impl ReplicateSet {
    /// Screen precomputed replicate statistics, dropping non-finite values
    /// under the same failure threshold as live evaluation
    pub fn screen(values: &[f64], max_failure_fraction: f64) -> Result<Self> {
        let total = values.len();
        let (rows, kept): (Vec<usize>, Vec<f64>) = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(b, &v)| (b, v))
            .unzip();

        let failed = total - kept.len();
        enforce_threshold(failed, total, max_failure_fraction)?;
        if failed > 0 {
            warn!(failed, total, "excluded non-finite replicate statistics");
        }

        Ok(Self {
            values: kept,
            rows,
            failed,
            total,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Applies a [`Statistic`] across resamples using an execution engine
#[derive(Debug, Clone)]
pub struct ReplicateEvaluator<E> {
    engine: E,
    max_failure_fraction: f64,
    cancellation: Option<CancellationToken>,
}

impl<E: ExecutionEngine> ReplicateEvaluator<E> {
    pub fn new(engine: E, max_failure_fraction: f64) -> Self {
        Self {
            engine,
            max_failure_fraction,
            cancellation: None,
        }
    }

    /// Check `token` before every estimator invocation
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    fn check_cancelled(&self, context: &str) -> Result<()> {
        match &self.cancellation {
            Some(token) => token.check(context),
            None => Ok(()),
        }
    }

    /// Statistic on the full observation set; any failure is fatal
    pub fn point_estimate<T, S>(&self, data: &[T], statistic: &S) -> Result<f64>
    where
        T: Clone + Sync,
        S: Statistic<T> + ?Sized,
    {
        self.check_cancelled("point estimate")?;
        let value = statistic.evaluate(data)?;
        if !value.is_finite() {
            return Err(Error::non_finite("point estimate"));
        }
        Ok(value)
    }

    /// Statistic on every row of `counts`
    ///
    /// Failed or non-finite evaluations are excluded and counted. When the
    /// failed fraction exceeds the configured maximum the whole call fails
    /// with [`Error::EstimatorFailure`].
    pub fn replicates<T, S>(
        &self,
        data: &[T],
        statistic: &S,
        counts: &CountMatrix,
    ) -> Result<ReplicateSet>
    where
        T: Clone + Sync,
        S: Statistic<T> + ?Sized,
    {
        if counts.n_observations() != data.len() {
            return Err(Error::size_mismatch(
                data.len(),
                counts.n_observations(),
                "count matrix columns",
            ));
        }

        let total = counts.n_replicates();
        let outcomes = self.engine.execute_batch(total, |b| {
            self.check_cancelled("bootstrap replicates")?;
            statistic.evaluate_counts(data, counts.row(b))
        });

        let mut values = Vec::with_capacity(total);
        let mut rows = Vec::with_capacity(total);
        for (b, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(value) if value.is_finite() => {
                    values.push(value);
                    rows.push(b);
                }
                Ok(_) => {}
                Err(err @ Error::Cancelled(_)) => return Err(err),
                Err(err) => debug!("replicate {} failed: {}", b, err),
            }
        }

        let failed = total - values.len();
        enforce_threshold(failed, total, self.max_failure_fraction)?;
        if failed > 0 {
            warn!(failed, total, "excluded failed bootstrap replicates");
        }

        Ok(ReplicateSet {
            values,
            rows,
            failed,
            total,
        })
    }

    /// Leave-one-out statistics, one per observation
    ///
    /// Each subset is passed as a count vector with a zero at the left-out
    /// position so weighted statistics avoid copying. Influence values are
    /// not defined with gaps, so any failed evaluation makes the whole set
    /// an `EstimatorFailure`; the driver then estimates the acceleration by
    /// regression instead.
    pub fn jackknife<T, S>(&self, data: &[T], statistic: &S) -> Result<Vec<f64>>
    where
        T: Clone + Sync,
        S: Statistic<T> + ?Sized,
    {
        let n = data.len();
        if n < 2 {
            return Err(Error::InvalidParameter(format!(
                "Sample size must be at least 2, got {n}"
            )));
        }

        let outcomes = self.engine.execute_batch(n, |i| {
            self.check_cancelled("jackknife")?;
            let mut counts = vec![1u32; n];
            counts[i] = 0;
            statistic.evaluate_counts(data, &counts)
        });

        let mut values = Vec::with_capacity(n);
        let mut failed = 0;
        for outcome in outcomes {
            match outcome {
                Ok(value) if value.is_finite() => values.push(value),
                Err(err @ Error::Cancelled(_)) => return Err(err),
                _ => failed += 1,
            }
        }

        if failed > 0 {
            return Err(Error::EstimatorFailure {
                failed,
                total: n,
                max_fraction: 0.0,
            });
        }
        Ok(values)
    }
}

fn enforce_threshold(failed: usize, total: usize, max_fraction: f64) -> Result<()> {
    if total == 0 || failed as f64 / total as f64 > max_fraction {
        return Err(Error::EstimatorFailure {
            failed,
            total,
            max_fraction,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistic::{Fallible, Mean};
    use bca_core::sequential;

    fn counts() -> CountMatrix {
        CountMatrix::from_rows(vec![
            vec![1, 1, 1, 1],
            vec![4, 0, 0, 0],
            vec![0, 0, 0, 4],
            vec![2, 2, 0, 0],
        ])
        .unwrap()
    }

    #[test]
    fn test_replicates_follow_count_rows() {
        let evaluator = ReplicateEvaluator::new(sequential(), 0.5);
        let data = [1.0, 2.0, 3.0, 10.0];
        let set = evaluator.replicates(&data, &Mean, &counts()).unwrap();

        assert_eq!(set.values, vec![4.0, 1.0, 10.0, 1.5]);
        assert_eq!(set.rows, vec![0, 1, 2, 3]);
        assert_eq!(set.failed, 0);
    }

    #[test]
    fn test_failed_replicates_are_excluded() {
        // Fails whenever the largest observation is absent
        let stat = Fallible(|xs: &[f64]| {
            if xs.contains(&10.0) {
                Ok(xs.iter().sum::<f64>())
            } else {
                Err(Error::Computation("no large value".to_string()))
            }
        });
        let evaluator = ReplicateEvaluator::new(sequential(), 0.5);
        let data = [1.0, 2.0, 3.0, 10.0];
        let set = evaluator.replicates(&data, &stat, &counts()).unwrap();

        assert_eq!(set.rows, vec![0, 2]);
        assert_eq!(set.values, vec![16.0, 40.0]);
        assert_eq!(set.failed, 2);
        assert_eq!(set.total, 4);

        let strict = ReplicateEvaluator::new(sequential(), 0.25);
        assert!(matches!(
            strict.replicates(&data, &stat, &counts()),
            Err(Error::EstimatorFailure { failed: 2, total: 4, .. })
        ));
    }

    #[test]
    fn test_non_finite_counts_as_failure() {
        let stat = |xs: &[f64]| if xs[0] > 1.0 { f64::NAN } else { xs[0] };
        let evaluator = ReplicateEvaluator::new(sequential(), 0.5);
        let set = evaluator
            .replicates(&[1.0, 2.0, 3.0, 10.0], &stat, &counts())
            .unwrap();
        assert_eq!(set.rows, vec![0, 1, 3]);
    }

    #[test]
    fn test_screen_precomputed_values() {
        let set = ReplicateSet::screen(&[1.0, f64::NAN, 3.0, f64::INFINITY], 0.5).unwrap();
        assert_eq!(set.values, vec![1.0, 3.0]);
        assert_eq!(set.rows, vec![0, 2]);
        assert_eq!(set.failed, 2);
        assert!(ReplicateSet::screen(&[1.0, f64::NAN, f64::NAN], 0.5).is_err());
        assert!(ReplicateSet::screen(&[], 0.5).is_err());
    }

    #[test]
    fn test_jackknife_leaves_one_out() {
        let evaluator = ReplicateEvaluator::new(sequential(), 0.5);
        let jack = evaluator.jackknife(&[1.0, 2.0, 3.0], &Mean).unwrap();
        assert_eq!(jack, vec![2.5, 2.0, 1.5]);

        let closure = |xs: &[f64]| xs.len() as f64;
        assert_eq!(
            evaluator.jackknife(&[5.0, 6.0, 7.0], &closure).unwrap(),
            vec![2.0, 2.0, 2.0]
        );
        assert!(evaluator.jackknife(&[1.0], &Mean).is_err());
    }

    #[test]
    fn test_cancelled_token_aborts() {
        let token = CancellationToken::new();
        token.cancel();
        let evaluator = ReplicateEvaluator::new(sequential(), 0.5).with_cancellation(token);
        assert!(matches!(
            evaluator.replicates(&[1.0, 2.0, 3.0, 4.0], &Mean, &counts()),
            Err(Error::Cancelled(_))
        ));
        assert!(matches!(
            evaluator.point_estimate(&[1.0, 2.0], &Mean),
            Err(Error::Cancelled(_))
        ));
    }

    #[test]
    fn test_point_estimate_rejects_non_finite() {
        let evaluator = ReplicateEvaluator::new(sequential(), 0.5);
        let inf = |_: &[f64]| f64::INFINITY;
        assert!(evaluator.point_estimate(&[1.0, 2.0], &inf).is_err());
        assert_eq!(evaluator.point_estimate(&[1.0, 3.0], &Mean).unwrap(), 2.0);
    }
}
