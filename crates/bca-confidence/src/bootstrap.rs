//! BCa bootstrap driver
//!
//! [`BcaBootstrap`] wires the components together:
//!
//! 1. resampling counts and replicate statistics (nonparametric), or
//!    caller-supplied replicates with their design
//! 2. z0 from the replicate distribution and `a` from the design
//! 3. BCa and standard limits for every alpha
//! 4. internal standard errors, then the assembled [`BcaResult`]

use crate::acceleration::estimate_acceleration;
use crate::bias::BiasCorrector;
use crate::config::{AccelerationMethod, BcaConfig};
use crate::design::{ResamplingDesign, SufficientStatistics};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::internal_se::{SeInputs, StandardErrorEstimator};
use crate::limits::{BcaParameters, LimitSolver};
use crate::replicates::{ReplicateEvaluator, ReplicateSet};
use crate::resampling::{generate_counts, CountMatrix};
use crate::result::{AssemblyParts, BcaResult, ResultAssembler};
use crate::statistic::Statistic;
use bca_core::math::moments;
use bca_core::{CancellationToken, Error, ExecutionEngine, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, instrument, warn};

/// BCa confidence-limit engine
///
/// ```rust
/// use bca_confidence::{BcaBootstrap, Mean};
/// use bca_core::sequential;
///
/// let data: Vec<f64> = (1..=30).map(|i| (i as f64).ln()).collect();
/// let result = BcaBootstrap::new(sequential())
///     .with_replicates(500)
///     .with_seed(7)
///     .nonparametric_seeded(&data, &Mean)
///     .unwrap();
///
/// let ci = result.interval(0.9).unwrap();
/// assert!(ci.lower < ci.estimate && ci.estimate < ci.upper);
/// ```
#[derive(Debug, Clone)]
pub struct BcaBootstrap<E> {
    engine: E,
    config: BcaConfig,
    cancellation: Option<CancellationToken>,
}

impl<E: ExecutionEngine> BcaBootstrap<E> {
    /// Create an engine with the default configuration
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            config: BcaConfig::default(),
            cancellation: None,
        }
    }

    pub fn with_config(mut self, config: BcaConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of bootstrap replicates
    pub fn with_replicates(mut self, n_replicates: usize) -> Self {
        self.config.n_replicates = n_replicates;
        self
    }

    pub fn with_alphas(mut self, alphas: &[f64]) -> Self {
        self.config = self.config.with_alphas(alphas);
        self
    }

    pub fn with_confidence_levels(mut self, levels: &[f64]) -> Self {
        self.config = self.config.with_confidence_levels(levels);
        self
    }

    pub fn with_acceleration(mut self, method: AccelerationMethod) -> Self {
        self.config.acceleration = method;
        self
    }

    /// Set random seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Poll `token` between estimator evaluations
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &BcaConfig {
        &self.config
    }

    fn evaluator(&self) -> ReplicateEvaluator<E> {
        let evaluator = ReplicateEvaluator::new(self.engine.clone(), self.config.max_failure_fraction);
        let token = match (&self.cancellation, self.config.time_limit()) {
            (Some(token), Some(limit)) => Some(token.clone().limited_to(limit)),
            (Some(token), None) => Some(token.clone()),
            (None, Some(limit)) => Some(CancellationToken::with_time_limit(limit)),
            (None, None) => None,
        };
        match token {
            Some(token) => evaluator.with_cancellation(token),
            None => evaluator,
        }
    }

    /// Full nonparametric analysis: resample, evaluate, jackknife, solve
    ///
    /// All randomness is drawn from `rng`. If the statistic fails on any
    /// leave-one-out subset, the acceleration and the standard error of the
    /// point estimate come from the count regression instead, which needs
    /// more usable replicates than observations.
    #[instrument(
        skip(self, data, statistic, rng),
        fields(n = data.len(), n_replicates = self.config.n_replicates)
    )]
    pub fn nonparametric<T, S, R>(&self, data: &[T], statistic: &S, rng: &mut R) -> Result<BcaResult>
    where
        T: Clone + Sync,
        S: Statistic<T> + ?Sized,
        R: Rng + ?Sized,
    {
        self.config.validate()?;
        if data.len() < 2 {
            return Err(Error::InvalidParameter(format!(
                "Sample size must be at least 2, got {}",
                data.len()
            )));
        }

        let evaluator = self.evaluator();
        let point_estimate = evaluator.point_estimate(data, statistic)?;
        let counts = generate_counts(rng, data.len(), self.config.n_replicates)?;
        let replicates = evaluator.replicates(data, statistic, &counts)?;

        let mut diagnostics = Diagnostics::new();
        let jackknife = match evaluator.jackknife(data, statistic) {
            Ok(jackknife) => Some(jackknife),
            Err(Error::EstimatorFailure { failed, total, .. }) => {
                warn!(failed, total, "leave-one-out statistics incomplete; using regression");
                diagnostics.push(Diagnostic::JackknifeFailures { failed, total });
                None
            }
            Err(err) => return Err(err),
        };

        debug!(
            "Point estimate {:.6}; {} of {} replicates usable",
            point_estimate,
            replicates.len(),
            replicates.total
        );

        let design = ResamplingDesign::ResampleCounts {
            counts: counts.select_rows(&replicates.rows),
            jackknife,
        };
        self.analyse(point_estimate, replicates, design, diagnostics)
    }

    /// [`nonparametric`](Self::nonparametric) with a `StdRng` seeded from
    /// the configured seed, or from entropy when none is set
    pub fn nonparametric_seeded<T, S>(&self, data: &[T], statistic: &S) -> Result<BcaResult>
    where
        T: Clone + Sync,
        S: Statistic<T> + ?Sized,
    {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.nonparametric(data, statistic, &mut rng)
    }

    /// Analysis of precomputed nonparametric replicates
    ///
    /// `replicates[b]` must come from count row `b`. With `jackknife` values
    /// the jackknife acceleration is available; without them the
    /// acceleration is estimated by regression on the counts, which needs
    /// more replicates than observations.
    #[instrument(skip(self, counts, replicates, jackknife), fields(n_replicates = replicates.len()))]
    pub fn from_counts(
        &self,
        point_estimate: f64,
        counts: CountMatrix,
        replicates: &[f64],
        jackknife: Option<Vec<f64>>,
    ) -> Result<BcaResult> {
        self.config.validate()?;
        check_point_estimate(point_estimate)?;
        check_replicate_count(replicates.len())?;
        if counts.n_replicates() != replicates.len() {
            return Err(Error::size_mismatch(
                counts.n_replicates(),
                replicates.len(),
                "replicate statistics",
            ));
        }
        if counts.n_observations() < 2 {
            return Err(Error::InvalidParameter(format!(
                "Sample size must be at least 2, got {}",
                counts.n_observations()
            )));
        }
        if let Some(jack) = &jackknife {
            if jack.len() != counts.n_observations() {
                return Err(Error::size_mismatch(
                    counts.n_observations(),
                    jack.len(),
                    "jackknife statistics",
                ));
            }
        }

        let screened = ReplicateSet::screen(replicates, self.config.max_failure_fraction)?;
        let design = ResamplingDesign::ResampleCounts {
            counts: counts.select_rows(&screened.rows),
            jackknife,
        };
        self.analyse(point_estimate, screened, design, Diagnostics::new())
    }

    /// Parametric analysis from replicates and their sufficient statistics
    ///
    /// The acceleration always comes from regressing the replicates on the
    /// sufficient statistics.
    #[instrument(skip(self, replicates, sufficient), fields(n_replicates = replicates.len()))]
    pub fn parametric(
        &self,
        point_estimate: f64,
        replicates: &[f64],
        sufficient: SufficientStatistics,
    ) -> Result<BcaResult> {
        self.config.validate()?;
        check_point_estimate(point_estimate)?;
        check_replicate_count(replicates.len())?;
        if sufficient.n_replicates() != replicates.len() {
            return Err(Error::size_mismatch(
                sufficient.n_replicates(),
                replicates.len(),
                "replicate statistics",
            ));
        }

        let screened = ReplicateSet::screen(replicates, self.config.max_failure_fraction)?;
        let design = ResamplingDesign::SufficientStatistics(sufficient.select_rows(&screened.rows));
        self.analyse(point_estimate, screened, design, Diagnostics::new())
    }

    /// Shared tail of every entry point; `design` rows are aligned with
    /// `replicates.values`, and `diagnostics` holds whatever the entry point
    /// already recorded
    fn analyse(
        &self,
        point_estimate: f64,
        replicates: ReplicateSet,
        design: ResamplingDesign,
        mut diagnostics: Diagnostics,
    ) -> Result<BcaResult> {
        let config = &self.config;
        let t = &replicates.values;
        if t.len() < 2 {
            return Err(Error::InsufficientData {
                expected: 2,
                actual: t.len(),
            });
        }

        if replicates.failed > 0 {
            diagnostics.push(Diagnostic::ReplicateFailures {
                failed: replicates.failed,
                total: replicates.total,
            });
        }

        let sd_boot = moments::sample_sd(t);
        if sd_boot == 0.0 {
            diagnostics.push(Diagnostic::ZeroVariance);
        }

        let bias = BiasCorrector::new(config.continuity_correction).estimate(
            t,
            point_estimate,
            &mut diagnostics,
        )?;
        let acceleration = estimate_acceleration(&design, t, config.acceleration)?;
        if acceleration.is_degenerate() {
            diagnostics.push(Diagnostic::DegenerateAcceleration {
                source: acceleration.source().to_string(),
            });
        }

        let params = BcaParameters {
            point_estimate,
            z0: bias.z0,
            acceleration: acceleration.value(),
            sd_boot,
        };
        debug!(
            "BCa parameters: z0={:.4}, a={:.4} ({}), sd_boot={:.4}",
            params.z0,
            params.acceleration,
            acceleration.source(),
            params.sd_boot
        );

        let alphas = config.sorted_alphas();
        let limits =
            LimitSolver::new(config.interpolation).solve(t, &params, &alphas, &mut diagnostics);

        let errors = StandardErrorEstimator::from_config(config).estimate(
            &SeInputs {
                replicates: t,
                jackknife: design.jackknife(),
                params: &params,
                bias: &bias,
                acceleration: &acceleration,
                limits: &limits,
            },
            &mut diagnostics,
        );

        Ok(ResultAssembler::assemble(AssemblyParts {
            mode: design.mode(),
            n_failed: replicates.failed,
            replicates: t,
            params,
            limits,
            errors,
            regression: acceleration.regression(),
            diagnostics,
        }))
    }
}

fn check_point_estimate(point_estimate: f64) -> Result<()> {
    if !point_estimate.is_finite() {
        return Err(Error::non_finite("point estimate"));
    }
    Ok(())
}

fn check_replicate_count(n_replicates: usize) -> Result<()> {
    if n_replicates < 2 {
        return Err(Error::InvalidParameter(format!(
            "Number of replicates must be at least 2, got {n_replicates}"
        )));
    }
    Ok(())
}
