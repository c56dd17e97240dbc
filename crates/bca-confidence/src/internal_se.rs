//! Internal standard errors of the BCa constants and limits
//!
//! These measure the Monte Carlo and sampling noise in the quantities the
//! limits are built from, so a reader can judge whether B was large enough.

use crate::acceleration::{influence_skewness, regression_skewness, Acceleration};
use crate::bias::{BiasCorrection, BiasCorrector};
use crate::config::{BcaConfig, InternalSeMethod, QuantileInterpolation};
use crate::diagnostics::{clamp_variance, Diagnostics};
use crate::limits::{BcaParameters, LimitPoint, LimitSolver};
use bca_core::math::{distributions::normal, moments};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::debug;

/// Seed for replicate groupings when the configuration has none
const DEFAULT_GROUPING_SEED: u64 = 0x00b0_07ca;

/// Everything the estimator reads from a finished analysis
#[derive(Debug, Clone, Copy)]
pub struct SeInputs<'a> {
    pub replicates: &'a [f64],
    pub jackknife: Option<&'a [f64]>,
    pub params: &'a BcaParameters,
    pub bias: &'a BiasCorrection,
    pub acceleration: &'a Acceleration,
    pub limits: &'a [LimitPoint],
}

/// Internal standard errors, one per estimated quantity
#[derive(Debug, Clone, PartialEq)]
pub struct InternalErrors {
    /// Standard error of the point estimate
    pub point_estimate: f64,
    pub bootstrap_se: f64,
    pub z0: f64,
    pub acceleration: f64,
    /// Aligned with the limit points; `None` where the BCa limit is degenerate
    pub limits: Vec<Option<f64>>,
}

/// `sqrt((n - 1) / n * sum((jack_i - mean(jack))^2))`
pub fn jackknife_se(jackknife: &[f64]) -> f64 {
    let n = jackknife.len();
    if n < 2 {
        return 0.0;
    }
    let mean = moments::mean(jackknife);
    let ss: f64 = jackknife.iter().map(|&j| (j - mean) * (j - mean)).sum();
    ((n - 1) as f64 / n as f64 * ss).sqrt()
}

/// Estimates internal standard errors by the delta method or by a
/// delete-a-group jackknife over replicate groups
#[derive(Debug, Clone)]
pub struct StandardErrorEstimator {
    method: InternalSeMethod,
    se_groups: usize,
    continuity_correction: f64,
    interpolation: QuantileInterpolation,
    seed: Option<u64>,
}

impl StandardErrorEstimator {
    pub fn from_config(config: &BcaConfig) -> Self {
        Self {
            method: config.internal_se,
            se_groups: config.se_groups,
            continuity_correction: config.continuity_correction,
            interpolation: config.interpolation,
            seed: config.seed,
        }
    }

    pub fn estimate(&self, inputs: &SeInputs<'_>, diagnostics: &mut Diagnostics) -> InternalErrors {
        let point_estimate = match (inputs.jackknife, inputs.acceleration.regression()) {
            (Some(jack), _) => jackknife_se(jack),
            (None, Some(fit)) => fit.sd_linear,
            (None, None) => 0.0,
        };

        let var_a = self.acceleration_variance(inputs.acceleration, inputs.replicates);
        let var_a = clamp_variance(var_a, "acceleration", diagnostics);

        let (var_sd, var_z0, var_limits) = match self.method {
            InternalSeMethod::DeltaMethod => {
                let var_sd = clamp_variance(
                    sd_boot_variance(inputs.replicates),
                    "bootstrap_se",
                    diagnostics,
                );
                let var_z0 = clamp_variance(
                    z0_variance(inputs.bias, inputs.replicates.len()),
                    "z0",
                    diagnostics,
                );
                let limits = inputs
                    .limits
                    .iter()
                    .map(|point| limit_variance(point, inputs.params, var_z0, var_a, var_sd))
                    .collect();
                (var_sd, var_z0, limits)
            }
            InternalSeMethod::GroupedJackknife {
                groups,
                repetitions,
            } => {
                let (var_sd, var_z0, limits) = self.grouped_jackknife(inputs, groups, repetitions);
                (
                    clamp_variance(var_sd, "bootstrap_se", diagnostics),
                    clamp_variance(var_z0, "z0", diagnostics),
                    limits,
                )
            }
        };

        let limits = var_limits
            .into_iter()
            .map(|var| var.map(|v| clamp_variance(v, "limit", diagnostics).sqrt()))
            .collect();
        let errors = InternalErrors {
            point_estimate,
            bootstrap_se: var_sd.sqrt(),
            z0: var_z0.sqrt(),
            acceleration: var_a.sqrt(),
            limits,
        };

        debug!(
            "Internal SEs: theta={:.4}, sd_boot={:.4}, z0={:.4}, a={:.4}",
            errors.point_estimate, errors.bootstrap_se, errors.z0, errors.acceleration
        );
        errors
    }

    /// Delete-a-group jackknife of `a` over the influence values, or over
    /// the fitted predictor and replicates with the coefficients held fixed
    ///
    /// NaN when too few groups give a usable value; the caller clamps it.
    fn acceleration_variance(&self, acceleration: &Acceleration, replicates: &[f64]) -> f64 {
        if acceleration.is_degenerate() {
            return 0.0;
        }
        let se = match acceleration {
            Acceleration::Jackknife(jack) => {
                let l = &jack.influence;
                moments::grouped_jackknife_se(l.len(), self.se_groups, |kept| {
                    let subset: Vec<f64> = kept.iter().map(|&i| l[i]).collect();
                    influence_skewness(&subset).unwrap_or(f64::NAN)
                })
            }
            Acceleration::Regression(fit) => {
                let u = &fit.fitted;
                moments::grouped_jackknife_se(u.len(), self.se_groups, |kept| {
                    let fitted: Vec<f64> = kept.iter().map(|&b| u[b]).collect();
                    let t: Vec<f64> = kept.iter().map(|&b| replicates[b]).collect();
                    regression_skewness(&fitted, &t).unwrap_or(f64::NAN)
                })
            }
        };
        se.map_or(f64::NAN, |s| s * s)
    }

    /// bcaboot-style grouped jackknife: the replicates are shuffled into
    /// `groups` groups, each group is deleted in turn and sd_boot, z0 and the
    /// limits recomputed; variances are averaged over `repetitions`
    /// shufflings with the acceleration held fixed.
    ///
    /// A quantity with too few usable groups in any shuffling comes back as
    /// NaN. Limits without a BCa value come back as `None`.
    fn grouped_jackknife(
        &self,
        inputs: &SeInputs<'_>,
        groups: usize,
        repetitions: usize,
    ) -> (f64, f64, Vec<Option<f64>>) {
        let t = inputs.replicates;
        let mut rng = StdRng::seed_from_u64(self.seed.unwrap_or(DEFAULT_GROUPING_SEED));
        let mut order: Vec<usize> = (0..t.len()).collect();
        let corrector = BiasCorrector::new(self.continuity_correction);
        let solver = LimitSolver::new(self.interpolation);

        let mut var_sd = 0.0;
        let mut var_z0 = 0.0;
        let mut var_limits = vec![0.0; inputs.limits.len()];

        for _ in 0..repetitions {
            order.shuffle(&mut rng);
            let subset =
                |kept: &[usize]| -> Vec<f64> { kept.iter().map(|&k| t[order[k]]).collect() };

            let se_sd = moments::grouped_jackknife_se(t.len(), groups, |kept| {
                moments::sample_sd(&subset(kept))
            });
            var_sd += se_sd.map_or(f64::NAN, |s| s * s);

            let z0_of = |kept: &[usize]| {
                let mut scratch = Diagnostics::new();
                corrector
                    .estimate(&subset(kept), inputs.params.point_estimate, &mut scratch)
                    .map_or(f64::NAN, |bias| bias.z0)
            };
            let se_z0 = moments::grouped_jackknife_se(t.len(), groups, &z0_of);
            var_z0 += se_z0.map_or(f64::NAN, |s| s * s);

            for (point, acc) in inputs.limits.iter().zip(var_limits.iter_mut()) {
                let se = moments::grouped_jackknife_se(t.len(), groups, |kept| {
                    let mut sorted = subset(kept);
                    sorted.sort_by(f64::total_cmp);
                    let params = BcaParameters {
                        z0: z0_of(kept),
                        sd_boot: moments::sample_sd(&sorted),
                        ..*inputs.params
                    };
                    solver
                        .solve_sorted(&sorted, &params, point.alpha)
                        .bca_limit
                        .unwrap_or(f64::NAN)
                });
                *acc += se.map_or(f64::NAN, |s| s * s);
            }
        }

        let k = repetitions as f64;
        let limits = inputs
            .limits
            .iter()
            .zip(var_limits)
            .map(|(point, var)| point.bca_limit.map(|_| var / k))
            .collect();
        (var_sd / k, var_z0 / k, limits)
    }
}

/// `Var(s) ~ (m4 - s^4) / (4 s^2 B)`
fn sd_boot_variance(replicates: &[f64]) -> f64 {
    let b = replicates.len() as f64;
    let mean = moments::mean(replicates);
    let m2 = moments::central_moment(replicates, mean, 2);
    if m2 <= 0.0 || !m2.is_finite() {
        return 0.0;
    }
    let m4 = moments::central_moment(replicates, mean, 4);
    (m4 - m2 * m2) / (4.0 * m2 * b)
}

/// Binomial variance of the proportion mapped through `Phi^-1`
fn z0_variance(bias: &BiasCorrection, n_replicates: usize) -> f64 {
    let p = bias.proportion;
    let density = normal::pdf(bias.z0);
    p * (1.0 - p) / (n_replicates as f64 * density * density)
}

/// Delta method on `t0 + s (z_adj - z0)`, treating z0, a and s as
/// independent
fn limit_variance(
    point: &LimitPoint,
    params: &BcaParameters,
    var_z0: f64,
    var_a: f64,
    var_sd: f64,
) -> Option<f64> {
    let z_adj = point.z_adjusted?;
    let w = params.z0 + point.z_alpha;
    let d2 = point.denominator * point.denominator;
    let d_z0 = 1.0 / d2;
    let d_a = w * w / d2;
    let spread = z_adj - params.z0;
    let s2 = params.sd_boot * params.sd_boot;
    Some(s2 * (d_z0 * d_z0 * var_z0 + d_a * d_a * var_a) + spread * spread * var_sd)
}
