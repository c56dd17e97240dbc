//! BCa and standard confidence limits

use crate::config::QuantileInterpolation;
use crate::diagnostics::{Diagnostic, Diagnostics};
use bca_core::math::distributions::normal;
use tracing::{debug, warn};

/// Constants every limit depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BcaParameters {
    pub point_estimate: f64,
    pub z0: f64,
    pub acceleration: f64,
    /// Bootstrap standard deviation of the replicates
    pub sd_boot: f64,
}

/// Limits at one alpha
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitPoint {
    pub alpha: f64,
    pub z_alpha: f64,
    /// `1 - a (z0 + z_alpha)`
    pub denominator: f64,
    /// `z0 + (z0 + z_alpha) / denominator`; `None` when degenerate
    pub z_adjusted: Option<f64>,
    /// `Phi(z_adjusted)`, the replicate percentile the BCa limit is read at
    pub percentile: Option<f64>,
    pub bca_limit: Option<f64>,
    /// `t0 + sd_boot * z_alpha`
    pub standard_limit: f64,
}

/// Maps alphas to limits through the BCa adjustment
#[derive(Debug, Clone, Copy, Default)]
pub struct LimitSolver {
    interpolation: QuantileInterpolation,
}

impl LimitSolver {
    pub fn new(interpolation: QuantileInterpolation) -> Self {
        Self { interpolation }
    }

    /// Solve every alpha against the replicate distribution
    ///
    /// A non-positive denominator leaves that alpha without a BCa limit and
    /// records [`Diagnostic::DegenerateLimit`]; the remaining alphas are
    /// unaffected. Percentiles outside `[1/B, (B-1)/B]` are flagged as
    /// extrapolation.
    pub fn solve(
        &self,
        replicates: &[f64],
        params: &BcaParameters,
        alphas: &[f64],
        diagnostics: &mut Diagnostics,
    ) -> Vec<LimitPoint> {
        let mut sorted = replicates.to_vec();
        sorted.sort_by(f64::total_cmp);
        let b = sorted.len() as f64;

        alphas
            .iter()
            .map(|&alpha| {
                let point = self.solve_sorted(&sorted, params, alpha);

                match point.percentile {
                    None => {
                        warn!(alpha, denominator = point.denominator, "degenerate BCa limit");
                        diagnostics.push(Diagnostic::DegenerateLimit {
                            alpha,
                            denominator: point.denominator,
                        });
                    }
                    Some(pct) if pct < 1.0 / b || pct > (b - 1.0) / b => {
                        diagnostics.push(Diagnostic::ExtremePercentile {
                            alpha,
                            percentile: pct,
                        });
                    }
                    Some(_) => {}
                }

                debug!(
                    "alpha={:.4}: z_adj={:?}, percentile={:?}, bca={:?}, standard={:.4}",
                    alpha, point.z_adjusted, point.percentile, point.bca_limit, point.standard_limit
                );
                point
            })
            .collect()
    }

    /// One alpha against replicates already sorted ascending; no diagnostics
    pub fn solve_sorted(&self, sorted: &[f64], params: &BcaParameters, alpha: f64) -> LimitPoint {
        let z_alpha = normal::ppf(alpha);
        let w = params.z0 + z_alpha;
        let denominator = 1.0 - params.acceleration * w;
        let standard_limit = params.point_estimate + params.sd_boot * z_alpha;

        let z_adjusted = (denominator > 0.0).then(|| params.z0 + w / denominator);
        let percentile = z_adjusted.map(normal::cdf);
        let bca_limit = percentile.and_then(|p| quantile_sorted(sorted, p, self.interpolation));

        LimitPoint {
            alpha,
            z_alpha,
            denominator,
            z_adjusted,
            percentile,
            bca_limit,
            standard_limit,
        }
    }
}

/// Read percentile `p` off ascending `sorted` values
///
/// `Linear` interpolates between order statistics at position `p (B - 1)`;
/// `Nearest` takes the order statistic of rank `ceil(p B)`. `None` for
/// empty input or a non-finite `p`.
pub fn quantile_sorted(sorted: &[f64], p: f64, interpolation: QuantileInterpolation) -> Option<f64> {
    if sorted.is_empty() || !p.is_finite() {
        return None;
    }
    let p = p.clamp(0.0, 1.0);
    let last = sorted.len() - 1;

    match interpolation {
        QuantileInterpolation::Linear => {
            let h = p * last as f64;
            let lo = (h.floor() as usize).min(last);
            let hi = (lo + 1).min(last);
            let frac = h - lo as f64;
            Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
        }
        QuantileInterpolation::Nearest => {
            let rank = (p * sorted.len() as f64).ceil() as usize;
            Some(sorted[rank.clamp(1, sorted.len()) - 1])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticFlags;
    use approx::assert_relative_eq;

    fn grid(b: usize) -> Vec<f64> {
        (0..b).map(|i| i as f64 / (b - 1) as f64).collect()
    }

    #[test]
    fn test_quantile_rules() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        let linear = QuantileInterpolation::Linear;
        let nearest = QuantileInterpolation::Nearest;

        assert_eq!(quantile_sorted(&sorted, 0.0, linear), Some(1.0));
        assert_eq!(quantile_sorted(&sorted, 1.0, linear), Some(4.0));
        assert_relative_eq!(quantile_sorted(&sorted, 0.5, linear).unwrap(), 2.5);
        assert_eq!(quantile_sorted(&sorted, 0.5, nearest), Some(2.0));
        assert_eq!(quantile_sorted(&sorted, 0.51, nearest), Some(3.0));
        assert_eq!(quantile_sorted(&sorted, 0.0, nearest), Some(1.0));
        assert_eq!(quantile_sorted(&[], 0.5, linear), None);
        assert_eq!(quantile_sorted(&sorted, f64::NAN, linear), None);
    }

    #[test]
    fn test_no_correction_reduces_to_percentile() {
        let replicates = grid(1001);
        let params = BcaParameters {
            point_estimate: 0.5,
            z0: 0.0,
            acceleration: 0.0,
            sd_boot: 0.2,
        };
        let mut diagnostics = Diagnostics::new();
        let points = LimitSolver::default().solve(&replicates, &params, &[0.05, 0.5, 0.95], &mut diagnostics);

        for point in &points {
            assert_relative_eq!(point.percentile.unwrap(), point.alpha, epsilon = 1e-12);
            assert_relative_eq!(point.bca_limit.unwrap(), point.alpha, epsilon = 1e-9);
        }
        assert_relative_eq!(points[2].standard_limit, 0.5 + 0.2 * 1.6448536269514722, epsilon = 1e-9);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_degenerate_alpha_is_isolated() {
        let replicates = grid(200);
        // a (z0 + z_alpha) >= 1 only in the far upper tail
        let params = BcaParameters {
            point_estimate: 0.5,
            z0: 0.0,
            acceleration: 0.6,
            sd_boot: 0.3,
        };
        let mut diagnostics = Diagnostics::new();
        let points = LimitSolver::default().solve(&replicates, &params, &[0.1, 0.5, 0.975], &mut diagnostics);

        assert!(points[0].bca_limit.is_some());
        assert!(points[1].bca_limit.is_some());
        assert!(points[2].bca_limit.is_none());
        assert!(points[2].percentile.is_none());
        assert!(points[2].denominator <= 0.0);
        assert!(diagnostics.contains(DiagnosticFlags::DEGENERATE_LIMIT));
    }

    #[test]
    fn test_extreme_percentile_flagged() {
        let replicates = grid(20);
        let params = BcaParameters {
            point_estimate: 0.5,
            z0: -1.5,
            acceleration: 0.0,
            sd_boot: 0.3,
        };
        let mut diagnostics = Diagnostics::new();
        let points = LimitSolver::default().solve(&replicates, &params, &[0.025], &mut diagnostics);

        assert!(points[0].percentile.unwrap() < 1.0 / 20.0);
        assert!(points[0].bca_limit.unwrap() < 1e-3);
        assert!(diagnostics.contains(DiagnosticFlags::EXTREME_PERCENTILE));
    }

    #[test]
    fn test_limits_monotone_in_alpha() {
        let replicates: Vec<f64> = (0..500).map(|i| ((i as f64) * 0.013).exp()).collect();
        let params = BcaParameters {
            point_estimate: 2.0,
            z0: 0.2,
            acceleration: 0.08,
            sd_boot: 1.0,
        };
        let alphas = [0.025, 0.05, 0.1, 0.16, 0.5, 0.84, 0.9, 0.95, 0.975];
        let mut diagnostics = Diagnostics::new();
        let points = LimitSolver::default().solve(&replicates, &params, &alphas, &mut diagnostics);

        for pair in points.windows(2) {
            assert!(pair[0].bca_limit.unwrap() <= pair[1].bca_limit.unwrap());
            assert!(pair[0].standard_limit < pair[1].standard_limit);
        }
    }
}
