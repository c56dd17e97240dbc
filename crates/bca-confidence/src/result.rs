//! Result records of a BCa analysis

use crate::acceleration::RegressionFit;
use crate::design::ResamplingMode;
use crate::diagnostics::{DiagnosticFlags, Diagnostics};
use crate::internal_se::InternalErrors;
use crate::limits::{BcaParameters, LimitPoint};
use crate::types::{ConfidenceInterval, ConfidenceLevel};
use bca_core::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Tolerance when matching a requested alpha against the table
const ALPHA_TOLERANCE: f64 = 1e-9;

/// Internal standard errors of the summary statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatisticErrors {
    pub point_estimate: f64,
    pub bootstrap_se: f64,
    pub z0: f64,
    pub acceleration: f64,
}

/// Point estimate, spread and BCa constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BcaStatistics {
    pub point_estimate: f64,
    /// Standard deviation of the replicate statistics
    pub bootstrap_se: f64,
    pub z0: f64,
    pub acceleration: f64,
    /// Jackknife standard error of the point estimate, or the standard
    /// deviation of the fitted linear predictor when no jackknife exists
    pub jackknife_se: f64,
    pub internal_se: StatisticErrors,
}

/// Limits at one alpha level
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LimitRow {
    pub alpha: f64,
    /// `None` when `1 - a (z0 + z_alpha) <= 0`
    pub bca_limit: Option<f64>,
    pub standard_limit: f64,
    pub internal_se: Option<f64>,
    /// Replicate percentile the BCa limit was read at
    pub percentile: Option<f64>,
}

/// Limits sorted by ascending alpha
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitsTable {
    #[serde(skip)]
    point_estimate: f64,
    rows: Vec<LimitRow>,
}

impl LimitsTable {
    pub fn rows(&self) -> &[LimitRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &LimitRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for `alpha`, if it was requested
    pub fn get(&self, alpha: f64) -> Option<&LimitRow> {
        self.rows
            .iter()
            .find(|row| (row.alpha - alpha).abs() < ALPHA_TOLERANCE)
    }

    /// Two-sided BCa interval at `level`
    ///
    /// Both tail alphas `(1 - level) / 2` and `1 - (1 - level) / 2` must be in
    /// the table with non-degenerate limits.
    pub fn interval(&self, level: f64) -> Result<ConfidenceInterval> {
        let (lower, upper) = self.tail_rows(level)?;
        match (lower.bca_limit, upper.bca_limit) {
            (Some(lo), Some(hi)) => Ok(ConfidenceInterval::new(lo, hi, self.point_estimate, level)),
            _ => Err(Error::Computation(format!(
                "BCa limits at {} are degenerate",
                ConfidenceLevel::new(level)?
            ))),
        }
    }

    /// Two-sided normal-theory interval at `level`
    pub fn standard_interval(&self, level: f64) -> Result<ConfidenceInterval> {
        let (lower, upper) = self.tail_rows(level)?;
        Ok(ConfidenceInterval::new(
            lower.standard_limit,
            upper.standard_limit,
            self.point_estimate,
            level,
        ))
    }

    fn tail_rows(&self, level: f64) -> Result<(&LimitRow, &LimitRow)> {
        let level = ConfidenceLevel::new(level)?;
        let find = |alpha: f64| {
            self.get(alpha).ok_or_else(|| {
                Error::InvalidParameter(format!(
                    "Alpha {alpha} needed for a {level} interval was not requested"
                ))
            })
        };
        Ok((find(level.lower_alpha())?, find(level.upper_alpha())?))
    }
}

/// Regression ("abc") table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionStats {
    pub coefficients: Vec<f64>,
    pub sd_linear: f64,
    pub r_squared: f64,
    pub acceleration: f64,
}

impl From<&RegressionFit> for RegressionStats {
    fn from(fit: &RegressionFit) -> Self {
        Self {
            coefficients: fit.coefficients.clone(),
            sd_linear: fit.sd_linear,
            r_squared: fit.r_squared,
            acceleration: fit.acceleration,
        }
    }
}

/// Bias-corrected estimate `2 t0 - mean(t*)` and its standard error
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UStats {
    pub ustat: f64,
    pub sdu: f64,
}

impl UStats {
    /// `sdu = sqrt(se_theta^2 + sd_boot^2 / B)`
    pub fn compute(point_estimate: f64, replicates: &[f64], se_theta: f64, sd_boot: f64) -> Self {
        let b = replicates.len().max(1) as f64;
        let mean = replicates.iter().sum::<f64>() / b;
        Self {
            ustat: 2.0 * point_estimate - mean,
            sdu: (se_theta * se_theta + sd_boot * sd_boot / b).sqrt(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtendedDiagnostics {
    /// Present when the acceleration came from the regression estimator
    pub regression: Option<RegressionStats>,
    pub ustats: UStats,
}

/// Read-only output of a BCa analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BcaResult {
    pub mode: ResamplingMode,
    /// Replicates used, after failed evaluations were excluded
    pub n_replicates: usize,
    pub n_failed: usize,
    pub statistics: BcaStatistics,
    pub limits: LimitsTable,
    pub extended: ExtendedDiagnostics,
    pub diagnostics: Diagnostics,
}

impl BcaResult {
    /// Shorthand for `self.limits.interval(level)`
    pub fn interval(&self, level: f64) -> Result<ConfidenceInterval> {
        self.limits.interval(level)
    }

    pub fn flags(&self) -> DiagnosticFlags {
        self.diagnostics.flags()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Computation(format!("Failed to serialise result: {e}")))
    }
}

impl fmt::Display for BcaResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.statistics;
        let e = &s.internal_se;
        writeln!(
            f,
            "BCa bootstrap ({:?}, B = {}, failed = {})",
            self.mode, self.n_replicates, self.n_failed
        )?;
        writeln!(f, "{:>14} {:>12} {:>12}", "", "estimate", "internal se")?;
        writeln!(f, "{:>14} {:>12.5} {:>12.5}", "theta", s.point_estimate, e.point_estimate)?;
        writeln!(f, "{:>14} {:>12.5} {:>12.5}", "sd_boot", s.bootstrap_se, e.bootstrap_se)?;
        writeln!(f, "{:>14} {:>12.5} {:>12.5}", "z0", s.z0, e.z0)?;
        writeln!(f, "{:>14} {:>12.5} {:>12.5}", "a", s.acceleration, e.acceleration)?;
        writeln!(f, "{:>14} {:>12.5}", "sd_jack", s.jackknife_se)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:>8} {:>12} {:>12} {:>12} {:>10}",
            "alpha", "bca", "standard", "internal se", "pct"
        )?;
        let cell = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |x| format!("{x:.5}"));
        for row in self.limits.iter() {
            writeln!(
                f,
                "{:>8.3} {:>12} {:>12.5} {:>12} {:>10}",
                row.alpha,
                cell(row.bca_limit),
                row.standard_limit,
                cell(row.internal_se),
                cell(row.percentile)
            )?;
        }
        if !self.diagnostics.is_empty() {
            writeln!(f)?;
            for diagnostic in self.diagnostics.entries() {
                writeln!(f, "  ! {diagnostic}")?;
            }
        }
        Ok(())
    }
}

/// Everything the assembler packages into a [`BcaResult`]
#[derive(Debug)]
pub struct AssemblyParts<'a> {
    pub mode: ResamplingMode,
    pub n_failed: usize,
    pub replicates: &'a [f64],
    pub params: BcaParameters,
    pub limits: Vec<LimitPoint>,
    pub errors: InternalErrors,
    pub regression: Option<&'a RegressionFit>,
    pub diagnostics: Diagnostics,
}

/// Packages computed quantities into the output record; no computation
/// beyond the u-statistic summary
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAssembler;

impl ResultAssembler {
    pub fn assemble(parts: AssemblyParts<'_>) -> BcaResult {
        let AssemblyParts {
            mode,
            n_failed,
            replicates,
            params,
            limits,
            errors,
            regression,
            diagnostics,
        } = parts;

        let rows = limits
            .iter()
            .zip(&errors.limits)
            .map(|(point, &internal_se)| LimitRow {
                alpha: point.alpha,
                bca_limit: point.bca_limit,
                standard_limit: point.standard_limit,
                internal_se,
                percentile: point.percentile,
            })
            .collect();

        BcaResult {
            mode,
            n_replicates: replicates.len(),
            n_failed,
            statistics: BcaStatistics {
                point_estimate: params.point_estimate,
                bootstrap_se: params.sd_boot,
                z0: params.z0,
                acceleration: params.acceleration,
                jackknife_se: errors.point_estimate,
                internal_se: StatisticErrors {
                    point_estimate: errors.point_estimate,
                    bootstrap_se: errors.bootstrap_se,
                    z0: errors.z0,
                    acceleration: errors.acceleration,
                },
            },
            limits: LimitsTable {
                point_estimate: params.point_estimate,
                rows,
            },
            extended: ExtendedDiagnostics {
                regression: regression.map(RegressionStats::from),
                ustats: UStats::compute(
                    params.point_estimate,
                    replicates,
                    errors.point_estimate,
                    params.sd_boot,
                ),
            },
            diagnostics,
        }
    }
}
