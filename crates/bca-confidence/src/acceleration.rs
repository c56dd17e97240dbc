//! Acceleration constant from empirical influence values
//!
//! Two estimators are provided:
//!
//! - the jackknife form `a = sum(l^3) / (6 * sum(l^2)^1.5)` with
//!   `l_i = mean(jack) - jack_i`, and
//! - a regression form: the replicate statistics are regressed on the
//!   centered resampling design and `a = mean(u^3) / (6 * sd_boot^3)`, with
//!   `u` the fitted linear predictor and `sd_boot` the spread of the
//!   replicates themselves.
//!
//! For count designs both agree to first order, because the regression
//! coefficients are themselves influence values.

use crate::config::AccelerationMethod;
use crate::design::ResamplingDesign;
use bca_core::math::moments;
use bca_core::{Error, Result};
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use tracing::debug;

/// Jackknife acceleration with its influence values
#[derive(Debug, Clone, PartialEq)]
pub struct JackknifeAcceleration {
    pub acceleration: f64,
    /// `mean(jack) - jack_i`
    pub influence: Vec<f64>,
    /// Influence values had zero spread and `a` was set to 0
    pub degenerate: bool,
}

/// Least-squares fit of replicates on the centered resampling design
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionFit {
    /// One coefficient per design column used in the fit
    pub coefficients: Vec<f64>,
    /// Centered fitted linear predictor, aligned with the replicates
    #[serde(skip)]
    pub fitted: Vec<f64>,
    pub acceleration: f64,
    /// Standard deviation of the fitted predictor
    pub sd_linear: f64,
    /// Share of replicate variance explained by the linear predictor
    pub r_squared: f64,
    #[serde(skip)]
    pub degenerate: bool,
}

/// Which estimator produced the acceleration constant
#[derive(Debug, Clone, PartialEq)]
pub enum Acceleration {
    Jackknife(JackknifeAcceleration),
    Regression(RegressionFit),
}

impl Acceleration {
    pub fn value(&self) -> f64 {
        match self {
            Self::Jackknife(jack) => jack.acceleration,
            Self::Regression(fit) => fit.acceleration,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::Jackknife(jack) => jack.degenerate,
            Self::Regression(fit) => fit.degenerate,
        }
    }

    /// Short label for diagnostics
    pub fn source(&self) -> &'static str {
        match self {
            Self::Jackknife(_) => "jackknife",
            Self::Regression(_) => "regression",
        }
    }

    pub fn regression(&self) -> Option<&RegressionFit> {
        match self {
            Self::Regression(fit) => Some(fit),
            Self::Jackknife(_) => None,
        }
    }
}

/// Acceleration for a resampling design
///
/// The jackknife estimator is used when it is requested and the design
/// carries leave-one-out values; every other case falls back to regression.
/// `replicates` must be aligned with the rows of `design`.
pub fn estimate_acceleration(
    design: &ResamplingDesign,
    replicates: &[f64],
    method: AccelerationMethod,
) -> Result<Acceleration> {
    match (method, design.jackknife()) {
        (AccelerationMethod::Jackknife, Some(jackknife)) => {
            jackknife_acceleration(jackknife).map(Acceleration::Jackknife)
        }
        _ => {
            let (columns, p) = regression_design(design);
            regression_acceleration(&columns, p, replicates).map(Acceleration::Regression)
        }
    }
}

/// Design columns entering the regression
///
/// Count rows all sum to n, so the centered count columns are linearly
/// dependent; the last column is dropped without changing the fitted values.
fn regression_design(design: &ResamplingDesign) -> (Vec<f64>, usize) {
    let full = design.design_matrix();
    let width = design.dimension();
    match design {
        ResamplingDesign::ResampleCounts { .. } if width > 1 => {
            let reduced = full
                .chunks(width)
                .flat_map(|row| row[..width - 1].iter().copied())
                .collect();
            (reduced, width - 1)
        }
        _ => (full, width),
    }
}

/// Acceleration from leave-one-out statistics
pub fn jackknife_acceleration(jackknife: &[f64]) -> Result<JackknifeAcceleration> {
    if jackknife.len() < 2 {
        return Err(Error::InsufficientData {
            expected: 2,
            actual: jackknife.len(),
        });
    }
    if jackknife.iter().any(|v| !v.is_finite()) {
        return Err(Error::non_finite("jackknife statistics"));
    }

    let mean = moments::mean(jackknife);
    let influence: Vec<f64> = jackknife.iter().map(|&j| mean - j).collect();
    let identical = jackknife.iter().all(|&j| j == jackknife[0]);

    let acceleration = if identical {
        None
    } else {
        influence_skewness(&influence)
    };

    debug!("Jackknife acceleration: {:?}", acceleration);

    Ok(JackknifeAcceleration {
        acceleration: acceleration.unwrap_or(0.0),
        degenerate: acceleration.is_none(),
        influence,
    })
}

/// `sum(l^3) / (6 * sum(l^2)^1.5)` for influence values `l`, re-centered
///
/// `None` when the values have no spread.
pub(crate) fn influence_skewness(influence: &[f64]) -> Option<f64> {
    let center = moments::mean(influence);
    let (mut s2, mut s3) = (0.0, 0.0);
    for &l in influence {
        let d = l - center;
        s2 += d * d;
        s3 += d * d * d;
    }
    if s2 <= 0.0 || !s2.is_finite() {
        return None;
    }
    let a = s3 / (6.0 * s2.powf(1.5));
    a.is_finite().then_some(a)
}

/// `mean(u^3) / (6 * sd_boot^3)` for a linear predictor `u`, re-centered,
/// where `sd_boot` is the spread of the aligned replicates
///
/// `None` when either the predictor or the replicates have no spread.
pub(crate) fn regression_skewness(fitted: &[f64], replicates: &[f64]) -> Option<f64> {
    if fitted.is_empty() || fitted.len() != replicates.len() {
        return None;
    }
    let center = moments::mean(fitted);
    let m2 = moments::central_moment(fitted, center, 2);
    let m3 = moments::central_moment(fitted, center, 3);
    let var_boot = moments::central_moment(replicates, moments::mean(replicates), 2);
    if m2 <= 0.0 || !m2.is_finite() || var_boot <= 0.0 || !var_boot.is_finite() {
        return None;
    }
    let a = m3 / (6.0 * var_boot.powf(1.5));
    a.is_finite().then_some(a)
}

/// Regress replicates on a row-major `B x p` design and derive `a` from the
/// third moment of the fitted predictor
///
/// Requires `B > p + 1`. Solves the normal equations by Cholesky, falling
/// back to SVD when the cross-product matrix is not positive definite.
pub fn regression_acceleration(
    design: &[f64],
    n_columns: usize,
    replicates: &[f64],
) -> Result<RegressionFit> {
    let b = replicates.len();
    if n_columns == 0 {
        return Err(Error::InvalidInput("Regression design has no columns".to_string()));
    }
    if design.len() != b * n_columns {
        return Err(Error::size_mismatch(b * n_columns, design.len(), "regression design"));
    }
    if b <= n_columns + 1 {
        return Err(Error::InsufficientData {
            expected: n_columns + 2,
            actual: b,
        });
    }

    let mut x = DMatrix::from_row_slice(b, n_columns, design);
    for j in 0..n_columns {
        let mean = x.column(j).mean();
        for i in 0..b {
            x[(i, j)] -= mean;
        }
    }
    let y_mean = moments::mean(replicates);
    let y = DVector::from_iterator(b, replicates.iter().map(|&t| t - y_mean));

    let xtx = x.tr_mul(&x);
    let xty = x.tr_mul(&y);
    let beta = match xtx.clone().cholesky() {
        Some(chol) => chol.solve(&xty),
        None => xtx
            .svd(true, true)
            .solve(&xty, 1e-10)
            .map_err(|e| Error::Computation(format!("Failed to solve regression system: {e}")))?,
    };

    let fitted_vec = &x * &beta;
    let fitted: Vec<f64> = fitted_vec.iter().copied().collect();
    if fitted.iter().any(|u| !u.is_finite()) {
        return Err(Error::non_finite("regression fitted values"));
    }

    let sd_linear = moments::central_moment(&fitted, 0.0, 2).sqrt();
    let var_y = moments::central_moment(replicates, y_mean, 2);
    let r_squared = if var_y > 0.0 {
        (sd_linear * sd_linear / var_y).min(1.0)
    } else {
        0.0
    };

    let acceleration = regression_skewness(&fitted, replicates);
    debug!(
        "Regression acceleration: {:?}, sd_linear={}, R^2={}",
        acceleration, sd_linear, r_squared
    );

    Ok(RegressionFit {
        coefficients: beta.iter().copied().collect(),
        fitted,
        acceleration: acceleration.unwrap_or(0.0),
        sd_linear,
        r_squared,
        degenerate: acceleration.is_none(),
    })
}
