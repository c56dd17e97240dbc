//! Resampling designs: what the analysis knows about each replicate

use crate::resampling::CountMatrix;
use bca_core::{Error, Result};
use serde::Serialize;

/// B x p matrix of sufficient statistics, one row per parametric replicate
#[derive(Debug, Clone, PartialEq)]
pub struct SufficientStatistics {
    n_replicates: usize,
    dimension: usize,
    values: Vec<f64>,
}

impl SufficientStatistics {
    /// Build from row-major values
    pub fn new(n_replicates: usize, dimension: usize, values: Vec<f64>) -> Result<Self> {
        if n_replicates == 0 || dimension == 0 {
            return Err(Error::InvalidInput(
                "Sufficient statistic matrix is empty".to_string(),
            ));
        }
        if values.len() != n_replicates * dimension {
            return Err(Error::size_mismatch(
                n_replicates * dimension,
                values.len(),
                "sufficient statistic matrix",
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::non_finite("sufficient statistic matrix"));
        }
        Ok(Self {
            n_replicates,
            dimension,
            values,
        })
    }

    /// Build from one vector per replicate
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let dimension = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((b, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != dimension) {
            return Err(Error::size_mismatch(
                dimension,
                row.len(),
                &format!("sufficient statistic row {b}"),
            ));
        }
        Self::new(rows.len(), dimension, rows.concat())
    }

    pub fn n_replicates(&self) -> usize {
        self.n_replicates
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn row(&self, b: usize) -> &[f64] {
        let start = b * self.dimension;
        &self.values[start..start + self.dimension]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Keep only the listed replicate rows, in the given order
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let mut values = Vec::with_capacity(rows.len() * self.dimension);
        for &b in rows {
            values.extend_from_slice(self.row(b));
        }
        Self {
            n_replicates: rows.len(),
            dimension: self.dimension,
            values,
        }
    }
}

/// Mode-specific payload describing how replicates were generated
#[derive(Debug, Clone)]
pub enum ResamplingDesign {
    /// Nonparametric bootstrap: resampling counts, with jackknife values
    /// when the statistic could be re-evaluated on leave-one-out subsets
    ResampleCounts {
        counts: CountMatrix,
        jackknife: Option<Vec<f64>>,
    },
    /// Parametric bootstrap summarised by sufficient statistics
    SufficientStatistics(SufficientStatistics),
}

impl ResamplingDesign {
    pub fn mode(&self) -> ResamplingMode {
        match self {
            Self::ResampleCounts { .. } => ResamplingMode::Nonparametric,
            Self::SufficientStatistics(_) => ResamplingMode::Parametric,
        }
    }

    /// Number of replicate rows in the design
    pub fn n_replicates(&self) -> usize {
        match self {
            Self::ResampleCounts { counts, .. } => counts.n_replicates(),
            Self::SufficientStatistics(stats) => stats.n_replicates(),
        }
    }

    /// Columns of the regression design
    pub fn dimension(&self) -> usize {
        match self {
            Self::ResampleCounts { counts, .. } => counts.n_observations(),
            Self::SufficientStatistics(stats) => stats.dimension(),
        }
    }

    pub fn jackknife(&self) -> Option<&[f64]> {
        match self {
            Self::ResampleCounts { jackknife, .. } => jackknife.as_deref(),
            Self::SufficientStatistics(_) => None,
        }
    }

    /// Row-major design matrix as floating point
    pub fn design_matrix(&self) -> Vec<f64> {
        match self {
            Self::ResampleCounts { counts, .. } => counts.to_f64(),
            Self::SufficientStatistics(stats) => stats.as_slice().to_vec(),
        }
    }

    /// Restrict the design to the replicates that survived evaluation
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        match self {
            Self::ResampleCounts { counts, jackknife } => Self::ResampleCounts {
                counts: counts.select_rows(rows),
                jackknife: jackknife.clone(),
            },
            Self::SufficientStatistics(stats) => {
                Self::SufficientStatistics(stats.select_rows(rows))
            }
        }
    }
}

/// Which family of bootstrap produced the replicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResamplingMode {
    Nonparametric,
    Parametric,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sufficient_statistics_shape() {
        let stats = SufficientStatistics::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(stats.n_replicates(), 2);
        assert_eq!(stats.dimension(), 2);
        assert_eq!(stats.row(1), &[3.0, 4.0]);

        assert!(SufficientStatistics::from_rows(&[vec![1.0], vec![1.0, 2.0]]).is_err());
        assert!(SufficientStatistics::new(2, 2, vec![1.0; 3]).is_err());
        assert!(SufficientStatistics::new(1, 1, vec![f64::NAN]).is_err());
    }

    #[test]
    fn test_design_accessors() {
        let counts = CountMatrix::from_rows(vec![vec![2, 0], vec![1, 1], vec![0, 2]]).unwrap();
        let design = ResamplingDesign::ResampleCounts {
            counts,
            jackknife: Some(vec![1.0, 2.0]),
        };
        assert_eq!(design.mode(), ResamplingMode::Nonparametric);
        assert_eq!(design.n_replicates(), 3);
        assert_eq!(design.dimension(), 2);
        assert_eq!(design.jackknife(), Some(&[1.0, 2.0][..]));
        assert_eq!(design.design_matrix(), vec![2.0, 0.0, 1.0, 1.0, 0.0, 2.0]);

        let stats = SufficientStatistics::new(2, 1, vec![0.5, 1.5]).unwrap();
        let design = ResamplingDesign::SufficientStatistics(stats);
        assert_eq!(design.mode(), ResamplingMode::Parametric);
        assert!(design.jackknife().is_none());
        assert_eq!(design.select_rows(&[1]).design_matrix(), vec![1.5]);
    }
}
