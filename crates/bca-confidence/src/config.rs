//! Configuration for BCa analyses

use bca_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of bootstrap replicates
pub const DEFAULT_REPLICATES: usize = 2000;

/// Replicate count for quick exploratory runs
pub const FAST_REPLICATES: usize = 1000;

/// Replicate count when the extreme limits matter
pub const HIGH_PRECISION_REPLICATES: usize = 4000;

/// Default alpha levels: both tails of the 68%, 80%, 90% and 95% intervals
/// plus the median
pub const DEFAULT_ALPHAS: [f64; 9] = [0.025, 0.05, 0.1, 0.16, 0.5, 0.84, 0.9, 0.95, 0.975];

/// How the acceleration constant is estimated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccelerationMethod {
    /// Skewness of the jackknife empirical influence values
    #[default]
    Jackknife,
    /// Skewness of the linear predictor from regressing replicates on the
    /// resampling design
    Regression,
}

/// Rule for reading a percentile off the sorted replicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantileInterpolation {
    /// Linear interpolation between order statistics at position `p (B - 1)`
    #[default]
    Linear,
    /// The order statistic of rank `ceil(p B)`
    Nearest,
}

/// How internal standard errors of the limits are estimated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum InternalSeMethod {
    /// Delta method through (z0, a, sd_boot)
    #[default]
    DeltaMethod,
    /// Delete-a-group jackknife over the replicates, repeated over random
    /// groupings and averaged
    GroupedJackknife { groups: usize, repetitions: usize },
}

/// Configuration of a BCa analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BcaConfig {
    /// Number of bootstrap replicates (B)
    pub n_replicates: usize,
    /// Requested lower-tail probabilities, each in (0, 1)
    pub alphas: Vec<f64>,
    pub acceleration: AccelerationMethod,
    /// Numerator of the boundary correction: a proportion of 0 becomes
    /// `c / B` and a proportion of 1 becomes `1 - c / B`
    pub continuity_correction: f64,
    pub interpolation: QuantileInterpolation,
    /// Largest tolerated fraction of failed replicate evaluations
    pub max_failure_fraction: f64,
    pub internal_se: InternalSeMethod,
    /// Groups used by the delete-a-group jackknife of the acceleration
    pub se_groups: usize,
    /// Seed for resampling and for random SE groupings
    pub seed: Option<u64>,
    /// Wall-clock budget for estimator evaluations
    pub time_limit_ms: Option<u64>,
}

impl Default for BcaConfig {
    fn default() -> Self {
        Self {
            n_replicates: DEFAULT_REPLICATES,
            alphas: DEFAULT_ALPHAS.to_vec(),
            acceleration: AccelerationMethod::default(),
            continuity_correction: 0.5,
            interpolation: QuantileInterpolation::default(),
            max_failure_fraction: 0.5,
            internal_se: InternalSeMethod::default(),
            se_groups: 20,
            seed: None,
            time_limit_ms: None,
        }
    }
}

impl BcaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of bootstrap replicates
    pub fn with_replicates(mut self, n_replicates: usize) -> Self {
        self.n_replicates = n_replicates;
        self
    }

    /// Set the alpha levels
    pub fn with_alphas(mut self, alphas: &[f64]) -> Self {
        self.alphas = alphas.to_vec();
        self
    }

    /// Set the alpha levels from two-sided confidence levels
    ///
    /// A level of 0.9 contributes alphas 0.05 and 0.95.
    pub fn with_confidence_levels(mut self, levels: &[f64]) -> Self {
        self.alphas = levels
            .iter()
            .flat_map(|&level| {
                let tail = (1.0 - level) / 2.0;
                [tail, 1.0 - tail]
            })
            .collect();
        self
    }

    pub fn with_acceleration(mut self, method: AccelerationMethod) -> Self {
        self.acceleration = method;
        self
    }

    pub fn with_continuity_correction(mut self, correction: f64) -> Self {
        self.continuity_correction = correction;
        self
    }

    pub fn with_interpolation(mut self, interpolation: QuantileInterpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_max_failure_fraction(mut self, fraction: f64) -> Self {
        self.max_failure_fraction = fraction;
        self
    }

    pub fn with_internal_se(mut self, method: InternalSeMethod) -> Self {
        self.internal_se = method;
        self
    }

    /// Set random seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(limit.as_millis() as u64);
        self
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    /// Alphas sorted ascending with duplicates removed
    pub fn sorted_alphas(&self) -> Vec<f64> {
        let mut alphas = self.alphas.clone();
        alphas.sort_by(f64::total_cmp);
        alphas.dedup();
        alphas
    }

    /// Check every parameter, failing with `InvalidParameter`
    pub fn validate(&self) -> Result<()> {
        if self.n_replicates < 2 {
            return Err(Error::InvalidParameter(format!(
                "Number of replicates must be at least 2, got {}",
                self.n_replicates
            )));
        }
        if self.alphas.is_empty() {
            return Err(Error::InvalidParameter("At least one alpha is required".to_string()));
        }
        if let Some(&alpha) = self
            .alphas
            .iter()
            .find(|&&a| !(a.is_finite() && a > 0.0 && a < 1.0))
        {
            return Err(Error::invalid_alpha(alpha));
        }
        if !(self.continuity_correction > 0.0 && self.continuity_correction < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "Continuity correction must be in (0, 1), got {}",
                self.continuity_correction
            )));
        }
        if !(self.max_failure_fraction >= 0.0 && self.max_failure_fraction < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "Maximum failure fraction must be in [0, 1), got {}",
                self.max_failure_fraction
            )));
        }
        if let InternalSeMethod::GroupedJackknife { groups, repetitions } = self.internal_se {
            if groups < 2 || repetitions == 0 {
                return Err(Error::InvalidParameter(format!(
                    "Grouped jackknife needs at least 2 groups and 1 repetition, got {groups} and {repetitions}"
                )));
            }
        }
        if self.se_groups < 2 {
            return Err(Error::InvalidParameter(format!(
                "se_groups must be at least 2, got {}",
                self.se_groups
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = BcaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.n_replicates, DEFAULT_REPLICATES);
        assert_eq!(config.sorted_alphas().len(), 9);
    }

    #[test]
    fn test_builder() {
        let config = BcaConfig::new()
            .with_replicates(500)
            .with_confidence_levels(&[0.9])
            .with_acceleration(AccelerationMethod::Regression)
            .with_seed(7)
            .with_time_limit(Duration::from_secs(2));

        assert_eq!(config.n_replicates, 500);
        assert_eq!(config.alphas.len(), 2);
        assert!((config.alphas[0] - 0.05).abs() < 1e-12);
        assert!((config.alphas[1] - 0.95).abs() < 1e-12);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.time_limit(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_sorted_alphas_dedup() {
        let config = BcaConfig::new().with_alphas(&[0.9, 0.1, 0.5, 0.1]);
        assert_eq!(config.sorted_alphas(), vec![0.1, 0.5, 0.9]);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            BcaConfig::new().with_replicates(1).validate(),
            Err(Error::InvalidParameter(_))
        ));
        assert!(BcaConfig::new().with_alphas(&[0.0]).validate().is_err());
        assert!(BcaConfig::new().with_alphas(&[1.0]).validate().is_err());
        assert!(BcaConfig::new().with_alphas(&[]).validate().is_err());
        assert!(BcaConfig::new().with_continuity_correction(0.0).validate().is_err());
        assert!(BcaConfig::new().with_max_failure_fraction(1.0).validate().is_err());
        assert!(BcaConfig::new()
            .with_internal_se(InternalSeMethod::GroupedJackknife {
                groups: 1,
                repetitions: 2
            })
            .validate()
            .is_err());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let json = r#"{
            "n_replicates": 800,
            "acceleration": "regression",
            "internal_se": { "method": "grouped_jackknife", "groups": 10, "repetitions": 2 }
        }"#;
        let config: BcaConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.n_replicates, 800);
        assert_eq!(config.acceleration, AccelerationMethod::Regression);
        assert_eq!(
            config.internal_se,
            InternalSeMethod::GroupedJackknife {
                groups: 10,
                repetitions: 2
            }
        );
        assert_eq!(config.alphas, DEFAULT_ALPHAS.to_vec());
        assert!(config.validate().is_ok());
    }
}
