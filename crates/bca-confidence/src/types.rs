//! Two-sided intervals read off a limits table

use bca_core::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Lower and upper limits around a point estimate
///
/// BCa intervals are generally not centered on the estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    /// Lower bound of the interval
    pub lower: f64,
    /// Upper bound of the interval
    pub upper: f64,
    /// The point estimate
    pub estimate: f64,
    /// Confidence level (e.g., 0.95 for 95% CI)
    pub confidence_level: f64,
}

impl ConfidenceInterval {
    pub fn new(lower: f64, upper: f64, estimate: f64, confidence_level: f64) -> Self {
        Self {
            lower,
            upper,
            estimate,
            confidence_level,
        }
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

impl fmt::Display for ConfidenceInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}% CI: [{:.4}, {:.4}], estimate: {:.4}",
            self.confidence_level * 100.0,
            self.lower,
            self.upper,
            self.estimate
        )
    }
}

/// Two-sided confidence level in (0, 1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceLevel(f64);

impl ConfidenceLevel {
    pub fn new(level: f64) -> Result<Self> {
        if !(level > 0.0 && level < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "Confidence level must be in (0, 1), got {level}"
            )));
        }
        Ok(Self(level))
    }

    /// Total tail mass (1 - level)
    pub fn alpha(&self) -> f64 {
        1.0 - self.0
    }

    /// Alpha of the lower limit
    pub fn lower_alpha(&self) -> f64 {
        self.alpha() / 2.0
    }

    /// Alpha of the upper limit
    pub fn upper_alpha(&self) -> f64 {
        1.0 - self.alpha() / 2.0
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0 * 100.0)
    }
}
