//! Bias-correction constant z0

use crate::diagnostics::{Diagnostic, Diagnostics};
use bca_core::math::distributions::normal;
use bca_core::{Error, Result};
use tracing::{debug, warn};

/// Estimated bias correction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasCorrection {
    pub z0: f64,
    /// Proportion of replicates strictly below the point estimate, after any
    /// boundary correction
    pub proportion: f64,
    /// The raw proportion was 0 or 1
    pub corrected: bool,
}

/// Estimates z0 from the replicate distribution
#[derive(Debug, Clone, Copy)]
pub struct BiasCorrector {
    continuity_correction: f64,
}

impl Default for BiasCorrector {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl BiasCorrector {
    /// `continuity_correction` is `c` in the boundary replacements `c / B`
    /// and `1 - c / B`
    pub fn new(continuity_correction: f64) -> Self {
        Self {
            continuity_correction,
        }
    }

    /// `z0 = Phi^-1(#{t*_b < t0} / B)`
    ///
    /// A proportion of exactly 0 or 1 would give an infinite z0; it is
    /// replaced by its continuity-corrected value and a
    /// [`Diagnostic::BoundaryExceeded`] is recorded.
    pub fn estimate(
        &self,
        replicates: &[f64],
        point_estimate: f64,
        diagnostics: &mut Diagnostics,
    ) -> Result<BiasCorrection> {
        if replicates.is_empty() {
            return Err(Error::InvalidInput("No bootstrap replicates".to_string()));
        }

        let b = replicates.len() as f64;
        let below = replicates.iter().filter(|&&t| t < point_estimate).count();
        let raw = below as f64 / b;

        debug!(
            "Bias correction: {} of {} replicates below the point estimate (proportion: {:.4})",
            below,
            replicates.len(),
            raw
        );

        let (proportion, corrected) = if below == 0 {
            (self.continuity_correction / b, true)
        } else if below == replicates.len() {
            (1.0 - self.continuity_correction / b, true)
        } else {
            (raw, false)
        };

        if corrected {
            warn!(raw, proportion, "point estimate outside the replicate range");
            diagnostics.push(Diagnostic::BoundaryExceeded {
                raw_proportion: raw,
                corrected_proportion: proportion,
            });
        }

        Ok(BiasCorrection {
            z0: normal::ppf(proportion),
            proportion,
            corrected,
        })
    }
}
