//! Diagnostics raised during a BCa analysis
//!
//! Recoverable conditions never abort an analysis. They are recorded here
//! and returned with the result, even when the list is empty.

use bitflags::bitflags;
use serde::Serialize;
use std::fmt;

bitflags! {
    /// Compact set view over the diagnostics raised by an analysis
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DiagnosticFlags: u32 {
        /// z0 proportion was 0 or 1 and was continuity-corrected
        const BOUNDARY_EXCEEDED = 1 << 0;
        /// Influence values had zero spread; acceleration set to 0
        const DEGENERATE_ACCELERATION = 1 << 1;
        /// At least one alpha produced a non-positive BCa denominator
        const DEGENERATE_LIMIT = 1 << 2;
        /// A BCa limit was read from the extreme tail of the replicates
        const EXTREME_PERCENTILE = 1 << 3;
        /// Some replicate evaluations failed and were excluded
        const REPLICATE_FAILURES = 1 << 4;
        /// A variance was negative or non-finite and clamped to zero
        const NUMERICAL_INSTABILITY = 1 << 5;
        /// All replicate statistics were identical
        const ZERO_VARIANCE = 1 << 6;
        /// Some leave-one-out evaluations failed; acceleration came from regression
        const JACKKNIFE_FAILURES = 1 << 7;
    }
}

/// A single recoverable condition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The point estimate lies outside the replicate range
    BoundaryExceeded {
        raw_proportion: f64,
        corrected_proportion: f64,
    },
    /// Zero-variance influence values
    DegenerateAcceleration { source: String },
    /// `1 - a (z0 + z_alpha) <= 0` for this alpha
    DegenerateLimit { alpha: f64, denominator: f64 },
    /// The BCa percentile fell outside `[1/B, (B-1)/B]`
    ExtremePercentile { alpha: f64, percentile: f64 },
    /// Replicates excluded because the statistic failed on them
    ReplicateFailures { failed: usize, total: usize },
    /// A variance estimate was clamped to zero
    NumericalInstability { quantity: String, value: f64 },
    /// The bootstrap distribution has no spread
    ZeroVariance,
    /// Leave-one-out statistics discarded because the statistic failed on some
    JackknifeFailures { failed: usize, total: usize },
}

impl Diagnostic {
    /// Flag corresponding to this diagnostic
    pub fn flag(&self) -> DiagnosticFlags {
        match self {
            Self::BoundaryExceeded { .. } => DiagnosticFlags::BOUNDARY_EXCEEDED,
            Self::DegenerateAcceleration { .. } => DiagnosticFlags::DEGENERATE_ACCELERATION,
            Self::DegenerateLimit { .. } => DiagnosticFlags::DEGENERATE_LIMIT,
            Self::ExtremePercentile { .. } => DiagnosticFlags::EXTREME_PERCENTILE,
            Self::ReplicateFailures { .. } => DiagnosticFlags::REPLICATE_FAILURES,
            Self::NumericalInstability { .. } => DiagnosticFlags::NUMERICAL_INSTABILITY,
            Self::ZeroVariance => DiagnosticFlags::ZERO_VARIANCE,
            Self::JackknifeFailures { .. } => DiagnosticFlags::JACKKNIFE_FAILURES,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BoundaryExceeded {
                raw_proportion,
                corrected_proportion,
            } => write!(
                f,
                "point estimate outside replicate range: proportion {raw_proportion} corrected to {corrected_proportion:.6}"
            ),
            Self::DegenerateAcceleration { source } => {
                write!(f, "{source} influence values have zero variance; acceleration set to 0")
            }
            Self::DegenerateLimit { alpha, denominator } => write!(
                f,
                "alpha {alpha}: BCa denominator {denominator:.4} is not positive"
            ),
            Self::ExtremePercentile { alpha, percentile } => write!(
                f,
                "alpha {alpha}: limit taken at replicate percentile {percentile:.6}"
            ),
            Self::ReplicateFailures { failed, total } => {
                write!(f, "{failed} of {total} replicates failed and were excluded")
            }
            Self::NumericalInstability { quantity, value } => {
                write!(f, "variance of {quantity} was {value}; clamped to 0")
            }
            Self::ZeroVariance => write!(f, "all replicate statistics are identical"),
            Self::JackknifeFailures { failed, total } => write!(
                f,
                "{failed} of {total} leave-one-out statistics failed; acceleration estimated by regression"
            ),
        }
    }
}

/// Ordered collection of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Union of the flags of every recorded diagnostic
    pub fn flags(&self) -> DiagnosticFlags {
        self.entries
            .iter()
            .fold(DiagnosticFlags::empty(), |acc, d| acc | d.flag())
    }

    pub fn contains(&self, flag: DiagnosticFlags) -> bool {
        self.flags().contains(flag)
    }
}

/// Clamp a variance estimate, recording instability instead of propagating NaN
pub(crate) fn clamp_variance(value: f64, quantity: &str, diagnostics: &mut Diagnostics) -> f64 {
    if value.is_finite() && value >= 0.0 {
        return value;
    }
    tracing::warn!(quantity, value, "clamping unstable variance to zero");
    diagnostics.push(Diagnostic::NumericalInstability {
        quantity: quantity.to_string(),
        value,
    });
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_fold_over_entries() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.flags().is_empty());

        diagnostics.push(Diagnostic::ZeroVariance);
        diagnostics.push(Diagnostic::DegenerateLimit {
            alpha: 0.975,
            denominator: -0.2,
        });

        let flags = diagnostics.flags();
        assert!(flags.contains(DiagnosticFlags::ZERO_VARIANCE));
        assert!(flags.contains(DiagnosticFlags::DEGENERATE_LIMIT));
        assert!(!flags.contains(DiagnosticFlags::BOUNDARY_EXCEEDED));
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_clamp_variance() {
        let mut diagnostics = Diagnostics::new();
        assert_eq!(clamp_variance(0.25, "z0", &mut diagnostics), 0.25);
        assert!(diagnostics.is_empty());

        assert_eq!(clamp_variance(-1e-18, "limit", &mut diagnostics), 0.0);
        assert_eq!(clamp_variance(f64::NAN, "a", &mut diagnostics), 0.0);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.contains(DiagnosticFlags::NUMERICAL_INSTABILITY));
    }

    #[test]
    fn test_serialized_tag() {
        let json = serde_json::to_string(&Diagnostic::ZeroVariance).unwrap();
        assert_eq!(json, r#"{"kind":"zero_variance"}"#);

        let json =
            serde_json::to_string(&Diagnostic::JackknifeFailures { failed: 1, total: 20 }).unwrap();
        assert_eq!(json, r#"{"kind":"jackknife_failures","failed":1,"total":20}"#);
    }
}
