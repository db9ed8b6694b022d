use serde::{Deserialize, Serialize};
use std::fmt;

use crate::FitError;

/// Why a candidate was excluded from consideration.
///
/// Rejections are data, not errors: the search records the reason and
/// keeps going. Keeping the reason inspectable makes "why did nothing
/// survive" diagnosable after an all-rejected run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The fitting engine failed (instability, non-convergence, ...).
    FitFailed(FitError),
    /// Adjusted R-squared was exactly zero, so the explanatory-power
    /// term of the composite score is undefined.
    ZeroRSquared,
    /// A structurally required coefficient was not statistically
    /// distinguishable from zero at the admissibility threshold.
    InsignificantCoefficient { name: String, pvalue: f64 },
    /// A coefficient the candidate requires was absent from the report.
    MissingCoefficient { name: String },
    /// The composite score came out non-finite.
    NonFiniteScore,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::FitFailed(e) => write!(f, "fit failed: {e}"),
            RejectReason::ZeroRSquared => write!(f, "adjusted R-squared is zero"),
            RejectReason::InsignificantCoefficient { name, pvalue } => {
                write!(f, "coefficient {name} insignificant (p={pvalue:.4})")
            }
            RejectReason::MissingCoefficient { name } => {
                write!(f, "coefficient {name} missing from fit report")
            }
            RejectReason::NonFiniteScore => write!(f, "composite score is non-finite"),
        }
    }
}

/// Outcome of evaluating one candidate. Lower finite scores are better;
/// rejected candidates compare worse than any finite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Score {
    Finite(f64),
    Rejected(RejectReason),
}

impl Score {
    /// The scalar a minimizing search engine sees: the finite value, or
    /// positive infinity for rejected candidates.
    pub fn objective(&self) -> f64 {
        match self {
            Score::Finite(v) => *v,
            Score::Rejected(_) => f64::INFINITY,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Score::Rejected(_))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Finite(v) => write!(f, "{v:.6}"),
            Score::Rejected(reason) => write!(f, "rejected ({reason})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_scores_are_infinite_objectives() {
        let score = Score::Rejected(RejectReason::ZeroRSquared);
        assert!(score.is_rejected());
        assert!(score.objective().is_infinite());
    }

    #[test]
    fn finite_scores_pass_through() {
        let score = Score::Finite(42.5);
        assert!(!score.is_rejected());
        assert_eq!(score.objective(), 42.5);
    }

    #[test]
    fn reject_reason_display_names_the_coefficient() {
        let reason = RejectReason::InsignificantCoefficient {
            name: "beta[1]".to_string(),
            pvalue: 0.3,
        };
        let text = reason.to_string();
        assert!(text.contains("beta[1]"));
        assert!(text.contains("0.3"));
    }
}
