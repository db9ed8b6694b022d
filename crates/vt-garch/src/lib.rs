//! # vt-garch
//!
//! Maximum-likelihood estimation engine for the ARCH/GARCH/EGARCH family.
//!
//! The rest of the workspace talks to this crate through the
//! [`VolatilityFitter`] trait, so the candidate evaluation layer stays
//! decoupled from any particular estimation backend. [`MleFitter`] is the
//! bundled implementation: joint Nelder-Mead maximum likelihood over the
//! mean and variance equations with finite-difference inference.

pub mod dist;
pub mod inference;
pub mod mean;
pub mod mle;
pub mod variance;

pub use mle::{FitOptions, MleFitter};

use vt_types::{CandidateSpec, FitError, FitReport, Series};

/// Boundary between the search layer and whatever estimates the models.
///
/// Implementations fit the candidate to the series by maximum likelihood
/// (or any other method) and report criteria, coefficient p-values, and
/// the conditional-volatility path. Failures are ordinary values of
/// [`FitError`]; callers decide how to score them.
pub trait VolatilityFitter: Send + Sync {
    fn fit(
        &self,
        spec: &CandidateSpec,
        series: &Series,
        exog: Option<&Series>,
    ) -> Result<FitReport, FitError>;
}
