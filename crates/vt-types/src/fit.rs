use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything the estimation engine reports about one fitted candidate.
///
/// The evaluation layer consumes this read-only: information criteria and
/// adjusted R-squared feed the composite score, the p-value table feeds
/// admissibility filtering, and the conditional-volatility path is
/// compared against the model-free volatility proxy.
///
/// Coefficient names follow the usual GARCH conventions: `mu`, `omega`,
/// `alpha[i]`, `gamma[k]`, `beta[j]`, shape parameters `nu` and `lambda`,
/// and mean-equation AR terms named `{series_name}[lag]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    /// Bayesian information criterion (lower is better).
    pub bic: f64,
    /// Akaike information criterion.
    pub aic: f64,
    /// Maximized log-likelihood.
    pub loglik: f64,
    /// Adjusted coefficient of determination of the mean equation.
    pub adj_rsquared: f64,
    /// Point estimates by coefficient name.
    pub params: HashMap<String, f64>,
    /// Two-sided p-values by coefficient name.
    pub pvalues: HashMap<String, f64>,
    /// Conditional volatility in the units of the input series, aligned
    /// index-for-index with it. Positions consumed by AR lags are NaN.
    pub conditional_volatility: Vec<f64>,
    /// Power-of-ten factor the series was multiplied by before fitting.
    pub scale: f64,
    /// Observations that entered the likelihood.
    pub nobs: usize,
}
