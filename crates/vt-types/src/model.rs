use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{validation_error, VtError, VtResult};

/// Conditional-variance process family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolModel {
    Arch,
    Garch,
    Egarch,
}

impl VolModel {
    pub const ALL: [VolModel; 3] = [VolModel::Arch, VolModel::Garch, VolModel::Egarch];

    pub fn as_str(&self) -> &'static str {
        match self {
            VolModel::Arch => "arch",
            VolModel::Garch => "garch",
            VolModel::Egarch => "egarch",
        }
    }

    /// Whether the recursion carries lagged-variance (beta) terms.
    /// The pure ARCH process has none.
    pub fn has_beta(&self) -> bool {
        !matches!(self, VolModel::Arch)
    }

    /// Whether the recursion admits asymmetry (gamma) terms.
    pub fn has_asymmetry(&self) -> bool {
        !matches!(self, VolModel::Arch)
    }
}

impl fmt::Display for VolModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mean-equation specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeanModel {
    Constant,
    Ar,
    Zero,
}

impl MeanModel {
    pub const ALL: [MeanModel; 3] = [MeanModel::Constant, MeanModel::Ar, MeanModel::Zero];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeanModel::Constant => "constant",
            MeanModel::Ar => "AR",
            MeanModel::Zero => "zero",
        }
    }

    /// Zero-mean processes carry no estimated mean parameters and ignore
    /// exogenous regressors.
    pub fn permits_exog(&self) -> bool {
        !matches!(self, MeanModel::Zero)
    }
}

impl fmt::Display for MeanModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Innovation distribution for the standardized residuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorDist {
    Normal,
    StudentsT,
    SkewT,
    Ged,
}

impl ErrorDist {
    pub const ALL: [ErrorDist; 4] = [
        ErrorDist::Normal,
        ErrorDist::StudentsT,
        ErrorDist::SkewT,
        ErrorDist::Ged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorDist::Normal => "normal",
            ErrorDist::StudentsT => "studentst",
            ErrorDist::SkewT => "skewt",
            ErrorDist::Ged => "ged",
        }
    }

    /// Number of shape parameters estimated alongside the model.
    pub fn shape_param_count(&self) -> usize {
        match self {
            ErrorDist::Normal => 0,
            ErrorDist::StudentsT | ErrorDist::Ged => 1,
            ErrorDist::SkewT => 2,
        }
    }
}

impl fmt::Display for ErrorDist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inclusive upper bounds for the integer model orders.
///
/// `max_p` and `max_q` must be at least 1 (a volatility model without its
/// first-order terms is not estimable); `max_o` and `max_lag` may be zero,
/// which pins the corresponding order at zero for every candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBounds {
    pub max_p: usize,
    pub max_q: usize,
    pub max_o: usize,
    pub max_lag: usize,
}

impl OrderBounds {
    pub fn new(max_p: usize, max_q: usize, max_o: usize, max_lag: usize) -> VtResult<Self> {
        let bounds = Self {
            max_p,
            max_q,
            max_o,
            max_lag,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> VtResult<()> {
        if self.max_p < 1 {
            return Err(VtError::Config(format!(
                "max_p must be >= 1, got {}",
                self.max_p
            )));
        }
        if self.max_q < 1 {
            return Err(VtError::Config(format!(
                "max_q must be >= 1, got {}",
                self.max_q
            )));
        }
        Ok(())
    }
}

/// A fully specified candidate model: one point in the search space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub p: usize,
    pub q: usize,
    pub o: usize,
    pub lags: usize,
    pub mean: MeanModel,
    pub vol: VolModel,
    pub dist: ErrorDist,
}

impl CandidateSpec {
    /// Check the order invariants against the bounds they were sampled from.
    pub fn validate(&self, bounds: &OrderBounds) -> VtResult<()> {
        if self.p < 1 || self.p > bounds.max_p {
            return Err(validation_error!(
                "p={} outside [1, {}]",
                self.p,
                bounds.max_p
            ));
        }
        if self.q < 1 || self.q > bounds.max_q {
            return Err(validation_error!(
                "q={} outside [1, {}]",
                self.q,
                bounds.max_q
            ));
        }
        if self.o > bounds.max_o {
            return Err(validation_error!("o={} above {}", self.o, bounds.max_o));
        }
        if self.lags > bounds.max_lag {
            return Err(validation_error!(
                "lags={} above {}",
                self.lags,
                bounds.max_lag
            ));
        }
        Ok(())
    }

    /// Render the candidate as the key-value mapping returned to callers.
    pub fn to_params(&self) -> BestParams {
        let mut params = BTreeMap::new();
        params.insert("p".to_string(), serde_json::json!(self.p));
        params.insert("q".to_string(), serde_json::json!(self.q));
        params.insert("o".to_string(), serde_json::json!(self.o));
        params.insert("lags".to_string(), serde_json::json!(self.lags));
        params.insert(
            "mean_model".to_string(),
            serde_json::json!(self.mean.as_str()),
        );
        params.insert("vol_model".to_string(), serde_json::json!(self.vol.as_str()));
        params.insert(
            "error_dist".to_string(),
            serde_json::json!(self.dist.as_str()),
        );
        params
    }
}

impl fmt::Display for CandidateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(p={}, o={}, q={}) mean={} lags={} dist={}",
            self.vol, self.p, self.o, self.q, self.mean, self.lags, self.dist
        )
    }
}

/// Ordered key-value mapping describing the winning candidate.
pub type BestParams = BTreeMap<String, serde_json::Value>;
