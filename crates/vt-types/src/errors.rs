use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the VolTune system
#[derive(Error, Debug)]
pub enum VtError {
    #[error("Fit error: {0}")]
    Fit(#[from] FitError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure modes of the model-fitting engine.
///
/// Every variant here is recoverable at the evaluation layer: a candidate
/// whose fit fails is scored with the rejection sentinel and the search
/// moves on.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FitError {
    #[error("Ill-conditioned fit: {message}")]
    IllConditioned { message: String },

    #[error("Optimizer failed to converge: {message}")]
    ConvergenceFailure { message: String },

    #[error("Numerical failure during fitting: {message}")]
    Numerical { message: String },

    #[error("Invalid fit input: {message}")]
    InvalidInput { message: String },
}

/// Search-space and driver errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Empty volatility-model restriction")]
    EmptyVolRestriction,

    #[error("Trial budget is zero")]
    EmptyTrialBudget,

    #[error("Worker pool error: {message}")]
    WorkerPool { message: String },
}

/// Result type alias for VolTune operations
pub type VtResult<T> = Result<T, VtError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::VtError::Validation(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::VtError::Config(format!($($arg)*))
    };
}
