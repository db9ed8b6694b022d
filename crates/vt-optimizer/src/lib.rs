//! # vt-optimizer
//!
//! Hyperparameter search over GARCH-family volatility models.
//!
//! Given an observed series, the search proposes candidate model
//! configurations (orders, mean model, volatility family, innovation
//! distribution), fits each one through [`vt_garch::VolatilityFitter`],
//! scores it with a composite of information criterion, explanatory
//! power, and volatility-forecast calibration, filters out candidates
//! with statistically insignificant coefficients, and keeps the minimum.
//!
//! [`search_volatility_spec`] is the batteries-included entry point; the
//! pieces ([`GarchSearchSpace`], [`SearchStrategy`], [`Evaluator`],
//! [`SearchDriver`]) compose directly for callers that need control over
//! the strategy or the fitting backend.

pub mod driver;
pub mod evaluate;
pub mod report;
pub mod search;
pub mod trial;

pub use driver::{DriverConfig, SearchDriver};
pub use evaluate::{Evaluator, EWM_COM, PVALUE_THRESHOLD};
pub use search::{AdaptiveSearch, GarchSearchSpace, GridSearch, RandomSearch, SearchStrategy, VolChoice};
pub use trial::{BestTracker, SearchOutcome, TrialRecord};

use std::sync::Arc;
use tracing::info;

use vt_garch::MleFitter;
use vt_types::{BestParams, OrderBounds, Series, VtResult};

/// Exploration share of the adaptive strategy used by the entry point.
const DEFAULT_EXPLORATION: f64 = 0.3;

/// Options for [`search_volatility_spec`].
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub max_p: usize,
    pub max_q: usize,
    pub max_o: usize,
    pub max_lag: usize,
    /// Volatility-family resolution: free, restricted, or pinned.
    pub vol: VolChoice,
    pub trial_count: usize,
    pub worker_count: usize,
    /// Optional exogenous regressor for the mean equation.
    pub exog: Option<Series>,
    /// Seed for the candidate-proposal strategy.
    pub seed: u64,
}

impl SearchOptions {
    pub fn new(max_p: usize, max_q: usize) -> Self {
        Self {
            max_p,
            max_q,
            max_o: 0,
            max_lag: 0,
            vol: VolChoice::Free,
            trial_count: 200,
            worker_count: 5,
            exog: None,
            seed: 0,
        }
    }

    pub fn with_max_o(mut self, max_o: usize) -> Self {
        self.max_o = max_o;
        self
    }

    pub fn with_max_lag(mut self, max_lag: usize) -> Self {
        self.max_lag = max_lag;
        self
    }

    pub fn with_vol(mut self, vol: VolChoice) -> Self {
        self.vol = vol;
        self
    }

    pub fn with_trials(mut self, trial_count: usize) -> Self {
        self.trial_count = trial_count;
        self
    }

    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_exog(mut self, exog: Series) -> Self {
        self.exog = Some(exog);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Search the candidate space for the configuration that best explains
/// the series.
///
/// Runs the trial budget with the bundled maximum-likelihood fitter and
/// the adaptive strategy, prints the winning configuration, its score,
/// and the elapsed wall time, and returns the winner as a key-value
/// mapping. An all-rejected run is reported as such; its returned
/// mapping is the first candidate evaluated and its score is infinite.
pub fn search_volatility_spec(series: Series, options: SearchOptions) -> VtResult<BestParams> {
    let bounds = OrderBounds::new(
        options.max_p,
        options.max_q,
        options.max_o,
        options.max_lag,
    )?;
    let space = GarchSearchSpace::new(bounds, options.vol.clone())?;
    let mut strategy = AdaptiveSearch::new(space, DEFAULT_EXPLORATION, options.seed);

    let evaluator = Evaluator::new(
        MleFitter::new(),
        Arc::new(series),
        options.exog.map(Arc::new),
    );
    let config = DriverConfig {
        trial_count: options.trial_count,
        worker_count: options.worker_count,
        log_trials: true,
    };

    let outcome = SearchDriver::new(evaluator, config).run(&mut strategy)?;
    print!("{}", report::format_outcome(&outcome));
    info!(
        strategy = outcome.strategy.as_str(),
        trials = outcome.trials_run,
        rejected = outcome.trials_rejected,
        "search complete"
    );

    Ok(outcome.best_params().unwrap_or_default())
}
