//! Parallel trial driver: proposes candidates, evaluates them on a
//! bounded worker pool, and reduces the results to a best trial.

use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use vt_garch::VolatilityFitter;
use vt_types::{SearchError, VtResult};

use crate::evaluate::Evaluator;
use crate::search::SearchStrategy;
use crate::trial::{BestTracker, SearchOutcome, TrialRecord};

/// Driver configuration, passed in explicitly rather than read from any
/// process-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Total number of trials to run.
    pub trial_count: usize,
    /// How many trials evaluate concurrently.
    pub worker_count: usize,
    /// Emit a tracing event per completed trial.
    pub log_trials: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            trial_count: 200,
            worker_count: 5,
            log_trials: true,
        }
    }
}

/// Runs the trial budget against one evaluator.
///
/// Trials are dispatched in batches of `worker_count` on a dedicated
/// thread pool; the strategy only sees completed objectives between
/// batches, so its internal state needs no synchronization. The series
/// behind the evaluator is shared read-only by every worker.
pub struct SearchDriver<F> {
    evaluator: Evaluator<F>,
    config: DriverConfig,
}

impl<F: VolatilityFitter> SearchDriver<F> {
    pub fn new(evaluator: Evaluator<F>, config: DriverConfig) -> Self {
        Self { evaluator, config }
    }

    pub fn run(&self, strategy: &mut dyn SearchStrategy) -> VtResult<SearchOutcome> {
        if self.config.trial_count == 0 {
            return Err(SearchError::EmptyTrialBudget.into());
        }
        let workers = self.config.worker_count.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| SearchError::WorkerPool {
                message: e.to_string(),
            })?;

        info!(
            strategy = strategy.name(),
            trials = self.config.trial_count,
            workers,
            "starting candidate search"
        );
        let start = Instant::now();
        let mut tracker = BestTracker::new();
        let mut trials_run = 0usize;
        let mut trials_rejected = 0usize;

        while trials_run < self.config.trial_count {
            let batch_size = workers.min(self.config.trial_count - trials_run);
            let mut batch = strategy.suggest(batch_size);
            batch.truncate(batch_size);
            if batch.is_empty() {
                warn!(
                    trials_run,
                    "strategy exhausted before the trial budget; stopping early"
                );
                break;
            }

            let first_number = trials_run;
            let records: Vec<TrialRecord> = pool.install(|| {
                batch
                    .par_iter()
                    .enumerate()
                    .map(|(offset, candidate)| {
                        let started_at = Utc::now();
                        let score = self.evaluator.evaluate(candidate);
                        TrialRecord {
                            id: Uuid::new_v4(),
                            number: first_number + offset,
                            candidate: *candidate,
                            score,
                            started_at,
                            finished_at: Utc::now(),
                        }
                    })
                    .collect()
            });

            for record in &records {
                strategy.report(&record.candidate, record.score.objective());
                if record.score.is_rejected() {
                    trials_rejected += 1;
                }
                if self.config.log_trials {
                    debug!(
                        trial = record.number,
                        candidate = %record.candidate,
                        score = %record.score,
                        "trial completed"
                    );
                }
                tracker.update(record);
                trials_run += 1;
            }
        }

        let outcome = SearchOutcome {
            best: tracker.into_best(),
            trials_run,
            trials_rejected,
            elapsed: start.elapsed(),
            strategy: strategy.name().to_string(),
        };

        if outcome.all_rejected() {
            warn!(
                trials = outcome.trials_run,
                "every trial was rejected; no admissible configuration found"
            );
        } else if let Some(best) = &outcome.best {
            info!(
                trial = best.number,
                candidate = %best.candidate,
                score = %best.score,
                "search finished"
            );
        }
        Ok(outcome)
    }
}
