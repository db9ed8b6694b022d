//! Trial bookkeeping and best-result reduction for one search run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vt_types::{BestParams, CandidateSpec, Score};

/// A single trial: one candidate and its evaluated score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub id: Uuid,
    /// Position in the fixed trial ordering; ties on score are broken by
    /// the lowest number so results are reproducible across worker
    /// schedules.
    pub number: usize,
    pub candidate: CandidateSpec,
    pub score: Score,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Running minimum-reduction over trial records.
///
/// The reduction is commutative over scores, so the order workers finish
/// in cannot change the winner; equal scores keep the earliest trial.
#[derive(Debug, Default)]
pub struct BestTracker {
    best: Option<TrialRecord>,
}

impl BestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, record: &TrialRecord) {
        let improves = match &self.best {
            None => true,
            Some(current) => {
                let (new, old) = (record.score.objective(), current.score.objective());
                new < old || (new == old && record.number < current.number)
            }
        };
        if improves {
            self.best = Some(record.clone());
        }
    }

    pub fn best(&self) -> Option<&TrialRecord> {
        self.best.as_ref()
    }

    pub fn into_best(self) -> Option<TrialRecord> {
        self.best
    }
}

/// Aggregate outcome of a search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// The minimum-score trial. `None` only when no trial ran at all.
    pub best: Option<TrialRecord>,
    pub trials_run: usize,
    pub trials_rejected: usize,
    pub elapsed: std::time::Duration,
    pub strategy: String,
}

impl SearchOutcome {
    /// True when the run produced no admissible candidate: the "best"
    /// score is the rejection sentinel and must not be read as a
    /// meaningful model.
    pub fn all_rejected(&self) -> bool {
        self.trials_run > 0
            && self
                .best
                .as_ref()
                .map_or(true, |best| best.score.is_rejected())
    }

    /// The scalar objective of the winner (infinite if all rejected).
    pub fn best_objective(&self) -> f64 {
        self.best
            .as_ref()
            .map_or(f64::INFINITY, |best| best.score.objective())
    }

    /// The winning candidate as a key-value mapping.
    pub fn best_params(&self) -> Option<BestParams> {
        self.best.as_ref().map(|best| best.candidate.to_params())
    }
}
