//! Formatted terminal output for finished runs.
//!
//! Formatting lives in one place so the search code stays testable and
//! output changes are localized.

use std::time::Duration;

use crate::trial::SearchOutcome;

/// Format a duration as `HH:MM:SS.ss`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs_f64();
    let hours = (total / 3600.0) as u64;
    let minutes = ((total % 3600.0) / 60.0) as u64;
    let seconds = total % 60.0;
    format!("{hours:02}:{minutes:02}:{seconds:05.2}")
}

/// Render the run summary: winning parameters, score, and wall time.
pub fn format_outcome(outcome: &SearchOutcome) -> String {
    let mut out = String::new();

    if outcome.all_rejected() {
        out.push_str(&format!(
            "No admissible configuration found: all {} trials were rejected.\n",
            outcome.trials_run
        ));
    }
    if let Some(best) = &outcome.best {
        let params = serde_json::to_string(&best.candidate.to_params()).unwrap_or_default();
        out.push_str(&format!("Best Parameters: {params}\n"));
        out.push_str(&format!("Best Score: {}\n", best.score));
    }
    out.push_str(&format!(
        "Elapsed Time: {}\n",
        format_elapsed(outcome.elapsed)
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use vt_types::{CandidateSpec, ErrorDist, MeanModel, RejectReason, Score, VolModel};

    use crate::trial::TrialRecord;

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00:00.00");
        assert_eq!(format_elapsed(Duration::from_secs_f64(45.5)), "00:00:45.50");
        assert_eq!(
            format_elapsed(Duration::from_secs_f64(3661.25)),
            "01:01:01.25"
        );
        assert_eq!(
            format_elapsed(Duration::from_secs(7200 + 600 + 9)),
            "02:10:09.00"
        );
    }

    fn outcome(score: Score, trials_rejected: usize) -> SearchOutcome {
        SearchOutcome {
            best: Some(TrialRecord {
                id: Uuid::new_v4(),
                number: 0,
                candidate: CandidateSpec {
                    p: 2,
                    q: 1,
                    o: 0,
                    lags: 0,
                    mean: MeanModel::Constant,
                    vol: VolModel::Garch,
                    dist: ErrorDist::Normal,
                },
                score,
                started_at: Utc::now(),
                finished_at: Utc::now(),
            }),
            trials_run: 10,
            trials_rejected,
            elapsed: Duration::from_secs_f64(1.5),
            strategy: "adaptive".to_string(),
        }
    }

    #[test]
    fn summary_lists_parameters_score_and_time() {
        let text = format_outcome(&outcome(Score::Finite(123.456), 2));
        assert!(text.contains("Best Parameters:"));
        assert!(text.contains("\"vol_model\":\"garch\""));
        assert!(text.contains("Best Score: 123.456"));
        assert!(text.contains("Elapsed Time: 00:00:01.50"));
        assert!(!text.contains("No admissible configuration"));
    }

    #[test]
    fn all_rejected_summary_says_so() {
        let text = format_outcome(&outcome(
            Score::Rejected(RejectReason::ZeroRSquared),
            10,
        ));
        assert!(text.contains("No admissible configuration found"));
        assert!(text.contains("rejected"));
    }
}
