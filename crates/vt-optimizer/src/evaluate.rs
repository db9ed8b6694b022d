//! Candidate evaluation: fit, composite score, admissibility filtering.
//!
//! This is the objective function the search minimizes. It owns the
//! scoring formula and the admissibility policy; the fitting itself is
//! delegated through [`VolatilityFitter`]. Evaluation never fails: every
//! failure mode of the fit becomes a rejection with an inspectable
//! reason, so the search keeps exploring.

use std::sync::Arc;
use tracing::debug;

use vt_garch::VolatilityFitter;
use vt_types::{CandidateSpec, FitReport, MeanModel, RejectReason, Score, Series};

/// Coefficients must beat this p-value to count as significant.
pub const PVALUE_THRESHOLD: f64 = 0.05;

/// Center of mass of the EWM volatility proxy the fit is compared to.
pub const EWM_COM: f64 = 3.0;

/// Scores one candidate against a fixed series.
///
/// Stateless and pure given its inputs; the driver calls it from many
/// workers at once against the same shared series.
pub struct Evaluator<F> {
    fitter: F,
    series: Arc<Series>,
    exog: Option<Arc<Series>>,
}

impl<F: VolatilityFitter> Evaluator<F> {
    pub fn new(fitter: F, series: Arc<Series>, exog: Option<Arc<Series>>) -> Self {
        Self {
            fitter,
            series,
            exog,
        }
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    /// Fit the candidate and score it.
    pub fn evaluate(&self, candidate: &CandidateSpec) -> Score {
        let report = match self.fitter.fit(candidate, &self.series, self.exog.as_deref()) {
            Ok(report) => report,
            Err(e) => {
                debug!(candidate = %candidate, error = %e, "fit failed, rejecting candidate");
                return Score::Rejected(RejectReason::FitFailed(e));
            }
        };

        if let Some(reason) = self.admissibility(candidate, &report) {
            debug!(candidate = %candidate, reason = %reason, "candidate rejected");
            return Score::Rejected(reason);
        }

        self.composite(&report)
    }

    /// Check the p-values of every coefficient the candidate structurally
    /// requires: the order-p shock coefficient always, the order-q
    /// variance coefficient unless the family has none, the asymmetry
    /// coefficient when present, and the mean-equation AR coefficient
    /// when the mean is autoregressive.
    fn admissibility(&self, candidate: &CandidateSpec, report: &FitReport) -> Option<RejectReason> {
        let mut checked = vec![format!("alpha[{}]", candidate.p)];
        if candidate.vol.has_beta() {
            checked.push(format!("beta[{}]", candidate.q));
        }
        if candidate.o != 0 && candidate.vol.has_asymmetry() {
            checked.push(format!("gamma[{}]", candidate.o));
        }
        if candidate.lags != 0 && candidate.mean == MeanModel::Ar {
            checked.push(format!("{}[{}]", self.series.name(), candidate.lags));
        }

        for name in checked {
            match report.pvalues.get(&name) {
                None => return Some(RejectReason::MissingCoefficient { name }),
                // NaN p-values fail the comparison and are rejected too.
                Some(&pvalue) if !(pvalue < PVALUE_THRESHOLD) => {
                    return Some(RejectReason::InsignificantCoefficient { name, pvalue })
                }
                Some(_) => {}
            }
        }
        None
    }

    /// Composite score: information criterion, plus an explanatory-power
    /// penalty, plus a forecast-calibration penalty against the EWM
    /// volatility proxy. All three terms shrink for better models, so
    /// they combine additively.
    fn composite(&self, report: &FitReport) -> Score {
        if report.adj_rsquared == 0.0 {
            return Score::Rejected(RejectReason::ZeroRSquared);
        }

        let truth = self.series.ewm_std(EWM_COM);
        let mape = mape(&truth, &report.conditional_volatility);

        let score = report.bic + 100.0 / report.adj_rsquared + 100.0 * mape;
        if score.is_finite() {
            Score::Finite(score)
        } else {
            Score::Rejected(RejectReason::NonFiniteScore)
        }
    }
}

/// Mean absolute percentage error over the positions where both
/// sequences hold finite values. Denominators are clamped away from zero
/// so an exactly-zero reference cannot produce a division blowup.
pub fn mape(truth: &[f64], pred: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for (&t, &p) in truth.iter().zip(pred.iter()) {
        if t.is_finite() && p.is_finite() {
            sum += (t - p).abs() / t.abs().max(f64::EPSILON);
            n += 1;
        }
    }
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use vt_types::{ErrorDist, FitError, VolModel};

    /// Fitter that returns a canned report (or error) for every candidate.
    struct FakeFitter {
        result: Result<FitReport, FitError>,
    }

    impl VolatilityFitter for FakeFitter {
        fn fit(
            &self,
            _spec: &CandidateSpec,
            _series: &Series,
            _exog: Option<&Series>,
        ) -> Result<FitReport, FitError> {
            self.result.clone()
        }
    }

    fn series() -> Arc<Series> {
        Arc::new(Series::new("y", vec![1.0, 2.0, 3.0]).unwrap())
    }

    fn garch_candidate() -> CandidateSpec {
        CandidateSpec {
            p: 1,
            q: 1,
            o: 0,
            lags: 0,
            mean: MeanModel::Constant,
            vol: VolModel::Garch,
            dist: ErrorDist::Normal,
        }
    }

    fn significant_pvalues() -> HashMap<String, f64> {
        HashMap::from([
            ("mu".to_string(), 0.001),
            ("omega".to_string(), 0.001),
            ("alpha[1]".to_string(), 0.01),
            ("beta[1]".to_string(), 0.02),
        ])
    }

    /// A report whose volatility path equals the EWM proxy exactly, so
    /// the calibration term vanishes and the score is fully determined
    /// by bic and adjusted R-squared.
    fn calibrated_report(s: &Series) -> FitReport {
        FitReport {
            bic: 10.0,
            aic: 8.0,
            loglik: -4.0,
            adj_rsquared: 0.5,
            params: HashMap::new(),
            pvalues: significant_pvalues(),
            conditional_volatility: s.ewm_std(EWM_COM),
            scale: 1.0,
            nobs: s.len(),
        }
    }

    fn evaluator(result: Result<FitReport, FitError>) -> Evaluator<FakeFitter> {
        Evaluator::new(FakeFitter { result }, series(), None)
    }

    #[test]
    fn composite_score_matches_the_formula() {
        let s = series();
        let eval = evaluator(Ok(calibrated_report(&s)));

        // bic + 100 / adj_r2 + 100 * mape = 10 + 200 + 0
        match eval.evaluate(&garch_candidate()) {
            Score::Finite(v) => assert!((v - 210.0).abs() < 1e-9, "score {v}"),
            other => panic!("expected finite score, got {other:?}"),
        }
    }

    #[test]
    fn insignificant_coefficient_rejects_regardless_of_score() {
        let s = series();
        let mut report = calibrated_report(&s);
        report.pvalues.insert("beta[1]".to_string(), 0.05);

        match evaluator(Ok(report)).evaluate(&garch_candidate()) {
            Score::Rejected(RejectReason::InsignificantCoefficient { name, pvalue }) => {
                assert_eq!(name, "beta[1]");
                assert_eq!(pvalue, 0.05);
            }
            other => panic!("expected insignificance rejection, got {other:?}"),
        }
    }

    #[test]
    fn arch_candidates_skip_the_beta_check() {
        let s = series();
        let mut report = calibrated_report(&s);
        report.pvalues.remove("beta[1]");

        let mut candidate = garch_candidate();
        candidate.vol = VolModel::Arch;

        assert!(!evaluator(Ok(report)).evaluate(&candidate).is_rejected());
    }

    #[test]
    fn asymmetry_coefficient_checked_only_when_present() {
        let s = series();
        let mut candidate = garch_candidate();
        candidate.o = 1;

        // gamma[1] absent from the report: structurally required, so reject.
        match evaluator(Ok(calibrated_report(&s))).evaluate(&candidate) {
            Score::Rejected(RejectReason::MissingCoefficient { name }) => {
                assert_eq!(name, "gamma[1]");
            }
            other => panic!("expected missing-coefficient rejection, got {other:?}"),
        }

        // With a significant gamma the candidate passes.
        let mut report = calibrated_report(&s);
        report.pvalues.insert("gamma[1]".to_string(), 0.001);
        assert!(!evaluator(Ok(report)).evaluate(&candidate).is_rejected());
    }

    #[test]
    fn ar_mean_coefficient_checked_by_series_name() {
        let s = series();
        let mut candidate = garch_candidate();
        candidate.mean = MeanModel::Ar;
        candidate.lags = 2;

        let mut report = calibrated_report(&s);
        report.pvalues.insert("y[2]".to_string(), 0.5);

        match evaluator(Ok(report)).evaluate(&candidate) {
            Score::Rejected(RejectReason::InsignificantCoefficient { name, .. }) => {
                assert_eq!(name, "y[2]");
            }
            other => panic!("expected insignificance rejection, got {other:?}"),
        }
    }

    #[test]
    fn fit_failures_become_rejections_not_panics() {
        for error in [
            FitError::IllConditioned {
                message: "singular".to_string(),
            },
            FitError::ConvergenceFailure {
                message: "stalled".to_string(),
            },
            FitError::Numerical {
                message: "overflow".to_string(),
            },
        ] {
            match evaluator(Err(error.clone())).evaluate(&garch_candidate()) {
                Score::Rejected(RejectReason::FitFailed(e)) => assert_eq!(e, error),
                other => panic!("expected fit-failure rejection, got {other:?}"),
            }
        }
    }

    #[test]
    fn zero_adjusted_rsquared_rejects() {
        let s = series();
        let mut report = calibrated_report(&s);
        report.adj_rsquared = 0.0;

        match evaluator(Ok(report)).evaluate(&garch_candidate()) {
            Score::Rejected(RejectReason::ZeroRSquared) => {}
            other => panic!("expected zero-R2 rejection, got {other:?}"),
        }
    }

    #[test]
    fn negative_adjusted_rsquared_still_scores() {
        // A negative adjusted R-squared pulls the score down through the
        // inverse term; the original behavior is preserved.
        let s = series();
        let mut report = calibrated_report(&s);
        report.adj_rsquared = -0.5;

        match evaluator(Ok(report)).evaluate(&garch_candidate()) {
            Score::Finite(v) => assert!((v - (10.0 - 200.0)).abs() < 1e-9),
            other => panic!("expected finite score, got {other:?}"),
        }
    }

    #[test]
    fn mape_skips_unaligned_positions_and_clamps_zero_denominators() {
        let truth = [f64::NAN, 1.0, 2.0];
        let pred = [0.9, 1.1, 2.0];
        // Only the last two positions align: (0.1 / 1.0 + 0.0 / 2.0) / 2
        assert!((mape(&truth, &pred) - 0.05).abs() < 1e-12);

        let zero_truth = [0.0];
        let off = [1.0];
        assert!(mape(&zero_truth, &off).is_finite());
        assert!(mape(&zero_truth, &off) > 1e10);

        assert!(mape(&[f64::NAN], &[1.0]).is_nan());
    }
}
