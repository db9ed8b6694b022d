//! Mean-equation handling: residual construction and parameter naming.

use vt_types::{CandidateSpec, MeanModel};

/// Resolved mean equation for one candidate.
///
/// `lags` is only honored for autoregressive means, and exogenous
/// regressors are dropped for zero-mean models (which do not admit them),
/// mirroring how the candidate orders map onto the estimated equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeanEquation {
    pub mean: MeanModel,
    pub lags: usize,
    pub has_exog: bool,
}

impl MeanEquation {
    pub fn new(spec: &CandidateSpec, exog_present: bool) -> Self {
        let lags = if spec.mean == MeanModel::Ar {
            spec.lags
        } else {
            0
        };
        Self {
            mean: spec.mean,
            lags,
            has_exog: exog_present && spec.mean.permits_exog(),
        }
    }

    /// Number of estimated mean parameters, in the order they appear in
    /// the packed parameter vector: intercept, AR coefficients, exogenous
    /// coefficient.
    pub fn param_count(&self) -> usize {
        let base = match self.mean {
            MeanModel::Zero => 0,
            MeanModel::Constant => 1,
            MeanModel::Ar => 1 + self.lags,
        };
        base + usize::from(self.has_exog)
    }

    pub fn param_names(&self, series_name: &str, exog_name: Option<&str>) -> Vec<String> {
        let mut names = Vec::with_capacity(self.param_count());
        match self.mean {
            MeanModel::Zero => {}
            MeanModel::Constant => names.push("mu".to_string()),
            MeanModel::Ar => {
                names.push("mu".to_string());
                for lag in 1..=self.lags {
                    names.push(format!("{series_name}[{lag}]"));
                }
            }
        }
        if self.has_exog {
            names.push(exog_name.unwrap_or("x").to_string());
        }
        names
    }

    /// Observations at the start of the sample consumed by AR lags.
    pub fn presample(&self) -> usize {
        self.lags
    }

    /// Residuals and fitted values over the effective sample `t >= lags`.
    ///
    /// `theta` must hold exactly `param_count()` values in packing order.
    pub fn residuals(
        &self,
        y: &[f64],
        exog: Option<&[f64]>,
        theta: &[f64],
    ) -> (Vec<f64>, Vec<f64>) {
        debug_assert_eq!(theta.len(), self.param_count());

        let n = y.len();
        let start = self.presample();
        let mut eps = Vec::with_capacity(n - start);
        let mut fitted = Vec::with_capacity(n - start);

        let (mu, ar, xcoef) = self.unpack(theta);

        for t in start..n {
            let mut mean_t = mu;
            for (lag, phi) in ar.iter().enumerate() {
                mean_t += phi * y[t - lag - 1];
            }
            if let (Some(x), Some(g)) = (exog, xcoef) {
                mean_t += g * x[t];
            }
            fitted.push(mean_t);
            eps.push(y[t] - mean_t);
        }

        (eps, fitted)
    }

    fn unpack<'a>(&self, theta: &'a [f64]) -> (f64, &'a [f64], Option<f64>) {
        match self.mean {
            MeanModel::Zero => {
                let xcoef = self.has_exog.then(|| theta[0]);
                (0.0, &[], xcoef)
            }
            MeanModel::Constant => {
                let xcoef = self.has_exog.then(|| theta[1]);
                (theta[0], &[], xcoef)
            }
            MeanModel::Ar => {
                let xcoef = self.has_exog.then(|| theta[1 + self.lags]);
                (theta[0], &theta[1..1 + self.lags], xcoef)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vt_types::{ErrorDist, VolModel};

    fn candidate(mean: MeanModel, lags: usize) -> CandidateSpec {
        CandidateSpec {
            p: 1,
            q: 1,
            o: 0,
            lags,
            mean,
            vol: VolModel::Garch,
            dist: ErrorDist::Normal,
        }
    }

    #[test]
    fn zero_mean_passes_data_through() {
        let eq = MeanEquation::new(&candidate(MeanModel::Zero, 2), false);
        assert_eq!(eq.param_count(), 0);
        assert_eq!(eq.presample(), 0);

        let y = [1.0, -2.0, 3.0];
        let (eps, fitted) = eq.residuals(&y, None, &[]);
        assert_eq!(eps, vec![1.0, -2.0, 3.0]);
        assert_eq!(fitted, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn zero_mean_ignores_exog() {
        let eq = MeanEquation::new(&candidate(MeanModel::Zero, 0), true);
        assert!(!eq.has_exog);
        assert_eq!(eq.param_count(), 0);
    }

    #[test]
    fn constant_mean_demeans() {
        let eq = MeanEquation::new(&candidate(MeanModel::Constant, 3), false);
        // lags only apply to AR means
        assert_eq!(eq.presample(), 0);
        assert_eq!(eq.param_count(), 1);

        let y = [1.0, 2.0, 3.0];
        let (eps, _) = eq.residuals(&y, None, &[2.0]);
        assert_eq!(eps, vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn ar_mean_consumes_lags_and_matches_hand_computation() {
        let eq = MeanEquation::new(&candidate(MeanModel::Ar, 2), false);
        assert_eq!(eq.param_count(), 3);
        assert_eq!(eq.presample(), 2);

        // y_t = 0.5 + 0.3 y_{t-1} - 0.1 y_{t-2} + eps_t
        let y = [1.0, 2.0, 1.5, 0.5];
        let theta = [0.5, 0.3, -0.1];
        let (eps, fitted) = eq.residuals(&y, None, &theta);

        assert_eq!(eps.len(), 2);
        let f2 = 0.5 + 0.3 * 2.0 - 0.1 * 1.0;
        let f3 = 0.5 + 0.3 * 1.5 - 0.1 * 2.0;
        assert!((fitted[0] - f2).abs() < 1e-12);
        assert!((fitted[1] - f3).abs() < 1e-12);
        assert!((eps[0] - (1.5 - f2)).abs() < 1e-12);
        assert!((eps[1] - (0.5 - f3)).abs() < 1e-12);
    }

    #[test]
    fn param_names_follow_naming_convention() {
        let eq = MeanEquation::new(&candidate(MeanModel::Ar, 2), true);
        let names = eq.param_names("ret", Some("vix"));
        assert_eq!(names, vec!["mu", "ret[1]", "ret[2]", "vix"]);
    }
}
