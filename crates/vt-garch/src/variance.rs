//! Conditional-variance recursions for the supported process families.

use vt_types::{CandidateSpec, VolModel};

/// Floor applied to every conditional variance to keep likelihoods finite.
pub const VAR_FLOOR: f64 = 1e-12;

/// Stationarity margin: persistence must stay strictly below this.
const MAX_PERSISTENCE: f64 = 0.9999;

/// E|z| for a standard normal innovation, used by the EGARCH recursion.
const ABS_Z_MEAN: f64 = 0.797_884_560_802_865_4; // sqrt(2/pi)

/// Resolved variance process for one candidate.
///
/// The pure ARCH family carries neither lagged-variance nor asymmetry
/// terms, so `o` and `q` are pinned to zero there regardless of what the
/// candidate sampled; the remaining families use the candidate orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarianceSpec {
    pub vol: VolModel,
    pub p: usize,
    pub o: usize,
    pub q: usize,
}

impl VarianceSpec {
    pub fn from_candidate(spec: &CandidateSpec) -> Self {
        match spec.vol {
            VolModel::Arch => Self {
                vol: spec.vol,
                p: spec.p,
                o: 0,
                q: 0,
            },
            VolModel::Garch | VolModel::Egarch => Self {
                vol: spec.vol,
                p: spec.p,
                o: spec.o,
                q: spec.q,
            },
        }
    }

    /// omega, alpha[1..=p], gamma[1..=o], beta[1..=q]
    pub fn param_count(&self) -> usize {
        1 + self.p + self.o + self.q
    }

    pub fn param_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.param_count());
        names.push("omega".to_string());
        for i in 1..=self.p {
            names.push(format!("alpha[{i}]"));
        }
        for k in 1..=self.o {
            names.push(format!("gamma[{k}]"));
        }
        for j in 1..=self.q {
            names.push(format!("beta[{j}]"));
        }
        names
    }

    fn unpack<'a>(&self, theta: &'a [f64]) -> (f64, &'a [f64], &'a [f64], &'a [f64]) {
        let omega = theta[0];
        let alpha = &theta[1..1 + self.p];
        let gamma = &theta[1 + self.p..1 + self.p + self.o];
        let beta = &theta[1 + self.p + self.o..1 + self.p + self.o + self.q];
        (omega, alpha, gamma, beta)
    }

    /// Whether `theta` lies in the admissible parameter region.
    pub fn params_valid(&self, theta: &[f64]) -> bool {
        if theta.len() != self.param_count() || theta.iter().any(|v| !v.is_finite()) {
            return false;
        }
        let (omega, alpha, gamma, beta) = self.unpack(theta);

        match self.vol {
            VolModel::Arch | VolModel::Garch => {
                if omega <= 0.0 {
                    return false;
                }
                if alpha.iter().any(|&a| a < 0.0) || beta.iter().any(|&b| b < 0.0) {
                    return false;
                }
                let sum_alpha: f64 = alpha.iter().sum();
                let sum_gamma: f64 = gamma.iter().sum();
                let sum_beta: f64 = beta.iter().sum();
                // Asymmetry terms only load on negative shocks, hence the
                // half weight in the persistence bound.
                if sum_alpha + 0.5 * sum_gamma < 0.0 {
                    return false;
                }
                sum_alpha + 0.5 * sum_gamma + sum_beta < MAX_PERSISTENCE
            }
            VolModel::Egarch => {
                let sum_beta: f64 = beta.iter().sum();
                sum_beta.abs() < MAX_PERSISTENCE
            }
        }
    }

    /// Run the recursion over the residuals, assuming `params_valid`.
    ///
    /// `backcast` seeds pre-sample variance terms (the sample variance of
    /// the residuals is the conventional choice).
    pub fn recursion(&self, eps: &[f64], theta: &[f64], backcast: f64) -> Vec<f64> {
        let (omega, alpha, gamma, beta) = self.unpack(theta);
        let backcast = backcast.max(VAR_FLOOR);

        match self.vol {
            VolModel::Arch | VolModel::Garch => {
                let mut h = Vec::with_capacity(eps.len());
                for t in 0..eps.len() {
                    let mut v = omega;
                    for (i, &a) in alpha.iter().enumerate() {
                        let lag = i + 1;
                        v += a * if t >= lag {
                            eps[t - lag] * eps[t - lag]
                        } else {
                            backcast
                        };
                    }
                    for (k, &g) in gamma.iter().enumerate() {
                        let lag = k + 1;
                        // Pre-sample shocks count as negative half the time.
                        v += g * if t >= lag {
                            if eps[t - lag] < 0.0 {
                                eps[t - lag] * eps[t - lag]
                            } else {
                                0.0
                            }
                        } else {
                            0.5 * backcast
                        };
                    }
                    for (j, &b) in beta.iter().enumerate() {
                        let lag = j + 1;
                        v += b * if t >= lag { h[t - lag] } else { backcast };
                    }
                    h.push(v.max(VAR_FLOOR));
                }
                h
            }
            VolModel::Egarch => {
                let ln_backcast = backcast.ln();
                let mut h: Vec<f64> = Vec::with_capacity(eps.len());
                let mut ln_h: Vec<f64> = Vec::with_capacity(eps.len());
                for t in 0..eps.len() {
                    let mut v = omega;
                    for (i, &a) in alpha.iter().enumerate() {
                        let lag = i + 1;
                        if t >= lag {
                            let z = eps[t - lag] / h[t - lag].sqrt();
                            v += a * (z.abs() - ABS_Z_MEAN);
                        }
                    }
                    for (k, &g) in gamma.iter().enumerate() {
                        let lag = k + 1;
                        if t >= lag {
                            let z = eps[t - lag] / h[t - lag].sqrt();
                            v += g * z;
                        }
                    }
                    for (j, &b) in beta.iter().enumerate() {
                        let lag = j + 1;
                        v += b * if t >= lag { ln_h[t - lag] } else { ln_backcast };
                    }
                    // Clamp log-variance so exp() stays representable.
                    let v = v.clamp(-50.0, 50.0);
                    ln_h.push(v);
                    h.push(v.exp().max(VAR_FLOOR));
                }
                h
            }
        }
    }
}

/// Pre-sample variance seed: the mean square of the residuals.
pub fn backcast(eps: &[f64]) -> f64 {
    if eps.is_empty() {
        return VAR_FLOOR;
    }
    let ms = eps.iter().map(|e| e * e).sum::<f64>() / eps.len() as f64;
    ms.max(VAR_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vt_types::{ErrorDist, MeanModel};

    fn candidate(vol: VolModel, p: usize, o: usize, q: usize) -> CandidateSpec {
        CandidateSpec {
            p,
            q,
            o,
            lags: 0,
            mean: MeanModel::Zero,
            vol,
            dist: ErrorDist::Normal,
        }
    }

    #[test]
    fn arch_ignores_o_and_q() {
        let spec = VarianceSpec::from_candidate(&candidate(VolModel::Arch, 2, 1, 3));
        assert_eq!(spec.o, 0);
        assert_eq!(spec.q, 0);
        assert_eq!(spec.param_count(), 3);
        assert_eq!(spec.param_names(), vec!["omega", "alpha[1]", "alpha[2]"]);
    }

    #[test]
    fn garch_names_in_packing_order() {
        let spec = VarianceSpec::from_candidate(&candidate(VolModel::Garch, 1, 1, 1));
        assert_eq!(
            spec.param_names(),
            vec!["omega", "alpha[1]", "gamma[1]", "beta[1]"]
        );
    }

    #[test]
    fn garch11_recursion_matches_hand_computation() {
        let spec = VarianceSpec::from_candidate(&candidate(VolModel::Garch, 1, 0, 1));
        let theta = [0.1, 0.2, 0.7]; // omega, alpha, beta
        let eps = [1.0, -2.0, 0.5];
        let bc = backcast(&eps); // (1 + 4 + 0.25) / 3 = 1.75

        let h = spec.recursion(&eps, &theta, bc);

        let h0 = 0.1 + 0.2 * bc + 0.7 * bc;
        let h1 = 0.1 + 0.2 * 1.0 + 0.7 * h0;
        let h2 = 0.1 + 0.2 * 4.0 + 0.7 * h1;
        assert!((h[0] - h0).abs() < 1e-12);
        assert!((h[1] - h1).abs() < 1e-12);
        assert!((h[2] - h2).abs() < 1e-12);
    }

    #[test]
    fn gjr_term_only_loads_on_negative_shocks() {
        let spec = VarianceSpec::from_candidate(&candidate(VolModel::Garch, 1, 1, 1));
        let theta = [0.1, 0.1, 0.2, 0.5]; // omega, alpha, gamma, beta
        let eps = [1.0, -1.0, 1.0, 1.0];
        let bc = 1.0;

        let h = spec.recursion(&eps, &theta, bc);

        // t=0 uses backcast seeds (half weight on the asymmetry term)
        let h0 = 0.1 + 0.1 * 1.0 + 0.2 * 0.5 + 0.5 * 1.0;
        // t=1: previous shock positive, no asymmetry contribution
        let h1 = 0.1 + 0.1 * 1.0 + 0.5 * h0;
        // t=2: previous shock negative, asymmetry active
        let h2 = 0.1 + 0.1 * 1.0 + 0.2 * 1.0 + 0.5 * h1;
        assert!((h[0] - h0).abs() < 1e-12);
        assert!((h[1] - h1).abs() < 1e-12);
        assert!((h[2] - h2).abs() < 1e-12);
    }

    #[test]
    fn egarch_recursion_stays_positive_and_finite() {
        let spec = VarianceSpec::from_candidate(&candidate(VolModel::Egarch, 1, 1, 1));
        let theta = [0.01, 0.15, -0.05, 0.9];
        let eps = [0.3, -1.2, 2.0, -0.1, 0.0, 0.5];

        let h = spec.recursion(&eps, &theta, backcast(&eps));
        assert_eq!(h.len(), eps.len());
        for &v in &h {
            assert!(v.is_finite() && v > 0.0);
        }
    }

    #[test]
    fn validity_enforces_positivity_and_persistence() {
        let spec = VarianceSpec::from_candidate(&candidate(VolModel::Garch, 1, 0, 1));
        assert!(spec.params_valid(&[0.1, 0.2, 0.7]));
        assert!(!spec.params_valid(&[-0.1, 0.2, 0.7])); // omega <= 0
        assert!(!spec.params_valid(&[0.1, -0.2, 0.7])); // alpha < 0
        assert!(!spec.params_valid(&[0.1, 0.3, 0.75])); // persistence >= 1

        let egarch = VarianceSpec::from_candidate(&candidate(VolModel::Egarch, 1, 0, 1));
        assert!(egarch.params_valid(&[-0.1, 0.2, 0.95])); // omega free in log space
        assert!(!egarch.params_valid(&[0.0, 0.2, 1.01])); // explosive
    }
}
