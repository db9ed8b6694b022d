//! Joint maximum-likelihood estimation of the mean and variance
//! equations via Nelder-Mead, with finite-difference inference.

use argmin::core::{CostFunction, Error as ArgminError, Executor, State};
use argmin::solver::neldermead::NelderMead;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use vt_types::{CandidateSpec, ErrorDist, FitError, FitReport, MeanModel, Series, VolModel};

use crate::dist;
use crate::inference;
use crate::mean::MeanEquation;
use crate::variance::{backcast, VarianceSpec};
use crate::VolatilityFitter;

/// Cost assigned to parameter vectors outside the admissible region.
const BIG_COST: f64 = 1e30;

/// Observations required beyond the parameter count for an estimable fit.
const MIN_N_BUFFER: usize = 5;

/// Knobs for the simplex search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    /// Iteration cap for the simplex search.
    pub max_iters: u64,
    /// Simplex standard-deviation tolerance for convergence.
    pub sd_tolerance: f64,
    /// Rescale the series so its sample std lands in [1, 1000) before
    /// fitting; the reported volatility path is mapped back.
    pub rescale: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iters: 5000,
            sd_tolerance: 1e-7,
            rescale: true,
        }
    }
}

/// Nelder-Mead maximum-likelihood fitter for the GARCH family.
#[derive(Debug, Clone, Default)]
pub struct MleFitter {
    options: FitOptions,
}

impl MleFitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: FitOptions) -> Self {
        Self { options }
    }
}

impl VolatilityFitter for MleFitter {
    fn fit(
        &self,
        spec: &CandidateSpec,
        series: &Series,
        exog: Option<&Series>,
    ) -> Result<FitReport, FitError> {
        let scale = if self.options.rescale {
            rescale_factor(series.std())?
        } else {
            1.0
        };
        let y: Vec<f64> = series.values().iter().map(|v| v * scale).collect();

        let exog_values = match exog {
            Some(x) if x.len() != series.len() => {
                return Err(FitError::InvalidInput {
                    message: format!(
                        "exogenous series length {} does not match series length {}",
                        x.len(),
                        series.len()
                    ),
                });
            }
            Some(x) => Some(x.values().to_vec()),
            None => None,
        };

        let mean_eq = MeanEquation::new(spec, exog_values.is_some());
        let var_spec = VarianceSpec::from_candidate(spec);
        let problem = GarchProblem {
            y,
            exog: exog_values,
            mean_eq,
            var_spec,
            dist: spec.dist,
        };

        let k = problem.param_count();
        let presample = mean_eq.presample();
        if problem.y.len() < presample + k + MIN_N_BUFFER {
            return Err(FitError::InvalidInput {
                message: format!(
                    "{} observations cannot support {k} parameters and {presample} lags",
                    problem.y.len()
                ),
            });
        }
        let nobs = problem.y.len() - presample;

        let init = problem.initial_params();
        let solver = NelderMead::<Vec<f64>, f64>::new(build_simplex(&init))
            .with_sd_tolerance(self.options.sd_tolerance)
            .map_err(|e| FitError::Numerical {
                message: e.to_string(),
            })?;

        let result = Executor::new(problem.clone(), solver)
            .configure(|state| state.max_iters(self.options.max_iters))
            .run()
            .map_err(|e| FitError::ConvergenceFailure {
                message: e.to_string(),
            })?;

        let mut state = result.state().clone();
        let iterations = state.get_iter();
        let best_cost = state.get_best_cost();
        let theta = state
            .take_best_param()
            .ok_or_else(|| FitError::ConvergenceFailure {
                message: "optimizer produced no parameters".to_string(),
            })?;

        if !best_cost.is_finite() || best_cost >= 0.5 * BIG_COST {
            return Err(FitError::ConvergenceFailure {
                message: "no admissible parameter region found".to_string(),
            });
        }
        if iterations >= self.options.max_iters {
            return Err(FitError::ConvergenceFailure {
                message: format!("iteration budget exhausted after {iterations}"),
            });
        }
        if theta.iter().any(|v| !v.is_finite()) {
            return Err(FitError::Numerical {
                message: "non-finite parameter estimate".to_string(),
            });
        }

        debug!(
            candidate = %spec,
            loglik = -best_cost,
            iterations,
            "simplex search converged"
        );

        let (loglik, eps, h) = problem.paths(&theta).ok_or_else(|| FitError::Numerical {
            message: "optimum left the admissible region".to_string(),
        })?;

        // Observed information at the optimum drives the p-values.
        let neg_loglik = |point: &[f64]| {
            problem
                .paths(point)
                .map(|(ll, _, _)| -ll)
                .unwrap_or(f64::NAN)
        };
        let obs_info = inference::hessian(&neg_loglik, &theta)?;
        let se = inference::standard_errors(obs_info)?;

        let names = problem.param_names(series.name(), exog.map(|x| x.name()));
        let mut params = HashMap::with_capacity(k);
        let mut pvalues = HashMap::with_capacity(k);
        for ((name, &estimate), &stderr) in names.iter().zip(theta.iter()).zip(se.iter()) {
            params.insert(name.clone(), estimate);
            pvalues.insert(name.clone(), inference::two_sided_pvalue(estimate / stderr));
        }

        let mut conditional_volatility = vec![f64::NAN; presample];
        conditional_volatility.extend(h.iter().map(|v| v.sqrt() / scale));

        let adj_rsquared = adj_rsquared(&problem.y[presample..], &eps, mean_eq.param_count());
        let n = nobs as f64;
        let kf = k as f64;

        Ok(FitReport {
            bic: kf * n.ln() - 2.0 * loglik,
            aic: 2.0 * kf - 2.0 * loglik,
            loglik,
            adj_rsquared,
            params,
            pvalues,
            conditional_volatility,
            scale,
            nobs,
        })
    }
}

// ---------------------------------------------------------------------------
// Likelihood problem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct GarchProblem {
    y: Vec<f64>,
    exog: Option<Vec<f64>>,
    mean_eq: MeanEquation,
    var_spec: VarianceSpec,
    dist: ErrorDist,
}

impl GarchProblem {
    fn param_count(&self) -> usize {
        self.mean_eq.param_count() + self.var_spec.param_count() + self.dist.shape_param_count()
    }

    fn param_names(&self, series_name: &str, exog_name: Option<&str>) -> Vec<String> {
        let mut names = self.mean_eq.param_names(series_name, exog_name);
        names.extend(self.var_spec.param_names());
        names.extend(
            dist::shape_names(self.dist)
                .iter()
                .map(|s| (*s).to_string()),
        );
        names
    }

    fn split<'a>(&self, theta: &'a [f64]) -> (&'a [f64], &'a [f64], &'a [f64]) {
        let n_mean = self.mean_eq.param_count();
        let n_var = self.var_spec.param_count();
        (
            &theta[..n_mean],
            &theta[n_mean..n_mean + n_var],
            &theta[n_mean + n_var..],
        )
    }

    /// Log-likelihood plus the residual and variance paths, or `None`
    /// outside the admissible parameter region.
    fn paths(&self, theta: &[f64]) -> Option<(f64, Vec<f64>, Vec<f64>)> {
        if theta.len() != self.param_count() || theta.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let (theta_mean, theta_var, theta_shape) = self.split(theta);
        if !self.var_spec.params_valid(theta_var) || !dist::shape_valid(self.dist, theta_shape) {
            return None;
        }

        let (eps, _fitted) = self
            .mean_eq
            .residuals(&self.y, self.exog.as_deref(), theta_mean);
        let h = self.var_spec.recursion(&eps, theta_var, backcast(&eps));

        let mut loglik = 0.0;
        for (&e, &v) in eps.iter().zip(h.iter()) {
            loglik += dist::loglik_term(self.dist, e, v, theta_shape);
        }
        if !loglik.is_finite() {
            return None;
        }
        Some((loglik, eps, h))
    }

    /// Starting point: unconditional moments for the mean, a mildly
    /// persistent variance process with the unconditional variance as its
    /// long-run level, and the default distribution shapes.
    fn initial_params(&self) -> Vec<f64> {
        let n = self.y.len() as f64;
        let y_mean = self.y.iter().sum::<f64>() / n;
        let y_var = (self
            .y
            .iter()
            .map(|&v| {
                let d = v - y_mean;
                d * d
            })
            .sum::<f64>()
            / n)
            .max(1e-8);

        let mut init = Vec::with_capacity(self.param_count());

        match self.mean_eq.mean {
            MeanModel::Zero => {}
            MeanModel::Constant => init.push(y_mean),
            MeanModel::Ar => {
                init.push(y_mean * 0.5);
                init.extend(std::iter::repeat(0.05).take(self.mean_eq.lags));
            }
        }
        if self.mean_eq.has_exog {
            init.push(0.0);
        }

        let (p, o, q) = (self.var_spec.p, self.var_spec.o, self.var_spec.q);
        match self.var_spec.vol {
            VolModel::Arch => {
                init.push(0.7 * y_var);
                init.extend(std::iter::repeat(0.3 / p as f64).take(p));
            }
            VolModel::Garch => {
                let persistence = 0.05 + if o > 0 { 0.025 } else { 0.0 } + 0.8;
                init.push((1.0 - persistence) * y_var);
                init.extend(std::iter::repeat(0.05 / p as f64).take(p));
                init.extend(std::iter::repeat(0.05 / o.max(1) as f64).take(o));
                init.extend(std::iter::repeat(0.8 / q as f64).take(q));
            }
            VolModel::Egarch => {
                init.push(0.1 * y_var.ln());
                init.extend(std::iter::repeat(0.1 / p as f64).take(p));
                init.extend(std::iter::repeat(0.0).take(o));
                init.extend(std::iter::repeat(0.9 / q as f64).take(q));
            }
        }

        init.extend(dist::default_shape(self.dist));
        init
    }
}

impl CostFunction for GarchProblem {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, ArgminError> {
        Ok(self
            .paths(theta)
            .map(|(loglik, _, _)| -loglik)
            .unwrap_or(BIG_COST))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Initial simplex: the starting point plus one vertex per dimension,
/// nudged along that axis.
fn build_simplex(init: &[f64]) -> Vec<Vec<f64>> {
    let mut vertices = Vec::with_capacity(init.len() + 1);
    vertices.push(init.to_vec());
    for i in 0..init.len() {
        let mut vertex = init.to_vec();
        vertex[i] += 0.1 * vertex[i].abs().max(0.05);
        vertices.push(vertex);
    }
    vertices
}

/// Power-of-ten factor bringing the sample std into [1, 1000).
fn rescale_factor(std: f64) -> Result<f64, FitError> {
    if !std.is_finite() || std <= 0.0 {
        return Err(FitError::InvalidInput {
            message: "series has no dispersion to model".to_string(),
        });
    }
    let mut s = std;
    let mut scale = 1.0;
    while s < 1.0 {
        s *= 10.0;
        scale *= 10.0;
    }
    while s >= 1000.0 {
        s /= 10.0;
        scale /= 10.0;
    }
    Ok(scale)
}

/// Degrees-of-freedom adjusted coefficient of determination of the mean
/// equation over the effective sample.
fn adj_rsquared(y_eff: &[f64], eps: &[f64], k_mean: usize) -> f64 {
    let n = y_eff.len() as f64;
    let y_mean = y_eff.iter().sum::<f64>() / n;
    let tss: f64 = y_eff
        .iter()
        .map(|&v| {
            let d = v - y_mean;
            d * d
        })
        .sum();
    let ssr: f64 = eps.iter().map(|e| e * e).sum();

    if tss <= 0.0 {
        return 0.0;
    }
    let r2 = 1.0 - ssr / tss;
    let dof = n - k_mean as f64 - 1.0;
    if dof > 0.0 {
        1.0 - (1.0 - r2) * (n - 1.0) / dof
    } else {
        r2
    }
}
