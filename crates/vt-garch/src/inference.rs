//! Post-fit inference: finite-difference Hessians, eigen-based standard
//! errors, and coefficient p-values.

use nalgebra::DMatrix;
use statrs::function::erf::erfc;
use vt_types::FitError;

/// Eigenvalues at or below this are treated as numerically zero; an
/// observed information matrix with any such direction is considered
/// ill-conditioned rather than invertible.
pub const EIGEN_EPS: f64 = 1e-10;

const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Central-difference Hessian of `f` at `theta`.
///
/// `f` must return NaN outside its valid region; any non-finite
/// evaluation aborts with a numerical error instead of poisoning the
/// matrix silently.
pub fn hessian<F: Fn(&[f64]) -> f64>(f: &F, theta: &[f64]) -> Result<DMatrix<f64>, FitError> {
    let n = theta.len();
    let steps: Vec<f64> = theta.iter().map(|&t| 1e-4 * t.abs().max(0.1)).collect();

    let eval = |point: &[f64]| -> Result<f64, FitError> {
        let v = f(point);
        if v.is_finite() {
            Ok(v)
        } else {
            Err(FitError::Numerical {
                message: "non-finite objective while differentiating".to_string(),
            })
        }
    };

    let f0 = eval(theta)?;
    let mut h = DMatrix::<f64>::zeros(n, n);
    let mut point = theta.to_vec();

    for i in 0..n {
        point[i] = theta[i] + steps[i];
        let f_plus = eval(&point)?;
        point[i] = theta[i] - steps[i];
        let f_minus = eval(&point)?;
        point[i] = theta[i];
        h[(i, i)] = (f_plus - 2.0 * f0 + f_minus) / (steps[i] * steps[i]);
    }

    for i in 0..n {
        for j in (i + 1)..n {
            point[i] = theta[i] + steps[i];
            point[j] = theta[j] + steps[j];
            let fpp = eval(&point)?;
            point[j] = theta[j] - steps[j];
            let fpm = eval(&point)?;
            point[i] = theta[i] - steps[i];
            let fmm = eval(&point)?;
            point[j] = theta[j] + steps[j];
            let fmp = eval(&point)?;
            point[i] = theta[i];
            point[j] = theta[j];

            let value = (fpp - fpm - fmp + fmm) / (4.0 * steps[i] * steps[j]);
            h[(i, j)] = value;
            h[(j, i)] = value;
        }
    }

    Ok(h)
}

/// Classical standard errors from the observed information matrix (the
/// Hessian of the negative log-likelihood at the optimum).
///
/// Uses a symmetric eigendecomposition; directions with eigenvalues at or
/// below [`EIGEN_EPS`] mean the information matrix is singular to working
/// precision and the fit is reported as ill-conditioned.
pub fn standard_errors(obs_info: DMatrix<f64>) -> Result<Vec<f64>, FitError> {
    let n = obs_info.nrows();
    let eigen = obs_info.symmetric_eigen();
    let q = eigen.eigenvectors;
    let eigenvals = eigen.eigenvalues;

    if eigenvals.iter().any(|&l| !l.is_finite() || l <= EIGEN_EPS) {
        return Err(FitError::IllConditioned {
            message: "observed information matrix is singular to working precision".to_string(),
        });
    }

    let mut se = Vec::with_capacity(n);
    for i in 0..n {
        let var: f64 = eigenvals
            .iter()
            .enumerate()
            .map(|(k, &lambda)| q[(i, k)] * q[(i, k)] / lambda)
            .sum();
        if !var.is_finite() || var <= 0.0 {
            return Err(FitError::IllConditioned {
                message: format!("non-positive variance for parameter {i}"),
            });
        }
        se.push(var.sqrt());
    }
    Ok(se)
}

/// Two-sided p-value of a z-statistic under the standard normal.
pub fn two_sided_pvalue(z: f64) -> f64 {
    erfc(z.abs() / SQRT_2)
}
