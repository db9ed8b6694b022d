//! Innovation log-densities for standardized residuals.
//!
//! Each density is parameterized to have unit variance so the variance
//! recursion fully owns the scale. Shape parameters are appended to the
//! packed parameter vector and estimated jointly with the rest of the
//! model.

use statrs::function::gamma::ln_gamma;
use vt_types::ErrorDist;

const LN_2PI: f64 = 1.837_877_066_409_345_3;
const LN_2: f64 = std::f64::consts::LN_2;

/// Bounds keeping the shape parameters in the region where the unit
/// variance standardization exists.
const NU_TAIL_MIN: f64 = 2.05;
const NU_TAIL_MAX: f64 = 500.0;
const NU_GED_MIN: f64 = 0.1;
const SKEW_MAX: f64 = 0.995;

pub fn shape_names(dist: ErrorDist) -> &'static [&'static str] {
    match dist {
        ErrorDist::Normal => &[],
        ErrorDist::StudentsT | ErrorDist::Ged => &["nu"],
        ErrorDist::SkewT => &["nu", "lambda"],
    }
}

pub fn default_shape(dist: ErrorDist) -> Vec<f64> {
    match dist {
        ErrorDist::Normal => vec![],
        ErrorDist::StudentsT => vec![8.0],
        ErrorDist::SkewT => vec![8.0, 0.0],
        ErrorDist::Ged => vec![1.5],
    }
}

pub fn shape_valid(dist: ErrorDist, shape: &[f64]) -> bool {
    if shape.len() != dist.shape_param_count() || shape.iter().any(|v| !v.is_finite()) {
        return false;
    }
    match dist {
        ErrorDist::Normal => true,
        ErrorDist::StudentsT => shape[0] > NU_TAIL_MIN && shape[0] < NU_TAIL_MAX,
        ErrorDist::SkewT => {
            shape[0] > NU_TAIL_MIN && shape[0] < NU_TAIL_MAX && shape[1].abs() < SKEW_MAX
        }
        ErrorDist::Ged => shape[0] > NU_GED_MIN && shape[0] < NU_TAIL_MAX,
    }
}

/// Log-density of the standardized innovation at `z`.
pub fn ln_density(dist: ErrorDist, z: f64, shape: &[f64]) -> f64 {
    match dist {
        ErrorDist::Normal => -0.5 * (LN_2PI + z * z),
        ErrorDist::StudentsT => {
            let nu = shape[0];
            ln_gamma((nu + 1.0) / 2.0)
                - ln_gamma(nu / 2.0)
                - 0.5 * (std::f64::consts::PI * (nu - 2.0)).ln()
                - 0.5 * (nu + 1.0) * (1.0 + z * z / (nu - 2.0)).ln()
        }
        ErrorDist::SkewT => {
            let (nu, lambda) = (shape[0], shape[1]);
            let ln_c = ln_gamma((nu + 1.0) / 2.0)
                - 0.5 * (std::f64::consts::PI * (nu - 2.0)).ln()
                - ln_gamma(nu / 2.0);
            let c = ln_c.exp();
            let a = 4.0 * lambda * c * (nu - 2.0) / (nu - 1.0);
            let b = (1.0 + 3.0 * lambda * lambda - a * a).sqrt();
            let skew = if z < -a / b {
                1.0 - lambda
            } else {
                1.0 + lambda
            };
            let u = (b * z + a) / skew;
            b.ln() + ln_c - 0.5 * (nu + 1.0) * (1.0 + u * u / (nu - 2.0)).ln()
        }
        ErrorDist::Ged => {
            let nu = shape[0];
            // lambda scales the density to unit variance.
            let ln_lambda = 0.5 * (-2.0 / nu * LN_2 + ln_gamma(1.0 / nu) - ln_gamma(3.0 / nu));
            let lambda = ln_lambda.exp();
            nu.ln() - ln_lambda - (1.0 + 1.0 / nu) * LN_2 - ln_gamma(1.0 / nu)
                - 0.5 * (z.abs() / lambda).powf(nu)
        }
    }
}

/// Full log-likelihood contribution of one observation with conditional
/// variance `h`: `ln f(eps / sqrt(h)) - 0.5 ln h`.
pub fn loglik_term(dist: ErrorDist, eps: f64, h: f64, shape: &[f64]) -> f64 {
    let z = eps / h.sqrt();
    ln_density(dist, z, shape) - 0.5 * h.ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_matches_closed_form() {
        // ln phi(0) = -0.5 ln(2 pi)
        assert!((ln_density(ErrorDist::Normal, 0.0, &[]) + 0.918_938_533_204_672_7).abs() < 1e-12);
        // ln phi(1) = ln phi(0) - 0.5
        let diff = ln_density(ErrorDist::Normal, 0.0, &[]) - ln_density(ErrorDist::Normal, 1.0, &[]);
        assert!((diff - 0.5).abs() < 1e-12);
    }

    #[test]
    fn student_t_approaches_normal_for_large_nu() {
        for z in [-2.0, -0.5, 0.0, 1.0, 2.5] {
            let t = ln_density(ErrorDist::StudentsT, z, &[400.0]);
            let n = ln_density(ErrorDist::Normal, z, &[]);
            assert!((t - n).abs() < 1e-2, "z={z}: t={t}, normal={n}");
        }
    }

    #[test]
    fn ged_with_nu_two_is_gaussian() {
        // GED(2) is exactly the standard normal.
        for z in [-1.5, 0.0, 0.7] {
            let g = ln_density(ErrorDist::Ged, z, &[2.0]);
            let n = ln_density(ErrorDist::Normal, z, &[]);
            assert!((g - n).abs() < 1e-10, "z={z}: ged={g}, normal={n}");
        }
    }

    #[test]
    fn skew_t_reduces_to_student_t_at_zero_skew() {
        for z in [-2.0, -0.3, 0.0, 1.2] {
            let s = ln_density(ErrorDist::SkewT, z, &[7.0, 0.0]);
            let t = ln_density(ErrorDist::StudentsT, z, &[7.0]);
            assert!((s - t).abs() < 1e-10, "z={z}: skewt={s}, t={t}");
        }
    }

    #[test]
    fn negative_skew_thickens_the_left_tail() {
        let left = ln_density(ErrorDist::SkewT, -2.0, &[6.0, -0.5]);
        let right = ln_density(ErrorDist::SkewT, 2.0, &[6.0, -0.5]);
        assert!(left > right);
    }

    #[test]
    fn shape_validation_bounds() {
        assert!(shape_valid(ErrorDist::Normal, &[]));
        assert!(shape_valid(ErrorDist::StudentsT, &[8.0]));
        assert!(!shape_valid(ErrorDist::StudentsT, &[2.0])); // variance undefined
        assert!(!shape_valid(ErrorDist::SkewT, &[8.0, 1.5])); // |lambda| >= 1
        assert!(!shape_valid(ErrorDist::Ged, &[0.0]));
        assert!(!shape_valid(ErrorDist::Ged, &[1.5, 0.3])); // wrong arity
    }

    #[test]
    fn loglik_term_accounts_for_variance() {
        // With h = 1 the term is just the density at eps.
        let a = loglik_term(ErrorDist::Normal, 0.5, 1.0, &[]);
        assert!((a - ln_density(ErrorDist::Normal, 0.5, &[])).abs() < 1e-12);

        // Scaling eps and h together shifts the term by -0.5 ln h.
        let b = loglik_term(ErrorDist::Normal, 1.0, 4.0, &[]);
        let expected = ln_density(ErrorDist::Normal, 0.5, &[]) - 0.5 * 4.0_f64.ln();
        assert!((b - expected).abs() < 1e-12);
    }
}
