use serde::{Deserialize, Serialize};

use crate::{validation_error, VtResult};

/// A named, time-ordered sequence of observations.
///
/// Construction validates that every value is finite, so downstream code
/// can treat the data as clean. The series is immutable; the driver shares
/// it read-only across trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    name: String,
    values: Vec<f64>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> VtResult<Self> {
        let name = name.into();
        if values.is_empty() {
            return Err(validation_error!("series '{name}' is empty"));
        }
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(validation_error!(
                "series '{name}' has non-finite value at index {idx}"
            ));
        }
        Ok(Self { name, values })
    }

    /// Convenience constructor with the default name used for unnamed data.
    pub fn from_values(values: Vec<f64>) -> VtResult<Self> {
        Self::new("y", values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Exponentially weighted moving standard deviation.
    ///
    /// `com` is the center of mass of the weighting, so the smoothing
    /// factor is `alpha = 1 / (1 + com)`. Weights are cumulative
    /// (`adjust=true` in dataframe-library terms) and the variance is
    /// debiased, which leaves the first position without an estimate: it
    /// is returned as NaN and callers drop it when aligning.
    pub fn ewm_std(&self, com: f64) -> Vec<f64> {
        let alpha = 1.0 / (1.0 + com);
        let decay = 1.0 - alpha;

        let mut out = Vec::with_capacity(self.values.len());
        let mut w_sum = 0.0;
        let mut w2_sum = 0.0;
        let mut wx = 0.0;
        let mut wx2 = 0.0;

        for &x in &self.values {
            w_sum = decay * w_sum + 1.0;
            w2_sum = decay * decay * w2_sum + 1.0;
            wx = decay * wx + x;
            wx2 = decay * wx2 + x * x;

            let denom = w_sum * w_sum - w2_sum;
            if denom <= 0.0 {
                out.push(f64::NAN);
                continue;
            }
            let mean = wx / w_sum;
            let biased_var = (wx2 / w_sum - mean * mean).max(0.0);
            let var = biased_var * w_sum * w_sum / denom;
            out.push(var.sqrt());
        }

        out
    }

    /// Sample standard deviation of the raw values.
    pub fn std(&self) -> f64 {
        let n = self.values.len() as f64;
        if n < 2.0 {
            return 0.0;
        }
        let mean = self.values.iter().sum::<f64>() / n;
        let ss = self
            .values
            .iter()
            .map(|&v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>();
        (ss / (n - 1.0)).sqrt()
    }
}
