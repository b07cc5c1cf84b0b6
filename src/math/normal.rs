//! Standard normal quantiles for forecast bands.

use statrs::distribution::{ContinuousCDF, Normal};

/// Inverse CDF of the standard normal distribution.
///
/// Returns `NaN` outside `(0, 1)`.
pub fn quantile_normal(p: f64) -> f64 {
    if !(p > 0.0 && p < 1.0) {
        return f64::NAN;
    }
    match Normal::new(0.0, 1.0) {
        Ok(standard) => standard.inverse_cdf(p),
        Err(_) => f64::NAN,
    }
}

/// Two-sided critical value for a confidence level, e.g. `0.95 -> 1.96`.
pub fn two_sided_z(confidence: f64) -> f64 {
    quantile_normal(0.5 + confidence / 2.0)
}
