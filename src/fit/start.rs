//! Start values for the simplex search (Hannan–Rissanen).
//!
//! 1. Fit a long autoregression to the differenced series by least squares and
//!    keep its residuals as innovation estimates.
//! 2. Regress the series on its own AR / seasonal-AR lags and on the lagged
//!    innovation estimates at the MA / seasonal-MA lags.
//!
//! The multiplicative cross terms are ignored; the result only seeds the
//! simplex, it is not the final estimate.

use nalgebra::DVector;

use crate::domain::SarimaOrder;
use crate::math::{design_matrix, solve_least_squares};

/// Start values are kept inside this band so the first residual recursion stays tame.
const START_BOUND: f64 = 0.9;

/// Hannan–Rissanen start values laid out as `[ar, ma, seasonal_ar, seasonal_ma]`.
///
/// Returns `None` when the series is too short for either regression.
pub fn hannan_rissanen(order: &SarimaOrder, w: &[f64]) -> Option<Vec<f64>> {
    let ar_lags: Vec<usize> = (1..=order.p)
        .chain((1..=order.seasonal_p).map(|j| j * order.period))
        .collect();
    let ma_lags: Vec<usize> = (1..=order.q)
        .chain((1..=order.seasonal_q).map(|j| j * order.period))
        .collect();

    if ar_lags.is_empty() && ma_lags.is_empty() {
        return Some(Vec::new());
    }

    let innovations = if ma_lags.is_empty() {
        vec![0.0; w.len()]
    } else {
        long_ar_residuals(w, long_ar_order(order, w.len())?)?
    };

    let first = ar_lags.iter().chain(&ma_lags).copied().max()?;
    let start_t = first.max(w.len() - innovations.len() + ma_lags.iter().copied().max().unwrap_or(0));
    if start_t >= w.len() {
        return None;
    }

    let offset = w.len() - innovations.len();
    let rows: Vec<Vec<f64>> = (start_t..w.len())
        .map(|t| {
            ar_lags
                .iter()
                .map(|&k| w[t - k])
                .chain(ma_lags.iter().map(|&k| innovations[t - k - offset]))
                .collect()
        })
        .collect();
    let y = DVector::from_iterator(w.len() - start_t, w[start_t..].iter().copied());
    let beta = solve_least_squares(&design_matrix(&rows)?, &y)?;

    // Regressor order is [ar, seasonal_ar, ma, seasonal_ma]; reorder to the flat layout.
    let (ar_part, ma_part) = beta.as_slice().split_at(ar_lags.len());
    let flat: Vec<f64> = ar_part[..order.p]
        .iter()
        .chain(&ma_part[..order.q])
        .chain(&ar_part[order.p..])
        .chain(&ma_part[order.q..])
        .map(|v| v.clamp(-START_BOUND, START_BOUND))
        .collect();
    Some(flat)
}

/// Long AR order: one season plus one, bounded by a third of the sample.
fn long_ar_order(order: &SarimaOrder, n: usize) -> Option<usize> {
    let m = (order.period + 1).min(n / 3);
    (m > 0).then_some(m)
}

/// Residuals of an AR(m) least squares fit, aligned to `w[m..]`.
fn long_ar_residuals(w: &[f64], m: usize) -> Option<Vec<f64>> {
    if w.len() <= m {
        return None;
    }
    let rows: Vec<Vec<f64>> = (m..w.len())
        .map(|t| (1..=m).map(|k| w[t - k]).collect())
        .collect();
    let x = design_matrix(&rows)?;
    let y = DVector::from_iterator(w.len() - m, w[m..].iter().copied());
    let beta = solve_least_squares(&x, &y)?;
    let fitted = &x * &beta;
    Some((&y - fitted).iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lcg_noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5
            })
            .collect()
    }

    #[test]
    fn recovers_ar1_coefficient_roughly() {
        let order = SarimaOrder {
            p: 1,
            d: 0,
            q: 0,
            seasonal_p: 0,
            seasonal_d: 0,
            seasonal_q: 0,
            period: 12,
        };
        let noise = lcg_noise(400, 7);
        let mut w = vec![0.0];
        for e in &noise[1..] {
            let prev = *w.last().unwrap();
            w.push(0.6 * prev + e);
        }
        let start = hannan_rissanen(&order, &w).unwrap();
        assert_eq!(start.len(), 1);
        assert!((start[0] - 0.6).abs() < 0.1, "got {}", start[0]);
    }

    #[test]
    fn call_volume_layout_and_bounds() {
        let order = SarimaOrder::CALL_VOLUME;
        let w: Vec<f64> = lcg_noise(47, 11)
            .iter()
            .enumerate()
            .map(|(i, e)| 0.2 * (i as f64 * std::f64::consts::PI / 6.0).sin() + 0.05 * e)
            .collect();
        let start = hannan_rissanen(&order, &w).unwrap();
        assert_eq!(start.len(), order.n_params());
        assert!(start.iter().all(|v| v.abs() <= START_BOUND));
    }

    #[test]
    fn too_short_series_yields_none() {
        let order = SarimaOrder::CALL_VOLUME;
        assert!(hannan_rissanen(&order, &[0.1, 0.2, 0.3]).is_none());
    }
}
