//! Seasonal ARIMA evaluation.
//!
//! The fitter relies on a handful of primitive operations:
//! - expand the multiplicative lag polynomials `phi(B)Phi(B^s)` and `theta(B)Theta(B^s)`
//! - difference / integrate a series with `(1-B)^d (1-B^s)^D`
//! - run the conditional residual recursion (objective for the search)
//! - forecast the differenced series and its psi-weights (forecast variance)
//!
//! Presample values of both the differenced series and the innovations are
//! taken as zero, so every differenced observation contributes a residual.

use crate::domain::{FittedModel, SarimaOrder, SarimaParams};

/// Multiply two polynomials given by ascending coefficients.
pub fn polymul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0.0 {
            continue;
        }
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] += ai * bj;
        }
    }
    out
}

/// Lag polynomial `1 + sign * (c_1 B^step + c_2 B^{2 step} + ...)`.
fn lag_polynomial(coeffs: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coeffs.len() * step + 1];
    poly[0] = 1.0;
    for (i, &c) in coeffs.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

/// Expanded AR operator `phi(B) Phi(B^s)`, ascending, leading coefficient 1.
pub fn ar_polynomial(order: &SarimaOrder, params: &SarimaParams) -> Vec<f64> {
    polymul(
        &lag_polynomial(&params.ar, 1, -1.0),
        &lag_polynomial(&params.seasonal_ar, order.period, -1.0),
    )
}

/// Expanded MA operator `theta(B) Theta(B^s)`, ascending, leading coefficient 1.
pub fn ma_polynomial(order: &SarimaOrder, params: &SarimaParams) -> Vec<f64> {
    polymul(
        &lag_polynomial(&params.ma, 1, 1.0),
        &lag_polynomial(&params.seasonal_ma, order.period, 1.0),
    )
}

/// Differencing operator `(1-B)^d (1-B^s)^D`.
pub fn diff_polynomial(order: &SarimaOrder) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..order.d {
        poly = polymul(&poly, &[1.0, -1.0]);
    }
    for _ in 0..order.seasonal_d {
        poly = polymul(&poly, &lag_polynomial(&[1.0], order.period, -1.0));
    }
    poly
}

/// Apply the differencing operator. The first `d + s*D` observations are consumed.
pub fn difference(order: &SarimaOrder, y: &[f64]) -> Vec<f64> {
    let delta = diff_polynomial(order);
    let k = delta.len() - 1;
    (k..y.len())
        .map(|t| delta.iter().enumerate().map(|(j, &c)| c * y[t - j]).sum())
        .collect()
}

/// Conditional residuals `e_t = theta(B)^{-1} phi(B) w_t` with zero presample.
pub fn conditional_residuals(w: &[f64], ar_poly: &[f64], ma_poly: &[f64]) -> Vec<f64> {
    let mut e = Vec::with_capacity(w.len());
    for t in 0..w.len() {
        let mut v = w[t];
        for k in 1..ar_poly.len().min(t + 1) {
            v += ar_poly[k] * w[t - k];
        }
        for k in 1..ma_poly.len().min(t + 1) {
            v -= ma_poly[k] * e[t - k];
        }
        e.push(v);
    }
    e
}

/// Concentrated Gaussian negative log-likelihood of the conditional residuals.
///
/// `sigma^2` is concentrated out as `SSE / n`, leaving `n/2 * ln(SSE / n)`
/// (constants dropped). Returns `+inf` when the recursion blows up.
pub fn css_objective(order: &SarimaOrder, w: &[f64], flat: &[f64]) -> f64 {
    if w.is_empty() {
        return f64::INFINITY;
    }
    let params = SarimaParams::from_flat(order, flat);
    let e = conditional_residuals(w, &ar_polynomial(order, &params), &ma_polynomial(order, &params));
    let sse: f64 = e.iter().map(|v| v * v).sum();
    if !sse.is_finite() {
        return f64::INFINITY;
    }
    let n = w.len() as f64;
    0.5 * n * (sse / n).max(f64::MIN_POSITIVE).ln()
}

/// Point forecasts of the levels, `steps` ahead, on the scale the model was fitted on.
pub fn forecast_levels(model: &FittedModel, steps: usize) -> Vec<f64> {
    let order = &model.order;
    let ar_poly = ar_polynomial(order, &model.params);
    let ma_poly = ma_polynomial(order, &model.params);

    let mut w = difference(order, &model.endog);
    let mut e = model.residuals.clone();
    let n_w = w.len();

    for _ in 0..steps {
        let t = w.len();
        let mut v = 0.0;
        for k in 1..ar_poly.len().min(t + 1) {
            v -= ar_poly[k] * w[t - k];
        }
        for k in 1..ma_poly.len().min(t + 1) {
            v += ma_poly[k] * e[t - k];
        }
        w.push(v);
        e.push(0.0);
    }

    integrate(order, &model.endog, &w[n_w..])
}

/// Undo differencing for future values `w_future` given the observed levels.
pub fn integrate(order: &SarimaOrder, history: &[f64], w_future: &[f64]) -> Vec<f64> {
    let delta = diff_polynomial(order);
    let mut levels = history.to_vec();
    let n = levels.len();
    for &wf in w_future {
        let t = levels.len();
        let mut y = wf;
        for k in 1..delta.len().min(t + 1) {
            y -= delta[k] * levels[t - k];
        }
        levels.push(y);
    }
    levels.split_off(n)
}

/// Psi-weights of the integrated process: `psi(B) = theta(B)Theta(B^s) / (phi(B)Phi(B^s)(1-B)^d(1-B^s)^D)`.
pub fn psi_weights(order: &SarimaOrder, params: &SarimaParams, count: usize) -> Vec<f64> {
    let full_ar = polymul(&ar_polynomial(order, params), &diff_polynomial(order));
    let ma_poly = ma_polynomial(order, params);

    let mut psi = Vec::with_capacity(count);
    for j in 0..count {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let mut v = ma_poly.get(j).copied().unwrap_or(0.0);
        for k in 1..full_ar.len().min(j + 1) {
            v -= full_ar[k] * psi[j - k];
        }
        psi.push(v);
    }
    psi
}

/// Forecast error variances for horizons `1..=steps`.
pub fn forecast_variances(model: &FittedModel, steps: usize) -> Vec<f64> {
    let psi = psi_weights(&model.order, &model.params, steps);
    let mut acc = 0.0;
    psi.iter()
        .map(|p| {
            acc += p * p;
            model.sigma2 * acc
        })
        .collect()
}
