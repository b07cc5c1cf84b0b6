//! Parameter estimation for a fixed seasonal ARIMA order.
//!
//! Given:
//! - a (log-scale) monthly series `y_t`
//! - a fixed order `(p,d,q) x (P,D,Q,s)`
//!
//! we:
//! - difference the series once per `d` / `D`
//! - seed the coefficients with Hannan–Rissanen regressions
//! - minimize the concentrated conditional-sum-of-squares likelihood with
//!   restarted Nelder–Mead, without stationarity/invertibility constraints;
//!   restarts share the single iteration cap
//! - concentrate `sigma^2 = SSE / n` out of the optimum
//!
//! A fit that does not converge within the iteration cap is reported as
//! `FitFailed`; the order is never changed to rescue a fit.

use tracing::{debug, info, warn};

use crate::domain::{FIT_MAX_ITER, FittedModel, Month, SarimaOrder, SarimaParams};
use crate::error::{AppError, Result};
use crate::fit::start::hannan_rissanen;
use crate::math::{NelderMeadConfig, nelder_mead_restarted};
use crate::models::{ar_polynomial, conditional_residuals, css_objective, difference, ma_polynomial};

/// Options that affect how the model is calibrated.
#[derive(Debug, Clone, Copy)]
pub struct FitOptions {
    pub optimizer: NelderMeadConfig,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            optimizer: NelderMeadConfig {
                max_iter: FIT_MAX_ITER,
                ..NelderMeadConfig::default()
            },
        }
    }
}

/// Smallest series the order can be fitted on: every lag of the expanded
/// polynomials must be reachable from at least one differenced observation.
pub fn min_observations(order: &SarimaOrder) -> usize {
    order.diff_lags() + order.ar_lags().max(order.ma_lags()) + 2
}

/// Fit `order` on `endog` (already on the modelling scale).
pub fn fit_sarima(
    order: SarimaOrder,
    endog: &[f64],
    last_month: Month,
    opts: &FitOptions,
) -> Result<FittedModel> {
    let required = min_observations(&order);
    if endog.len() < required {
        return Err(AppError::fit_failed(format!(
            "order {} needs at least {required} observations, got {}",
            order.label(),
            endog.len()
        )));
    }
    if endog.iter().any(|v| !v.is_finite()) {
        return Err(AppError::fit_failed("series contains non-finite values"));
    }

    let w = difference(&order, endog);

    let start = hannan_rissanen(&order, &w).unwrap_or_else(|| {
        warn!(order = %order.label(), "start-value regression not solvable; starting from zero");
        vec![0.0; order.n_params()]
    });
    debug!(?start, "seasonal ARIMA start values");

    let result = nelder_mead_restarted(|x| css_objective(&order, &w, x), &start, opts.optimizer);
    debug!(
        iterations = result.iterations,
        evaluations = result.evaluations,
        restarts = result.restarts,
        objective = result.value,
        "simplex search finished"
    );

    if !result.value.is_finite() {
        return Err(AppError::fit_failed(
            "objective is not finite at the optimum (residual recursion diverged)",
        ));
    }
    if !result.converged {
        return Err(AppError::fit_failed(format!(
            "Nelder-Mead did not converge within {} iterations (objective {:.6})",
            opts.optimizer.max_iter, result.value
        )));
    }

    let params = SarimaParams::from_flat(&order, &result.point);
    let residuals = conditional_residuals(
        &w,
        &ar_polynomial(&order, &params),
        &ma_polynomial(&order, &params),
    );
    let sse: f64 = residuals.iter().map(|e| e * e).sum();
    let sigma2 = sse / residuals.len() as f64;
    if !(sigma2.is_finite() && sigma2 > 0.0) {
        return Err(AppError::fit_failed(format!(
            "degenerate innovation variance ({sigma2})"
        )));
    }

    info!(
        order = %order.label(),
        n_obs = endog.len(),
        iterations = result.iterations,
        sigma2,
        "seasonal ARIMA fitted"
    );

    Ok(FittedModel {
        order,
        params,
        sigma2,
        endog: endog.to_vec(),
        last_month,
        residuals,
        objective: result.value,
        iterations: result.iterations,
        converged: result.converged,
    })
}
