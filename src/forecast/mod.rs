//! Monthly call-volume forecaster.
//!
//! Pipeline:
//!
//! 1. natural log of every observation (volumes must be strictly positive)
//! 2. fit the fixed seasonal ARIMA order on the log series
//! 3. forecast a fixed horizon with a symmetric band on the log scale
//! 4. exponentiate mean and bounds back to call counts
//!
//! Step 4 happens after the band is computed, so the band in original units
//! is asymmetric around the mean.

use tracing::info;

use crate::domain::{
    CONFIDENCE_LEVEL, FORECAST_HORIZON, FittedModel, Forecast, ForecastPoint, SarimaOrder,
    TimeSeries,
};
use crate::error::{AppError, Result};
use crate::fit::{FitOptions, fit_sarima};
use crate::math::two_sided_z;
use crate::models::{forecast_levels, forecast_variances};

/// Natural log of every observation.
///
/// Fails with `InvalidSeries` on the first non-positive or non-finite value.
pub fn log_transform(series: &TimeSeries) -> Result<Vec<f64>> {
    series
        .iter()
        .map(|(month, v)| {
            if v.is_finite() && v > 0.0 {
                Ok(v.ln())
            } else {
                Err(AppError::invalid_series(format!(
                    "value {v} at {month} cannot be log-transformed (must be > 0)"
                )))
            }
        })
        .collect()
}

/// Inverse of [`log_transform`] for a single value.
pub fn exp_back(v: f64) -> f64 {
    v.exp()
}

/// Fixed-order forecaster.
#[derive(Debug, Clone)]
pub struct Forecaster {
    order: SarimaOrder,
    horizon: usize,
    confidence: f64,
    options: FitOptions,
}

impl Default for Forecaster {
    fn default() -> Self {
        Self {
            order: SarimaOrder::CALL_VOLUME,
            horizon: FORECAST_HORIZON,
            confidence: CONFIDENCE_LEVEL,
            options: FitOptions::default(),
        }
    }
}

impl Forecaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(&self) -> &SarimaOrder {
        &self.order
    }

    /// Fit the model on the log of `series`.
    pub fn fit(&self, series: &TimeSeries) -> Result<FittedModel> {
        let log_y = log_transform(series)?;
        fit_sarima(self.order, &log_y, series.last_month(), &self.options)
    }

    /// Fit and forecast `series`.
    pub fn forecast(&self, series: &TimeSeries) -> Result<Forecast> {
        let model = self.fit(series)?;
        let forecast = self.forecast_from(&model)?;
        info!(
            last_observed = %series.last_month(),
            horizon = self.horizon,
            first_mean = forecast.points.first().map(|p| p.mean),
            "forecast produced"
        );
        Ok(forecast)
    }

    /// Forecast from an already fitted model.
    pub fn forecast_from(&self, model: &FittedModel) -> Result<Forecast> {
        let means = forecast_levels(model, self.horizon);
        let variances = forecast_variances(model, self.horizon);
        let z = two_sided_z(self.confidence);

        let mut month = model.last_month;
        let mut points = Vec::with_capacity(self.horizon);
        for (mean, var) in means.into_iter().zip(variances) {
            month = month.succ();
            let half = z * var.sqrt();
            let point = ForecastPoint {
                month,
                mean: exp_back(mean),
                lower: exp_back(mean - half),
                upper: exp_back(mean + half),
            };
            if ![point.mean, point.lower, point.upper].iter().all(|v| v.is_finite()) {
                return Err(AppError::fit_failed(format!(
                    "forecast for {month} is not finite"
                )));
            }
            points.push(point);
        }

        Ok(Forecast {
            model: format!("SARIMA{}", model.order.label()),
            confidence: self.confidence,
            points,
        })
    }
}
