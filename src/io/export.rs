//! Export forecast results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets: one row per
//! month, history first, then the forecast with its bounds.

use std::path::Path;

use serde::Serialize;

use crate::domain::{Forecast, TimeSeries};
use crate::error::{AppError, Result};

#[derive(Debug, Serialize)]
struct ExportRow {
    month: String,
    kind: &'static str,
    value: f64,
    lower: Option<f64>,
    upper: Option<f64>,
}

/// Write history + forecast rows to `path`.
pub fn write_forecast_csv(path: &Path, history: &TimeSeries, forecast: &Forecast) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    for (month, value) in history.iter() {
        writer.serialize(ExportRow {
            month: month.to_string(),
            kind: "actual",
            value,
            lower: None,
            upper: None,
        })?;
    }
    for p in &forecast.points {
        writer.serialize(ExportRow {
            month: p.month.to_string(),
            kind: "forecast",
            value: p.mean,
            lower: Some(p.lower),
            upper: Some(p.upper),
        })?;
    }

    writer.flush().map_err(|e| AppError::io(path, e))?;
    Ok(())
}
