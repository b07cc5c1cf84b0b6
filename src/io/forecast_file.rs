//! Read/write forecast JSON files.
//!
//! The JSON file is the portable representation of one forecast run:
//! - which snapshot it came from
//! - the fitted coefficients and innovation variance
//! - the forecast points with their bounds

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{FittedModel, Forecast, Month, SarimaParams};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastFile {
    pub tool: String,
    pub source: PathBuf,
    pub last_observed: Month,
    pub params: SarimaParams,
    pub sigma2: f64,
    pub iterations: usize,
    pub forecast: Forecast,
}

impl ForecastFile {
    pub fn new(source: &Path, model: &FittedModel, forecast: &Forecast) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            source: source.to_path_buf(),
            last_observed: model.last_month,
            params: model.params.clone(),
            sigma2: model.sigma2,
            iterations: model.iterations,
            forecast: forecast.clone(),
        }
    }
}

pub fn write_forecast_json(path: &Path, file: &ForecastFile) -> Result<()> {
    let out = File::create(path).map_err(|e| AppError::io(path, e))?;
    serde_json::to_writer_pretty(out, file)?;
    Ok(())
}

pub fn read_forecast_json(path: &Path) -> Result<ForecastFile> {
    let input = File::open(path).map_err(|e| AppError::io(path, e))?;
    Ok(serde_json::from_reader(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ForecastPoint;

    #[test]
    fn json_file_preserves_months_and_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.json");
        let file = ForecastFile {
            tool: "callcast".to_string(),
            source: PathBuf::from("data/calls_2024-06.csv"),
            last_observed: Month::new(2024, 6).unwrap(),
            params: SarimaParams {
                ar: vec![0.3],
                ma: vec![-0.2],
                seasonal_ar: vec![0.4, 0.1],
                seasonal_ma: vec![-0.3],
            },
            sigma2: 0.002,
            iterations: 312,
            forecast: Forecast {
                model: "SARIMA(1,1,1)x(2,0,1,12)".to_string(),
                confidence: 0.95,
                points: vec![ForecastPoint {
                    month: Month::new(2024, 7).unwrap(),
                    mean: 51_000.0,
                    lower: 47_000.0,
                    upper: 55_500.0,
                }],
            },
        };

        write_forecast_json(&path, &file).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"2024-07\""));
        assert_eq!(read_forecast_json(&path).unwrap(), file);
    }
}
