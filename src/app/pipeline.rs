//! Shared "load -> fit -> forecast" workflow.
//!
//! Keeping this in one place lets every front-end (CLI subcommands, tests)
//! run the same steps and concentrate on presentation.
//!
//! Loader failures abort the run. Model failures do not: the loaded history is
//! still returned so it can be shown, with the failure in `outcome`.

use std::path::Path;

use tracing::warn;

use crate::domain::{FittedModel, Forecast, TimeSeries};
use crate::error::{AppError, Result};
use crate::forecast::Forecaster;
use crate::io::{LoadedSnapshot, SnapshotCache};

/// Fitted model and its forecast.
#[derive(Debug, Clone)]
pub struct ModelOutput {
    pub model: FittedModel,
    pub forecast: Forecast,
}

/// All computed outputs of a single forecast run.
#[derive(Debug)]
pub struct ForecastRun {
    pub snapshot: LoadedSnapshot,
    pub outcome: std::result::Result<ModelOutput, AppError>,
}

impl ForecastRun {
    pub fn forecast(&self) -> Option<&Forecast> {
        self.outcome.as_ref().ok().map(|o| &o.forecast)
    }
}

/// Fit and forecast one series.
pub fn forecast_series(series: &TimeSeries) -> Result<ModelOutput> {
    let forecaster = Forecaster::new();
    let model = forecaster.fit(series)?;
    let forecast = forecaster.forecast_from(&model)?;
    Ok(ModelOutput { model, forecast })
}

/// Load the latest snapshot in `dir` (through `cache`) and forecast it.
pub fn run_forecast(dir: &Path, cache: &mut SnapshotCache) -> Result<ForecastRun> {
    let snapshot = cache.load(dir)?;
    let outcome = forecast_series(&snapshot.series);
    if let Err(e) = &outcome {
        warn!(file = %snapshot.path.display(), error = %e, "forecast failed; history only");
    }
    Ok(ForecastRun { snapshot, outcome })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleSpec, generate_series, write_snapshot};
    use crate::domain::Month;

    #[test]
    fn model_failure_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("calls_2024-03.csv"),
            "ds,y\n2024-01-01,100\n2024-02-01,0\n2024-03-01,150\n",
        )
        .unwrap();

        let mut cache = SnapshotCache::new();
        let run = run_forecast(dir.path(), &mut cache).unwrap();
        assert_eq!(run.snapshot.series.len(), 3);
        assert!(matches!(run.outcome, Err(AppError::InvalidSeries { .. })));
        assert!(run.forecast().is_none());
    }

    #[test]
    fn synthetic_snapshot_forecasts_seven_months() {
        let dir = tempfile::tempdir().unwrap();
        let end = Month::new(2024, 6).unwrap();
        let series = generate_series(&SampleSpec::new(48, end, 11)).unwrap();
        write_snapshot(dir.path(), "calls", &series).unwrap();

        let mut cache = SnapshotCache::new();
        let run = run_forecast(dir.path(), &mut cache).unwrap();
        let forecast = run.forecast().unwrap();
        assert_eq!(forecast.points.len(), 7);
        assert_eq!(forecast.points[0].month, Month::new(2024, 7).unwrap());
    }
}
