//! Synthetic monthly call-volume snapshots.
//!
//! Used for demos (`callcast generate`) and tests. The shape mimics a real
//! contact centre: slow linear growth, a yearly cycle with a peak in
//! December, and multiplicative log-normal noise.
//!
//! `y_t = level * (1 + growth * t) * exp(amplitude * cos(2π (m_t - 12) / 12) + ε_t)`,
//! `ε_t ~ N(0, noise^2)`

use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::Serialize;
use tracing::info;

use crate::domain::{Month, TimeSeries};
use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct SampleSpec {
    pub months: usize,
    /// Last month of the generated series (also the snapshot tag).
    pub end: Month,
    pub seed: u64,
    pub level: f64,
    /// Linear growth per month, as a fraction of `level`.
    pub growth: f64,
    /// Log-scale amplitude of the yearly cycle.
    pub amplitude: f64,
    /// Log-scale standard deviation of the noise.
    pub noise: f64,
}

impl SampleSpec {
    pub fn new(months: usize, end: Month, seed: u64) -> Self {
        Self {
            months,
            end,
            seed,
            level: 42_000.0,
            growth: 0.004,
            amplitude: 0.12,
            noise: 0.03,
        }
    }
}

pub fn generate_series(sample: &SampleSpec) -> Result<TimeSeries> {
    if sample.months == 0 {
        return Err(AppError::config("sample length must be > 0 months"));
    }
    if !(sample.level.is_finite() && sample.level > 0.0) {
        return Err(AppError::config("sample level must be finite and > 0"));
    }

    let mut rng = StdRng::seed_from_u64(sample.seed);
    let normal = Normal::new(0.0, sample.noise)
        .map_err(|e| AppError::config(format!("noise distribution error: {e}")))?;

    let start = sample.end.add_months(-(sample.months as i64 - 1));
    let values = (0..sample.months)
        .map(|t| {
            let month = start.add_months(t as i64);
            let phase = 2.0 * PI * (f64::from(month.month()) - 12.0) / 12.0;
            let trend = (1.0 + sample.growth * t as f64).max(0.01);
            let eps: f64 = normal.sample(&mut rng);
            sample.level * trend * (sample.amplitude * phase.cos() + eps).exp()
        })
        .collect();

    TimeSeries::from_values(start, values)
}

#[derive(Debug, Serialize)]
struct SnapshotRow {
    ds: String,
    y: f64,
}

/// Write `series` as `<dir>/<prefix>_<YYYY-MM>.csv` tagged with its last month.
pub fn write_snapshot(dir: &Path, prefix: &str, series: &TimeSeries) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| AppError::io(dir, e))?;
    let path = dir.join(format!("{prefix}_{}.csv", series.last_month()));

    let mut writer = csv::Writer::from_path(&path)?;
    for (month, y) in series.iter() {
        writer.serialize(SnapshotRow {
            ds: month.first_day().to_string(),
            y: y.round(),
        })?;
    }
    writer.flush().map_err(|e| AppError::io(&path, e))?;

    info!(file = %path.display(), months = series.len(), "wrote synthetic snapshot");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::snapshot::load_latest;

    #[test]
    fn same_seed_same_series() {
        let end = Month::new(2024, 6).unwrap();
        let a = generate_series(&SampleSpec::new(48, end, 7)).unwrap();
        let b = generate_series(&SampleSpec::new(48, end, 7)).unwrap();
        let c = generate_series(&SampleSpec::new(48, end, 8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 48);
        assert_eq!(a.last_month(), end);
        assert!(a.values().iter().all(|v| *v > 0.0));
    }

    #[test]
    fn december_peaks_above_june() {
        let sample = SampleSpec {
            noise: 0.0,
            growth: 0.0,
            ..SampleSpec::new(12, Month::new(2024, 12).unwrap(), 1)
        };
        let s = generate_series(&sample).unwrap();
        let dec = s.get(Month::new(2024, 12).unwrap()).unwrap();
        let jun = s.get(Month::new(2024, 6).unwrap()).unwrap();
        assert!(dec > jun);
    }

    #[test]
    fn written_snapshot_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let series = generate_series(&SampleSpec::new(30, Month::new(2024, 3).unwrap(), 3)).unwrap();
        let path = write_snapshot(dir.path(), "calls", &series).unwrap();
        assert!(path.ends_with("calls_2024-03.csv"));

        let loaded = load_latest(dir.path()).unwrap();
        assert_eq!(loaded.tag, Month::new(2024, 3).unwrap());
        assert_eq!(loaded.series.len(), 30);
    }

    #[test]
    fn zero_months_is_rejected() {
        let err = generate_series(&SampleSpec::new(0, Month::new(2024, 1).unwrap(), 1)).unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
    }
}
