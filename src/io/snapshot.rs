//! Snapshot discovery and loading.
//!
//! Monthly call volumes arrive as one CSV export per refresh, named
//! `<anything>_<YYYY-MM>.csv` (e.g. `calls_2024-07.csv`). The loader picks the
//! file with the most recent tag and parses it into a [`TimeSeries`].
//!
//! Rules:
//! - only `.csv` files are candidates
//! - the tag is the last `_`-separated segment of the file stem
//! - any candidate with an unparseable tag fails the whole load
//! - no candidates at all is `NoDataFound`

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::{Month, TimeSeries, parse_date_cell};
use crate::error::{AppError, Result};
use crate::io::table::{HeaderMap, cell, open_reader, parse_number};

const TAG_FORMAT: &str = "YYYY-MM";
const DS_FORMAT: &str = "YYYY-MM-DD, YYYY-MM-DD HH:MM:SS, YYYY/MM/DD or YYYY-MM";

/// A loaded snapshot: which file was chosen and what it contained.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSnapshot {
    pub path: PathBuf,
    pub tag: Month,
    pub series: TimeSeries,
}

/// A candidate file and its parsed tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    pub path: PathBuf,
    pub tag: Month,
}

/// Find the most recent snapshot in `dir`.
pub fn latest_snapshot(dir: &Path) -> Result<SnapshotFile> {
    let candidates = list_snapshots(dir)?;
    candidates
        .into_iter()
        .max_by(|a, b| a.tag.cmp(&b.tag).then_with(|| a.path.cmp(&b.path)))
        .ok_or_else(|| AppError::NoDataFound {
            dir: dir.to_path_buf(),
        })
}

/// Every `.csv` candidate in `dir`, with its tag.
pub fn list_snapshots(dir: &Path) -> Result<Vec<SnapshotFile>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        debug!(dir = %dir.display(), error = %e, "snapshot directory not readable");
        AppError::NoDataFound {
            dir: dir.to_path_buf(),
        }
    })?;

    let mut out = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| AppError::io(dir, e))?.path();
        if !path.is_file() || !has_csv_extension(&path) {
            continue;
        }
        let tag = snapshot_tag(&path)?;
        out.push(SnapshotFile { path, tag });
    }
    out.sort_by(|a, b| a.tag.cmp(&b.tag).then_with(|| a.path.cmp(&b.path)));
    Ok(out)
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Parse the `YYYY-MM` tag out of a snapshot file name.
pub fn snapshot_tag(path: &Path) -> Result<Month> {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let tag = stem.rsplit('_').next().unwrap_or(stem);
    Month::parse_tag(tag).ok_or_else(|| AppError::MalformedDate {
        context: format!("file name '{}'", path.display()),
        value: tag.to_string(),
        expected: TAG_FORMAT,
    })
}

/// Discover and load the latest snapshot in `dir`.
pub fn load_latest(dir: &Path) -> Result<LoadedSnapshot> {
    let file = latest_snapshot(dir)?;
    let series = load_series(&file.path)?;
    info!(
        file = %file.path.display(),
        tag = %file.tag,
        rows = series.len(),
        first = %series.first_month(),
        last = %series.last_month(),
        "loaded snapshot"
    );
    Ok(LoadedSnapshot {
        path: file.path,
        tag: file.tag,
        series,
    })
}

/// Parse a `ds,y` CSV into a monthly series.
pub fn load_series(path: &Path) -> Result<TimeSeries> {
    let mut reader = open_reader(path)?;
    let headers = HeaderMap::new(reader.headers()?);
    let ds_idx = headers.require(path, &["ds"])?;
    let y_idx = headers.require(path, &["y"])?;

    let mut points: Vec<(Month, f64)> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        // Data starts on line 2.
        let line = idx + 2;

        let ds = cell(&record, ds_idx).unwrap_or_default();
        let date = parse_date_cell(ds).ok_or_else(|| AppError::MalformedDate {
            context: format!("'{}' line {line}", path.display()),
            value: ds.to_string(),
            expected: DS_FORMAT,
        })?;

        let raw = cell(&record, y_idx).unwrap_or_default();
        let y = parse_number(raw)
            .filter(|v| *v >= 0.0)
            .ok_or_else(|| {
                AppError::invalid_series(format!(
                    "'{}' line {line}: `y` value '{raw}' is not a non-negative number",
                    path.display()
                ))
            })?;

        points.push((Month::from_date(date), y));
    }

    if points.is_empty() {
        return Err(AppError::invalid_series(format!(
            "'{}' contains no observations",
            path.display()
        )));
    }

    points.sort_by_key(|(m, _)| *m);
    TimeSeries::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn tag_is_last_underscore_segment() {
        let tag = snapshot_tag(Path::new("data/monthly_calls_2024-03.csv")).unwrap();
        assert_eq!(tag, Month::new(2024, 3).unwrap());

        let err = snapshot_tag(Path::new("data/calls_final.csv")).unwrap_err();
        assert!(matches!(err, AppError::MalformedDate { .. }));
    }

    #[test]
    fn series_is_sorted_and_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "calls_2024-03.csv",
            "\u{feff}DS,Y\n2024-03-01,30\n2024-01-01,10\n2024-02-01 00:00:00,\"2,000\"\n",
        );
        let s = load_series(&path).unwrap();
        assert_eq!(s.values(), &[10.0, 2000.0, 30.0]);
        assert_eq!(s.last_month(), Month::new(2024, 3).unwrap());
    }

    #[test]
    fn bad_rows_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let date = write(dir, "a_2024-01.csv", "ds,y\nJan 2024,1\n");
        assert!(matches!(load_series(&date), Err(AppError::MalformedDate { .. })));

        let neg = write(dir, "b_2024-01.csv", "ds,y\n2024-01-01,-5\n");
        assert!(matches!(load_series(&neg), Err(AppError::InvalidSeries { .. })));

        let gap = write(dir, "c_2024-01.csv", "ds,y\n2024-01-01,1\n2024-03-01,2\n");
        assert!(matches!(load_series(&gap), Err(AppError::InvalidSeries { .. })));

        let schema = write(dir, "d_2024-01.csv", "date,value\n2024-01-01,1\n");
        assert!(matches!(load_series(&schema), Err(AppError::Schema { .. })));
    }

    #[test]
    fn missing_directory_is_no_data() {
        let err = load_latest(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, AppError::NoDataFound { .. }));
        assert_eq!(err.exit_code(), 3);
    }
}
