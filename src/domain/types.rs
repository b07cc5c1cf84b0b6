//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - handed to a presentation layer as plain ordered records

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Number of months the forecaster projects forward.
pub const FORECAST_HORIZON: usize = 7;

/// Confidence level of the forecast band. Not configurable.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Iteration cap for the parameter search.
pub const FIT_MAX_ITER: usize = 1000;

/// A calendar month.
///
/// Ordering is chronological (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse a strict `YYYY-MM` tag.
    pub fn parse_tag(s: &str) -> Option<Self> {
        let s = s.trim();
        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return None;
        }
        if !bytes[..4].iter().chain(&bytes[5..]).all(u8::is_ascii_digit) {
            return None;
        }
        let year = s[..4].parse().ok()?;
        let month = s[5..].parse().ok()?;
        Self::new(year, month)
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// Calendar quarter, 1..=4.
    pub fn quarter(self) -> u32 {
        (self.month - 1) / 3 + 1
    }

    pub fn first_day(self) -> NaiveDate {
        // Month is validated on construction, so day 1 always exists.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Months since year 0, used for offset arithmetic.
    fn ordinal(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month - 1)
    }

    fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn add_months(self, n: i64) -> Self {
        Self::from_ordinal(self.ordinal() + n)
    }

    pub fn succ(self) -> Self {
        self.add_months(1)
    }

    pub fn pred(self) -> Self {
        self.add_months(-1)
    }

    /// Signed number of months from `self` to `other`.
    pub fn months_until(self, other: Month) -> i64 {
        other.ordinal() - self.ordinal()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Month::parse_tag(s).ok_or_else(|| format!("invalid month '{s}', expected YYYY-MM"))
    }
}

impl From<Month> for String {
    fn from(value: Month) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Month {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// Parse a date cell from an export.
///
/// Accepts full dates in a few common layouts as well as bare `YYYY-MM`.
pub fn parse_date_cell(s: &str) -> Option<NaiveDate> {
    const FMTS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];
    let s = s.trim();
    // Timestamps like `2024-01-01 00:00:00` come out of spreadsheet exports.
    let date_part = s.split([' ', 'T']).next().unwrap_or(s);
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(date_part, fmt) {
            return Some(d);
        }
    }
    Month::parse_tag(date_part).map(Month::first_day)
}

/// A monthly series with exactly one observation per calendar month and no gaps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    months: Vec<Month>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Build a series from `(month, value)` pairs already in chronological order.
    pub fn new(points: Vec<(Month, f64)>) -> Result<Self> {
        if points.is_empty() {
            return Err(AppError::invalid_series("series is empty"));
        }
        for pair in points.windows(2) {
            let (prev, next) = (pair[0].0, pair[1].0);
            if next == prev {
                return Err(AppError::invalid_series(format!("duplicate month {next}")));
            }
            if next != prev.succ() {
                return Err(AppError::invalid_series(format!(
                    "series is not monthly: {prev} is followed by {next}"
                )));
            }
        }
        let (months, values) = points.into_iter().unzip();
        Ok(Self { months, values })
    }

    /// Build a series of consecutive months starting at `start`.
    pub fn from_values(start: Month, values: Vec<f64>) -> Result<Self> {
        let points = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (start.add_months(i as i64), v))
            .collect();
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn months(&self) -> &[Month] {
        &self.months
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn first_month(&self) -> Month {
        self.months[0]
    }

    pub fn last_month(&self) -> Month {
        self.months[self.months.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Month, f64)> + '_ {
        self.months.iter().copied().zip(self.values.iter().copied())
    }

    pub fn get(&self, month: Month) -> Option<f64> {
        let idx = self.first_month().months_until(month);
        usize::try_from(idx).ok().and_then(|i| self.values.get(i).copied())
    }

    /// Points with `start <= month <= end`.
    pub fn window(&self, start: Month, end: Month) -> Vec<(Month, f64)> {
        self.iter().filter(|(m, _)| *m >= start && *m <= end).collect()
    }

    /// Mean of the last `n` observations (or all of them if shorter).
    pub fn trailing_mean(&self, n: usize) -> f64 {
        let n = n.clamp(1, self.values.len());
        let tail = &self.values[self.values.len() - n..];
        tail.iter().sum::<f64>() / n as f64
    }
}

/// Seasonal ARIMA order `(p,d,q) x (P,D,Q,s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub seasonal_p: usize,
    pub seasonal_d: usize,
    pub seasonal_q: usize,
    pub period: usize,
}

impl SarimaOrder {
    /// The order used for monthly call volumes. Fixed, not searched.
    pub const CALL_VOLUME: SarimaOrder = SarimaOrder {
        p: 1,
        d: 1,
        q: 1,
        seasonal_p: 2,
        seasonal_d: 0,
        seasonal_q: 1,
        period: 12,
    };

    /// Number of free ARMA coefficients.
    pub fn n_params(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q
    }

    /// Largest lag of the expanded AR polynomial: `p + s*P`.
    pub fn ar_lags(&self) -> usize {
        self.p + self.period * self.seasonal_p
    }

    /// Largest lag of the expanded MA polynomial: `q + s*Q`.
    pub fn ma_lags(&self) -> usize {
        self.q + self.period * self.seasonal_q
    }

    /// Observations consumed by differencing: `d + s*D`.
    pub fn diff_lags(&self) -> usize {
        self.d + self.period * self.seasonal_d
    }

    pub fn label(&self) -> String {
        format!(
            "({},{},{})x({},{},{},{})",
            self.p, self.d, self.q, self.seasonal_p, self.seasonal_d, self.seasonal_q, self.period
        )
    }
}

/// Estimated ARMA coefficients.
///
/// Sign convention: `phi(B) = 1 - ar_1 B - ...` and `theta(B) = 1 + ma_1 B + ...`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SarimaParams {
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
}

impl SarimaParams {
    /// Split a flat vector laid out as `[ar, ma, seasonal_ar, seasonal_ma]`.
    pub fn from_flat(order: &SarimaOrder, flat: &[f64]) -> Self {
        let mut rest = flat;
        let mut take = |n: usize| {
            let (head, tail) = rest.split_at(n.min(rest.len()));
            rest = tail;
            head.to_vec()
        };
        Self {
            ar: take(order.p),
            ma: take(order.q),
            seasonal_ar: take(order.seasonal_p),
            seasonal_ma: take(order.seasonal_q),
        }
    }

    pub fn to_flat(&self) -> Vec<f64> {
        self.ar
            .iter()
            .chain(&self.ma)
            .chain(&self.seasonal_ar)
            .chain(&self.seasonal_ma)
            .copied()
            .collect()
    }
}

/// A fitted seasonal ARIMA model. Never mutated after fitting.
#[derive(Debug, Clone, Serialize)]
pub struct FittedModel {
    pub order: SarimaOrder,
    pub params: SarimaParams,
    /// Innovation variance (concentrated out of the likelihood).
    pub sigma2: f64,
    /// Series the model was fitted on (log scale).
    pub endog: Vec<f64>,
    pub last_month: Month,
    /// In-sample one-step residuals of the differenced series.
    pub residuals: Vec<f64>,
    /// Final objective value (concentrated negative log-likelihood).
    pub objective: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// One forecasted month, in original units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub month: Month,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Fixed-horizon forecast anchored to the last observed month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub model: String,
    pub confidence: f64,
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    pub fn means(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(y: i32, m: u32) -> Month {
        Month::new(y, m).unwrap()
    }

    #[test]
    fn month_tag_parsing_is_strict() {
        assert_eq!(Month::parse_tag("2024-07"), Some(month(2024, 7)));
        assert_eq!(Month::parse_tag("2024-13"), None);
        assert_eq!(Month::parse_tag("2024-7"), None);
        assert_eq!(Month::parse_tag("24-07-01"), None);
        assert_eq!(Month::parse_tag("final"), None);
    }

    #[test]
    fn month_arithmetic_crosses_years() {
        assert_eq!(month(2023, 12).succ(), month(2024, 1));
        assert_eq!(month(2024, 1).pred(), month(2023, 12));
        assert_eq!(month(2024, 7).add_months(-13), month(2023, 6));
        assert_eq!(month(2023, 11).months_until(month(2024, 2)), 3);
        assert_eq!(month(2024, 5).quarter(), 2);
    }

    #[test]
    fn month_serializes_as_tag() {
        let json = serde_json::to_string(&month(2024, 3)).unwrap();
        assert_eq!(json, "\"2024-03\"");
        let back: Month = serde_json::from_str(&json).unwrap();
        assert_eq!(back, month(2024, 3));
    }

    #[test]
    fn date_cells_accept_common_layouts() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(parse_date_cell("2024-02-01"), Some(d));
        assert_eq!(parse_date_cell("2024-02-01 00:00:00"), Some(d));
        assert_eq!(parse_date_cell("2024/02/01"), Some(d));
        assert_eq!(parse_date_cell("2024-02"), Some(d));
        assert_eq!(parse_date_cell("Feb 2024"), None);
    }

    #[test]
    fn series_rejects_gaps_and_duplicates() {
        let gap = TimeSeries::new(vec![(month(2024, 1), 1.0), (month(2024, 3), 2.0)]);
        assert!(matches!(gap, Err(AppError::InvalidSeries { .. })));

        let dup = TimeSeries::new(vec![(month(2024, 1), 1.0), (month(2024, 1), 2.0)]);
        assert!(matches!(dup, Err(AppError::InvalidSeries { .. })));

        assert!(TimeSeries::new(vec![]).is_err());
    }

    #[test]
    fn series_window_and_lookup() {
        let s = TimeSeries::from_values(month(2023, 11), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(s.last_month(), month(2024, 2));
        assert_eq!(s.get(month(2024, 1)), Some(3.0));
        assert_eq!(s.get(month(2023, 10)), None);
        assert_eq!(s.window(month(2023, 12), month(2024, 1)).len(), 2);
        assert!((s.trailing_mean(2) - 3.5).abs() < 1e-12);
    }

    #[test]
    fn call_volume_order_shape() {
        let o = SarimaOrder::CALL_VOLUME;
        assert_eq!(o.n_params(), 5);
        assert_eq!(o.ar_lags(), 25);
        assert_eq!(o.ma_lags(), 13);
        assert_eq!(o.label(), "(1,1,1)x(2,0,1,12)");

        let flat = [0.1, 0.2, 0.3, 0.4, 0.5];
        let params = SarimaParams::from_flat(&o, &flat);
        assert_eq!(params.seasonal_ar, vec![0.3, 0.4]);
        assert_eq!(params.to_flat(), flat.to_vec());
    }
}
