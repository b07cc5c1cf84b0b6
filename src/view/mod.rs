//! What the forecast screen shows: a history window plus the forecast.
//!
//! The window start is session state owned by the caller; building a view
//! never mutates it beyond clamping the requested start into range.

use serde::Serialize;

use crate::domain::{Forecast, Month, TimeSeries};

/// Furthest back the history window may start, in months before the last observation.
pub const MAX_LOOKBACK_MONTHS: i64 = 36;
/// Default window start, in months before the last observation.
pub const DEFAULT_LOOKBACK_MONTHS: i64 = 13;
/// Fraction of the value span added above and below the y-range.
pub const Y_PAD_FRACTION: f64 = 0.1;

/// Per-session view state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewSession {
    pub start: Option<Month>,
}

impl ViewSession {
    pub fn starting_at(start: Month) -> Self {
        Self { start: Some(start) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastView {
    pub window_min: Month,
    pub window_max: Month,
    pub start: Month,
    pub history: Vec<(Month, f64)>,
    pub forecast: Option<Forecast>,
    pub y_range: (f64, f64),
}

impl ForecastView {
    /// Build the view. `forecast` is `None` when fitting failed; the history
    /// is still shown.
    pub fn build(series: &TimeSeries, forecast: Option<&Forecast>, session: &mut ViewSession) -> Self {
        let last = series.last_month();
        let window_min = last.add_months(-MAX_LOOKBACK_MONTHS);
        let default_start = last.add_months(-DEFAULT_LOOKBACK_MONTHS);

        let start = session.start.unwrap_or(default_start).clamp(window_min, last);
        session.start = Some(start);

        let history = series.window(start, last);
        let y_range = y_range(
            history
                .iter()
                .map(|(_, v)| *v)
                .chain(forecast.into_iter().flat_map(|f| f.means())),
        );

        Self {
            window_min,
            window_max: last,
            start,
            history,
            forecast: forecast.cloned(),
            y_range,
        }
    }
}

/// Min/max of `values`, padded by [`Y_PAD_FRACTION`] of the span.
fn y_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let pad = (hi - lo) * Y_PAD_FRACTION;
    (lo - pad, hi + pad)
}
