//! Daily handled-call counts per team and per shopping mall.
//!
//! The export has one row per (date, team, mall). Rows with zero handled
//! calls are dropped on load; they are placeholders for closed days.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{Month, TimeSeries};
use crate::error::{AppError, Result};
use crate::io::table::{HeaderMap, cell, open_reader, parse_number};

/// Mon..Fri, the days the centre is staffed.
pub const WORKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub date: NaiveDate,
    pub team: String,
    pub mall: String,
    pub handled: u64,
}

/// Dimension a breakdown is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Team,
    Mall,
}

impl GroupBy {
    fn key(self, r: &CallRecord) -> &str {
        match self {
            GroupBy::Team => &r.team,
            GroupBy::Mall => &r.mall,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_weekday")]
    pub weekday: Weekday,
    pub handled: u64,
}

fn serialize_weekday<S: serde::Serializer>(w: &Weekday, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.collect_str(w)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMonth {
    pub month: Month,
    pub group: String,
    pub handled: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupDay {
    pub date: NaiveDate,
    pub group: String,
    pub handled: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DailyCalls {
    records: Vec<CallRecord>,
}

impl DailyCalls {
    pub fn new(mut records: Vec<CallRecord>) -> Self {
        records.retain(|r| r.handled != 0);
        records.sort_by(|a, b| a.date.cmp(&b.date));
        Self { records }
    }

    pub fn records(&self) -> &[CallRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    pub fn teams(&self) -> Vec<String> {
        self.distinct(GroupBy::Team)
    }

    pub fn malls(&self) -> Vec<String> {
        self.distinct(GroupBy::Mall)
    }

    fn distinct(&self, by: GroupBy) -> Vec<String> {
        let mut out: Vec<String> = self.records.iter().map(|r| by.key(r).to_string()).collect();
        out.sort();
        out.dedup();
        out
    }

    /// Handled calls per month, most recent first.
    pub fn monthly_totals(&self) -> Vec<(Month, u64)> {
        let mut sums: BTreeMap<Month, u64> = BTreeMap::new();
        for r in &self.records {
            *sums.entry(Month::from_date(r.date)).or_default() += r.handled;
        }
        sums.into_iter().rev().collect()
    }

    /// Handled calls per day, oldest first.
    pub fn daily_totals(&self) -> Vec<DailyTotal> {
        let mut sums: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for r in &self.records {
            *sums.entry(r.date).or_default() += r.handled;
        }
        sums.into_iter()
            .map(|(date, handled)| DailyTotal {
                date,
                weekday: date.weekday(),
                handled,
            })
            .collect()
    }

    /// Daily totals split by workday; weekends are left out.
    pub fn weekday_series(&self) -> Vec<(Weekday, Vec<DailyTotal>)> {
        let daily = self.daily_totals();
        WORKDAYS
            .iter()
            .map(|&wd| (wd, daily.iter().filter(|d| d.weekday == wd).copied().collect()))
            .collect()
    }

    /// Monthly totals per group, restricted to `selection` (all groups when empty).
    pub fn monthly_by(&self, by: GroupBy, selection: &[String]) -> Vec<GroupMonth> {
        let mut sums: BTreeMap<(Month, String), u64> = BTreeMap::new();
        for r in self.selected(by, selection) {
            *sums
                .entry((Month::from_date(r.date), by.key(r).to_string()))
                .or_default() += r.handled;
        }
        sums.into_iter()
            .map(|((month, group), handled)| GroupMonth {
                month,
                group,
                handled,
            })
            .collect()
    }

    /// Daily totals per group over the last `days` days of the selection.
    ///
    /// The window is `[last - days, last]` where `last` is the latest date
    /// among the selected rows.
    pub fn trailing_window(&self, by: GroupBy, selection: &[String], days: i64) -> Vec<GroupDay> {
        let selected: Vec<&CallRecord> = self.selected(by, selection).collect();
        let Some(last) = selected.iter().map(|r| r.date).max() else {
            return Vec::new();
        };
        let start = last - Duration::days(days.max(0));

        let mut sums: BTreeMap<(NaiveDate, String), u64> = BTreeMap::new();
        for r in selected.into_iter().filter(|r| r.date >= start) {
            *sums.entry((r.date, by.key(r).to_string())).or_default() += r.handled;
        }
        sums.into_iter()
            .map(|((date, group), handled)| GroupDay {
                date,
                group,
                handled,
            })
            .collect()
    }

    /// Monthly totals as a forecastable series.
    ///
    /// An export rarely starts on the first workday of a month or ends on
    /// the last one. The first and last months are kept only when no workday
    /// of theirs falls outside the covered dates; a partial month would read
    /// as a drop in volume. Interior months without any handled call are an
    /// `InvalidSeries` error, same as a gap in a snapshot file.
    pub fn monthly_series(&self) -> Result<TimeSeries> {
        let (Some(first), Some(last)) = (self.records.first(), self.records.last()) else {
            return Err(AppError::invalid_series("no handled calls in the export"));
        };
        let (first, last) = (first.date, last.date);

        let mut sums: BTreeMap<Month, f64> = self
            .monthly_totals()
            .into_iter()
            .map(|(m, n)| (m, n as f64))
            .collect();

        let first_month = Month::from_date(first);
        if workdays_between(first_month.first_day(), first) > 0 {
            debug!(month = %first_month, from = %first, "leading month is partial; left out");
            sums.remove(&first_month);
        }
        let last_month = Month::from_date(last);
        if workdays_between(last + Duration::days(1), last_month.succ().first_day()) > 0 {
            debug!(month = %last_month, to = %last, "trailing month is partial; left out");
            sums.remove(&last_month);
        }

        if sums.is_empty() {
            return Err(AppError::invalid_series(format!(
                "no complete month between {first} and {last}"
            )));
        }
        TimeSeries::new(sums.into_iter().collect())
    }

    fn selected<'a>(
        &'a self,
        by: GroupBy,
        selection: &'a [String],
    ) -> impl Iterator<Item = &'a CallRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| selection.is_empty() || selection.iter().any(|s| s == by.key(r)))
    }
}

/// Workdays in `[from, to)`.
fn workdays_between(from: NaiveDate, to: NaiveDate) -> usize {
    from.iter_days()
        .take_while(|d| *d < to)
        .filter(|d| WORKDAYS.contains(&d.weekday()))
        .count()
}

/// Load a daily call export.
pub fn load_daily_calls(path: &Path) -> Result<DailyCalls> {
    let mut reader = open_reader(path)?;
    let headers = HeaderMap::new(reader.headers()?);
    let date_idx = headers.require(path, &["date", "날짜"])?;
    let team_idx = headers.require(path, &["team", "팀명"])?;
    let mall_idx = headers.require(path, &["mall", "쇼핑몰명"])?;
    let handled_idx = headers.require(path, &["handled", "총처리호"])?;

    let mut records = Vec::new();
    let mut rows_read = 0usize;
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = idx + 2;
        rows_read += 1;

        let raw_date = cell(&record, date_idx).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
            AppError::MalformedDate {
                context: format!("'{}' line {line}", path.display()),
                value: raw_date.to_string(),
                expected: "YYYY-MM-DD",
            }
        })?;

        let raw_handled = cell(&record, handled_idx).unwrap_or("0");
        let handled = parse_number(raw_handled)
            .filter(|v| *v >= 0.0 && v.fract() == 0.0)
            .ok_or_else(|| {
                AppError::schema(
                    path,
                    format!("line {line}: handled count '{raw_handled}' is not a whole number"),
                )
            })? as u64;

        records.push(CallRecord {
            date,
            team: cell(&record, team_idx).unwrap_or_default().to_string(),
            mall: cell(&record, mall_idx).unwrap_or_default().to_string(),
            handled,
        });
    }

    let calls = DailyCalls::new(records);
    info!(
        file = %path.display(),
        rows_read,
        rows_used = calls.records.len(),
        "loaded daily calls"
    );
    Ok(calls)
}
