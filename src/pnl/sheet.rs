//! Monthly P&L sheet ingest.
//!
//! The sheet is exported as one row per month with a date column and one
//! revenue + one expense column per service:
//!
//! ```text
//! date,revenue:Inbound,expense:Inbound,revenue:Chat,expense:Chat
//! 2024-01-01,"12,000,000","9,500,000","3,000,000","2,100,000"
//! ```
//!
//! Korean prefixes (`날짜`, `매출:`, `지출:`) are accepted as aliases. Empty
//! cells count as zero. Derived profit columns in the export are ignored.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::domain::{Month, parse_date_cell};
use crate::error::{AppError, Result};
use crate::io::table::{HeaderMap, cell, normalize_header_name, open_reader, parse_number};

const REVENUE_PREFIXES: [&str; 2] = ["revenue:", "매출:"];
const EXPENSE_PREFIXES: [&str; 2] = ["expense:", "지출:"];

/// Which figures an aggregate is computed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Total,
    Service(String),
}

/// Revenue and expense of one service, aligned with [`ProfitSheet::months`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceLedger {
    pub name: String,
    pub revenue: Vec<f64>,
    pub expense: Vec<f64>,
}

/// One month of figures for a scope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthRow {
    pub month: Month,
    pub revenue: f64,
    pub expense: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfitSheet {
    months: Vec<Month>,
    services: Vec<ServiceLedger>,
}

impl ProfitSheet {
    pub fn months(&self) -> &[Month] {
        &self.months
    }

    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(|s| s.name.as_str())
    }

    pub fn service(&self, name: &str) -> Result<&ServiceLedger> {
        self.services
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| AppError::UnknownService(name.to_string()))
    }

    /// Sum over every service, per month.
    pub fn total(&self) -> Vec<MonthRow> {
        self.months
            .iter()
            .enumerate()
            .map(|(i, &month)| {
                let revenue: f64 = self.services.iter().map(|s| s.revenue[i]).sum();
                let expense: f64 = self.services.iter().map(|s| s.expense[i]).sum();
                MonthRow {
                    month,
                    revenue,
                    expense,
                    profit: revenue - expense,
                }
            })
            .collect()
    }

    /// Per-month figures of one service.
    pub fn service_table(&self, name: &str) -> Result<Vec<MonthRow>> {
        let ledger = self.service(name)?;
        Ok(self
            .months
            .iter()
            .zip(ledger.revenue.iter().zip(&ledger.expense))
            .map(|(&month, (&revenue, &expense))| MonthRow {
                month,
                revenue,
                expense,
                profit: revenue - expense,
            })
            .collect())
    }

    pub fn rows(&self, scope: &Scope) -> Result<Vec<MonthRow>> {
        match scope {
            Scope::Total => Ok(self.total()),
            Scope::Service(name) => self.service_table(name),
        }
    }

    /// Years present in the sheet, most recent first.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.months.iter().map(|m| m.year()).collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        years
    }

    /// Keep only months falling in one of `years`.
    pub fn filter_years(&self, years: &[i32]) -> ProfitSheet {
        let keep: Vec<usize> = self
            .months
            .iter()
            .enumerate()
            .filter(|(_, m)| years.contains(&m.year()))
            .map(|(i, _)| i)
            .collect();
        let pick = |v: &[f64]| keep.iter().map(|&i| v[i]).collect::<Vec<f64>>();
        ProfitSheet {
            months: keep.iter().map(|&i| self.months[i]).collect(),
            services: self
                .services
                .iter()
                .map(|s| ServiceLedger {
                    name: s.name.clone(),
                    revenue: pick(&s.revenue),
                    expense: pick(&s.expense),
                })
                .collect(),
        }
    }
}

/// Load a P&L CSV export.
pub fn load_profit_sheet(path: &Path) -> Result<ProfitSheet> {
    let mut reader = open_reader(path)?;
    let raw_headers = reader.headers()?.clone();
    let headers = HeaderMap::new(&raw_headers);
    let date_idx = headers.require(path, &["date", "날짜"])?;

    let mut revenue_cols: Vec<(String, usize)> = Vec::new();
    let mut expense_cols: Vec<(String, usize)> = Vec::new();
    for (idx, raw) in raw_headers.iter().enumerate() {
        let name = raw.trim().trim_start_matches('\u{feff}');
        if let Some(service) = strip_prefix_ci(name, &REVENUE_PREFIXES) {
            revenue_cols.push((service, idx));
        } else if let Some(service) = strip_prefix_ci(name, &EXPENSE_PREFIXES) {
            expense_cols.push((service, idx));
        }
    }

    if revenue_cols.is_empty() {
        return Err(AppError::schema(path, "no `revenue:<service>` columns found"));
    }
    let mut pairs: Vec<(String, usize, usize)> = Vec::with_capacity(revenue_cols.len());
    for (service, rev_idx) in revenue_cols {
        let exp_idx = expense_cols
            .iter()
            .find(|(s, _)| *s == service)
            .map(|(_, idx)| *idx)
            .ok_or_else(|| {
                AppError::schema(path, format!("service '{service}' has no expense column"))
            })?;
        pairs.push((service, rev_idx, exp_idx));
    }

    let mut rows: Vec<(Month, Vec<(f64, f64)>)> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = idx + 2;
        let Some(raw_date) = cell(&record, date_idx) else {
            // Trailing blank lines in spreadsheet exports.
            continue;
        };
        let date = parse_date_cell(raw_date).ok_or_else(|| AppError::MalformedDate {
            context: format!("'{}' line {line}", path.display()),
            value: raw_date.to_string(),
            expected: "YYYY-MM-DD or YYYY-MM",
        })?;

        let mut figures = Vec::with_capacity(pairs.len());
        for (service, rev_idx, exp_idx) in &pairs {
            let revenue = amount(&record, *rev_idx, path, line, service)?;
            let expense = amount(&record, *exp_idx, path, line, service)?;
            figures.push((revenue, expense));
        }
        rows.push((Month::from_date(date), figures));
    }

    rows.sort_by_key(|(m, _)| *m);
    if let Some(pair) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(AppError::schema(path, format!("duplicate month {}", pair[0].0)));
    }

    let months: Vec<Month> = rows.iter().map(|(m, _)| *m).collect();
    let services = pairs
        .iter()
        .enumerate()
        .map(|(j, (name, _, _))| ServiceLedger {
            name: name.clone(),
            revenue: rows.iter().map(|(_, f)| f[j].0).collect(),
            expense: rows.iter().map(|(_, f)| f[j].1).collect(),
        })
        .collect();

    info!(
        file = %path.display(),
        months = months.len(),
        services = pairs.len(),
        "loaded P&L sheet"
    );

    Ok(ProfitSheet { months, services })
}

fn strip_prefix_ci(name: &str, prefixes: &[&str]) -> Option<String> {
    let lowered = normalize_header_name(name);
    prefixes.iter().find_map(|p| {
        lowered
            .starts_with(p)
            .then(|| name[p.len()..].trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

fn amount(
    record: &csv::StringRecord,
    idx: usize,
    path: &Path,
    line: usize,
    service: &str,
) -> Result<f64> {
    match cell(record, idx) {
        None => Ok(0.0),
        Some(raw) => parse_number(raw).ok_or_else(|| {
            AppError::schema(
                path,
                format!("line {line}: amount '{raw}' for service '{service}' is not a number"),
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
날짜,매출:Inbound,지출:Inbound,revenue:Chat,expense:Chat
2024-02-01,\"1,200\",900,300,200
2024-01-01,1000,800,,100
2023-12-01,900,700,250,150
";

    fn sheet() -> ProfitSheet {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pnl.csv");
        std::fs::write(&path, SHEET).unwrap();
        load_profit_sheet(&path).unwrap()
    }

    #[test]
    fn loads_services_in_column_order_and_sorts_months() {
        let s = sheet();
        assert_eq!(s.services().collect::<Vec<_>>(), vec!["Inbound", "Chat"]);
        assert_eq!(s.months()[0], Month::new(2023, 12).unwrap());
        assert_eq!(s.service("Inbound").unwrap().revenue, vec![900.0, 1000.0, 1200.0]);
        // Empty cell counts as zero.
        assert_eq!(s.service("Chat").unwrap().revenue[1], 0.0);
    }

    #[test]
    fn total_sums_services() {
        let total = sheet().total();
        let feb = total.last().unwrap();
        assert_eq!(feb.revenue, 1500.0);
        assert_eq!(feb.expense, 1100.0);
        assert_eq!(feb.profit, 400.0);
    }

    #[test]
    fn years_and_filtering() {
        let s = sheet();
        assert_eq!(s.years(), vec![2024, 2023]);
        let only_2024 = s.filter_years(&[2024]);
        assert_eq!(only_2024.months().len(), 2);
        assert_eq!(only_2024.service("Chat").unwrap().expense, vec![100.0, 200.0]);
    }

    #[test]
    fn unknown_service_is_reported() {
        let err = sheet().service_table("Email").unwrap_err();
        assert!(matches!(err, AppError::UnknownService(ref s) if s == "Email"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn service_without_expense_column_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pnl.csv");
        std::fs::write(&path, "date,revenue:A\n2024-01-01,1\n").unwrap();
        assert!(matches!(load_profit_sheet(&path), Err(AppError::Schema { .. })));
    }
}
