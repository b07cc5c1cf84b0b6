//! Year-level P&L indicators, quarterly roll-ups and the month-over-month
//! table handed to the narrative analysis.

use serde::Serialize;

use crate::domain::Month;
use crate::error::Result;
use crate::pnl::sheet::{MonthRow, ProfitSheet, Scope};

/// Headline numbers for one year.
///
/// `month_*_delta` compare the latest month of the year with the calendar
/// month before it inside the same year; a month without figures counts as 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub year: i32,
    pub ytd_revenue: f64,
    pub ytd_profit: f64,
    pub last_month: Option<Month>,
    pub month_revenue: f64,
    pub month_revenue_delta: f64,
    pub month_profit: f64,
    pub month_profit_delta: f64,
}

pub fn compute_kpis(sheet: &ProfitSheet, scope: &Scope, year: i32) -> Result<Kpis> {
    let rows: Vec<MonthRow> = sheet
        .rows(scope)?
        .into_iter()
        .filter(|r| r.month.year() == year)
        .collect();

    let last_month = rows.iter().map(|r| r.month).max();
    let figures = |month: Option<Month>| {
        rows.iter()
            .filter(|r| Some(r.month) == month)
            .fold((0.0, 0.0), |(rev, pro), r| (rev + r.revenue, pro + r.profit))
    };
    let (month_revenue, month_profit) = figures(last_month);
    let (prev_revenue, prev_profit) = figures(last_month.map(Month::pred));

    Ok(Kpis {
        year,
        ytd_revenue: rows.iter().map(|r| r.revenue).sum(),
        ytd_profit: rows.iter().map(|r| r.profit).sum(),
        last_month,
        month_revenue,
        month_revenue_delta: month_revenue - prev_revenue,
        month_profit,
        month_profit_delta: month_profit - prev_profit,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterRow {
    /// e.g. `2024Q1`
    pub label: String,
    pub revenue: f64,
    pub profit: f64,
}

/// Revenue and profit per calendar quarter of `year`.
pub fn quarterly(sheet: &ProfitSheet, scope: &Scope, year: i32) -> Result<Vec<QuarterRow>> {
    let mut sums = [(0.0, 0.0, false); 4];
    for r in sheet.rows(scope)?.iter().filter(|r| r.month.year() == year) {
        let slot = &mut sums[(r.month.quarter() - 1) as usize];
        slot.0 += r.revenue;
        slot.1 += r.profit;
        slot.2 = true;
    }
    Ok(sums
        .iter()
        .enumerate()
        .filter(|(_, s)| s.2)
        .map(|(q, &(revenue, profit, _))| QuarterRow {
            label: format!("{year}Q{}", q + 1),
            revenue,
            profit,
        })
        .collect())
}

/// One service-month of the analysis table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRow {
    pub month: Month,
    pub service: String,
    pub revenue: f64,
    pub expense: f64,
    pub profit: f64,
    /// Change against the previous month's row of the same service, if any.
    pub revenue_change: Option<f64>,
    pub profit_change: Option<f64>,
}

/// Per-service monthly figures of `year` with month-over-month changes.
pub fn analysis_table(sheet: &ProfitSheet, year: i32) -> Result<Vec<AnalysisRow>> {
    let services: Vec<String> = sheet.services().map(str::to_string).collect();
    let mut out = Vec::new();
    for service in services {
        let rows = sheet.service_table(&service)?;
        let mut prev: Option<MonthRow> = None;
        for r in rows.into_iter().filter(|r| r.month.year() == year) {
            let consecutive = prev.filter(|p| p.month.succ() == r.month);
            out.push(AnalysisRow {
                month: r.month,
                service: service.clone(),
                revenue: r.revenue,
                expense: r.expense,
                profit: r.profit,
                revenue_change: consecutive.map(|p| r.revenue - p.revenue),
                profit_change: consecutive.map(|p| r.profit - p.profit),
            });
            prev = Some(r);
        }
    }
    out.sort_by(|a, b| a.month.cmp(&b.month).then_with(|| a.service.cmp(&b.service)));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pnl::sheet::load_profit_sheet;

    fn sheet(body: &str) -> ProfitSheet {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pnl.csv");
        std::fs::write(&path, body).unwrap();
        load_profit_sheet(&path).unwrap()
    }

    const BODY: &str = "\
date,revenue:A,expense:A,revenue:B,expense:B
2023-12-01,500,400,50,40
2024-01-01,100,80,10,5
2024-02-01,120,90,20,10
2024-03-01,130,100,30,10
2024-04-01,150,100,40,20
";

    #[test]
    fn kpis_use_previous_calendar_month() {
        let k = compute_kpis(&sheet(BODY), &Scope::Total, 2024).unwrap();
        assert_eq!(k.last_month, Month::new(2024, 4));
        assert_eq!(k.ytd_revenue, 100.0 + 10.0 + 140.0 + 160.0 + 190.0);
        assert_eq!(k.month_revenue, 190.0);
        assert_eq!(k.month_revenue_delta, 190.0 - 160.0);
        assert_eq!(k.month_profit, 70.0);
        assert_eq!(k.month_profit_delta, 70.0 - 50.0);
    }

    #[test]
    fn missing_previous_month_counts_as_zero() {
        let body = "date,revenue:A,expense:A\n2024-01-01,100,50\n2024-03-01,120,60\n";
        let k = compute_kpis(&sheet(body), &Scope::Service("A".into()), 2024).unwrap();
        assert_eq!(k.month_revenue_delta, 120.0);
        assert_eq!(k.month_profit_delta, 60.0);
    }

    #[test]
    fn quarterly_sums_three_months() {
        let q = quarterly(&sheet(BODY), &Scope::Service("A".into()), 2024).unwrap();
        assert_eq!(q.len(), 2);
        assert_eq!(q[0].label, "2024Q1");
        assert_eq!(q[0].revenue, 350.0);
        assert_eq!(q[0].profit, 80.0);
        assert_eq!(q[1].label, "2024Q2");
        assert_eq!(q[1].profit, 50.0);
    }

    #[test]
    fn analysis_table_reports_month_over_month_change() {
        let table = analysis_table(&sheet(BODY), 2024).unwrap();
        assert_eq!(table.len(), 8);
        assert_eq!(table[0].service, "A");
        assert_eq!(table[0].revenue_change, None);
        let feb_b = table
            .iter()
            .find(|r| r.service == "B" && r.month == Month::new(2024, 2).unwrap())
            .unwrap();
        assert_eq!(feb_b.revenue_change, Some(10.0));
        assert_eq!(feb_b.profit_change, Some(5.0));
    }
}
