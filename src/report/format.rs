//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the loading/fitting code stays clean and testable
//! - output changes are localized

use crate::calls::{GroupDay, GroupMonth};
use crate::domain::{FittedModel, Month};
use crate::pnl::{AnalysisRow, Kpis, MonthRow, QuarterRow};
use crate::view::ForecastView;

/// History window followed by the forecast table.
pub fn format_forecast(view: &ForecastView) -> String {
    let mut out = String::new();

    out.push_str(&format!("History ({}..{}):\n", view.start, view.window_max));
    out.push_str(&header(&[("month", 8), ("calls", 12)]));
    for (month, v) in &view.history {
        out.push_str(&format!("{:<8} {:>12}\n", month.to_string(), fmt_amount(*v)));
    }
    out.push('\n');

    match &view.forecast {
        Some(f) => {
            out.push_str(&format!(
                "Forecast {} ({:.0}% interval):\n",
                f.model,
                f.confidence * 100.0
            ));
            out.push_str(&header(&[("month", 8), ("mean", 12), ("lower", 12), ("upper", 12)]));
            for p in &f.points {
                out.push_str(&format!(
                    "{:<8} {:>12} {:>12} {:>12}\n",
                    p.month.to_string(),
                    fmt_amount(p.mean),
                    fmt_amount(p.lower),
                    fmt_amount(p.upper)
                ));
            }
        }
        None => out.push_str("Forecast unavailable.\n"),
    }

    out
}

/// Fitted coefficients and diagnostics.
pub fn format_model_summary(model: &FittedModel) -> String {
    let mut out = String::new();
    out.push_str(&format!("Model: SARIMA{} on log volumes\n", model.order.label()));
    out.push_str(&format!("- ar    : {}\n", fmt_vec(&model.params.ar)));
    out.push_str(&format!("- ma    : {}\n", fmt_vec(&model.params.ma)));
    out.push_str(&format!("- sar   : {}\n", fmt_vec(&model.params.seasonal_ar)));
    out.push_str(&format!("- sma   : {}\n", fmt_vec(&model.params.seasonal_ma)));
    out.push_str(&format!(
        "- sigma2: {:.6} | objective={:.4} | iterations={}\n",
        model.sigma2, model.objective, model.iterations
    ));
    out
}

pub fn format_kpis(scope: &str, kpis: &Kpis) -> String {
    let mut out = String::new();
    out.push_str(&format!("KPIs {scope} {}:\n", kpis.year));
    out.push_str(&format!("- YTD revenue : {}\n", fmt_amount(kpis.ytd_revenue)));
    out.push_str(&format!("- YTD profit  : {}\n", fmt_amount(kpis.ytd_profit)));
    match kpis.last_month {
        Some(m) => {
            out.push_str(&format!(
                "- {m} revenue: {} ({})\n",
                fmt_amount(kpis.month_revenue),
                fmt_delta(kpis.month_revenue_delta)
            ));
            out.push_str(&format!(
                "- {m} profit : {} ({})\n",
                fmt_amount(kpis.month_profit),
                fmt_delta(kpis.month_profit_delta)
            ));
        }
        None => out.push_str("- no months recorded for this year\n"),
    }
    out
}

pub fn format_month_rows(title: &str, rows: &[MonthRow]) -> String {
    let mut out = format!("{title}:\n");
    out.push_str(&header(&[("month", 8), ("revenue", 15), ("expense", 15), ("profit", 15)]));
    for r in rows {
        out.push_str(&format!(
            "{:<8} {:>15} {:>15} {:>15}\n",
            r.month.to_string(),
            fmt_amount(r.revenue),
            fmt_amount(r.expense),
            fmt_amount(r.profit)
        ));
    }
    out
}

pub fn format_quarterly(rows: &[QuarterRow]) -> String {
    let mut out = header(&[("quarter", 8), ("revenue", 15), ("profit", 15)]);
    for r in rows {
        out.push_str(&format!(
            "{:<8} {:>15} {:>15}\n",
            r.label,
            fmt_amount(r.revenue),
            fmt_amount(r.profit)
        ));
    }
    out
}

/// Per-service month-over-month table. Missing changes print as `-`.
pub fn format_analysis(rows: &[AnalysisRow]) -> String {
    let change = |v: Option<f64>| v.map(fmt_delta).unwrap_or_else(|| "-".to_string());
    let mut out = String::from("Month-over-month by service:\n");
    out.push_str(&header(&[
        ("month", 8),
        ("service", 16),
        ("revenue", 15),
        ("profit", 15),
        ("rev chg", 15),
        ("profit chg", 15),
    ]));
    for r in rows {
        out.push_str(&format!(
            "{:<8} {:<16} {:>15} {:>15} {:>15} {:>15}\n",
            r.month.to_string(),
            truncate(&r.service, 16),
            fmt_amount(r.revenue),
            fmt_amount(r.profit),
            change(r.revenue_change),
            change(r.profit_change)
        ));
    }
    out
}

/// Monthly totals, per-group monthly totals and the trailing daily window.
pub fn format_call_summary(
    monthly: &[(Month, u64)],
    by_group: &[GroupMonth],
    window: &[GroupDay],
) -> String {
    let mut out = String::from("Monthly handled calls:\n");
    out.push_str(&header(&[("month", 8), ("handled", 12)]));
    for (m, n) in monthly {
        out.push_str(&format!("{:<8} {:>12}\n", m.to_string(), fmt_amount(*n as f64)));
    }

    if !by_group.is_empty() {
        out.push_str("\nBy group:\n");
        out.push_str(&header(&[("month", 8), ("group", 20), ("handled", 12)]));
        for g in by_group {
            out.push_str(&format!(
                "{:<8} {:<20} {:>12}\n",
                g.month.to_string(),
                truncate(&g.group, 20),
                fmt_amount(g.handled as f64)
            ));
        }
    }

    if !window.is_empty() {
        out.push_str("\nRecent days:\n");
        out.push_str(&header(&[("date", 10), ("group", 20), ("handled", 12)]));
        for g in window {
            out.push_str(&format!(
                "{:<10} {:<20} {:>12}\n",
                g.date.to_string(),
                truncate(&g.group, 20),
                fmt_amount(g.handled as f64)
            ));
        }
    }
    out
}

/// Column titles plus a dashed rule. The first column is left-aligned.
fn header(cols: &[(&str, usize)]) -> String {
    let mut titles = String::new();
    let mut rule = String::new();
    for (i, (name, width)) in cols.iter().enumerate() {
        if i > 0 {
            titles.push(' ');
            rule.push(' ');
        }
        if i == 0 {
            titles.push_str(&format!("{name:<width$}"));
        } else {
            titles.push_str(&format!("{name:>width$}"));
        }
        rule.push_str(&"-".repeat(*width));
    }
    format!("{}\n{}\n", titles.trim_end(), rule)
}

/// Whole units with thousands separators, e.g. `-1,234,567`.
pub fn fmt_amount(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let rounded = v.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn fmt_delta(v: f64) -> String {
    if v >= 0.0 {
        format!("▲ {}", fmt_amount(v))
    } else {
        format!("▼ {}", fmt_amount(-v))
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
