//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output
//!
//! Plot elements:
//! - observed months: `o`, joined by a `-` line
//! - forecast means: `*`
//! - forecast bounds: `:`

use crate::domain::Month;
use crate::view::ForecastView;

/// Render the history window and forecast of `view`.
pub fn render_forecast_plot(view: &ForecastView, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let first = view.start;
    let last = view
        .forecast
        .as_ref()
        .and_then(|f| f.points.last())
        .map(|p| p.month)
        .unwrap_or(view.window_max);
    let span = first.months_until(last).max(1) as f64;
    let x_of = |m: Month| map_x(first.months_until(m) as f64, span, width);

    let (y_min, y_max) = view.y_range;
    let (y_min, y_max) = if y_max > y_min { (y_min, y_max) } else { (y_min - 1.0, y_max + 1.0) };
    let y_of = |v: f64| map_y(v, y_min, y_max, height);

    let mut grid = vec![vec![' '; width]; height];

    if let Some(forecast) = &view.forecast {
        for p in &forecast.points {
            let x = x_of(p.month);
            grid[y_of(p.lower)][x] = ':';
            grid[y_of(p.upper)][x] = ':';
        }
    }

    let history: Vec<(usize, usize)> = view.history.iter().map(|&(m, v)| (x_of(m), y_of(v))).collect();
    for pair in history.windows(2) {
        draw_line(&mut grid, pair[0], pair[1], '-');
    }
    for &(x, y) in &history {
        grid[y][x] = 'o';
    }

    if let Some(forecast) = &view.forecast {
        for p in &forecast.points {
            grid[y_of(p.mean)][x_of(p.month)] = '*';
        }
    }

    let mut out = String::new();
    out.push_str(&format!("Plot: {first}..{last} | y=[{y_min:.0}, {y_max:.0}]\n"));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    let first_label = first.to_string();
    let last_label = last.to_string();
    let gap = width.saturating_sub(first_label.len() + last_label.len()).max(1);
    out.push_str(&format!("{first_label}{}{last_label}\n", " ".repeat(gap)));
    out
}

fn map_x(offset: f64, span: f64, width: usize) -> usize {
    let u = (offset / span).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Top row is the maximum.
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham). Never overwrites a non-blank cell.
fn draw_line(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let (mut x0, mut y0) = (from.0 as isize, from.1 as isize);
    let (x1, y1) = (to.0 as isize, to.1 as isize);

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid
            .get_mut(y0 as usize)
            .and_then(|row| row.get_mut(x0 as usize))
            .filter(|c| **c == ' ')
        {
            *cell = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Forecast, ForecastPoint, TimeSeries};
    use crate::view::{ForecastView, ViewSession};

    fn month(y: i32, m: u32) -> Month {
        Month::new(y, m).unwrap()
    }

    #[test]
    fn plot_marks_history_forecast_and_bounds() {
        let series = TimeSeries::from_values(month(2024, 1), vec![10.0, 20.0, 30.0]).unwrap();
        let forecast = Forecast {
            model: "m".to_string(),
            confidence: 0.95,
            points: vec![ForecastPoint {
                month: month(2024, 4),
                mean: 40.0,
                lower: 35.0,
                upper: 45.0,
            }],
        };
        let mut session = ViewSession::starting_at(month(2024, 1));
        let view = ForecastView::build(&series, Some(&forecast), &mut session);
        assert!((view.y_range.0 - 7.0).abs() < 1e-9);
        assert!((view.y_range.1 - 43.0).abs() < 1e-9);

        let txt = render_forecast_plot(&view, 10, 5);
        let rows: Vec<Vec<char>> = txt.lines().skip(1).take(5).map(|l| l.chars().collect()).collect();

        assert_eq!(rows[4][0], 'o');
        assert_eq!(rows[4][1], '-');
        assert_eq!(rows[3][3], 'o');
        assert_eq!(rows[1][6], 'o');
        assert_eq!(rows[0][9], '*');
        assert_eq!(rows[1][9], ':');
        assert!(txt.starts_with("Plot: 2024-01..2024-04"));
        assert!(txt.trim_end().ends_with("2024-04"));
    }

    #[test]
    fn history_only_plot_without_forecast() {
        let series = TimeSeries::from_values(month(2024, 1), vec![5.0, 5.0]).unwrap();
        let mut session = ViewSession::default();
        let view = ForecastView::build(&series, None, &mut session);
        let txt = render_forecast_plot(&view, 12, 6);
        let grid: String = txt.lines().skip(1).take(6).collect();
        assert!(!grid.contains('*'));
        assert_eq!(grid.matches('o').count(), 2);
    }
}
