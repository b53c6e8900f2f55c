//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - history: `-` line
//! - forecast: `*` line, continuing from the last historical point

use crate::domain::PricePoint;

/// Render history and (optionally empty) forecast on one date axis.
pub fn render_ascii_plot(history: &[PricePoint], forecast: &[PricePoint], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let all = || history.iter().chain(forecast.iter());
    let Some((x_min, x_max)) = x_range(all()) else {
        return "Plot: (no data)\n".to_string();
    };
    let (y_min, y_max) = y_range(all()).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    let to_xy = |p: &PricePoint| (day_number(p), p.price);
    let hist: Vec<(f64, f64)> = history.iter().map(to_xy).collect();
    draw_series(&mut grid, &hist, (x_min, x_max), (y_min, y_max), '-');

    // Forecast starts at the last history point so the two lines join.
    let mut fc: Vec<(f64, f64)> = hist.last().copied().into_iter().collect();
    fc.extend(forecast.iter().map(to_xy));
    draw_series(&mut grid, &fc, (x_min, x_max), (y_min, y_max), '*');

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} .. {} | price=[{y_min:.2}, {y_max:.2}] | - history, * forecast\n",
        date_label(x_min),
        date_label(x_max)
    ));

    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    out
}

fn day_number(p: &PricePoint) -> f64 {
    use chrono::Datelike;
    p.date.num_days_from_ce() as f64
}

fn date_label(day: f64) -> String {
    chrono::NaiveDate::from_num_days_from_ce_opt(day.round() as i32)
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn x_range<'a>(points: impl Iterator<Item = &'a PricePoint>) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for p in points {
        let x = day_number(p);
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }
    if !(min_x.is_finite() && max_x.is_finite()) {
        return None;
    }
    if max_x <= min_x {
        // Single date: widen so the point lands mid-plot.
        return Some((min_x - 1.0, max_x + 1.0));
    }
    Some((min_x, max_x))
}

fn y_range<'a>(points: impl Iterator<Item = &'a PricePoint>) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in points {
        min_y = min_y.min(p.price);
        max_y = max_y.max(p.price);
    }
    if !(min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    if max_y <= min_y {
        return Some((min_y - 1.0, max_y + 1.0));
    }
    Some((min_y, max_y))
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_series(grid: &mut [Vec<char>], points: &[(f64, f64)], x: (f64, f64), y: (f64, f64), ch: char) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(px, py) in points {
        let col = map_x(px, x.0, x.1, width);
        let row = map_y(py, y.0, y.1, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, ch);
        } else if grid[row][col] == ' ' {
            grid[row][col] = ch;
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
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
    use chrono::NaiveDate;

    fn pt(day: u32, price: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            price,
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let history = [pt(1, 100.0), pt(10, 100.0)];
        let forecast = [pt(19, 110.0)];

        let txt = render_ascii_plot(&history, &forecast, 10, 5);
        let expected = concat!(
            "Plot: 2025-01-01 .. 2025-01-19 | price=[99.50, 110.50] | - history, * forecast\n",
            "         *\n",
            "        *\n",
            "       *\n",
            "      *\n",
            "------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_input_renders_placeholder() {
        assert_eq!(render_ascii_plot(&[], &[], 20, 5), "Plot: (no data)\n");
    }

    #[test]
    fn history_only_has_no_forecast_marks() {
        let history = [pt(1, 1.0), pt(2, 2.0), pt(3, 1.5)];
        let txt = render_ascii_plot(&history, &[], 12, 6);
        assert!(!txt.lines().skip(1).any(|l| l.contains('*')));
        assert_eq!(txt.lines().count(), 7);
    }
}
