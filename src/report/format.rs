//! Plain-text and JSON rendering for `metals forecast`.

use serde::Serialize;

use crate::app::pipeline::{ForecastRun, RunOutput};
use crate::domain::Estimation;
use crate::error::AppError;
use crate::report::{ForecastRow, RecentRow, display_price, forecast_rows};

/// Format the run summary: dataset coverage and the fitted model.
pub fn format_run_summary(run: &RunOutput, fit: &ForecastRun) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== metals - {} forecast ===\n", run.series.metal));
    if let (Some(first), Some(last)) = (run.series.points.first(), run.series.points.last()) {
        out.push_str(&format!(
            "History: n={} | {} .. {}\n",
            run.series.len(),
            first.date,
            last.date
        ));
    }
    out.push_str(&format!("Horizon: {} day(s)\n", run.horizon));
    out.push_str(&format!(
        "Model: {} via {} | sigma={:.4}\n",
        fit.model.order.display_name(),
        fit.model.estimation.display_name(),
        fit.model.sigma()
    ));
    out.push_str(&format!("- ar: {}\n", fmt_vec(&fit.model.ar)));
    if fit.model.estimation == Estimation::YuleWalker {
        out.push_str("  (short series: Yule-Walker estimates)\n");
    }

    out
}

/// Format the forecast table (date, rounded price).
pub fn format_forecast_table(rows: &[ForecastRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<12} {:>14}\n", "date", "forecast"));
    out.push_str(&format!("{:-<12} {:-<14}\n", "", ""));
    for row in rows {
        out.push_str(&format!("{:<12} {:>14.2}\n", row.date.to_string(), row.price));
    }
    out
}

/// Format the recent-history table for one metal.
///
/// Prices are printed as stored; missing cells show as `-`.
pub fn format_recent_table(metal: &str, rows: &[RecentRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<12} {:>14}\n", "date", truncate(metal, 14)));
    out.push_str(&format!("{:-<12} {:-<14}\n", "", ""));
    for row in rows {
        out.push_str(&format!("{:<12} {:>14}\n", row.date.to_string(), display_price(row.price)));
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metal: &'a str,
    horizon: usize,
    model: &'a crate::models::FittedArima,
    forecast: Vec<ForecastRow>,
    recent: &'a [RecentRow],
}

/// Render a successful run as pretty JSON.
pub fn format_json(run: &RunOutput, fit: &ForecastRun) -> Result<String, AppError> {
    let report = JsonReport {
        metal: &run.series.metal,
        horizon: run.horizon.days(),
        model: &fit.model,
        forecast: forecast_rows(&fit.result),
        recent: &run.recent,
    };
    serde_json::to_string_pretty(&report)
        .map_err(|e| AppError::new(4, format!("Failed to encode JSON report: {e}")))
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn forecast_table_has_header_and_two_decimals() {
        let rows = vec![
            ForecastRow {
                date: NaiveDate::from_ymd_opt(2024, 1, 21).unwrap(),
                price: 2061.5,
            },
            ForecastRow {
                date: NaiveDate::from_ymd_opt(2024, 1, 22).unwrap(),
                price: 2063.07,
            },
        ];
        let txt = format_forecast_table(&rows);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "2024-01-21          2061.50");
        assert_eq!(lines[3], "2024-01-22          2063.07");
    }

    #[test]
    fn recent_table_truncates_long_metal_names() {
        let rows = [RecentRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            price: Some(950.5),
        }];
        let txt = format_recent_table("Platinum (USD/oz, London PM)", &rows);
        let header = txt.lines().next().unwrap();
        assert!(header.ends_with("Platinum (USD."));
        assert!(txt.lines().nth(2).unwrap().ends_with(" 950.5"));
    }

    #[test]
    fn recent_table_shows_gaps_and_unrounded_prices() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let rows = [
            RecentRow { date: day(17), price: Some(23.4567) },
            RecentRow { date: day(18), price: None },
        ];
        let txt = format_recent_table("Silver", &rows);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[2], "2024-01-17          23.4567");
        assert_eq!(lines[3], "2024-01-18                -");
    }

    #[test]
    fn json_recent_rows_serialize_gaps_as_null() {
        let row = RecentRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 18).unwrap(),
            price: None,
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"date":"2024-01-18","price":null}"#);
    }
}
