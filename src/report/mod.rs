//! Reporting utilities: table rows and formatted terminal output.
//!
//! We keep row shaping and formatting in one place so:
//! - the modeling code stays clean and testable
//! - the CLI and the TUI show the same numbers

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{ForecastResult, PriceTable};

pub mod format;

pub use format::*;

/// Number of rows in the recent-history table.
pub const RECENT_ROWS: usize = 5;

/// A forecast table row with the price rounded for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastRow {
    pub date: NaiveDate,
    pub price: f64,
}

/// Forecast rows, prices rounded to two decimals.
pub fn forecast_rows(forecast: &ForecastResult) -> Vec<ForecastRow> {
    forecast
        .points
        .iter()
        .map(|p| ForecastRow {
            date: p.date,
            price: round2(p.price),
        })
        .collect()
}

/// One row of the recent-history table; `None` where the cell was missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecentRow {
    pub date: NaiveDate,
    pub price: Option<f64>,
}

/// The last `RECENT_ROWS` table rows of `metal`, missing cells included.
///
/// Empty if `metal` is not a column of the table.
pub fn recent_history(table: &PriceTable, metal: &str) -> Vec<RecentRow> {
    let Some(column) = table.column(metal) else {
        return Vec::new();
    };
    let start = table.len().saturating_sub(RECENT_ROWS);
    table.dates()[start..]
        .iter()
        .zip(&column[start..])
        .map(|(&date, &price)| RecentRow { date, price })
        .collect()
}

/// Stored prices are shown as parsed; missing cells as `-`.
pub fn display_price(price: Option<f64>) -> String {
    price.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
