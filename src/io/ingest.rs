//! CSV ingest and normalization.
//!
//! This module is responsible for turning a dated price CSV into a `PriceTable`:
//! one `Date` column used as the index, every other column a metal.
//!
//! Design goals:
//! - **Strict schema** for the date index (clear `DataLoadError`s)
//! - **Lenient cells**: blank / `NA` / non-numeric prices become missing values
//! - **Separation of concerns**: no modeling logic here

use std::fs::File;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::{debug, info};

use crate::domain::PriceTable;
use crate::error::DataLoadError;

/// Name of the index column (matched case-insensitively).
pub const DATE_COLUMN: &str = "date";

/// Load a price table from a CSV file, sorted ascending by date.
pub fn load_price_table(path: &Path) -> Result<PriceTable, DataLoadError> {
    if !path.exists() {
        return Err(DataLoadError::NotFound(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|source| DataLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let table = read_price_table(file)?;
    info!(
        path = %path.display(),
        rows = table.len(),
        metals = ?table.metals(),
        "loaded price table"
    );
    Ok(table)
}

/// Parse a price table from any CSV reader.
pub fn read_price_table<R: std::io::Read>(input: R) -> Result<PriceTable, DataLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(DataLoadError::Empty);
    }

    let date_idx = headers
        .iter()
        .position(|h| normalize_header_name(h).eq_ignore_ascii_case(DATE_COLUMN))
        .ok_or(DataLoadError::MissingDateColumn)?;

    let metal_indices: Vec<usize> = (0..headers.len()).filter(|&i| i != date_idx).collect();
    if metal_indices.is_empty() {
        return Err(DataLoadError::NoMetalColumns);
    }
    let metals = metal_indices
        .iter()
        .map(|&i| normalize_header_name(&headers[i]).to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header line, and lines are 1-based.
        let line = idx + 2;
        let record = result?;
        if is_blank(&record) {
            debug!(line, "skipping blank row");
            continue;
        }

        let raw_date = record.get(date_idx).unwrap_or("");
        let date = parse_date(raw_date).ok_or_else(|| DataLoadError::InvalidDate {
            line,
            value: raw_date.to_string(),
        })?;

        let cells = metal_indices
            .iter()
            .map(|&i| parse_price(record.get(i)))
            .collect();
        rows.push((date, cells));
    }

    if rows.is_empty() {
        return Err(DataLoadError::Empty);
    }

    PriceTable::from_rows(metals, rows)
}

fn normalize_header_name(name: &str) -> &str {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, the `Date` column goes missing.
    name.trim().trim_start_matches('\u{feff}')
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

/// Parse a calendar date, accepting a small set of common export formats.
///
/// Numeric dates with the year last are read month first (`01/02/2024` is
/// January 2nd); day first is only tried when that is not a valid date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    const DATE_FMTS: [&str; 6] = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d/%m/%Y",
        "%m-%d-%Y",
        "%d-%m-%Y",
    ];
    const DATETIME_FMTS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Parse a price cell; anything that is not a finite number is missing.
fn parse_price(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
