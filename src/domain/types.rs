//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the load / fit / render stages
//! - printed as JSON by `metals forecast --format json`

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::DataLoadError;

/// Date-indexed table of metal prices.
///
/// Invariants (established by `PriceTable::from_rows`):
/// - `dates` is strictly increasing (sorted, no duplicates)
/// - every column has exactly `dates.len()` cells
/// - `metals.len() == columns.len()`
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    metals: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl PriceTable {
    /// Build a table from `(date, cells)` rows in any order.
    ///
    /// Rows are sorted by date. Short rows are padded with missing cells and
    /// extra cells are ignored. Fails on duplicate dates.
    pub fn from_rows(metals: Vec<String>, mut rows: Vec<(NaiveDate, Vec<Option<f64>>)>) -> Result<Self, DataLoadError> {
        rows.sort_by_key(|(date, _)| *date);
        if let Some(pair) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(DataLoadError::DuplicateDate(pair[0].0));
        }

        let mut columns = vec![Vec::with_capacity(rows.len()); metals.len()];
        let mut dates = Vec::with_capacity(rows.len());
        for (date, cells) in rows {
            dates.push(date);
            for (idx, column) in columns.iter_mut().enumerate() {
                column.push(cells.get(idx).copied().flatten());
            }
        }

        Ok(Self { dates, metals, columns })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Metal (column) names in file order.
    pub fn metals(&self) -> &[String] {
        &self.metals
    }

    pub fn column(&self, metal: &str) -> Option<&[Option<f64>]> {
        let idx = self.metals.iter().position(|m| m == metal)?;
        Some(&self.columns[idx])
    }

    /// Restrict one column to its non-missing observations.
    pub fn select(&self, metal: &str) -> Option<SelectedSeries> {
        let column = self.column(metal)?;
        let points = self
            .dates
            .iter()
            .zip(column)
            .filter_map(|(&date, value)| value.map(|price| PricePoint { date, price }))
            .collect();

        Some(SelectedSeries {
            metal: metal.to_string(),
            points,
        })
    }
}

/// A single dated price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// One metal's non-missing observations, in date order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedSeries {
    pub metal: String,
    pub points: Vec<PricePoint>,
}

impl SelectedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

/// Point forecast continuing a `SelectedSeries`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub points: Vec<PricePoint>,
}

impl ForecastResult {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Forecast horizon in days, always within `Horizon::MIN..=Horizon::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Horizon(u16);

impl Horizon {
    pub const MIN: u16 = 1;
    pub const MAX: u16 = 30;
    pub const DEFAULT: Horizon = Horizon(7);

    /// Clamp `days` into the supported range.
    pub fn clamped(days: u16) -> Self {
        Self(days.clamp(Self::MIN, Self::MAX))
    }

    pub fn days(self) -> usize {
        self.0 as usize
    }

    /// Move the slider by `delta` steps, staying in range.
    pub fn step(self, delta: i32) -> Self {
        let next = (self.0 as i32 + delta).clamp(Self::MIN as i32, Self::MAX as i32);
        Self(next as u16)
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for Horizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ARIMA `(p, d, q)` orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    /// Order used by the dashboard: five AR lags on first differences.
    pub const DASHBOARD: ArimaOrder = ArimaOrder { p: 5, d: 1, q: 0 };

    pub fn display_name(self) -> String {
        format!("ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// How the AR coefficients were estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Estimation {
    /// Conditional least squares on the lagged, differenced series.
    ConditionalLeastSquares,
    /// Yule-Walker equations (used when the series is too short for CLS).
    YuleWalker,
}

impl Estimation {
    pub fn display_name(self) -> &'static str {
        match self {
            Estimation::ConditionalLeastSquares => "CLS",
            Estimation::YuleWalker => "Yule-Walker",
        }
    }
}

/// Output format of `metals forecast`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn sample_table() -> PriceTable {
        PriceTable::from_rows(
            vec!["Gold".to_string(), "Silver".to_string()],
            vec![
                (d(3), vec![Some(2010.0), Some(22.9)]),
                (d(1), vec![Some(2000.0), Some(22.5)]),
                (d(4), vec![Some(2020.0), None]),
                (d(2), vec![None, Some(22.7)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn rows_are_sorted_by_date() {
        let table = sample_table();
        assert_eq!(table.dates(), &[d(1), d(2), d(3), d(4)]);
        assert_eq!(table.column("Gold").unwrap()[0], Some(2000.0));
        assert!(table.dates().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let err = PriceTable::from_rows(
            vec!["Gold".to_string()],
            vec![(d(2), vec![Some(1.0)]), (d(1), vec![Some(2.0)]), (d(2), vec![Some(3.0)])],
        )
        .unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateDate(date) if date == d(2)));
    }

    #[test]
    fn short_rows_are_padded_with_missing_cells() {
        let table = PriceTable::from_rows(
            vec!["Gold".to_string(), "Silver".to_string()],
            vec![(d(1), vec![Some(1.0)]), (d(2), vec![Some(2.0), Some(3.0), Some(4.0)])],
        )
        .unwrap();
        assert_eq!(table.column("Silver").unwrap(), &[None, Some(3.0)]);
    }

    #[test]
    fn select_drops_missing_values() {
        let table = sample_table();
        let gold = table.select("Gold").unwrap();
        assert_eq!(gold.len(), 3);
        assert_eq!(gold.points[1].date, d(3));
        assert_eq!(gold.last_date(), Some(d(4)));

        let silver = table.select("Silver").unwrap();
        assert_eq!(silver.last_date(), Some(d(3)));

        assert!(table.select("Platinum").is_none());
    }

    #[test]
    fn horizon_clamps_and_steps_within_bounds() {
        assert_eq!(Horizon::default().days(), 7);
        assert_eq!(Horizon::clamped(0).days(), 1);
        assert_eq!(Horizon::clamped(99).days(), 30);
        assert_eq!(Horizon::clamped(30).step(1).days(), 30);
        assert_eq!(Horizon::clamped(1).step(-1).days(), 1);
        assert_eq!(Horizon::DEFAULT.step(3).days(), 10);
    }
}
