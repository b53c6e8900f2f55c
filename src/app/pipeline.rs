//! Shared "select -> fit -> predict" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! price table -> selected series -> ARIMA fit -> dated forecast
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use chrono::{Days, NaiveDate};
use tracing::{info, warn};

use crate::domain::{ArimaOrder, ForecastResult, Horizon, PricePoint, PriceTable, SelectedSeries};
use crate::error::{AppError, ForecastError};
use crate::models::{self, FittedArima};
use crate::report::{RecentRow, recent_history};

/// All computed outputs of one interaction.
///
/// The series is always present; the forecast may have failed, in which case
/// only the history can be rendered. `recent` holds the last table rows of the
/// metal, gaps included.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub series: SelectedSeries,
    pub recent: Vec<RecentRow>,
    pub horizon: Horizon,
    pub forecast: Result<ForecastRun, ForecastError>,
}

/// A successful fit together with its dated forecast.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub model: FittedArima,
    pub result: ForecastResult,
}

/// Select `metal` from the table and forecast it `horizon` days ahead.
///
/// Fails only if the metal is not a column of the table; forecasting errors
/// are carried inside the output.
pub fn run_forecast(table: &PriceTable, metal: &str, horizon: Horizon) -> Result<RunOutput, AppError> {
    let series = table.select(metal).ok_or_else(|| {
        AppError::new(
            2,
            format!("Unknown metal '{metal}'. Available: {}", table.metals().join(", ")),
        )
    })?;

    let forecast = forecast_series(&series, horizon);
    match &forecast {
        Ok(run) => info!(
            metal,
            horizon = horizon.days(),
            n_obs = series.len(),
            method = run.model.estimation.display_name(),
            "forecast computed"
        ),
        Err(err) => warn!(metal, horizon = horizon.days(), %err, "forecast failed"),
    }

    Ok(RunOutput {
        series,
        recent: recent_history(table, metal),
        horizon,
        forecast,
    })
}

/// Fit the dashboard model on `series` and forecast `horizon` days ahead.
pub fn forecast_series(series: &SelectedSeries, horizon: Horizon) -> Result<ForecastRun, ForecastError> {
    let model = models::fit(&series.values(), ArimaOrder::DASHBOARD)?;
    let values = model.forecast(horizon.days())?;

    let last_date = series.last_date().ok_or(ForecastError::InsufficientData {
        required: models::MIN_OBSERVATIONS,
        actual: 0,
    })?;
    let dates = forecast_dates(last_date, horizon.days())
        .ok_or_else(|| ForecastError::Fit("forecast dates overflow the calendar".to_string()))?;

    let points = dates
        .into_iter()
        .zip(values)
        .map(|(date, price)| PricePoint { date, price })
        .collect();

    Ok(ForecastRun {
        model,
        result: ForecastResult { points },
    })
}

/// Consecutive calendar days after `last`: `last + 1 .. last + steps`.
pub fn forecast_dates(last: NaiveDate, steps: usize) -> Option<Vec<NaiveDate>> {
    (1..=steps as u64)
        .map(|i| last.checked_add_days(Days::new(i)))
        .collect()
}
