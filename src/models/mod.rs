//! Forecasting models.
//!
//! Only the moving-average-free ARIMA used by the dashboard is implemented.

pub mod arima;

pub use arima::*;
