use std::path::PathBuf;

use chrono::NaiveDate;

/// Failure to turn the input file into a `PriceTable`.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("data file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column: `Date`")]
    MissingDateColumn,

    #[error("line {line}: invalid date '{value}'")]
    InvalidDate { line: usize, value: String },

    #[error("file contains no data rows")]
    Empty,

    #[error("file has a `Date` column but no price columns")]
    NoMetalColumns,

    #[error("duplicate date in input: {0}")]
    DuplicateDate(NaiveDate),
}

/// Failure to fit the model or produce a forecast.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForecastError {
    #[error("not enough data to forecast: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("unsupported model order ({p},{d},{q}): moving-average terms are not implemented")]
    UnsupportedOrder { p: usize, d: usize, q: usize },

    #[error("model fit failed: {0}")]
    Fit(String),

    #[error("model produced a non-finite forecast at step {step}")]
    NonFinite { step: usize },
}

/// Top-level error carrying a process exit code.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<DataLoadError> for AppError {
    fn from(err: DataLoadError) -> Self {
        AppError::new(2, format!("Error loading data: {err}"))
    }
}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        AppError::new(3, format!("Error while forecasting: {err}"))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_exit_codes() {
        let load: AppError = DataLoadError::Empty.into();
        assert_eq!(load.exit_code(), 2);
        assert!(load.to_string().contains("no data rows"));

        let fc: AppError = ForecastError::InsufficientData { required: 10, actual: 3 }.into();
        assert_eq!(fc.exit_code(), 3);
        assert!(fc.to_string().contains("at least 10"));
    }
}
