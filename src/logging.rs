//! Tracing subscriber setup.
//!
//! Filtering follows `RUST_LOG` and defaults to `info`. The TUI owns the
//! terminal, so it only logs when a file is given.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
    Off,
}

impl<'a> LogTarget<'a> {
    /// A log file wins; otherwise fall back to stderr when it is safe to use.
    pub fn resolve(log_file: Option<&'a Path>, stderr_allowed: bool) -> Self {
        match log_file {
            Some(path) => Self::File(path),
            None if stderr_allowed => Self::Stderr,
            None => Self::Off,
        }
    }
}

pub fn init(target: LogTarget<'_>) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AppError::new(4, format!("Failed to open log file {}: {e}", path.display())))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };

    result.map_err(|e| AppError::new(4, format!("Failed to initialize logging: {e}")))
}
