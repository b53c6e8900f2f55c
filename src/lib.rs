//! `metal-forecast` library crate.
//!
//! The binary (`metals`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the CLI report and the TUI dashboard share one forecasting pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
