//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the loaded price table and the per-metal series derived from it
//! - forecast outputs (`ForecastResult`)
//! - user-facing settings (`Horizon`, `OutputFormat`) and model orders

pub mod types;

pub use types::*;
