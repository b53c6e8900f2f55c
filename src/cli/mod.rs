//! Command-line parsing for the metal price dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/rendering code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Horizon, OutputFormat};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "metals", version, about = "Precious metal price dashboard with ARIMA forecasts")]
pub struct Cli {
    /// Write logs to this file (the TUI logs nothing otherwise).
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard (default).
    Tui(DashboardArgs),
    /// Fit and print a forecast report without the TUI.
    Forecast(ForecastArgs),
}

/// Data source and initial selection, shared by all subcommands.
#[derive(Debug, Args, Clone)]
pub struct DashboardArgs {
    /// Price CSV with a `Date` column and one column per metal.
    ///
    /// Falls back to `metals.csv` in the working directory, then to an
    /// interactive picker.
    #[arg(short = 'f', long, env = "METALS_CSV", value_name = "CSV")]
    pub file: Option<PathBuf>,

    /// Metal (column) to analyze; defaults to the first column.
    #[arg(short = 'm', long)]
    pub metal: Option<String>,

    /// Days to forecast.
    #[arg(
        short = 'n',
        long,
        default_value_t = 7,
        value_parser = clap::value_parser!(u16).range(Horizon::MIN as i64..=Horizon::MAX as i64)
    )]
    pub horizon: u16,
}

impl DashboardArgs {
    pub fn horizon(&self) -> Horizon {
        Horizon::clamped(self.horizon)
    }
}

/// Options for the printed report.
#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub dashboard: DashboardArgs,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}
