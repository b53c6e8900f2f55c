//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves and loads the price CSV
//! - runs the ARIMA forecast
//! - prints reports/plots or hands over to the TUI

use clap::Parser;

use crate::cli::{Command, DashboardArgs, ForecastArgs};
use crate::domain::{OutputFormat, PriceTable};
use crate::error::AppError;
use crate::logging::LogTarget;

pub mod pipeline;

/// Entry point for the `metals` binary.
pub fn run() -> Result<(), AppError> {
    // A `.env` may provide METALS_CSV; it must be loaded before clap reads env.
    dotenvy::dotenv().ok();

    // We want `metals` and `metals -f prices.csv` to behave like `metals tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let stderr_allowed = matches!(cli.command, Command::Forecast(_));
    crate::logging::init(LogTarget::resolve(cli.log_file.as_deref(), stderr_allowed))?;

    match cli.command {
        Command::Forecast(args) => handle_forecast(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn handle_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let (table, metal) = load_selection(&args.dashboard)?;
    let run = pipeline::run_forecast(&table, &metal, args.dashboard.horizon())?;

    let fit = match &run.forecast {
        Ok(fit) => fit,
        Err(err) => {
            // History is still worth showing when the model cannot be fit.
            if args.format == OutputFormat::Text && !args.no_plot {
                println!(
                    "{}",
                    crate::plot::render_ascii_plot(&run.series.points, &[], args.width, args.height)
                );
            }
            return Err(err.clone().into());
        }
    };

    if args.format == OutputFormat::Json {
        println!("{}", crate::report::format_json(&run, fit)?);
        return Ok(());
    }

    println!("{}", crate::report::format_run_summary(&run, fit));

    if !args.no_plot {
        let plot = crate::plot::render_ascii_plot(
            &run.series.points,
            &fit.result.points,
            args.width,
            args.height,
        );
        println!("{plot}");
    }

    println!(
        "{}",
        crate::report::format_forecast_table(&crate::report::forecast_rows(&fit.result))
    );
    println!(
        "{}",
        crate::report::format_recent_table(&run.series.metal, &run.recent)
    );

    Ok(())
}

fn handle_tui(args: DashboardArgs) -> Result<(), AppError> {
    let path = crate::cli::picker::resolve_data_path(args.file.as_deref())?;
    let table = crate::io::load_price_table(&path)?;
    crate::tui::run(table, &path, args.metal.as_deref(), args.horizon())
}

/// Resolve the CSV, load it, and pick the metal to analyze.
pub fn load_selection(args: &DashboardArgs) -> Result<(PriceTable, String), AppError> {
    let path = crate::cli::picker::resolve_data_path(args.file.as_deref())?;
    let table = crate::io::load_price_table(&path)?;
    let metal = default_metal(&table, args.metal.as_deref())?;
    Ok((table, metal))
}

/// The requested metal, or the first metal column when none was given.
pub fn default_metal(table: &PriceTable, requested: Option<&str>) -> Result<String, AppError> {
    if let Some(name) = requested {
        return Ok(name.to_string());
    }
    table
        .metals()
        .first()
        .cloned()
        .ok_or_else(|| AppError::new(2, "The price table has no metal columns."))
}

/// Rewrite argv so `metals` defaults to `metals tui`.
///
/// Rules:
/// - `metals`                       -> `metals tui`
/// - `metals -f prices.csv ...`     -> `metals tui -f prices.csv ...`
/// - `metals --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "forecast");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
