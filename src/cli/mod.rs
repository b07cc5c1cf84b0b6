//! Command-line parsing for the call-volume forecaster.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! loading, fitting and presentation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::Month;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "callcast", version, about = "Contact-centre call volume forecasts and P&L summaries")]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Forecast the next 7 months from the latest snapshot.
    Forecast(ForecastArgs),
    /// Summarize a monthly P&L export.
    Pnl(PnlArgs),
    /// Summarize a daily call export.
    Calls(CallsArgs),
    /// Write a synthetic snapshot for demos.
    Generate(GenerateArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    /// Directory holding `<name>_<YYYY-MM>.csv` snapshots.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// First month of the history window (clamped to the last 36 months).
    #[arg(long, value_name = "YYYY-MM")]
    pub from: Option<Month>,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long)]
    pub width: Option<usize>,

    /// Plot height (rows).
    #[arg(long)]
    pub height: Option<usize>,

    /// Export history + forecast to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export model + forecast to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct PnlArgs {
    /// Monthly P&L CSV export.
    #[arg(long, value_name = "CSV")]
    pub file: PathBuf,

    /// Year to report (defaults to the most recent one in the file).
    #[arg(long)]
    pub year: Option<i32>,

    /// Services to detail (repeatable).
    #[arg(long = "service", value_name = "NAME")]
    pub services: Vec<String>,

    /// Also print the per-service month-over-month table.
    #[arg(long)]
    pub analysis: bool,
}

#[derive(Debug, Args, Clone)]
pub struct CallsArgs {
    /// Daily call CSV export.
    #[arg(long, value_name = "CSV")]
    pub file: PathBuf,

    /// Teams to break down (repeatable).
    #[arg(long = "team", value_name = "NAME", conflicts_with = "malls")]
    pub teams: Vec<String>,

    /// Shopping malls to break down (repeatable).
    #[arg(long = "mall", value_name = "NAME")]
    pub malls: Vec<String>,

    /// Trailing window for the daily table.
    #[arg(long, default_value_t = 10)]
    pub days: i64,

    /// Forecast the monthly totals of this export (partial first/last months are left out).
    #[arg(long)]
    pub forecast: bool,
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Output directory.
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Number of months to generate.
    #[arg(long, default_value_t = 48)]
    pub months: usize,

    /// Last month (snapshot tag). Defaults to last month.
    #[arg(long, value_name = "YYYY-MM")]
    pub end: Option<Month>,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// File name prefix.
    #[arg(long, default_value = "calls")]
    pub prefix: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_forecast_flags() {
        let cli = Cli::parse_from([
            "callcast", "-v", "forecast", "--data-dir", "snap", "--from", "2023-06", "--no-plot",
        ]);
        assert!(cli.verbose);
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.data_dir, Some(PathBuf::from("snap")));
        assert_eq!(args.from, Month::new(2023, 6));
        assert!(args.no_plot);
    }

    #[test]
    fn repeatable_selections() {
        let cli = Cli::parse_from([
            "callcast", "pnl", "--file", "p.csv", "--service", "A", "--service", "B",
        ]);
        let Command::Pnl(args) = cli.command else {
            panic!("expected pnl");
        };
        assert_eq!(args.services, vec!["A", "B"]);
    }

    #[test]
    fn bad_month_is_rejected() {
        let res = Cli::try_parse_from(["callcast", "forecast", "--from", "June"]);
        assert!(res.is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
