//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and merges configuration
//! - loads snapshots / exports
//! - runs the forecaster
//! - prints reports/plots
//! - writes optional exports

use chrono::Local;
use clap::Parser;

use crate::calls::{GroupBy, load_daily_calls};
use crate::cli::{CallsArgs, Cli, Command, ForecastArgs, GenerateArgs, PnlArgs};
use crate::config::Settings;
use crate::data::{SampleSpec, generate_series, write_snapshot};
use crate::domain::Month;
use crate::error::{AppError, Result};
use crate::io::{ForecastFile, SnapshotCache, write_forecast_csv, write_forecast_json};
use crate::pnl::{Scope, analysis_table, compute_kpis, load_profit_sheet, quarterly};
use crate::view::{ForecastView, ViewSession};

pub mod pipeline;

/// Entry point for the `callcast` binary.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    crate::logging::init(cli.verbose);
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Forecast(args) => handle_forecast(args, &settings),
        Command::Pnl(args) => handle_pnl(args),
        Command::Calls(args) => handle_calls(args, &settings),
        Command::Generate(args) => handle_generate(args),
    }
}

fn handle_forecast(args: ForecastArgs, settings: &Settings) -> Result<()> {
    let data_dir = args.data_dir.clone().unwrap_or_else(|| settings.data_dir.clone());
    let mut cache = SnapshotCache::new();
    let run = pipeline::run_forecast(&data_dir, &mut cache)?;

    println!(
        "Snapshot: {} (tag {})\n",
        run.snapshot.path.display(),
        run.snapshot.tag
    );

    let mut session = ViewSession {
        start: args.from.or(settings.view_start),
    };
    let view = ForecastView::build(&run.snapshot.series, run.forecast(), &mut session);
    print_view(&view, &args, settings);

    // History is already on screen; a model failure still sets the exit code.
    let output = run.outcome?;
    println!("{}", crate::report::format_model_summary(&output.model));
    if let Some(path) = &args.export {
        write_forecast_csv(path, &run.snapshot.series, &output.forecast)?;
    }
    if let Some(path) = &args.export_json {
        let file = ForecastFile::new(&run.snapshot.path, &output.model, &output.forecast);
        write_forecast_json(path, &file)?;
    }
    Ok(())
}

fn print_view(view: &ForecastView, args: &ForecastArgs, settings: &Settings) {
    println!("{}", crate::report::format_forecast(view));
    if settings.plot && !args.no_plot {
        let plot = crate::plot::render_forecast_plot(
            view,
            args.width.unwrap_or(settings.plot_width),
            args.height.unwrap_or(settings.plot_height),
        );
        println!("{plot}");
    }
}

fn handle_pnl(args: PnlArgs) -> Result<()> {
    let sheet = load_profit_sheet(&args.file)?;
    let year = match args.year {
        Some(y) => y,
        None => *sheet
            .years()
            .first()
            .ok_or_else(|| AppError::schema(&args.file, "sheet has no months"))?,
    };

    let in_year = sheet.filter_years(&[year]);
    println!("{}", crate::report::format_month_rows("Total", &in_year.total()));
    println!("{}", crate::report::format_kpis("total", &compute_kpis(&sheet, &Scope::Total, year)?));
    println!("{}", crate::report::format_quarterly(&quarterly(&sheet, &Scope::Total, year)?));

    for service in &args.services {
        let scope = Scope::Service(service.clone());
        println!(
            "{}",
            crate::report::format_month_rows(service, &in_year.service_table(service)?)
        );
        println!("{}", crate::report::format_kpis(service, &compute_kpis(&sheet, &scope, year)?));
        println!("{}", crate::report::format_quarterly(&quarterly(&sheet, &scope, year)?));
    }

    if args.analysis {
        println!("{}", crate::report::format_analysis(&analysis_table(&sheet, year)?));
    }
    Ok(())
}

fn handle_calls(args: CallsArgs, settings: &Settings) -> Result<()> {
    let calls = load_daily_calls(&args.file)?;

    let (by, selection) = if !args.malls.is_empty() {
        (Some(GroupBy::Mall), args.malls.as_slice())
    } else if !args.teams.is_empty() {
        (Some(GroupBy::Team), args.teams.as_slice())
    } else {
        (None, args.teams.as_slice())
    };

    let by_group = by.map(|b| calls.monthly_by(b, selection)).unwrap_or_default();
    let window = calls.trailing_window(by.unwrap_or(GroupBy::Team), selection, args.days);
    println!(
        "{}",
        crate::report::format_call_summary(&calls.monthly_totals(), &by_group, &window)
    );

    if args.forecast {
        let series = calls.monthly_series()?;
        let outcome = pipeline::forecast_series(&series);
        let mut session = ViewSession {
            start: settings.view_start,
        };
        let view = ForecastView::build(
            &series,
            outcome.as_ref().ok().map(|o| &o.forecast),
            &mut session,
        );
        println!("{}", crate::report::format_forecast(&view));
        outcome?;
    }
    Ok(())
}

fn handle_generate(args: GenerateArgs) -> Result<()> {
    let end = args
        .end
        .unwrap_or_else(|| Month::from_date(Local::now().date_naive()).pred());
    let series = generate_series(&SampleSpec::new(args.months, end, args.seed))?;
    let path = write_snapshot(&args.out, &args.prefix, &series)?;
    println!("Wrote {} months to {}", series.len(), path.display());
    Ok(())
}
