mod helpers;
mod report;

use std::{
    fs, io,
    path::{Path, PathBuf},
    process::exit,
};

use clap::Parser;
use derive_more::{Display, Error, From};
use log::LevelFilter;
use simplex_core::{solve_text, SolverConfig};

/// Solves a linear program with the tableau simplex method and reports every pivot.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Opts {
    /// File containing the problem description
    input: PathBuf,
    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Emit the outcome as JSON instead of the text derivation
    #[arg(long)]
    json: bool,
    /// Decimal places shown in the text report
    #[arg(long, default_value_t = 4)]
    precision: usize,
    #[arg(long)]
    max_iterations: Option<usize>,
    #[arg(long)]
    max_alternates: Option<usize>,
    #[arg(long)]
    tolerance: Option<f64>,
    /// JSON file with solver settings; the flags above take precedence
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = LevelFilter::Warn)]
    log_level: LevelFilter,
    /// Also append log records to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Display, Error, From)]
enum AppError {
    #[display(fmt = "{}: {}", path, source)]
    Io { path: String, source: io::Error },
    #[display(fmt = "{}", _0)]
    Json(serde_json::Error),
    #[display(fmt = "{}", _0)]
    Solve(simplex_core::Error),
    #[display(fmt = "cannot install the logger: {}", _0)]
    Logger(log::SetLoggerError),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> AppError + '_ {
    move |source| AppError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn main() {
    let opts = Opts::parse();

    if let Err(err) = run(&opts) {
        log::error!("{err}");
        eprintln!("error: {err}");
        exit(1);
    }
}

fn run(opts: &Opts) -> Result<(), AppError> {
    setup_logger(opts.log_level, opts.log_file.as_deref())?;

    let config = load_config(opts)?;
    log::info!("Solver config: {config:?}");

    let input = fs::read_to_string(&opts.input).map_err(io_error(&opts.input))?;
    let outcome = solve_text(&input, config)?;

    let report = if opts.json {
        report::json_report(&input, &config, &outcome)?
    } else {
        report::TextReport::new(&outcome, opts.precision).to_string()
    };
    match &opts.output {
        Some(path) => fs::write(path, report).map_err(io_error(path))?,
        None => print!("{report}"),
    }
    Ok(())
}

fn setup_logger(level: LevelFilter, log_file: Option<&Path>) -> Result<(), AppError> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr());
    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path).map_err(io_error(path))?);
    }
    dispatch.apply()?;
    Ok(())
}

/// Defaults, then the config file, then individual flags.
fn load_config(opts: &Opts) -> Result<SolverConfig, AppError> {
    let mut config = match &opts.config {
        Some(path) => {
            SolverConfig::from_json(&fs::read_to_string(path).map_err(io_error(path))?)?
        }
        None => SolverConfig::default(),
    };
    if let Some(max_iterations) = opts.max_iterations {
        config = config.with_max_iterations(max_iterations);
    }
    if let Some(max_alternates) = opts.max_alternates {
        config = config.with_max_alternates(max_alternates);
    }
    if let Some(tolerance) = opts.tolerance {
        config = config.with_tolerance(tolerance);
    }
    Ok(config)
}
