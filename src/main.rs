use clap::{Parser, ValueEnum};
use seriescast::io::{ForecastCsvSink, JsonSink, MetricsCsvSink, ReportSink};
use seriescast::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "seriescast")]
#[command(about = "Forecast a monthly time-series column and label its history")]
#[command(version)]
struct Cli {
    /// CSV file with a `date` column
    #[arg(short, long)]
    input: PathBuf,
    /// Numeric column to forecast
    #[arg(short, long)]
    column: String,
    /// `all`, `sarima`, `prophet` or `holt_winters`
    #[arg(short, long, default_value = "all")]
    strategy: StrategySelector,
    /// Number of months to forecast
    #[arg(long, default_value_t = 12)]
    horizon: usize,
    /// Seed for anomaly detection and clustering
    #[arg(long, env = "SERIESCAST_SEED", default_value_t = 42)]
    seed: u64,
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,
    /// Write here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Scale a constant column with a unit range instead of rejecting it
    #[arg(long)]
    allow_constant: bool,
    /// Optimizer iteration cap
    #[arg(long, default_value_t = 1000)]
    max_iterations: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    MetricsCsv,
    ForecastCsv,
}

impl Format {
    fn sink(self) -> Box<dyn ReportSink> {
        match self {
            Format::Json => Box::new(JsonSink::pretty()),
            Format::MetricsCsv => Box::new(MetricsCsvSink),
            Format::ForecastCsv => Box::new(ForecastCsvSink),
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let policy = if cli.allow_constant {
        ConstantColumnPolicy::Passthrough
    } else {
        ConstantColumnPolicy::Reject
    };
    let config = PipelineConfig::default()
        .seed(cli.seed)
        .constant_column(policy)
        .max_iterations(cli.max_iterations);
    let request = ForecastRequest::new(cli.column, cli.horizon).strategy(cli.strategy);

    let report = Pipeline::new(config).run_path(&cli.input, &request)?;
    for skipped in &report.skipped {
        log::warn!("{} skipped: {}", skipped.strategy, skipped.reason);
    }

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    cli.format.sink().write(&report, &mut *out)?;
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_user_facing() => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
        Err(err) => {
            log::error!("internal error, please report: {err}");
            ExitCode::FAILURE
        }
    }
}
