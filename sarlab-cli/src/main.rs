//! SarLab CLI — compute Parabolic SAR over price bars.
//!
//! Commands:
//! - `compute`: load bars from CSV (or generate synthetic bars), run the
//!   engine, apply the warm-up policy and write CSV or JSON
//! - `check-config`: parse and validate a TOML config file

mod bar_io;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bar_io::OutputFormat;
use sarlab_core::data::{sort_bars, synthetic_bars, validate_series};
use sarlab_core::{Bar, ParabolicSar, SarConfig, WarmupPolicy};

#[derive(Parser)]
#[command(name = "sarlab", about = "SarLab CLI — Parabolic SAR over price bars")]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute Parabolic SAR for one bar series.
    Compute {
        /// CSV file with timestamp, high and low columns.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Generate this many synthetic bars instead of reading a file.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed label for synthetic bars.
        #[arg(long, default_value = "SYNTH")]
        label: String,

        /// First date for synthetic bars (YYYY-MM-DD).
        #[arg(long, default_value = "2020-01-02")]
        start: String,

        /// TOML config with [parameters] and warmup policy.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Acceleration step. Without --initial, the initial AF follows it.
        #[arg(long)]
        step: Option<Decimal>,

        /// Maximum acceleration factor.
        #[arg(long)]
        max: Option<Decimal>,

        /// Initial acceleration factor.
        #[arg(long)]
        initial: Option<Decimal>,

        /// Sort bars by timestamp before computing. Without this, unsorted
        /// or duplicated timestamps are an error.
        #[arg(long, default_value_t = false)]
        sort: bool,

        /// Warm-up handling: keep, trim or condense.
        #[arg(long)]
        warmup: Option<WarmupPolicy>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Output file. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Parse and validate a config file, then print the effective settings.
    CheckConfig {
        /// Path to the TOML config.
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compute {
            input,
            synthetic,
            label,
            start,
            config,
            step,
            max,
            initial,
            sort,
            warmup,
            format,
            output,
        } => {
            let source = match (input, synthetic) {
                (Some(_), Some(_)) => bail!("--input and --synthetic are mutually exclusive"),
                (None, None) => bail!("one of --input or --synthetic is required"),
                (Some(path), None) => BarSource::Csv(path),
                (None, Some(count)) => BarSource::Synthetic {
                    label,
                    start: NaiveDate::parse_from_str(&start, "%Y-%m-%d")
                        .with_context(|| format!("invalid --start '{start}'"))?,
                    count,
                },
            };
            let overrides = Overrides {
                step,
                max,
                initial,
                warmup,
            };
            run_compute(source, config, overrides, sort, format, output)
        }
        Commands::CheckConfig { path } => run_check_config(&path),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "sarlab=debug,sarlab_core=debug"
    } else {
        "sarlab=info,sarlab_core=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

enum BarSource {
    Csv(PathBuf),
    Synthetic {
        label: String,
        start: NaiveDate,
        count: usize,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
struct Overrides {
    step: Option<Decimal>,
    max: Option<Decimal>,
    initial: Option<Decimal>,
    warmup: Option<WarmupPolicy>,
}

/// Merge config file (or defaults) with command-line overrides.
///
/// Parameters are validated later by `ParabolicSar::new`, so an invalid
/// combination from flags is reported the same way as one from a file.
fn resolve_config(base: SarConfig, overrides: &Overrides) -> SarConfig {
    let mut config = base;
    if let Some(step) = overrides.step {
        config.parameters.acceleration_step = step;
        config.parameters.initial_step = step;
    }
    if let Some(max) = overrides.max {
        config.parameters.max_acceleration_factor = max;
    }
    if let Some(initial) = overrides.initial {
        config.parameters.initial_step = initial;
    }
    if let Some(warmup) = overrides.warmup {
        config.warmup = warmup;
    }
    config
}

fn load_bars(source: &BarSource, sort: bool) -> Result<Vec<Bar>> {
    let mut bars = match source {
        BarSource::Csv(path) => bar_io::read_bars_file(path)?,
        BarSource::Synthetic {
            label,
            start,
            count,
        } => synthetic_bars(label, *start, *count),
    };

    if sort {
        sort_bars(&mut bars);
    }
    validate_series(&bars).context("bars must be strictly ascending by timestamp (try --sort)")?;
    Ok(bars)
}

fn run_compute(
    source: BarSource,
    config_path: Option<PathBuf>,
    overrides: Overrides,
    sort: bool,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let base = match &config_path {
        Some(path) => SarConfig::from_file(path)?,
        None => SarConfig::default(),
    };
    let config = resolve_config(base, &overrides);
    let psar = ParabolicSar::new(config.parameters).context("invalid SAR parameters")?;

    let bars = load_bars(&source, sort)?;
    info!(bars = bars.len(), indicator = psar.name(), "computing");

    let results = psar.compute(&bars)?;
    let results = config.warmup.apply(results);
    info!(rows = results.len(), warmup = ?config.warmup, "writing results");

    match output {
        Some(path) => {
            let file = std::fs::File::create(&path)
                .with_context(|| format!("create output '{}'", path.display()))?;
            bar_io::write_results(&results, format, std::io::BufWriter::new(file))?;
            info!(path = %path.display(), "results saved");
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            bar_io::write_results(&results, format, &mut lock)?;
            lock.flush()?;
        }
    }

    Ok(())
}

fn run_check_config(path: &std::path::Path) -> Result<()> {
    let config = SarConfig::from_file(path)?;
    println!("Config OK: {}", path.display());
    println!("{}", config.to_toml()?);
    Ok(())
}
