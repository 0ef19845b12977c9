//! lcfold command-line interface.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use lcfold::{
    load_config_with_refine, run_batch, BatchConfig, Pipeline, PipelineConfig, RefineMode,
};

#[derive(Parser)]
#[command(name = "lcfold")]
#[command(about = "Find periods of lightcurves and write binned, phase-folded copies", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory of lightcurve text files
    #[arg(value_name = "INPUT_DIR")]
    input: PathBuf,

    /// Directory for the folded lightcurves
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,

    /// Period refinement objective
    #[arg(short, long, value_enum)]
    refine: RefineArg,

    /// Number of phase bins (overrides the config file)
    #[arg(short, long)]
    bins: Option<usize>,

    /// JSON pipeline configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Process files concurrently
    #[arg(long)]
    parallel: bool,

    /// Write a JSON report of processed and failed files
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum RefineArg {
    /// Maximum Lomb-Scargle power
    Power,
    /// Minimum phase-folded dispersion
    Dispersion,
    /// Minimum summed scatter of 10-point chunks
    BinnedStd,
}

impl From<RefineArg> for RefineMode {
    fn from(arg: RefineArg) -> Self {
        match arg {
            RefineArg::Power => RefineMode::PowerMax,
            RefineArg::Dispersion => RefineMode::DispersionMin,
            RefineArg::BinnedStd => RefineMode::BinnedStdMin,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let refine = RefineMode::from(cli.refine);
    let mut config = match &cli.config {
        Some(path) => load_config_with_refine(path, refine)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => PipelineConfig::new(refine),
    };
    if let Some(bins) = cli.bins {
        config.bins = bins;
    }

    let pipeline = Pipeline::new(config).context("Invalid pipeline configuration")?;
    let batch = BatchConfig {
        parallel: cli.parallel,
        ..BatchConfig::default()
    };

    let report = run_batch(&pipeline, &cli.input, &cli.output, &batch)
        .with_context(|| format!("Failed to process {}", cli.input.display()))?;

    for success in &report.succeeded {
        println!(
            "{}\t{:.6}\t{}",
            success.summary.id,
            success.summary.period,
            success.output.display()
        );
    }
    for failure in &report.failed {
        eprintln!("failed: {}: {}", failure.path.display(), failure.error);
    }

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
    }

    if report.total() > 0 && report.succeeded.is_empty() {
        bail!("none of the {} lightcurves could be folded", report.total());
    }
    Ok(())
}
