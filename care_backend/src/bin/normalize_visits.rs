//! Batch visit normalizer
//!
//! Rewrites scheduler data files in place with canonical visit attributes:
//! migrated status flags, extracted skills, inferred recurrence and category.
//!
//! # Usage
//!
//! ```bash
//! # Normalize the configured data files
//! cargo run --bin normalize-visits
//!
//! # Normalize specific files, reporting only
//! cargo run --bin normalize-visits -- --dry-run public/data/homecare.json
//! ```
//!
//! # Environment Variables
//!
//! - `PLANNER_CONFIG`: Path to a planner.toml (default: ./planner.toml if present)
//! - `RUST_LOG`: Log filter, e.g. `care_planner=debug` (default: info)

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use care_planner::config::PlannerConfig;
use care_planner::io::batch::BatchNormalizer;
use care_planner::preprocessing::pipeline::{NormalizeOptions, NormalizePipeline};

#[derive(Parser, Debug)]
#[command(name = "normalize-visits", version, about = "Normalize visit attributes in scheduler data files", long_about = None)]
struct Cli {
    /// Data files to normalize. Defaults to the files listed in the config.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Planner configuration file
    #[arg(long, short = 'c', env = "PLANNER_CONFIG")]
    config: Option<PathBuf>,

    /// Directory the configured file names are resolved against
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Round-robin the configured service areas onto every row
    #[arg(long)]
    assign_service_areas: bool,

    /// Do not write files
    #[arg(long)]
    dry_run: bool,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => PlannerConfig::from_file(path)?,
        None => PlannerConfig::from_default_location()?,
    };
    if let Some(dir) = cli.data_dir {
        config.batch.data_dir = dir;
    }

    let options = NormalizeOptions {
        assign_service_areas: cli.assign_service_areas || config.batch.assign_service_areas,
        ..NormalizeOptions::default()
    };
    let pipeline = NormalizePipeline::with_options(&config, options)?;
    let normalizer = BatchNormalizer::with_pipeline(pipeline).dry_run(cli.dry_run);

    let files = if cli.files.is_empty() {
        config.batch.file_paths()
    } else {
        cli.files
    };

    info!("Normalizing {} data files", files.len());
    let report = normalizer.run(&files)?;

    for file in &report.files {
        info!("{}: {}", file.path.display(), file.outcome);
    }

    if report.failed() > 0 {
        warn!("{} files failed; see the log above", report.failed());
    }
    Ok(())
}

/// Per-target filter from `RUST_LOG`-style directives, falling back to info.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> ExitCode {
    FmtSubscriber::builder()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_target(true)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
