#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line driver for the civic aggregation pipeline.
//!
//! Loads already-downloaded extracts (boundary `GeoJSON`, point feed JSON,
//! index CSV, survey CSVs), runs one of the two pipeline entry points, and
//! writes the result as JSON for a map/chart front end. Logging goes
//! through `pretty_env_logger`, controlled by `RUST_LOG`.

mod export;
mod pipeline;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "civic_atlas", about = "Civic dataset aggregation pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the embedded study definitions
    Studies,
    /// Build the per-area entity table and write it as `GeoJSON`
    Entities(EntitiesArgs),
    /// Build the latest snapshot and period matrix for one metric
    Periods(PeriodsArgs),
}

/// Which study configuration to use.
#[derive(Args)]
struct StudyArgs {
    /// Embedded study id
    #[arg(long, default_value = "london")]
    study: String,
    /// Study TOML file (overrides `--study`)
    #[arg(long)]
    study_file: Option<PathBuf>,
}

#[derive(Args)]
struct EntitiesArgs {
    #[command(flatten)]
    study: StudyArgs,
    /// Boundary `GeoJSON` `FeatureCollection`
    #[arg(long)]
    boundaries: PathBuf,
    /// Point feed JSON array
    #[arg(long)]
    points: PathBuf,
    /// Socioeconomic index CSV
    #[arg(long)]
    index: PathBuf,
    /// Survey CSV whose latest values become a column, as `INDICATOR_ID=PATH`
    #[arg(long = "metric-series", value_parser = pipeline::parse_metric_series)]
    metric_series: Vec<(u32, PathBuf)>,
    /// Output file (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct PeriodsArgs {
    #[command(flatten)]
    study: StudyArgs,
    /// Indicator id from the study's metric catalogue
    #[arg(long)]
    metric: u32,
    /// Survey CSV for that indicator
    #[arg(long)]
    series: PathBuf,
    /// Output file (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Studies => pipeline::list_studies(),
        Commands::Entities(args) => {
            let study =
                pipeline::resolve_study(&args.study.study, args.study.study_file.as_deref())?;
            pipeline::run_entities(
                &study,
                &pipeline::EntityInputs {
                    boundaries: &args.boundaries,
                    points: &args.points,
                    index: &args.index,
                    metric_series: &args.metric_series,
                },
                args.output.as_deref(),
            )?;
        }
        Commands::Periods(args) => {
            let study =
                pipeline::resolve_study(&args.study.study, args.study.study_file.as_deref())?;
            pipeline::run_periods(&study, args.metric, &args.series, args.output.as_deref())?;
        }
    }

    Ok(())
}
