#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the publication metrics toolchain.
//!
//! Every subcommand works on the dated files of one day, named by the
//! optional `yyyymmdd` argument (today by default), so `usage` and
//! `report` can be rerun against an earlier harvest.

mod commands;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use pubmetrics_harvest::registry::enabled_repositories;
use pubmetrics_record_models::HarvestDate;

use crate::commands::RunContext;

/// Environment variable overriding the default data directory.
const DATA_DIR_ENV: &str = "PUBMETRICS_DATA_DIR";

const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser)]
#[command(name = "pubmetrics", about = "Publication and usage metrics harvester")]
struct Cli {
    /// Directory holding the dated harvest, usage and report files
    /// (overrides `PUBMETRICS_DATA_DIR`, default `./data`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Project name used in harvest file names
    #[arg(long, global = true, default_value = "ac3")]
    project: String,
    /// Comma-separated list of repository IDs (overrides
    /// `PUBMETRICS_REPOSITORIES` env var)
    #[arg(long, global = true)]
    repositories: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest OAI-PMH metadata from every repository
    Harvest {
        /// Harvest date as yyyymmdd (default: today)
        date: Option<HarvestDate>,
    },
    /// Collect view and download statistics, reusing cached results
    Usage {
        /// Date of the harvest to collect statistics for, as yyyymmdd
        date: Option<HarvestDate>,
    },
    /// Normalize harvested records and write the summary tables
    Report {
        /// Date of the harvest to report on, as yyyymmdd
        date: Option<HarvestDate>,
    },
    /// List all configured repositories
    Repositories,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = pubmetrics_cli_utils::init_logger();
    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let repositories = enabled_repositories(cli.repositories);
    let context = |date: Option<HarvestDate>| RunContext {
        data_dir: data_dir.clone(),
        project: cli.project.clone(),
        date: date.unwrap_or_else(HarvestDate::today),
        repositories: repositories.clone(),
    };

    let start = Instant::now();
    let summary = match cli.command {
        Commands::Repositories => {
            commands::list_repositories(&repositories);
            return Ok(());
        }
        Commands::Harvest { date } => commands::harvest(&context(date), &multi).await?,
        Commands::Usage { date } => commands::usage(&context(date), &multi).await?,
        Commands::Report { date } => commands::report(&context(date))?,
    };

    summary.print(start.elapsed());

    Ok(())
}
