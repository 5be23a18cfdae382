//! Subcommand implementations and the end-of-run summary.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use pubmetrics_cli_utils::{IndicatifProgress, MultiProgress};
use pubmetrics_harvest::http::ReqwestClient;
use pubmetrics_harvest::oai_pmh::harvest_oai_to_file;
use pubmetrics_harvest::repository_def::{RepositoryDefinition, UsageSource};
use pubmetrics_harvest::storage::harvest_path;
use pubmetrics_record_models::HarvestDate;
use pubmetrics_report::{ReportOptions, build_report};
use pubmetrics_usage::{UsageOptions, collect_usage};

const USER_AGENT: &str = concat!("pubmetrics/", env!("CARGO_PKG_VERSION"));

/// Retries per statistics request. A record that keeps failing is counted as
/// zero usage, so the long per-record loop gives up sooner than a harvest.
const STATISTICS_MAX_RETRIES: u32 = 2;

/// Everything a subcommand needs to locate its files.
pub struct RunContext {
    pub data_dir: PathBuf,
    pub project: String,
    pub date: HarvestDate,
    pub repositories: Vec<RepositoryDefinition>,
}

/// Per-repository outcome lines and the tolerated failures of a run.
#[derive(Default)]
pub struct RunSummary {
    lines: Vec<String>,
    warnings: u64,
}

impl RunSummary {
    fn line(&mut self, line: String) {
        self.lines.push(line);
    }

    pub fn print(&self, elapsed: Duration) {
        println!();
        for line in &self.lines {
            println!("  {line}");
        }
        println!(
            "Done in {:.1}s with {} warning(s)",
            elapsed.as_secs_f64(),
            self.warnings
        );
    }
}

pub fn list_repositories(repositories: &[RepositoryDefinition]) {
    println!("{:<12} {:<10} {:<10} USAGE", "ID", "NAME", "VERSIONED");
    println!("{}", "-".repeat(56));
    for repository in repositories {
        let usage = match repository.usage {
            UsageSource::SearchApi => "search API",
            UsageSource::StatisticsEndpoint { .. } => "statistics endpoint",
        };
        println!(
            "{:<12} {:<10} {:<10} {usage}",
            repository.id(),
            repository.name(),
            repository.versioned
        );
    }
}

/// Harvests every repository's OAI-PMH set into the dated harvest files.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or a harvest file
/// cannot be written.
pub async fn harvest(
    context: &RunContext,
    multi: &MultiProgress,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let client = ReqwestClient::new(USER_AGENT)?;
    let mut summary = RunSummary::default();
    let bar = IndicatifProgress::harvest_bar(multi, context.repositories.len() as u64);

    for repository in &context.repositories {
        bar.set_message(format!("Harvesting {}", repository.name()));
        let path = harvest_path(
            &context.data_dir,
            context.date,
            &context.project,
            repository.id(),
        );
        let result = harvest_oai_to_file(&client, &repository.oai_config(), &path).await?;

        let mut line = format!(
            "{}: {} records in {} page(s), {} deleted skipped",
            repository.name(),
            result.records.len(),
            result.pages,
            result.deleted_skipped
        );
        if let Some(reason) = &result.aborted {
            log::warn!("[{}] Harvest incomplete: {reason}", repository.name());
            let _ = write!(line, " (incomplete: {reason})");
            summary.warnings += 1;
        }
        summary.line(line);
        bar.advance();
    }

    bar.finish(format!("Harvested {} repositories", context.repositories.len()));
    Ok(summary)
}

/// Collects usage statistics for every repository.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built, a required harvest
/// file is missing, or a cache file cannot be read or written.
pub async fn usage(
    context: &RunContext,
    multi: &MultiProgress,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let client = ReqwestClient::new(USER_AGENT)?.with_max_retries(STATISTICS_MAX_RETRIES);
    let options = UsageOptions {
        data_dir: &context.data_dir,
        date: context.date,
        project: &context.project,
    };
    let mut summary = RunSummary::default();

    for repository in &context.repositories {
        let progress = IndicatifProgress::statistics_bar(multi, repository.name());
        let report = collect_usage(&client, repository, &options, &progress).await?;
        let source = if report.from_cache { "cached" } else { "fetched" };
        progress.finish(format!(
            "{}: {} records {source}",
            repository.name(),
            report.table.len()
        ));

        let totals = report.totals();
        summary.line(format!(
            "{}: {} records ({source}), {} metadata views, {} data views, {} downloads",
            repository.name(),
            report.table.len(),
            totals.metadata_views,
            totals.data_views,
            totals.downloads
        ));
        summary.warnings += report.warnings;
    }

    Ok(summary)
}

/// Builds the consolidated table and the report CSV files.
///
/// # Errors
///
/// Returns an error if a harvest file is missing or an output file cannot
/// be written.
pub fn report(context: &RunContext) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let options = ReportOptions {
        data_dir: &context.data_dir,
        date: context.date,
        project: &context.project,
    };
    let report = build_report(&context.repositories, &options)?;
    let normalized = &report.normalized;

    let mut summary = RunSummary::default();
    summary.line(format!(
        "{} harvested records: {} undated, {} aggregate, {} superseded, {} kept",
        normalized.input,
        normalized.undated,
        normalized.aggregate,
        normalized.superseded,
        normalized.output()
    ));
    summary.line(format!(
        "{} yearly rows, {} title terms written to {}",
        report.yearly_rows,
        report.terms,
        context.data_dir.display()
    ));
    if !report.missing_usage.is_empty() {
        summary.line(format!(
            "usage totals missing for: {}",
            report.missing_usage.join(", ")
        ));
    }
    summary.warnings += report.missing_usage.len() as u64;

    Ok(summary)
}
