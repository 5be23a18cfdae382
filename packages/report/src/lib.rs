#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Summary tables for project reporting.
//!
//! Builds the consolidated record table from a day's harvest files and
//! derives the tables behind the report figures: publications per year,
//! usage totals per publisher, and title term frequencies.

pub mod output;
pub mod terms;
pub mod usage_totals;
pub mod yearly;

use std::path::Path;

use pubmetrics_harvest::HarvestError;
use pubmetrics_harvest::repository_def::RepositoryDefinition;
use pubmetrics_harvest::storage::{read_json, usage_stats_path, write_json};
use pubmetrics_normalize::{NormalizeError, NormalizeReport, load_batches, normalize};
use pubmetrics_record_models::{HarvestDate, UsageTable};

/// Errors that can occur while building the report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Harvest files could not be loaded.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// Reading usage caches or writing JSON output failed.
    #[error(transparent)]
    Harvest(#[from] HarvestError),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the dated files of a run live.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions<'a> {
    pub data_dir: &'a Path,
    pub date: HarvestDate,
    pub project: &'a str,
}

/// What [`build_report`] produced.
#[derive(Debug, Clone, Default)]
pub struct ReportSummary {
    pub normalized: NormalizeReport,
    /// Rows of the yearly publications table.
    pub yearly_rows: usize,
    /// Rows of the title terms table.
    pub terms: usize,
    /// Repositories without a usage cache for the date.
    pub missing_usage: Vec<String>,
}

/// Builds every report table for `options.date` and writes it to the data
/// directory.
///
/// Usage totals only include repositories whose usage statistics were
/// collected for the same date; the others are listed in
/// [`ReportSummary::missing_usage`].
///
/// # Errors
///
/// Returns [`ReportError`] if a harvest file is missing or an output file
/// cannot be written.
pub fn build_report(
    repositories: &[RepositoryDefinition],
    options: &ReportOptions<'_>,
) -> Result<ReportSummary, ReportError> {
    let batches = load_batches(
        options.data_dir,
        options.date,
        options.project,
        repositories,
    )?;
    let normalized = normalize(batches);

    write_json(
        &output::consolidated_path(options.data_dir, options.date, options.project),
        &normalized.records,
    )?;

    let yearly = yearly::yearly_counts(&normalized.records);
    output::write_csv(
        &output::yearly_publications_path(options.data_dir, options.date),
        &yearly,
    )?;
    output::write_csv(
        &output::yearly_totals_path(options.data_dir, options.date),
        &yearly::year_totals(&yearly),
    )?;

    let terms = terms::title_terms(
        normalized.records.iter().map(|record| record.title.as_str()),
        terms::DEFAULT_MAX_TERMS,
    );
    output::write_csv(
        &output::title_terms_path(options.data_dir, options.date),
        &terms,
    )?;

    let mut tables = Vec::with_capacity(repositories.len());
    let mut missing_usage = Vec::new();
    for repository in repositories {
        let path = usage_stats_path(options.data_dir, options.date, repository.id());
        match read_json::<UsageTable>(&path) {
            Ok(table) => tables.push((repository.publisher, table)),
            Err(HarvestError::MissingInput { .. }) => {
                log::warn!(
                    "[{}] No usage statistics for {}; run `usage` first",
                    repository.name(),
                    options.date
                );
                missing_usage.push(repository.id().to_owned());
            }
            Err(e) => return Err(e.into()),
        }
    }
    output::write_csv(
        &output::usage_totals_path(options.data_dir, options.date),
        &usage_totals::usage_totals(&tables),
    )?;

    Ok(ReportSummary {
        yearly_rows: yearly.len(),
        terms: terms.len(),
        missing_usage,
        normalized,
    })
}
