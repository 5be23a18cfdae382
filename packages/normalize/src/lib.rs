#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Normalization of harvested records into one consolidated table.
//!
//! The pipeline runs in a fixed order:
//!
//! 1. tag every record with the publisher of the repository it came from
//! 2. flatten single-element list fields ([`FieldValue`])
//! 3. parse dates and drop undated records ([`dates`])
//! 4. drop aggregate publication types ([`AGGREGATE_TYPES`])
//! 5. collapse versions of versioned repositories ([`dedup`])
//! 6. sort by publisher, date and DOI

pub mod dates;
pub mod dedup;

use std::path::Path;

use chrono::Datelike as _;
use pubmetrics_harvest::HarvestError;
use pubmetrics_harvest::repository_def::RepositoryDefinition;
use pubmetrics_harvest::storage::{harvest_path, load_harvest};
use pubmetrics_record_models::{DatasetRecord, FieldValue, HarvestDate, HarvestedRecord, Publisher};

/// Publication types that describe collections of other records and are
/// never counted themselves. Matched case-insensitively.
pub const AGGREGATE_TYPES: &[&str] = &[
    "dataset bundled publication",
    "dataset bibliography",
    "dataset publication series",
];

/// Placeholder written by the harvester for a missing `relation`.
const NO_RELATION: &str = "No relation";

/// Errors that can occur while loading records for normalization.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// A harvest file could not be loaded.
    #[error(transparent)]
    Harvest(#[from] HarvestError),
}

/// The harvested records of one repository.
#[derive(Debug, Clone)]
pub struct HarvestBatch {
    pub publisher: Publisher,
    /// Whether versions should be collapsed to the latest one.
    pub versioned: bool,
    pub records: Vec<HarvestedRecord>,
}

/// A harvested record with every field flattened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatRecord {
    pub doi: FieldValue,
    pub authors: FieldValue,
    pub title: FieldValue,
    pub date: FieldValue,
    pub format: FieldValue,
    pub record_type: FieldValue,
    pub coverage: FieldValue,
    pub rights: FieldValue,
    pub relation: FieldValue,
    pub description: FieldValue,
    pub publisher: FieldValue,
}

impl From<HarvestedRecord> for FlatRecord {
    fn from(record: HarvestedRecord) -> Self {
        Self {
            doi: FieldValue::from_list(record.doi),
            authors: FieldValue::from_list(record.authors),
            title: FieldValue::from_list(record.title),
            date: FieldValue::from_list(record.date),
            format: FieldValue::from_list(record.format),
            record_type: FieldValue::from_list(record.record_type),
            coverage: FieldValue::from_list(record.coverage),
            rights: FieldValue::from_list(record.rights),
            relation: FieldValue::from_list(record.relation),
            description: FieldValue::from_list(record.description),
            publisher: FieldValue::from_list(record.publisher),
        }
    }
}

/// Outcome of [`normalize`].
#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    /// The consolidated table, ordered by publisher, date and DOI.
    pub records: Vec<DatasetRecord>,
    /// Records read from all batches.
    pub input: usize,
    /// Records dropped for a missing or unparseable date.
    pub undated: usize,
    /// Records dropped for an aggregate publication type.
    pub aggregate: usize,
    /// Older versions dropped in favour of a newer one.
    pub superseded: usize,
}

impl NormalizeReport {
    /// Number of records in the consolidated table.
    #[must_use]
    pub const fn output(&self) -> usize {
        self.records.len()
    }
}

enum Rejection {
    Undated,
    Aggregate,
}

/// Returns `true` if any type entry names an aggregate publication type.
#[must_use]
pub fn is_aggregate_type(record_type: &FieldValue) -> bool {
    record_type.values().iter().any(|value| {
        let value = value.trim();
        AGGREGATE_TYPES
            .iter()
            .any(|aggregate| value.eq_ignore_ascii_case(aggregate))
    })
}

fn to_dataset(flat: FlatRecord, publisher: Publisher) -> Result<DatasetRecord, Rejection> {
    let date = dates::parse_field_date(&flat.date).ok_or(Rejection::Undated)?;
    if is_aggregate_type(&flat.record_type) {
        return Err(Rejection::Aggregate);
    }

    let relation: Vec<String> = flat
        .relation
        .into_values()
        .into_iter()
        .filter(|value| value != NO_RELATION)
        .collect();

    Ok(DatasetRecord {
        doi: flat.doi.first().unwrap_or_default().to_owned(),
        authors: flat.authors.into_values(),
        title: flat.title.values().join("; "),
        date,
        year: date.year(),
        record_type: flat.record_type,
        publisher,
        relation,
        rights: flat.rights,
        coverage: flat.coverage,
        description: flat.description,
        format: flat.format,
    })
}

/// Builds the consolidated table from the harvested batches.
#[must_use]
pub fn normalize(batches: Vec<HarvestBatch>) -> NormalizeReport {
    let mut report = NormalizeReport::default();

    for batch in batches {
        let count = batch.records.len();
        report.input += count;

        let mut kept = Vec::with_capacity(count);
        for record in batch.records {
            match to_dataset(FlatRecord::from(record), batch.publisher) {
                Ok(record) => kept.push(record),
                Err(Rejection::Undated) => report.undated += 1,
                Err(Rejection::Aggregate) => report.aggregate += 1,
            }
        }

        if batch.versioned {
            let deduplicated = dedup::keep_latest_versions(kept);
            report.superseded += deduplicated.superseded;
            kept = deduplicated.records;
        }

        log::info!(
            "[{}] {count} harvested, {} kept",
            batch.publisher,
            kept.len()
        );
        report.records.extend(kept);
    }

    report.records.sort_by(|a, b| {
        a.publisher
            .cmp(&b.publisher)
            .then_with(|| a.date.cmp(&b.date))
            .then_with(|| a.doi.cmp(&b.doi))
    });

    log::info!(
        "Normalized {} records: {} undated, {} aggregate, {} superseded, {} kept",
        report.input,
        report.undated,
        report.aggregate,
        report.superseded,
        report.output()
    );

    report
}

/// Loads the harvest file of every repository for the given date.
///
/// # Errors
///
/// Returns [`NormalizeError`] if any harvest file is missing or malformed.
pub fn load_batches(
    data_dir: &Path,
    date: HarvestDate,
    project: &str,
    repositories: &[RepositoryDefinition],
) -> Result<Vec<HarvestBatch>, NormalizeError> {
    repositories
        .iter()
        .map(|repository| {
            let path = harvest_path(data_dir, date, project, repository.id());
            Ok(HarvestBatch {
                publisher: repository.publisher,
                versioned: repository.versioned,
                records: load_harvest(&path)?,
            })
        })
        .collect()
}
