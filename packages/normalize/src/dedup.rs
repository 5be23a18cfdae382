//! Collapsing of upload versions to the most recent one.
//!
//! Versioned repositories mint a fresh DOI per upload and record the
//! concept DOI shared by all versions as the last `relation` entry. Within
//! each concept group only the latest version survives.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use pubmetrics_record_models::DatasetRecord;

/// Result of [`keep_latest_versions`].
#[derive(Debug, Clone, Default)]
pub struct Deduplicated {
    /// One record per concept group.
    pub records: Vec<DatasetRecord>,
    /// Number of older versions that were dropped.
    pub superseded: usize,
}

/// Keeps only the most recent version of every concept group.
///
/// Records without a relation form a singleton group keyed by their DOI.
/// Among records with the same date, the higher numeric record id at the
/// end of the DOI wins, then the lexicographically last title, then the
/// lexicographically last DOI.
#[must_use]
pub fn keep_latest_versions(records: Vec<DatasetRecord>) -> Deduplicated {
    let total = records.len();
    let mut groups: BTreeMap<String, DatasetRecord> = BTreeMap::new();

    for record in records {
        let key = group_key(&record);
        match groups.get_mut(&key) {
            Some(current) => {
                if version_rank(&record) > version_rank(current) {
                    log::trace!("{} supersedes {} in {key}", record.doi, current.doi);
                    *current = record;
                }
            }
            None => {
                groups.insert(key, record);
            }
        }
    }

    let records: Vec<DatasetRecord> = groups.into_values().collect();
    Deduplicated {
        superseded: total - records.len(),
        records,
    }
}

fn group_key(record: &DatasetRecord) -> String {
    record.concept_id().map_or_else(
        || format!("doi:{}", record.doi),
        |concept| format!("concept:{concept}"),
    )
}

fn version_rank(record: &DatasetRecord) -> (NaiveDate, Option<u64>, &str, &str) {
    (
        record.date,
        trailing_record_id(&record.doi),
        &record.title,
        &record.doi,
    )
}

/// Numeric id at the end of a DOI, e.g. `123` for `10.5281/zenodo.123`.
fn trailing_record_id(doi: &str) -> Option<u64> {
    let digits = doi.len() - doi.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    doi[doi.len() - digits..].parse().ok()
}

#[cfg(test)]
mod tests {
    use pubmetrics_record_models::{FieldValue, Publisher};

    use super::*;

    fn record(doi: &str, date: &str, relation: &[&str]) -> DatasetRecord {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        DatasetRecord {
            doi: doi.to_owned(),
            authors: vec!["Doe, Jane".to_owned()],
            title: "Cloud radar".to_owned(),
            date,
            year: 2000,
            record_type: FieldValue::Scalar("dataset".to_owned()),
            publisher: Publisher::Zenodo,
            relation: relation.iter().map(|s| (*s).to_owned()).collect(),
            rights: FieldValue::default(),
            coverage: FieldValue::default(),
            description: FieldValue::default(),
            format: FieldValue::default(),
        }
    }

    #[test]
    fn keeps_latest_version_of_concept() {
        let concept = ["https://zenodo.org/communities/crc172-ac3", "10.5281/zenodo.100"];
        let result = keep_latest_versions(vec![
            record("10.5281/zenodo.101", "2022-01-01", &concept),
            record("10.5281/zenodo.205", "2023-06-01", &concept),
        ]);

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].doi, "10.5281/zenodo.205");
        assert_eq!(result.superseded, 1);
    }

    #[test]
    fn survivor_is_not_older_than_any_group_member() {
        let concept = ["10.5281/zenodo.7"];
        let dates = ["2021-05-01", "2024-02-29", "2019-12-31", "2024-02-28"];
        let records: Vec<DatasetRecord> = dates
            .iter()
            .enumerate()
            .map(|(i, date)| record(&format!("10.5281/zenodo.{}", 10 + i), date, &concept))
            .collect();
        let latest = records.iter().map(|r| r.date).max().unwrap();

        let result = keep_latest_versions(records);

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].date, latest);
    }

    #[test]
    fn equal_dates_prefer_higher_record_id() {
        let concept = ["10.5281/zenodo.100"];
        let result = keep_latest_versions(vec![
            record("10.5281/zenodo.999", "2023-06-01", &concept),
            record("10.5281/zenodo.1000", "2023-06-01", &concept),
        ]);

        assert_eq!(result.records[0].doi, "10.5281/zenodo.1000");
    }

    #[test]
    fn equal_dates_and_ids_fall_back_to_title() {
        let concept = ["10.5281/zenodo.100"];
        let mut a = record("10.5281/zenodo.5", "2023-06-01", &concept);
        a.title = "B title".to_owned();
        let mut b = record("https://doi.org/10.5281/zenodo.5", "2023-06-01", &concept);
        b.title = "A title".to_owned();

        let forward = keep_latest_versions(vec![a.clone(), b.clone()]);
        let backward = keep_latest_versions(vec![b, a]);

        assert_eq!(forward.records[0].title, "B title");
        assert_eq!(backward.records[0].title, "B title");
    }

    #[test]
    fn records_without_relation_stay_separate() {
        let result = keep_latest_versions(vec![
            record("10.5281/zenodo.1", "2020-01-01", &[]),
            record("10.5281/zenodo.2", "2021-01-01", &[]),
        ]);

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.superseded, 0);
    }

    #[test]
    fn reads_trailing_record_id() {
        assert_eq!(trailing_record_id("10.5281/zenodo.123"), Some(123));
        assert_eq!(
            trailing_record_id("https://doi.org/10.1594/PANGAEA.90"),
            Some(90)
        );
        assert_eq!(trailing_record_id("10.5281/zenodo.abc"), None);
    }
}
