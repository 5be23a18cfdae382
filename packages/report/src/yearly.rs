//! Publication counts per year.

use std::collections::BTreeMap;

use pubmetrics_record_models::{DatasetRecord, Publisher};
use serde::Serialize;

/// Publications of one publisher in one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearlyCount {
    pub year: i32,
    pub publisher: Publisher,
    pub count: u64,
    /// Running total over all rows up to and including this one.
    pub cumulative_count: u64,
}

/// Publications of all publishers in one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearTotal {
    pub year: i32,
    pub count: u64,
    pub cumulative_count: u64,
}

/// Counts records per `(year, publisher)`, ordered by year then publisher.
#[must_use]
pub fn yearly_counts(records: &[DatasetRecord]) -> Vec<YearlyCount> {
    let mut counts: BTreeMap<(i32, Publisher), u64> = BTreeMap::new();
    for record in records {
        *counts.entry((record.year, record.publisher)).or_default() += 1;
    }

    let mut cumulative = 0;
    counts
        .into_iter()
        .map(|((year, publisher), count)| {
            cumulative += count;
            YearlyCount {
                year,
                publisher,
                count,
                cumulative_count: cumulative,
            }
        })
        .collect()
}

/// Sums [`yearly_counts`] over publishers.
#[must_use]
pub fn year_totals(counts: &[YearlyCount]) -> Vec<YearTotal> {
    let mut per_year: BTreeMap<i32, u64> = BTreeMap::new();
    for row in counts {
        *per_year.entry(row.year).or_default() += row.count;
    }

    let mut cumulative = 0;
    per_year
        .into_iter()
        .map(|(year, count)| {
            cumulative += count;
            YearTotal {
                year,
                count,
                cumulative_count: cumulative,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pubmetrics_record_models::FieldValue;

    use super::*;

    fn record(year: i32, publisher: Publisher) -> DatasetRecord {
        DatasetRecord {
            doi: format!("10.1/{year}"),
            authors: Vec::new(),
            title: String::new(),
            date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            year,
            record_type: FieldValue::Scalar("dataset".to_owned()),
            publisher,
            relation: Vec::new(),
            rights: FieldValue::default(),
            coverage: FieldValue::default(),
            description: FieldValue::default(),
            format: FieldValue::default(),
        }
    }

    #[test]
    fn counts_per_year_and_publisher_with_running_total() {
        let records = vec![
            record(2021, Publisher::Zenodo),
            record(2020, Publisher::Pangaea),
            record(2021, Publisher::Pangaea),
            record(2021, Publisher::Zenodo),
            record(2020, Publisher::Pangaea),
        ];

        let counts = yearly_counts(&records);

        assert_eq!(
            counts,
            vec![
                YearlyCount {
                    year: 2020,
                    publisher: Publisher::Pangaea,
                    count: 2,
                    cumulative_count: 2,
                },
                YearlyCount {
                    year: 2021,
                    publisher: Publisher::Pangaea,
                    count: 1,
                    cumulative_count: 3,
                },
                YearlyCount {
                    year: 2021,
                    publisher: Publisher::Zenodo,
                    count: 2,
                    cumulative_count: 5,
                },
            ]
        );
    }

    #[test]
    fn year_totals_accumulate() {
        let records = vec![
            record(2019, Publisher::Zenodo),
            record(2020, Publisher::Pangaea),
            record(2020, Publisher::Zenodo),
            record(2022, Publisher::Pangaea),
        ];

        let totals = year_totals(&yearly_counts(&records));

        let rows: Vec<(i32, u64, u64)> = totals
            .iter()
            .map(|t| (t.year, t.count, t.cumulative_count))
            .collect();
        assert_eq!(rows, vec![(2019, 1, 1), (2020, 2, 3), (2022, 1, 4)]);
    }

    #[test]
    fn empty_input_gives_empty_tables() {
        assert!(yearly_counts(&[]).is_empty());
        assert!(year_totals(&[]).is_empty());
    }
}
