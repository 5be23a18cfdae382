//! Usage counter sums per publisher.

use std::collections::BTreeMap;

use pubmetrics_record_models::{Publisher, UsageCounts, UsageTable};
use serde::Serialize;

/// Label of the row summing every publisher.
pub const TOTAL_LABEL: &str = "Total";

/// One row of the usage totals table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageTotal {
    /// Publisher name, or [`TOTAL_LABEL`].
    pub publisher: String,
    pub metadata_views: u64,
    pub data_views: u64,
    pub downloads: u64,
}

impl UsageTotal {
    const fn new(publisher: String, counts: UsageCounts) -> Self {
        Self {
            publisher,
            metadata_views: counts.metadata_views,
            data_views: counts.data_views,
            downloads: counts.downloads,
        }
    }
}

/// Sums each publisher's table in [`Publisher::ALL`] order, followed by a
/// [`TOTAL_LABEL`] row.
///
/// Publishers appearing more than once are merged.
#[must_use]
pub fn usage_totals(tables: &[(Publisher, UsageTable)]) -> Vec<UsageTotal> {
    let mut per_publisher: BTreeMap<Publisher, UsageCounts> = BTreeMap::new();
    for (publisher, table) in tables {
        *per_publisher.entry(*publisher).or_default() += table.totals();
    }

    let overall = per_publisher
        .values()
        .fold(UsageCounts::default(), |acc, counts| acc + *counts);

    Publisher::ALL
        .iter()
        .filter_map(|publisher| {
            per_publisher
                .get(publisher)
                .map(|counts| UsageTotal::new(publisher.to_string(), *counts))
        })
        .chain(std::iter::once(UsageTotal::new(TOTAL_LABEL.to_owned(), overall)))
        .collect()
}
