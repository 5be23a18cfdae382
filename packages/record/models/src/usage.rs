//! Usage counters and their on-disk table form.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::Publisher;

/// View and download counters for one record or an aggregate of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounts {
    pub metadata_views: u64,
    pub data_views: u64,
    pub downloads: u64,
}

impl Add for UsageCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            metadata_views: self.metadata_views + rhs.metadata_views,
            data_views: self.data_views + rhs.data_views,
            downloads: self.downloads + rhs.downloads,
        }
    }
}

impl AddAssign for UsageCounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Usage counters for a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub doi: String,
    #[serde(flatten)]
    pub counts: UsageCounts,
    pub publisher: Publisher,
}

/// Column-oriented usage statistics, the format of the cache files.
///
/// All four columns have the same length; row `i` of each column belongs
/// to the same record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageTable {
    pub doi: Vec<String>,
    pub metadata_views: Vec<u64>,
    pub data_views: Vec<u64>,
    pub downloads: Vec<u64>,
}

impl UsageTable {
    /// Appends one row.
    pub fn push(&mut self, doi: String, counts: UsageCounts) {
        self.doi.push(doi);
        self.metadata_views.push(counts.metadata_views);
        self.data_views.push(counts.data_views);
        self.downloads.push(counts.downloads);
    }

    /// Number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.doi.len()
    }

    /// Returns `true` if the table has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.doi.is_empty()
    }

    /// Expands the table into per-record stats attributed to `publisher`.
    ///
    /// Rows beyond the shortest column are ignored.
    #[must_use]
    pub fn to_stats(&self, publisher: Publisher) -> Vec<UsageStats> {
        self.doi
            .iter()
            .zip(&self.metadata_views)
            .zip(&self.data_views)
            .zip(&self.downloads)
            .map(|(((doi, &metadata_views), &data_views), &downloads)| UsageStats {
                doi: doi.clone(),
                counts: UsageCounts {
                    metadata_views,
                    data_views,
                    downloads,
                },
                publisher,
            })
            .collect()
    }

    /// Sum of every column.
    #[must_use]
    pub fn totals(&self) -> UsageCounts {
        UsageCounts {
            metadata_views: self.metadata_views.iter().sum(),
            data_views: self.data_views.iter().sum(),
            downloads: self.downloads.iter().sum(),
        }
    }
}

impl FromIterator<UsageStats> for UsageTable {
    fn from_iter<I: IntoIterator<Item = UsageStats>>(iter: I) -> Self {
        let mut table = Self::default();
        for stats in iter {
            table.push(stats.doi, stats.counts);
        }
        table
    }
}
