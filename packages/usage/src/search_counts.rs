//! Usage counters embedded in search API hits.

use pubmetrics_harvest::search_api::{SearchHarvest, SearchHit};
use pubmetrics_record_models::{UsageCounts, UsageTable};

/// Counters of one hit. The search API has no separate metadata view
/// count, so `metadata_views` is always zero.
#[must_use]
pub fn hit_counts(hit: &SearchHit) -> UsageCounts {
    UsageCounts {
        metadata_views: 0,
        data_views: hit.stats.unique_views.unwrap_or(0),
        downloads: hit.stats.unique_downloads.unwrap_or(0),
    }
}

/// Builds the usage table from a search harvest.
///
/// Returns the table and the number of warnings: hits without a DOI URL
/// are skipped with a warning, and a truncated harvest counts as one.
#[must_use]
pub fn table_from_hits(harvest: &SearchHarvest, label: &str) -> (UsageTable, u64) {
    let mut table = UsageTable::default();
    let mut warnings = u64::from(harvest.truncated);

    for hit in &harvest.hits {
        let Some(doi) = hit.doi_url.as_deref() else {
            log::warn!("[{label}] Search hit without doi_url, skipping");
            warnings += 1;
            continue;
        };
        table.push(doi.to_owned(), hit_counts(hit));
    }

    (table, warnings)
}
