//! Per-record statistics endpoint (`{doi}?format=statistics`).
//!
//! One request is issued per record, strictly one at a time with a pause in
//! between. A record whose statistics cannot be fetched or parsed gets zero
//! counts and the loop moves on.

use std::sync::Arc;
use std::time::Duration;

use pubmetrics_harvest::http::HttpClient;
use pubmetrics_harvest::progress::ProgressCallback;
use pubmetrics_record_models::{HarvestedRecord, UsageCounts, UsageTable};
use serde::Deserialize;

/// Placeholder written by the harvester for a missing identifier.
const NO_IDENTIFIER: &str = "No identifier";

/// Configuration for one statistics run.
#[derive(Debug, Clone, Copy)]
pub struct StatisticsConfig<'a> {
    /// Prefix for identifiers that are bare DOIs rather than URLs.
    pub resolver_url: Option<&'a str>,
    /// Pause between consecutive requests.
    pub delay: Duration,
    /// Label for log messages.
    pub label: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct StatisticsResponse {
    #[serde(default)]
    metadata_views: Option<u64>,
    #[serde(default)]
    data_views: Option<u64>,
    #[serde(default)]
    downloads: Option<u64>,
}

impl From<StatisticsResponse> for UsageCounts {
    fn from(response: StatisticsResponse) -> Self {
        Self {
            metadata_views: response.metadata_views.unwrap_or(0),
            data_views: response.data_views.unwrap_or(0),
            downloads: response.downloads.unwrap_or(0),
        }
    }
}

/// Result of [`collect_statistics`].
#[derive(Debug, Clone, Default)]
pub struct StatisticsRun {
    pub table: UsageTable,
    /// Records that got zero counts or were skipped because of a failure.
    pub warnings: u64,
}

/// Resolves a record identifier to the URL its statistics hang off.
#[must_use]
pub fn record_url(identifier: &str, resolver_url: Option<&str>) -> String {
    let identifier = identifier.trim();
    if identifier.starts_with("http://") || identifier.starts_with("https://") {
        return identifier.to_owned();
    }
    resolver_url.map_or_else(
        || identifier.to_owned(),
        |resolver| format!("{}/{}", resolver.trim_end_matches('/'), identifier),
    )
}

/// Fetches the counters of a single record.
///
/// Returns `None` on a transport failure, a non-success status, or a body
/// that is not a statistics object.
pub async fn fetch_record_statistics<C: HttpClient>(
    client: &C,
    url: &str,
    label: &str,
) -> Option<UsageCounts> {
    let response = match client.get(url, &[("format", "statistics")]).await {
        Ok(response) => response,
        Err(e) => {
            log::warn!("[{label}] Failed to fetch statistics for {url}: {e}");
            return None;
        }
    };

    if !response.is_success() {
        log::warn!(
            "[{label}] Statistics request for {url} returned status {}",
            response.status
        );
        return None;
    }

    match serde_json::from_str::<StatisticsResponse>(&response.body) {
        Ok(parsed) => Some(parsed.into()),
        Err(e) => {
            log::warn!("[{label}] Unparseable statistics for {url}: {e}");
            None
        }
    }
}

/// Collects counters for every harvested record.
///
/// Rows are keyed by the record URL. Records without an identifier are
/// skipped; failed records are kept with zero counts.
pub async fn collect_statistics<C: HttpClient>(
    client: &C,
    records: &[HarvestedRecord],
    config: &StatisticsConfig<'_>,
    progress: &Arc<dyn ProgressCallback>,
) -> StatisticsRun {
    let mut run = StatisticsRun::default();
    progress.set_total(records.len() as u64);
    progress.set_message(format!("{} statistics", config.label));

    for (index, record) in records.iter().enumerate() {
        let Some(identifier) = record
            .doi
            .first()
            .filter(|doi| !doi.trim().is_empty() && doi.as_str() != NO_IDENTIFIER)
        else {
            log::warn!(
                "[{}] Record {index} has no identifier, skipping",
                config.label
            );
            run.warnings += 1;
            progress.advance();
            continue;
        };

        if index > 0 && !config.delay.is_zero() {
            tokio::time::sleep(config.delay).await;
        }

        let url = record_url(identifier, config.resolver_url);
        let counts = fetch_record_statistics(client, &url, config.label)
            .await
            .unwrap_or_else(|| {
                run.warnings += 1;
                UsageCounts::default()
            });

        log::debug!("[{}] {url}: {counts:?}", config.label);
        run.table.push(url, counts);
        progress.advance();
    }

    progress.finish(format!(
        "{}: {} records, {} warnings",
        config.label,
        run.table.len(),
        run.warnings
    ));

    run
}
