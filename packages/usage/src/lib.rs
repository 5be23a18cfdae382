#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Usage statistics collection.
//!
//! Each repository gets its counters one of two ways, chosen by its
//! [`UsageSource`]: from the hits of its search API, or with one statistics
//! request per harvested record. Results are cached per date in the data
//! directory; an existing cache file is returned as-is without any network
//! access.

pub mod search_counts;
pub mod statistics;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pubmetrics_harvest::HarvestError;
use pubmetrics_harvest::http::HttpClient;
use pubmetrics_harvest::progress::ProgressCallback;
use pubmetrics_harvest::repository_def::{RepositoryDefinition, UsageSource};
use pubmetrics_harvest::search_api::harvest_search_api;
use pubmetrics_harvest::storage::{
    harvest_path, load_harvest, read_json, usage_stats_path, write_json,
};
use pubmetrics_record_models::{HarvestDate, Publisher, UsageCounts, UsageStats, UsageTable};

use crate::statistics::{StatisticsConfig, collect_statistics};

/// Errors that can occur while collecting usage statistics.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    /// Loading the harvest file or reading/writing the cache failed.
    #[error(transparent)]
    Harvest(#[from] HarvestError),

    /// The repository takes usage from a search API it does not define.
    #[error("Repository '{repository}' has no [search_api] section")]
    MissingSearchApi {
        /// Repository identifier.
        repository: String,
    },
}

/// Where the dated files of a run live.
#[derive(Debug, Clone, Copy)]
pub struct UsageOptions<'a> {
    pub data_dir: &'a Path,
    pub date: HarvestDate,
    /// Project name used in harvest file names.
    pub project: &'a str,
}

/// Usage statistics of one repository.
#[derive(Debug, Clone)]
pub struct UsageReport {
    pub publisher: Publisher,
    pub table: UsageTable,
    /// Whether the table was loaded from an existing cache file.
    pub from_cache: bool,
    /// Failures that were tolerated while collecting.
    pub warnings: u64,
}

impl UsageReport {
    /// Per-record statistics.
    #[must_use]
    pub fn stats(&self) -> Vec<UsageStats> {
        self.table.to_stats(self.publisher)
    }

    /// Sum over all records.
    #[must_use]
    pub fn totals(&self) -> UsageCounts {
        self.table.totals()
    }
}

/// Returns per-record usage counters for `repository` on `options.date`.
///
/// # Errors
///
/// * [`UsageError::Harvest`] if the cache file is unreadable, the harvest
///   file needed for per-record statistics is missing, or the result cannot
///   be written.
/// * [`UsageError::MissingSearchApi`] if the repository is misconfigured.
pub async fn collect_usage<C: HttpClient>(
    client: &C,
    repository: &RepositoryDefinition,
    options: &UsageOptions<'_>,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<UsageReport, UsageError> {
    let label = repository.name();
    let cache = usage_stats_path(options.data_dir, options.date, repository.id());

    if cache.exists() {
        let table: UsageTable = read_json(&cache)?;
        log::info!(
            "[{label}] Loaded {} cached usage rows from {}",
            table.len(),
            cache.display()
        );
        return Ok(UsageReport {
            publisher: repository.publisher,
            table,
            from_cache: true,
            warnings: 0,
        });
    }

    let (table, warnings) = match &repository.usage {
        UsageSource::SearchApi => {
            let config = repository
                .search_api_config()
                .ok_or_else(|| UsageError::MissingSearchApi {
                    repository: repository.id().to_owned(),
                })?;
            let harvest = harvest_search_api(client, &config).await;
            search_counts::table_from_hits(&harvest, label)
        }
        UsageSource::StatisticsEndpoint {
            resolver_url,
            delay_ms,
        } => {
            let path = harvest_path(
                options.data_dir,
                options.date,
                options.project,
                repository.id(),
            );
            let records = load_harvest(&path)?;
            log::info!(
                "[{label}] Fetching statistics for {} records",
                records.len()
            );
            let config = StatisticsConfig {
                resolver_url: resolver_url.as_deref(),
                delay: Duration::from_millis(*delay_ms),
                label,
            };
            let run = collect_statistics(client, &records, &config, progress).await;
            (run.table, run.warnings)
        }
    };

    write_json(&cache, &table)?;
    log::info!(
        "[{label}] Saved {} usage rows to {} ({warnings} warnings)",
        table.len(),
        cache.display()
    );

    Ok(UsageReport {
        publisher: repository.publisher,
        table,
        from_cache: false,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use pubmetrics_harvest::http::HttpResponse;
    use pubmetrics_harvest::progress::null_progress;
    use pubmetrics_harvest::repository_def::parse_repository_toml;
    use pubmetrics_record_models::HarvestedRecord;

    use super::*;

    /// Fails the test on any request.
    struct NoNetwork;

    impl HttpClient for NoNetwork {
        async fn get(
            &self,
            url: &str,
            _query: &[(&str, &str)],
        ) -> Result<HttpResponse, HarvestError> {
            panic!("unexpected request to {url}");
        }
    }

    /// Answers every request with the same body and records the URLs.
    struct FixedClient {
        body: String,
        requested: Mutex<Vec<String>>,
    }

    impl FixedClient {
        fn new(body: &serde_json::Value) -> Self {
            Self {
                body: body.to_string(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for FixedClient {
        async fn get(
            &self,
            url: &str,
            _query: &[(&str, &str)],
        ) -> Result<HttpResponse, HarvestError> {
            self.requested.lock().unwrap().push(url.to_owned());
            Ok(HttpResponse {
                status: 200,
                body: self.body.clone(),
            })
        }
    }

    fn pangaea() -> RepositoryDefinition {
        parse_repository_toml(
            r#"
            id = "pangaea"
            name = "PANGAEA"
            publisher = "PANGAEA"
            [oai]
            endpoint = "https://pangaea.example/oai"
            set = "s"
            [usage]
            type = "statistics_endpoint"
            resolver_url = "https://doi.pangaea.example/"
            delay_ms = 0
            "#,
        )
        .unwrap()
    }

    fn zenodo() -> RepositoryDefinition {
        parse_repository_toml(
            r#"
            id = "zenodo"
            name = "Zenodo"
            publisher = "Zenodo"
            versioned = true
            [oai]
            endpoint = "https://zenodo.example/oai2d"
            set = "user-x"
            [search_api]
            url = "https://zenodo.example/api/records/"
            community = "x"
            [usage]
            type = "search_api"
            "#,
        )
        .unwrap()
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn date() -> HarvestDate {
        "20260210".parse().unwrap()
    }

    #[tokio::test]
    async fn cached_statistics_need_no_network() {
        let dir = temp_dir("pubmetrics_usage_cached");
        let mut cached = UsageTable::default();
        cached.push(
            "https://doi.pangaea.de/10.1594/PANGAEA.1".to_owned(),
            UsageCounts {
                metadata_views: 4,
                data_views: 2,
                downloads: 1,
            },
        );
        write_json(&usage_stats_path(&dir, date(), "pangaea"), &cached).unwrap();

        let options = UsageOptions {
            data_dir: &dir,
            date: date(),
            project: "ac3",
        };
        let report = collect_usage(&NoNetwork, &pangaea(), &options, &null_progress())
            .await
            .unwrap();

        assert!(report.from_cache);
        assert_eq!(report.table, cached);
        assert_eq!(report.stats()[0].publisher, Publisher::Pangaea);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn statistics_endpoint_requires_harvest_file() {
        let dir = temp_dir("pubmetrics_usage_missing_harvest");
        let options = UsageOptions {
            data_dir: &dir,
            date: date(),
            project: "ac3",
        };

        let err = collect_usage(&NoNetwork, &pangaea(), &options, &null_progress())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UsageError::Harvest(HarvestError::MissingInput { .. })
        ));
    }

    #[tokio::test]
    async fn statistics_endpoint_collects_and_caches() {
        let dir = temp_dir("pubmetrics_usage_statistics");
        let records = vec![
            HarvestedRecord {
                doi: vec!["10.1594/PANGAEA.1".to_owned()],
                ..HarvestedRecord::default()
            },
            HarvestedRecord {
                doi: vec!["10.1594/PANGAEA.2".to_owned()],
                ..HarvestedRecord::default()
            },
        ];
        write_json(&harvest_path(&dir, date(), "ac3", "pangaea"), &records).unwrap();
        let client = FixedClient::new(&serde_json::json!({
            "metadata_views": 3, "data_views": 2, "downloads": 1,
        }));
        let options = UsageOptions {
            data_dir: &dir,
            date: date(),
            project: "ac3",
        };

        let report = collect_usage(&client, &pangaea(), &options, &null_progress())
            .await
            .unwrap();

        assert!(!report.from_cache);
        assert_eq!(report.warnings, 0);
        assert_eq!(
            report.totals(),
            UsageCounts {
                metadata_views: 6,
                data_views: 4,
                downloads: 2,
            }
        );
        assert_eq!(
            *client.requested.lock().unwrap(),
            vec![
                "https://doi.pangaea.example/10.1594/PANGAEA.1".to_owned(),
                "https://doi.pangaea.example/10.1594/PANGAEA.2".to_owned(),
            ]
        );

        let cached: UsageTable = read_json(&usage_stats_path(&dir, date(), "pangaea")).unwrap();
        assert_eq!(cached, report.table);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn search_api_uses_embedded_counters() {
        let dir = temp_dir("pubmetrics_usage_search_api");
        let client = FixedClient::new(&serde_json::json!({
            "hits": {"hits": [
                {"doi_url": "https://doi.org/10.5281/zenodo.1",
                 "stats": {"unique_views": 10, "unique_downloads": 4}},
                {"doi_url": "https://doi.org/10.5281/zenodo.2",
                 "stats": {"unique_views": 5, "unique_downloads": 0}},
            ]},
        }));
        let options = UsageOptions {
            data_dir: &dir,
            date: date(),
            project: "ac3",
        };

        let report = collect_usage(&client, &zenodo(), &options, &null_progress())
            .await
            .unwrap();

        assert_eq!(report.publisher, Publisher::Zenodo);
        assert_eq!(report.table.len(), 2);
        assert_eq!(report.table.metadata_views, vec![0, 0]);
        assert_eq!(report.table.data_views, vec![10, 5]);
        assert_eq!(report.table.downloads, vec![4, 0]);
        assert!(usage_stats_path(&dir, date(), "zenodo").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
