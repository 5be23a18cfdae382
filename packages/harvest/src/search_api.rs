//! Page-numbered search API harvester.
//!
//! Fetches every hit of a community from a records search endpoint
//! (`?communities=..&page=..&size=..`). Pages are requested starting at 1
//! until a page returns fewer hits than the requested size.
//!
//! A failed page (transport error, non-success status, unparseable body)
//! ends the harvest with whatever was collected so far. The returned
//! [`SearchHarvest`] flags this as `truncated` so callers can report it.

use serde::Deserialize;

use crate::http::HttpClient;

/// Configuration for one search API harvest.
#[derive(Debug, Clone, Copy)]
pub struct SearchApiConfig<'a> {
    /// Records search URL (e.g. `"https://zenodo.org/api/records/"`).
    pub base_url: &'a str,
    /// Community identifier to filter by.
    pub community: &'a str,
    /// Hits requested per page.
    pub page_size: u32,
    /// Label for log messages.
    pub label: &'a str,
}

/// Usage counters embedded in a search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HitStats {
    #[serde(default)]
    pub unique_views: Option<u64>,
    #[serde(default)]
    pub unique_downloads: Option<u64>,
}

/// One record returned by the search API.
///
/// Only the fields the collector needs are typed; everything else is kept
/// verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub doi_url: Option<String>,
    #[serde(default)]
    pub stats: HitStats,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPage {
    #[serde(default)]
    hits: HitList,
}

#[derive(Debug, Default, Deserialize)]
struct HitList {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

/// Result of a search API harvest.
#[derive(Debug, Clone, Default)]
pub struct SearchHarvest {
    /// All hits, in page order.
    pub hits: Vec<SearchHit>,
    /// Number of page requests issued.
    pub requests: u32,
    /// Whether a failed page cut the harvest short.
    pub truncated: bool,
}

/// Fetches every page of hits for the configured community.
///
/// Never fails: a page that cannot be fetched or parsed is logged and ends
/// the harvest with `truncated = true`.
pub async fn harvest_search_api<C: HttpClient>(
    client: &C,
    config: &SearchApiConfig<'_>,
) -> SearchHarvest {
    let page_size = config.page_size.max(1);
    let size_param = page_size.to_string();
    let mut result = SearchHarvest::default();
    let mut page: u32 = 1;

    log::info!(
        "[{}] Querying {} for community {} ({page_size} per page)",
        config.label,
        config.base_url,
        config.community
    );

    loop {
        let page_param = page.to_string();
        result.requests += 1;

        let response = match client
            .get(
                config.base_url,
                &[
                    ("communities", config.community),
                    ("page", page_param.as_str()),
                    ("size", size_param.as_str()),
                ],
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::error!("[{}] Failed to fetch page {page}: {e}", config.label);
                result.truncated = true;
                break;
            }
        };

        if !response.is_success() {
            log::error!(
                "[{}] Failed to fetch page {page}. Status code: {}",
                config.label,
                response.status
            );
            result.truncated = true;
            break;
        }

        let parsed: SearchPage = match serde_json::from_str(&response.body) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::error!(
                    "[{}] Unparseable response for page {page}: {e}",
                    config.label
                );
                result.truncated = true;
                break;
            }
        };

        let count = parsed.hits.hits.len();
        result.hits.extend(parsed.hits.hits);

        log::info!(
            "[{}] Fetched {count} records from page {page} (total: {})",
            config.label,
            result.hits.len()
        );

        if count < page_size as usize {
            break;
        }

        page += 1;
    }

    if result.truncated {
        log::warn!(
            "[{}] Harvest truncated after {} request(s); {} records kept",
            config.label,
            result.requests,
            result.hits.len()
        );
    }

    result
}
