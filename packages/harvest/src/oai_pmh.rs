//! OAI-PMH set harvester.
//!
//! Issues `ListRecords` for a set, follows resumption tokens until the list
//! is complete, and maps each non-deleted Dublin Core record to a
//! [`HarvestedRecord`].
//!
//! The traversal never fails outright. Deleted records are skipped and
//! counted; `noRecordsMatch` means an empty set. Any other protocol error,
//! transport failure, or unparseable page aborts the traversal, and
//! [`harvest_oai_to_file`] still writes the records collected up to that
//! point.

use std::collections::BTreeMap;
use std::path::Path;

use pubmetrics_record_models::HarvestedRecord;

use crate::HarvestError;
use crate::http::HttpClient;
use crate::oai_xml::parse_list_records;
use crate::storage::write_json;

/// OAI error code for a set or query that matches nothing.
const NO_RECORDS_MATCH: &str = "noRecordsMatch";

/// Configuration for one OAI-PMH harvest.
#[derive(Debug, Clone, Copy)]
pub struct OaiConfig<'a> {
    /// Provider base URL (e.g. `"https://ws.pangaea.de/oai/provider"`).
    pub endpoint: &'a str,
    /// `setSpec` to harvest.
    pub set: &'a str,
    /// Metadata format, normally `"oai_dc"`.
    pub metadata_prefix: &'a str,
    /// Label for log messages.
    pub label: &'a str,
}

/// Result of an OAI-PMH harvest.
#[derive(Debug, Clone, Default)]
pub struct OaiHarvest {
    pub records: Vec<HarvestedRecord>,
    /// Tombstoned records that were skipped.
    pub deleted_skipped: u64,
    /// Number of `ListRecords` requests issued.
    pub pages: u32,
    /// Why the traversal stopped early, if it did.
    pub aborted: Option<String>,
}

/// Maps Dublin Core elements (by local name) to a [`HarvestedRecord`].
///
/// Missing or empty elements become a single `"No <element>"` placeholder,
/// so every field is a non-empty list.
#[must_use]
pub fn map_dublin_core(fields: &BTreeMap<String, Vec<String>>) -> HarvestedRecord {
    let get = |element: &str| -> Vec<String> {
        fields
            .get(element)
            .filter(|values| !values.is_empty())
            .cloned()
            .unwrap_or_else(|| vec![format!("No {element}")])
    };

    HarvestedRecord {
        doi: get("identifier"),
        authors: get("creator"),
        title: get("title"),
        date: get("date"),
        format: get("format"),
        record_type: get("type"),
        coverage: get("coverage"),
        rights: get("rights"),
        relation: get("relation"),
        description: get("description"),
        publisher: get("publisher"),
    }
}

/// Harvests every non-deleted record of the configured set.
#[allow(clippy::too_many_lines)]
pub async fn harvest_oai<C: HttpClient>(client: &C, config: &OaiConfig<'_>) -> OaiHarvest {
    let mut result = OaiHarvest::default();
    let mut token: Option<String> = None;

    log::info!(
        "[{}] Harvesting set {} from {} ({})",
        config.label,
        config.set,
        config.endpoint,
        config.metadata_prefix
    );

    loop {
        result.pages += 1;
        let response = match &token {
            None => {
                client
                    .get(
                        config.endpoint,
                        &[
                            ("verb", "ListRecords"),
                            ("metadataPrefix", config.metadata_prefix),
                            ("set", config.set),
                        ],
                    )
                    .await
            }
            Some(token) => {
                client
                    .get(
                        config.endpoint,
                        &[("verb", "ListRecords"), ("resumptionToken", token.as_str())],
                    )
                    .await
            }
        };

        let response = match response {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                result.aborted = Some(format!("HTTP {}", response.status));
                break;
            }
            Err(e) => {
                result.aborted = Some(e.to_string());
                break;
            }
        };

        let page = match parse_list_records(&response.body) {
            Ok(page) => page,
            Err(e) => {
                result.aborted = Some(e.to_string());
                break;
            }
        };

        if let Some(error) = page.error {
            if error.code == NO_RECORDS_MATCH {
                log::info!("[{}] Set {} has no records", config.label, config.set);
            } else {
                result.aborted = Some(format!("OAI error {}: {}", error.code, error.message));
            }
            break;
        }

        let mut kept = 0usize;
        for record in page.records {
            if record.deleted {
                log::debug!(
                    "[{}] Skipping deleted record {}",
                    config.label,
                    record.identifier
                );
                result.deleted_skipped += 1;
                continue;
            }
            result.records.push(map_dublin_core(&record.fields));
            kept += 1;
        }

        match page.complete_list_size {
            Some(size) => log::info!(
                "[{}] Page {}: {kept} records ({} of {size})",
                config.label,
                result.pages,
                result.records.len()
            ),
            None => log::info!(
                "[{}] Page {}: {kept} records (total: {})",
                config.label,
                result.pages,
                result.records.len()
            ),
        }

        match page.resumption_token {
            Some(next) if token.as_deref() == Some(next.as_str()) => {
                result.aborted = Some(format!("provider repeated resumption token {next}"));
                break;
            }
            Some(next) => token = Some(next),
            None => break,
        }
    }

    if let Some(reason) = &result.aborted {
        log::error!(
            "[{}] Harvest aborted after {} page(s): {reason}",
            config.label,
            result.pages
        );
    }

    log::info!(
        "[{}] Harvested {} records ({} deleted skipped)",
        config.label,
        result.records.len(),
        result.deleted_skipped
    );

    result
}

/// Harvests the set and writes the records as a JSON array to `output`.
///
/// The file is written even when the traversal was aborted, containing
/// whatever was collected (possibly nothing).
///
/// # Errors
///
/// Returns [`HarvestError`] only if the output file cannot be written.
pub async fn harvest_oai_to_file<C: HttpClient>(
    client: &C,
    config: &OaiConfig<'_>,
    output: &Path,
) -> Result<OaiHarvest, HarvestError> {
    let result = harvest_oai(client, config).await;
    write_json(output, &result.records)?;
    log::info!(
        "[{}] Wrote {} records to {}",
        config.label,
        result.records.len(),
        output.display()
    );
    Ok(result)
}
