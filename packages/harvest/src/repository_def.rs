//! Config-driven repository definition.
//!
//! [`RepositoryDefinition`] captures everything that differs between the
//! harvested repositories: OAI-PMH endpoint and set, the optional search
//! API, whether records are versioned, and where usage counters come from.

use pubmetrics_record_models::Publisher;
use serde::Deserialize;

use crate::oai_pmh::OaiConfig;
use crate::search_api::SearchApiConfig;

const fn default_page_size() -> u32 {
    100
}

const fn default_delay_ms() -> u64 {
    100
}

fn default_metadata_prefix() -> String {
    "oai_dc".to_owned()
}

/// A harvested repository.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryDefinition {
    /// Unique identifier, also used in file names (e.g. `"pangaea"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Publisher attributed to every record harvested from here.
    pub publisher: Publisher,
    /// Whether every upload version gets its own identifier, with the
    /// shared concept identifier as the last `relation` entry.
    #[serde(default)]
    pub versioned: bool,
    pub oai: OaiSettings,
    #[serde(default)]
    pub search_api: Option<SearchApiSettings>,
    pub usage: UsageSource,
}

/// OAI-PMH harvesting settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OaiSettings {
    pub endpoint: String,
    pub set: String,
    #[serde(default = "default_metadata_prefix")]
    pub metadata_prefix: String,
}

/// Records search API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchApiSettings {
    pub url: String,
    pub community: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Where per-record usage counters come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UsageSource {
    /// Counters are embedded in the search API hits.
    SearchApi,
    /// One `{doi}?format=statistics` request per harvested record.
    StatisticsEndpoint {
        /// Prefix for identifiers that are bare DOIs rather than URLs.
        #[serde(default)]
        resolver_url: Option<String>,
        /// Pause between consecutive requests.
        #[serde(default = "default_delay_ms")]
        delay_ms: u64,
    },
}

impl RepositoryDefinition {
    /// Returns the repository identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// OAI-PMH harvest configuration for this repository.
    #[must_use]
    pub fn oai_config(&self) -> OaiConfig<'_> {
        OaiConfig {
            endpoint: &self.oai.endpoint,
            set: &self.oai.set,
            metadata_prefix: &self.oai.metadata_prefix,
            label: &self.name,
        }
    }

    /// Search API configuration, if the repository has one.
    #[must_use]
    pub fn search_api_config(&self) -> Option<SearchApiConfig<'_>> {
        self.search_api.as_ref().map(|api| SearchApiConfig {
            base_url: &api.url,
            community: &api.community,
            page_size: api.page_size,
            label: &self.name,
        })
    }
}

/// Parses a repository definition from TOML.
///
/// # Errors
///
/// Returns [`toml::de::Error`] if the TOML is malformed or fields are
/// missing.
pub fn parse_repository_toml(toml_str: &str) -> Result<RepositoryDefinition, toml::de::Error> {
    toml::from_str(toml_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_definition_with_defaults() {
        let def = parse_repository_toml(
            r#"
            id = "example"
            name = "Example"
            publisher = "PANGAEA"

            [oai]
            endpoint = "https://example.org/oai"
            set = "s"

            [usage]
            type = "statistics_endpoint"
            "#,
        )
        .unwrap();

        assert_eq!(def.publisher, Publisher::Pangaea);
        assert!(!def.versioned);
        assert_eq!(def.oai.metadata_prefix, "oai_dc");
        assert!(def.search_api_config().is_none());
        assert_eq!(
            def.usage,
            UsageSource::StatisticsEndpoint {
                resolver_url: None,
                delay_ms: 100,
            }
        );
    }

    #[test]
    fn builds_harvest_configs() {
        let def = parse_repository_toml(
            r#"
            id = "zen"
            name = "Zen"
            publisher = "Zenodo"
            versioned = true

            [oai]
            endpoint = "https://zen.example/oai2d"
            set = "user-x"

            [search_api]
            url = "https://zen.example/api/records/"
            community = "x"

            [usage]
            type = "search_api"
            "#,
        )
        .unwrap();

        let oai = def.oai_config();
        assert_eq!(oai.set, "user-x");
        assert_eq!(oai.label, "Zen");

        let api = def.search_api_config().unwrap();
        assert_eq!(api.community, "x");
        assert_eq!(api.page_size, 100);
    }

    #[test]
    fn rejects_unknown_publisher() {
        let result = parse_repository_toml(
            r#"
            id = "f"
            name = "F"
            publisher = "figshare"
            [oai]
            endpoint = "https://f.example/oai"
            set = "s"
            [usage]
            type = "search_api"
            "#,
        );
        assert!(result.is_err());
    }
}
