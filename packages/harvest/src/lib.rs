#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Metadata harvesters for scholarly repositories.
//!
//! Two harvesting strategies are provided:
//!
//! - [`search_api`]: page-numbered REST search endpoints (Zenodo records
//!   API), used for usage counters embedded in the hits.
//! - [`oai_pmh`]: OAI-PMH `ListRecords` traversal with resumption tokens,
//!   mapping Dublin Core metadata into [`HarvestedRecord`]s.
//!
//! Every network call goes through an explicit [`http::HttpClient`] so that
//! harvesters can be exercised against scripted responses. Repositories are
//! configured by TOML definitions embedded in [`registry`].
//!
//! [`HarvestedRecord`]: pubmetrics_record_models::HarvestedRecord

pub mod http;
pub mod oai_pmh;
pub mod oai_xml;
pub mod progress;
pub mod registry;
pub mod repository_def;
pub mod search_api;
pub mod storage;

use std::path::PathBuf;

/// Errors that can occur while harvesting or persisting metadata.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A repository definition could not be parsed.
    #[error("Repository config error: {0}")]
    Config(#[from] toml::de::Error),

    /// An OAI-PMH response was not well-formed XML.
    #[error("XML parse error: {message}")]
    Xml {
        /// Description of what went wrong.
        message: String,
    },

    /// A dated input file from an earlier run does not exist.
    #[error("Input file not found: {}", path.display())]
    MissingInput {
        /// The expected location of the file.
        path: PathBuf,
    },
}
