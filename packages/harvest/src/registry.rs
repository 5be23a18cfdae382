//! Repository registry. Loads all repository definitions from embedded
//! TOML configs.
//!
//! Each `.toml` file in `packages/harvest/repositories/` is baked into the
//! binary at compile time via [`include_str!`].

use crate::repository_def::{RepositoryDefinition, parse_repository_toml};

/// TOML configs embedded at compile time.
const REPOSITORY_TOMLS: &[(&str, &str)] = &[
    ("zenodo", include_str!("../repositories/zenodo.toml")),
    ("pangaea", include_str!("../repositories/pangaea.toml")),
];

/// Environment variable holding a comma-separated repository filter.
pub const REPOSITORIES_ENV: &str = "PUBMETRICS_REPOSITORIES";

/// Returns all configured repository definitions.
///
/// # Panics
///
/// Panics if any embedded TOML config is malformed.
#[must_use]
pub fn all_repositories() -> Vec<RepositoryDefinition> {
    REPOSITORY_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_repository_toml(toml)
                .unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns the repositories to process, filtered by the `--repositories`
/// CLI flag or the [`REPOSITORIES_ENV`] environment variable. If neither is
/// set, all repositories are returned.
#[must_use]
pub fn enabled_repositories(cli_filter: Option<String>) -> Vec<RepositoryDefinition> {
    let filter = cli_filter.or_else(|| std::env::var(REPOSITORIES_ENV).ok());

    let all = all_repositories();

    let Some(filter_str) = filter else {
        return all;
    };

    let ids: Vec<&str> = filter_str.split(',').map(str::trim).collect();

    let filtered: Vec<RepositoryDefinition> =
        all.into_iter().filter(|r| ids.contains(&r.id())).collect();

    if filtered.is_empty() {
        log::warn!(
            "No matching repositories found for filter {:?}. Available: {}",
            ids,
            all_repositories()
                .iter()
                .map(|r| r.id().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    filtered
}
