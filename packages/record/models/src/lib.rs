#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for harvested publication metadata.
//!
//! Harvesters write [`HarvestedRecord`]s (every field list-valued) to dated
//! JSON files. The normalizer turns them into [`DatasetRecord`]s with true
//! field cardinality, and the usage collector produces [`UsageStats`] that
//! are persisted as a column-oriented [`UsageTable`].

pub mod record;
pub mod usage;

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use record::{DatasetRecord, FieldValue, HarvestedRecord};
pub use usage::{UsageCounts, UsageStats, UsageTable};

/// The repository a record was published in.
///
/// Ordered alphabetically by display name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Publisher {
    /// PANGAEA, an OAI-PMH data publisher for earth and environmental science.
    #[serde(rename = "PANGAEA")]
    #[strum(serialize = "PANGAEA", ascii_case_insensitive)]
    Pangaea,
    /// Zenodo, a REST-API archive with versioned objects.
    #[serde(rename = "Zenodo")]
    #[strum(serialize = "Zenodo", ascii_case_insensitive)]
    Zenodo,
}

impl Publisher {
    /// All known publishers, in report order.
    pub const ALL: &[Self] = &[Self::Pangaea, Self::Zenodo];
}

/// The calendar date that names every dated input and output file.
///
/// Parsed from and displayed as `yyyymmdd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HarvestDate(NaiveDate);

impl HarvestDate {
    /// Today's date in the local time zone.
    #[must_use]
    pub fn today() -> Self {
        Self(chrono::Local::now().date_naive())
    }

    /// The underlying calendar date.
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }
}

impl std::fmt::Display for HarvestDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d"))
    }
}

impl FromStr for HarvestDate {
    type Err = InvalidHarvestDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidHarvestDateError {
                value: s.to_owned(),
            });
        }
        NaiveDate::parse_from_str(s, "%Y%m%d")
            .map(Self)
            .map_err(|_| InvalidHarvestDateError {
                value: s.to_owned(),
            })
    }
}

/// Error returned when a string is not a valid `yyyymmdd` date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidHarvestDateError {
    /// The rejected input.
    pub value: String,
}

impl std::fmt::Display for InvalidHarvestDateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid date '{}': expected yyyymmdd", self.value)
    }
}

impl std::error::Error for InvalidHarvestDateError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publisher_display_matches_repository_names() {
        assert_eq!(Publisher::Zenodo.to_string(), "Zenodo");
        assert_eq!(Publisher::Pangaea.to_string(), "PANGAEA");
    }

    #[test]
    fn publisher_parses_case_insensitively() {
        assert_eq!(Publisher::from_str("pangaea").unwrap(), Publisher::Pangaea);
        assert_eq!(Publisher::from_str("ZENODO").unwrap(), Publisher::Zenodo);
        assert!(Publisher::from_str("figshare").is_err());
    }

    #[test]
    fn publisher_serializes_as_repository_name() {
        let json = serde_json::to_string(&Publisher::Pangaea).unwrap();
        assert_eq!(json, "\"PANGAEA\"");
    }

    #[test]
    fn harvest_date_round_trips_through_display() {
        let date: HarvestDate = "20260210".parse().unwrap();
        assert_eq!(date.date(), NaiveDate::from_ymd_opt(2026, 2, 10).unwrap());
        assert_eq!(date.to_string(), "20260210");
    }

    #[test]
    fn harvest_date_rejects_other_formats() {
        assert!("2026-02-10".parse::<HarvestDate>().is_err());
        assert!("20261310".parse::<HarvestDate>().is_err());
        assert!("2026021".parse::<HarvestDate>().is_err());
    }
}
