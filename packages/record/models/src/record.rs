//! Harvested and normalized publication records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Publisher;

/// One record as written by a harvester.
///
/// Every field is list-valued regardless of how many values the source
/// provided, so that files from different repositories share one shape.
/// Missing source fields hold a single `"No <element>"` placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestedRecord {
    /// Dublin Core `identifier`.
    #[serde(default)]
    pub doi: Vec<String>,
    /// Dublin Core `creator`.
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub title: Vec<String>,
    #[serde(default)]
    pub date: Vec<String>,
    #[serde(default)]
    pub format: Vec<String>,
    #[serde(default, rename = "type")]
    pub record_type: Vec<String>,
    #[serde(default)]
    pub coverage: Vec<String>,
    #[serde(default)]
    pub rights: Vec<String>,
    /// Related identifiers. For versioned repositories the last entry is
    /// the concept identifier shared by every version.
    #[serde(default)]
    pub relation: Vec<String>,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default)]
    pub publisher: Vec<String>,
}

/// A flattened harvested field.
///
/// A list with exactly one element becomes a [`FieldValue::Scalar`]; every
/// other list (empty or multi-valued) stays a [`FieldValue::List`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// The source provided exactly one value.
    Scalar(String),
    /// The source provided zero or several values.
    List(Vec<String>),
}

impl FieldValue {
    /// Flattens a harvested list.
    #[must_use]
    pub fn from_list(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            Self::Scalar(values.swap_remove(0))
        } else {
            Self::List(values)
        }
    }

    /// Returns `true` if this field held exactly one value.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// All values as a slice. A scalar is a one-element slice.
    #[must_use]
    pub fn values(&self) -> &[String] {
        match self {
            Self::Scalar(value) => std::slice::from_ref(value),
            Self::List(values) => values,
        }
    }

    /// The first value, if any.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.values().first().map(String::as_str)
    }

    /// The last value, if any.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.values().last().map(String::as_str)
    }

    /// Consumes the field and returns its values.
    #[must_use]
    pub fn into_values(self) -> Vec<String> {
        match self {
            Self::Scalar(value) => vec![value],
            Self::List(values) => values,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// A dated, primary-type record in the consolidated table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub doi: String,
    pub authors: Vec<String>,
    pub title: String,
    pub date: NaiveDate,
    /// Calendar year of [`Self::date`], kept for aggregation.
    pub year: i32,
    #[serde(rename = "type")]
    pub record_type: FieldValue,
    /// The repository whose harvest file this record came from.
    pub publisher: Publisher,
    pub relation: Vec<String>,
    pub rights: FieldValue,
    pub coverage: FieldValue,
    pub description: FieldValue,
    pub format: FieldValue,
}

impl DatasetRecord {
    /// The identifier shared by all versions of this record, i.e. the last
    /// entry of `relation`.
    #[must_use]
    pub fn concept_id(&self) -> Option<&str> {
        self.relation.last().map(String::as_str)
    }
}
