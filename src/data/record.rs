//! Canonical name record schema. Written by the pipeline, loaded by every stage.
//! Field names match the persisted JSON the web front end consumes (camelCase).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const GENDER_MALE: &str = "Male";
pub const GENDER_FEMALE: &str = "Female";

/// One name entry with its aggregated demographic and popularity attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameRecord {
    /// Canonical display form: Title-case, single word, Latin letters only.
    pub name: String,
    /// Relative probability mass per gender key ("Male"/"Female"). Values >= 0.
    #[serde(default)]
    pub gender: BTreeMap<String, f64>,
    /// Country code -> in-country popularity rank (lower = more popular).
    #[serde(default)]
    pub countries: BTreeMap<String, u32>,
    /// Number of source countries the name occurred in; kept equal to countries.len().
    #[serde(default)]
    pub appearances: usize,
    #[serde(default, rename = "popularityScore")]
    pub popularity_score: f64,
    /// Dense 1-based rank over the full ranked set. Absent on raw records.
    #[serde(
        default,
        rename = "popularityRank",
        skip_serializing_if = "Option::is_none"
    )]
    pub popularity_rank: Option<u32>,
    /// Alternate spellings folded into this record. Sorted, never contains `name`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
    /// Original hyphenated form when this record was derived by splitting.
    #[serde(default, rename = "splitFrom", skip_serializing_if = "Option::is_none")]
    pub split_from: Option<String>,
}

impl NameRecord {
    pub fn new(name: impl Into<String>) -> Self {
        NameRecord {
            name: name.into(),
            gender: BTreeMap::new(),
            countries: BTreeMap::new(),
            appearances: 0,
            popularity_score: 0.0,
            popularity_rank: None,
            variants: Vec::new(),
            split_from: None,
        }
    }

    /// Grouping key for deduplication.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Top-level metadata block of a persisted dataset file. Unknown keys are
/// preserved round-trip via `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(
        default,
        rename = "totalNames",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_names: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "lastUpdated",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Persisted dataset file: `{ "metadata": {...}, "names": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamesFile {
    #[serde(default)]
    pub metadata: DatasetMetadata,
    pub names: Vec<NameRecord>,
}
