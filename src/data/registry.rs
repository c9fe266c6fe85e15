//! Dataset registry: source and version tracking for each produced file.
//! Written by the pipeline, read by the validator to check every referenced
//! path still exists and parses.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::store::write_json_pretty_atomic;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSetEntry {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    pub path: String,
}

pub type Registry = BTreeMap<String, DataSetEntry>;

pub const DEFAULT_REGISTRY_PATH: &str = "data/registry.json";

/// Load the registry. Returns an empty one when the file is missing or invalid.
pub fn load_registry(path: impl AsRef<Path>) -> Registry {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return Registry::new(),
    };
    serde_json::from_str(&raw).unwrap_or_default()
}

pub fn save_registry(path: impl AsRef<Path>, registry: &Registry) -> std::io::Result<()> {
    write_json_pretty_atomic(path.as_ref(), registry)
}

/// Record a produced dataset under `name`, stamping `last_updated` with now.
pub fn register_dataset(registry: &mut Registry, name: &str, source: &str, path: &str) {
    registry.insert(
        name.to_string(),
        DataSetEntry {
            source: source.to_string(),
            data_version: None,
            last_updated: Some(Utc::now().to_rfc3339()),
            path: path.to_string(),
        },
    );
}
