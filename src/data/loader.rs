//! Load dataset files into a uniform in-memory sequence.
//! Accepts either a bare JSON array of records or the `{ metadata, names }`
//! wrapper; downstream stages never branch on input shape.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::data::record::{DatasetMetadata, NameRecord, NamesFile};

#[derive(Debug)]
pub enum LoadError {
    Read(PathBuf, std::io::Error),
    Parse(PathBuf, serde_json::Error),
    /// Valid JSON, but neither a record array nor an object with a `names` list.
    UnrecognizedShape(PathBuf),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(path, err) => write!(f, "failed to read '{}': {err}", path.display()),
            Self::Parse(path, err) => {
                write!(f, "failed to parse JSON '{}': {err}", path.display())
            }
            Self::UnrecognizedShape(path) => write!(
                f,
                "'{}': expected a JSON array of records or {{ \"names\": [...] }}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for LoadError {}

/// Parse one dataset file. Wrapper metadata defaults to empty for bare arrays.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<NamesFile, LoadError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|err| LoadError::Read(path.to_path_buf(), err))?;
    parse_dataset(&raw, path)
}

fn parse_dataset(raw: &str, path: &Path) -> Result<NamesFile, LoadError> {
    let payload: Value =
        serde_json::from_str(raw).map_err(|err| LoadError::Parse(path.to_path_buf(), err))?;

    if let Some(names) = payload.as_array() {
        let names = records_from_values(names, path)?;
        return Ok(NamesFile {
            metadata: DatasetMetadata::default(),
            names,
        });
    }

    if let Some(object) = payload.as_object() {
        if let Some(names) = object.get("names").and_then(Value::as_array) {
            let metadata = object
                .get("metadata")
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|err| LoadError::Parse(path.to_path_buf(), err))?
                .unwrap_or_default();
            let names = records_from_values(names, path)?;
            return Ok(NamesFile { metadata, names });
        }
    }

    Err(LoadError::UnrecognizedShape(path.to_path_buf()))
}

fn records_from_values(values: &[Value], path: &Path) -> Result<Vec<NameRecord>, LoadError> {
    values
        .iter()
        .map(|value| {
            serde_json::from_value(value.clone())
                .map_err(|err| LoadError::Parse(path.to_path_buf(), err))
        })
        .collect()
}

/// Load several dataset files and flatten them into one sequence.
/// Metadata keys from earlier files win over later ones.
pub fn load_datasets(paths: &[PathBuf]) -> Result<NamesFile, LoadError> {
    let mut merged = NamesFile::default();
    for path in paths {
        let file = load_dataset(path)?;
        merged.names.extend(file.names);
        merge_metadata(&mut merged.metadata, file.metadata);
    }
    Ok(merged)
}

fn merge_metadata(into: &mut DatasetMetadata, from: DatasetMetadata) {
    if into.total_names.is_none() {
        into.total_names = from.total_names;
    }
    if into.description.is_none() {
        into.description = from.description;
    }
    if into.last_updated.is_none() {
        into.last_updated = from.last_updated;
    }
    for (key, value) in from.extra {
        into.extra.entry(key).or_insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<NamesFile, LoadError> {
        parse_dataset(raw, Path::new("test.json"))
    }

    #[test]
    fn loads_bare_array() {
        let file = parse("[{\"name\":\"Noah\"},{\"name\":\"Liam\"}]").unwrap();
        assert_eq!(file.names.len(), 2);
        assert_eq!(file.metadata, DatasetMetadata::default());
    }

    #[test]
    fn loads_wrapper_object_with_metadata() {
        let file = parse(
            "{\"metadata\":{\"totalNames\":1,\"description\":\"d\"},\"names\":[{\"name\":\"Emma\"}]}",
        )
        .unwrap();
        assert_eq!(file.names.len(), 1);
        assert_eq!(file.metadata.total_names, Some(1));
        assert_eq!(file.metadata.description.as_deref(), Some("d"));
    }

    #[test]
    fn rejects_unrecognized_shape() {
        let err = parse("{\"records\":[]}").unwrap_err();
        assert!(matches!(err, LoadError::UnrecognizedShape(_)));
    }

    #[test]
    fn rejects_invalid_json() {
        let err = parse("{not json").unwrap_err();
        assert!(matches!(err, LoadError::Parse(_, _)));
    }
}
