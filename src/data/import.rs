//! Import external source lists into the raw record shape.
//!
//! Two source forms: JSON records of `(name, country, rank, sex)` from the
//! demographics provider, and CSV exports of national rank tables
//! (columns located by header name, not position).

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::record::{NameRecord, GENDER_FEMALE, GENDER_MALE};

#[derive(Debug)]
pub enum ImportError {
    Read(PathBuf, std::io::Error),
    Parse(PathBuf, serde_json::Error),
    Csv(PathBuf, csv::Error),
    MissingColumn(PathBuf, &'static str),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(path, err) => {
                write!(f, "failed to read source '{}': {err}", path.display())
            }
            Self::Parse(path, err) => {
                write!(f, "failed to parse source JSON '{}': {err}", path.display())
            }
            Self::Csv(path, err) => {
                write!(f, "failed to parse source CSV '{}': {err}", path.display())
            }
            Self::MissingColumn(path, column) => {
                write!(f, "'{}': missing required column '{column}'", path.display())
            }
        }
    }
}

impl std::error::Error for ImportError {}

/// One row from an external provider: a name's placement in one country list.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceRow {
    pub name: String,
    #[serde(default, alias = "country_code", alias = "countryCode")]
    pub country: Option<String>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default, alias = "gender")]
    pub sex: Option<String>,
}

/// Wrapper shapes providers use; flattened at the boundary.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourceExport {
    Rows(Vec<SourceRow>),
    Named { names: Vec<SourceRow> },
    Data { data: Vec<SourceRow> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub source_path: String,
    pub total_rows: usize,
    pub imported: usize,
    /// Rows without a usable name.
    pub skipped: usize,
}

/// Import a JSON source list. Rows without a country fall back to
/// `default_country`; rows without a rank get the next position in file order.
pub fn import_json_source(
    path: impl AsRef<Path>,
    default_country: &str,
) -> Result<(Vec<NameRecord>, ImportReport), ImportError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|err| ImportError::Read(path.to_path_buf(), err))?;
    let export: SourceExport =
        serde_json::from_str(&raw).map_err(|err| ImportError::Parse(path.to_path_buf(), err))?;
    let rows = match export {
        SourceExport::Rows(rows) => rows,
        SourceExport::Named { names } => names,
        SourceExport::Data { data } => data,
    };
    Ok(rows_to_records(rows, default_country, path))
}

/// Import a CSV rank table. Requires a `name` column; `rank`, `sex`, and
/// `country` are optional and located by header name.
pub fn import_csv_source(
    path: impl AsRef<Path>,
    default_country: &str,
) -> Result<(Vec<NameRecord>, ImportReport), ImportError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|err| ImportError::Csv(path.to_path_buf(), err))?;

    let headers = reader
        .headers()
        .map_err(|err| ImportError::Csv(path.to_path_buf(), err))?
        .clone();
    let find = |column: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(column))
    };
    let name_col = find("name").ok_or(ImportError::MissingColumn(path.to_path_buf(), "name"))?;
    let rank_col = find("rank");
    let sex_col = find("sex").or_else(|| find("gender"));
    let country_col = find("country").or_else(|| find("country_code"));

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|err| ImportError::Csv(path.to_path_buf(), err))?;
        let cell = |col: Option<usize>| {
            col.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        rows.push(SourceRow {
            name: cell(Some(name_col)).unwrap_or_default(),
            country: cell(country_col),
            rank: cell(rank_col).and_then(|s| s.parse().ok()),
            sex: cell(sex_col),
        });
    }
    Ok(rows_to_records(rows, default_country, path))
}

fn rows_to_records(
    rows: Vec<SourceRow>,
    default_country: &str,
    path: &Path,
) -> (Vec<NameRecord>, ImportReport) {
    let total_rows = rows.len();
    let mut records = Vec::with_capacity(total_rows);
    let mut skipped = 0usize;
    let mut next_rank = 0u32;

    for row in rows {
        next_rank += 1;
        if row.name.trim().is_empty() {
            skipped += 1;
            continue;
        }
        let country = row
            .country
            .unwrap_or_else(|| default_country.to_string())
            .to_uppercase();
        let rank = row.rank.unwrap_or(next_rank);

        let mut record = NameRecord::new(row.name.trim());
        record.countries = BTreeMap::from([(country, rank)]);
        record.appearances = 1;
        record.gender = gender_mass(row.sex.as_deref());
        records.push(record);
    }

    let report = ImportReport {
        source_path: path.display().to_string(),
        total_rows,
        imported: records.len(),
        skipped,
    };
    (records, report)
}

fn gender_mass(sex: Option<&str>) -> BTreeMap<String, f64> {
    let mut mass = BTreeMap::new();
    match sex.map(str::trim) {
        Some(s) if s.eq_ignore_ascii_case("m") || s.eq_ignore_ascii_case("male") => {
            mass.insert(GENDER_MALE.to_string(), 1.0);
        }
        Some(s) if s.eq_ignore_ascii_case("f") || s.eq_ignore_ascii_case("female") => {
            mass.insert(GENDER_FEMALE.to_string(), 1.0);
        }
        _ => {
            mass.insert(GENDER_MALE.to_string(), 0.5);
            mass.insert(GENDER_FEMALE.to_string(), 0.5);
        }
    }
    mass
}
