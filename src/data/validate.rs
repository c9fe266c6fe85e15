//! Structural validation of produced datasets: the invariants the old script
//! family used to repair after the fact are checked up front here.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::data::loader::{load_dataset, LoadError};
use crate::data::record::NameRecord;
use crate::shard::ShardIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }
}

/// Check the record-set invariants: dense unique ranks, score ordering,
/// canonical name shape, unique lowercase names, non-negative gender mass,
/// appearances consistency, variants not echoing the canonical name.
pub fn validate_records(records: &[NameRecord]) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen_names = HashSet::new();
    let mut seen_ranks = HashSet::new();
    let ranked = records.iter().any(|r| r.popularity_rank.is_some());

    for (index, record) in records.iter().enumerate() {
        let context = format!("names[{index}] '{}'", record.name);

        if record.name.is_empty() || !record.name.chars().all(|c| c.is_ascii_alphabetic()) {
            report.push(
                ValidationSeverity::Error,
                context.clone(),
                "name is not a single Latin-letter word",
            );
        }

        if !seen_names.insert(record.name.to_lowercase()) {
            report.push(
                ValidationSeverity::Error,
                context.clone(),
                "duplicate name (case-insensitive)",
            );
        }

        for (key, value) in &record.gender {
            if *value < 0.0 {
                report.push(
                    ValidationSeverity::Error,
                    context.clone(),
                    format!("negative gender mass for '{key}'"),
                );
            }
        }

        if record.appearances != record.countries.len() {
            report.push(
                ValidationSeverity::Warning,
                context.clone(),
                format!(
                    "appearances={} but countries={}",
                    record.appearances,
                    record.countries.len()
                ),
            );
        }

        let canonical_lower = record.name.to_lowercase();
        if record
            .variants
            .iter()
            .any(|v| v.to_lowercase() == canonical_lower)
        {
            report.push(
                ValidationSeverity::Error,
                context.clone(),
                "variants contain the canonical name",
            );
        }

        if ranked {
            match record.popularity_rank {
                Some(rank) => {
                    if !seen_ranks.insert(rank) {
                        report.push(
                            ValidationSeverity::Error,
                            context.clone(),
                            format!("duplicate popularityRank {rank}"),
                        );
                    }
                }
                None => report.push(
                    ValidationSeverity::Error,
                    context.clone(),
                    "missing popularityRank in a ranked dataset",
                ),
            }
        }
    }

    if ranked {
        let total = records.len() as u32;
        for expected in 1..=total {
            if !seen_ranks.contains(&expected) {
                report.push(
                    ValidationSeverity::Error,
                    "names",
                    format!("rank {expected} missing; ranks are not dense 1..{total}"),
                );
            }
        }

        for window in records.windows(2) {
            if window[0].popularity_score < window[1].popularity_score {
                report.push(
                    ValidationSeverity::Warning,
                    format!("names '{}'/'{}'", window[0].name, window[1].name),
                    "file order is not descending by popularityScore",
                );
                break;
            }
        }
    } else if !records.is_empty() {
        report.push(
            ValidationSeverity::Info,
            "names",
            "dataset is unranked; rank invariants skipped",
        );
    }

    report
}

/// Load a dataset file and validate its records.
pub fn validate_dataset_file(path: impl AsRef<Path>) -> Result<ValidationReport, LoadError> {
    let file = load_dataset(path)?;
    Ok(validate_records(&file.names))
}

/// Check a shard index against its shard files: contiguous boundaries,
/// existing files, matching record counts and rank spans.
pub fn validate_shard_coverage(index: &ShardIndex, shard_dir: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();

    let mut entries: Vec<(&String, &crate::shard::ShardIndexEntry)> = index.chunks.iter().collect();
    entries.sort_by_key(|(_, entry)| entry.start_rank);

    let mut expected = 1u32;
    let mut covered = 0usize;
    for (id, entry) in entries {
        let context = format!("chunks['{id}']");
        if entry.start_rank != expected {
            report.push(
                ValidationSeverity::Error,
                context.clone(),
                format!("starts at rank {}, expected {expected}", entry.start_rank),
            );
        }
        if entry.end_rank < entry.start_rank {
            report.push(
                ValidationSeverity::Error,
                context.clone(),
                "endRank precedes startRank",
            );
        }
        let span = (entry.end_rank - entry.start_rank + 1) as usize;
        if span != entry.count {
            report.push(
                ValidationSeverity::Error,
                context.clone(),
                format!("count={} but rank span is {span}", entry.count),
            );
        }
        expected = entry.end_rank + 1;
        covered += entry.count;

        let shard_path = shard_dir.join(&entry.file);
        match load_dataset(&shard_path) {
            Ok(file) => {
                if file.names.len() != entry.count {
                    report.push(
                        ValidationSeverity::Error,
                        context.clone(),
                        format!(
                            "file has {} records, index says {}",
                            file.names.len(),
                            entry.count
                        ),
                    );
                }
                let first = file.names.first().and_then(|r| r.popularity_rank);
                if first != Some(entry.start_rank) {
                    report.push(
                        ValidationSeverity::Error,
                        context,
                        format!("first record rank {first:?} != startRank {}", entry.start_rank),
                    );
                }
            }
            Err(err) => {
                report.push(ValidationSeverity::Error, context, err.to_string());
            }
        }
    }

    if covered != index.total_names {
        report.push(
            ValidationSeverity::Error,
            "chunks",
            format!(
                "chunks cover {covered} records, index totalNames is {}",
                index.total_names
            ),
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(n: usize) -> Vec<NameRecord> {
        (1..=n)
            .map(|i| {
                let suffix = (b'a' + (i as u8 - 1) % 26) as char;
                let mut rec = NameRecord::new(format!("Name{suffix}"));
                rec.popularity_rank = Some(i as u32);
                rec.popularity_score = (n - i) as f64;
                rec
            })
            .collect()
    }

    #[test]
    fn clean_ranked_dataset_passes() {
        let report = validate_records(&ranked(5));
        assert!(!report.has_errors(), "{:?}", report.diagnostics);
    }

    #[test]
    fn duplicate_rank_is_an_error() {
        let mut records = ranked(3);
        records[2].popularity_rank = Some(2);
        let report = validate_records(&records);
        assert!(report.has_errors());
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.message.contains("duplicate popularityRank")));
    }

    #[test]
    fn duplicate_lowercase_name_is_an_error() {
        let mut records = ranked(2);
        records[1].name = "NAMEA".to_string();
        let report = validate_records(&records);
        assert!(report.has_errors());
    }

    #[test]
    fn negative_gender_mass_is_an_error() {
        let mut records = ranked(1);
        records[0].gender.insert("Male".to_string(), -0.5);
        let report = validate_records(&records);
        assert!(report.has_errors());
    }

    #[test]
    fn non_latin_name_is_an_error() {
        let mut records = ranked(1);
        records[0].name = "Anne-Marie".to_string();
        let report = validate_records(&records);
        assert!(report.has_errors());
    }

    #[test]
    fn unranked_dataset_skips_rank_checks() {
        let records = vec![NameRecord::new("Noah"), NameRecord::new("Liam")];
        let report = validate_records(&records);
        assert!(!report.has_errors(), "{:?}", report.diagnostics);
    }
}
