//! End-to-end pipeline: load -> normalize -> merge -> rank -> shard -> write.
//!
//! Each run rebuilds everything from the raw sources; no intermediate file is
//! treated as authoritative state. Outputs are written atomically, with an
//! optional timestamped backup of the previous database.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::config::{ConfigError, PipelineConfig};
use crate::data::loader::{load_datasets, LoadError};
use crate::data::record::{DatasetMetadata, NameRecord, NamesFile};
use crate::data::registry::{load_registry, register_dataset, save_registry, DEFAULT_REGISTRY_PATH};
use crate::merge::{default_equivalence_rules, merge_records, EquivalenceRules};
use crate::normalize::{
    default_denylist, default_transliterations, normalize_record, NormalizePolicy, Outcome,
};
use crate::rank::{rank_records, RankError};
use crate::shard::{build_index, shard_records, ShardError, ShardPolicy};
use crate::store::{backup_existing, write_json_atomic, write_json_pretty_atomic};

const REJECT_EXAMPLE_LIMIT: usize = 10;

#[derive(Debug)]
pub enum PipelineError {
    Config(ConfigError),
    Load(LoadError),
    Rank(RankError),
    Shard(ShardError),
    Write(std::io::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Load(err) => write!(f, "{err}"),
            Self::Rank(err) => write!(f, "{err}"),
            Self::Shard(err) => write!(f, "{err}"),
            Self::Write(err) => write!(f, "failed to write output: {err}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<LoadError> for PipelineError {
    fn from(err: LoadError) -> Self {
        Self::Load(err)
    }
}

impl From<RankError> for PipelineError {
    fn from(err: RankError) -> Self {
        Self::Rank(err)
    }
}

impl From<ShardError> for PipelineError {
    fn from(err: ShardError) -> Self {
        Self::Shard(err)
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Write(err)
    }
}

/// Per-stage counts reported after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub loaded: usize,
    pub rejected: usize,
    /// Records produced by hyphen splitting (in addition to their parents' removal).
    pub derived: usize,
    pub merged: usize,
    pub ranked: usize,
    pub shards_written: usize,
    pub rejected_by_reason: BTreeMap<String, usize>,
}

/// Normalize a raw sequence under `policy`. Returns survivors and fills in
/// rejection counts; prints a short summary with example rejects.
pub fn normalize_stage(
    records: Vec<NameRecord>,
    policy: &NormalizePolicy,
    report: &mut RunReport,
) -> Vec<NameRecord> {
    let input_count = records.len();
    let mut kept = Vec::with_capacity(records.len());
    let mut examples: Vec<String> = Vec::new();

    for record in records {
        match normalize_record(record, policy) {
            Outcome::Accepted(rec) => kept.push(rec),
            Outcome::Split(derived) => {
                report.derived += derived.len();
                kept.extend(derived);
            }
            Outcome::Rejected { name, reason } => {
                report.rejected += 1;
                *report
                    .rejected_by_reason
                    .entry(reason.as_str().to_string())
                    .or_insert(0) += 1;
                if examples.len() < REJECT_EXAMPLE_LIMIT {
                    examples.push(format!("{name:?} ({reason})"));
                }
            }
        }
    }

    if report.rejected > 0 {
        println!(
            "normalize: rejected {} of {} records",
            report.rejected, input_count
        );
        for example in &examples {
            println!("  - {example}");
        }
    }
    kept
}

/// Build the normalizer policy from configuration, loading curated tables
/// when paths are given.
pub fn normalize_policy(config: &PipelineConfig) -> Result<NormalizePolicy, PipelineError> {
    let mut policy = NormalizePolicy {
        multi_word: config.multi_word,
        hyphen: config.hyphen,
        allow_apostrophe: config.allow_apostrophe,
        denylist: default_denylist(),
        transliterations: default_transliterations(),
    };
    policy.denylist.extend(config.denylist.iter().cloned());

    if let Some(path) = &config.transliteration_table {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| PipelineError::Load(LoadError::Read(path.clone(), err)))?;
        policy.transliterations = serde_json::from_str(&raw)
            .map_err(|err| PipelineError::Load(LoadError::Parse(path.clone(), err)))?;
    }
    Ok(policy)
}

pub fn equivalence_rules(config: &PipelineConfig) -> Result<EquivalenceRules, PipelineError> {
    match &config.equivalence_table {
        Some(path) => EquivalenceRules::load(path)
            .map_err(|message| PipelineError::Config(ConfigError::Table(message))),
        None => Ok(default_equivalence_rules()),
    }
}

/// Run the full pipeline described by `config`.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunReport, PipelineError> {
    let mut report = RunReport::default();

    let input = load_datasets(&config.sources)?;
    report.loaded = input.names.len();
    println!(
        "load: {} records from {} source file(s)",
        report.loaded,
        config.sources.len()
    );

    let policy = normalize_policy(config)?;
    let normalized = normalize_stage(input.names, &policy, &mut report);

    let rules = equivalence_rules(config)?;
    let mut merged = merge_records(normalized, config.gender_merge, &rules);
    report.merged = merged.len();
    println!("merge: {} unique names", report.merged);

    rank_records(&mut merged, config.score_base)?;
    report.ranked = merged.len();
    println!("rank: assigned ranks 1..{}", report.ranked);

    let shards = shard_records(&merged, config.shard)?;
    let index = build_index(&shards);

    if config.backup {
        if let Some(backup) = backup_existing(&config.database_path)? {
            println!("backup: {}", backup.display());
        }
    }

    let database = NamesFile {
        metadata: dataset_metadata(merged.len(), "Full ranked name database"),
        names: merged,
    };
    write_json_pretty_atomic(&config.database_path, &database)?;
    println!("write: {}", config.database_path.display());

    for shard in &shards {
        let file = NamesFile {
            metadata: shard_metadata(shard),
            names: shard.records.clone(),
        };
        let path = config.output_dir.join(&shard.file);
        write_json_atomic(&path, &file)?;
    }
    report.shards_written = shards.len();

    let index_path = config.output_dir.join("names-index.json");
    write_json_pretty_atomic(&index_path, &index)?;
    println!(
        "shard: {} shard file(s) + index in {}",
        report.shards_written,
        config.output_dir.display()
    );

    let registry_path = Path::new(DEFAULT_REGISTRY_PATH);
    let mut registry = load_registry(registry_path);
    register_dataset(
        &mut registry,
        "names-database",
        "onomast pipeline",
        &config.database_path.display().to_string(),
    );
    register_dataset(
        &mut registry,
        "names-index",
        "onomast pipeline",
        &index_path.display().to_string(),
    );
    save_registry(registry_path, &registry)?;

    println!(
        "done: loaded={} rejected={} derived={} final={} shards={}",
        report.loaded, report.rejected, report.derived, report.ranked, report.shards_written
    );
    Ok(report)
}

/// Re-shard an already ranked database without touching its contents.
pub fn rechunk(
    database_path: &Path,
    output_dir: &Path,
    policy: ShardPolicy,
) -> Result<usize, PipelineError> {
    let file = crate::data::loader::load_dataset(database_path)?;
    let shards = shard_records(&file.names, policy)?;
    let index = build_index(&shards);

    for shard in &shards {
        let out = NamesFile {
            metadata: shard_metadata(shard),
            names: shard.records.clone(),
        };
        write_json_atomic(&output_dir.join(&shard.file), &out)?;
    }
    write_json_pretty_atomic(&output_dir.join("names-index.json"), &index)?;
    Ok(shards.len())
}

fn dataset_metadata(total: usize, description: &str) -> DatasetMetadata {
    DatasetMetadata {
        total_names: Some(total),
        description: Some(description.to_string()),
        last_updated: Some(Utc::now().to_rfc3339()),
        extra: BTreeMap::new(),
    }
}

fn shard_metadata(shard: &crate::shard::Shard) -> DatasetMetadata {
    let mut extra = BTreeMap::new();
    extra.insert(
        "chunk".to_string(),
        serde_json::Value::String(shard.id.clone()),
    );
    extra.insert(
        "startRank".to_string(),
        serde_json::Value::from(shard.start_rank),
    );
    extra.insert(
        "endRank".to_string(),
        serde_json::Value::from(shard.end_rank),
    );
    DatasetMetadata {
        total_names: Some(shard.records.len()),
        description: Some(format!("Name database shard: {}", shard.id)),
        last_updated: Some(Utc::now().to_rfc3339()),
        extra,
    }
}
