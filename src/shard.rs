//! Split the globally ranked sequence into contiguous shard files plus an
//! index describing their boundaries.
//!
//! The non-overlap/no-gap invariant is checked up front and again on the
//! computed boundaries; a violation aborts the run instead of shipping a
//! database that needs a repair pass.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::record::NameRecord;

pub const SHARD_INDEX_VERSION: &str = "2.0.0";

/// Partitioning policy for the ranked sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum ShardPolicy {
    /// A fast-loading head shard ("core") plus `tail_count` near-equal tail shards.
    HeadPlusTails { head_size: usize, tail_count: usize },
    /// Fixed-size shards of `shard_size` records each (last one may be short).
    FixedSize { shard_size: usize },
}

impl Default for ShardPolicy {
    fn default() -> Self {
        ShardPolicy::HeadPlusTails {
            head_size: 1000,
            tail_count: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardError {
    EmptyDataset,
    /// Input ranks are not the dense sequence 1..N.
    RankGap { position: usize, expected: u32, found: Option<u32> },
    /// Computed boundaries would overlap or leave a hole between shards.
    PartitionOverlap { shard: String, start_rank: u32, expected: u32 },
}

impl fmt::Display for ShardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDataset => write!(f, "cannot shard an empty dataset"),
            Self::RankGap {
                position,
                expected,
                found,
            } => match found {
                Some(found) => write!(
                    f,
                    "rank sequence not dense at position {position}: expected {expected}, found {found}"
                ),
                None => write!(
                    f,
                    "rank sequence not dense at position {position}: expected {expected}, found unranked record"
                ),
            },
            Self::PartitionOverlap {
                shard,
                start_rank,
                expected,
            } => write!(
                f,
                "shard '{shard}' starts at rank {start_rank}, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for ShardError {}

/// One computed shard: a contiguous slice of the ranked sequence.
#[derive(Debug, Clone)]
pub struct Shard {
    pub id: String,
    pub file: String,
    pub start_rank: u32,
    pub end_rank: u32,
    pub records: Vec<NameRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardIndexEntry {
    pub file: String,
    pub count: usize,
    #[serde(rename = "startRank")]
    pub start_rank: u32,
    #[serde(rename = "endRank")]
    pub end_rank: u32,
}

/// Persisted shard index: `{ "version", "totalNames", "chunks": { id: ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardIndex {
    pub version: String,
    #[serde(rename = "totalNames")]
    pub total_names: usize,
    pub chunks: BTreeMap<String, ShardIndexEntry>,
}

/// Compute shards for an already ranked sequence. The concatenation of the
/// returned shards reproduces the input exactly.
pub fn shard_records(records: &[NameRecord], policy: ShardPolicy) -> Result<Vec<Shard>, ShardError> {
    if records.is_empty() {
        return Err(ShardError::EmptyDataset);
    }
    ensure_dense_ranks(records)?;

    let sizes = shard_sizes(records.len(), policy);
    let mut shards = Vec::with_capacity(sizes.len());
    let mut offset = 0usize;
    for (id, size) in sizes {
        if size == 0 {
            continue;
        }
        let slice = &records[offset..offset + size];
        shards.push(Shard {
            file: format!("names-{id}.json"),
            id,
            start_rank: offset as u32 + 1,
            end_rank: (offset + size) as u32,
            records: slice.to_vec(),
        });
        offset += size;
    }

    verify_boundaries(&shards, records.len())?;
    Ok(shards)
}

/// Shard ids and sizes in sequence order.
fn shard_sizes(total: usize, policy: ShardPolicy) -> Vec<(String, usize)> {
    match policy {
        ShardPolicy::HeadPlusTails {
            head_size,
            tail_count,
        } => {
            let head = head_size.min(total);
            let mut sizes = vec![("core".to_string(), head)];
            let remaining = total - head;
            let tails = tail_count.max(1);
            let per_tail = remaining / tails;
            let leftover = remaining % tails;
            for i in 0..tails {
                // Earlier tails absorb the remainder so sizes differ by at most one.
                let size = per_tail + usize::from(i < leftover);
                sizes.push((format!("chunk{}", i + 1), size));
            }
            sizes
        }
        ShardPolicy::FixedSize { shard_size } => {
            let size = shard_size.max(1);
            let count = total.div_ceil(size);
            (0..count)
                .map(|i| {
                    let this = size.min(total - i * size);
                    (format!("chunk{}", i + 1), this)
                })
                .collect()
        }
    }
}

fn ensure_dense_ranks(records: &[NameRecord]) -> Result<(), ShardError> {
    for (position, record) in records.iter().enumerate() {
        let expected = position as u32 + 1;
        if record.popularity_rank != Some(expected) {
            return Err(ShardError::RankGap {
                position,
                expected,
                found: record.popularity_rank,
            });
        }
    }
    Ok(())
}

/// Post-condition: shards are contiguous from rank 1 through N with no
/// overlap and no hole.
fn verify_boundaries(shards: &[Shard], total: usize) -> Result<(), ShardError> {
    let mut expected = 1u32;
    for shard in shards {
        if shard.start_rank != expected {
            return Err(ShardError::PartitionOverlap {
                shard: shard.id.clone(),
                start_rank: shard.start_rank,
                expected,
            });
        }
        expected = shard.end_rank + 1;
    }
    if expected != total as u32 + 1 {
        return Err(ShardError::PartitionOverlap {
            shard: "<end>".to_string(),
            start_rank: expected,
            expected: total as u32 + 1,
        });
    }
    Ok(())
}

/// Build the persisted index for a computed shard list.
pub fn build_index(shards: &[Shard]) -> ShardIndex {
    let total_names = shards.iter().map(|s| s.records.len()).sum();
    let chunks = shards
        .iter()
        .map(|shard| {
            (
                shard.id.clone(),
                ShardIndexEntry {
                    file: shard.file.clone(),
                    count: shard.records.len(),
                    start_rank: shard.start_rank,
                    end_rank: shard.end_rank,
                },
            )
        })
        .collect();
    ShardIndex {
        version: SHARD_INDEX_VERSION.to_string(),
        total_names,
        chunks,
    }
}
