//! Deduplication and merging: group normalized records by case-insensitive
//! name, fold each group into one record, and absorb curated variant
//! spellings into their canonical entries.
//!
//! Variant grouping is driven only by explicit keep-together/must-separate
//! tables. Edit-distance matching is deliberately absent: it collapses
//! unrelated short names.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::record::NameRecord;

/// How to combine gender mass when merging duplicate records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenderMergePolicy {
    /// Average per key, weighted by each record's country appearances.
    #[default]
    WeightedAverage,
    Sum,
}

/// Curated spelling-equivalence rules.
/// `keep_together` folds listed spellings into their canonical name;
/// `must_separate` blocks a fold even if some other rule would apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquivalenceRules {
    #[serde(default)]
    pub keep_together: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub must_separate: HashMap<String, Vec<String>>,
}

impl EquivalenceRules {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|err| format!("unable to read '{}': {err}", path.display()))?;
        serde_json::from_str(&raw)
            .map_err(|err| format!("unable to parse '{}': {err}", path.display()))
    }

    /// Canonical spelling for `name`, when a keep-together rule maps it and no
    /// must-separate rule forbids the fold. Canonical names map to themselves.
    pub fn canonical_for(&self, name: &str) -> Option<&str> {
        for (canonical, variants) in &self.keep_together {
            let is_canonical = canonical.eq_ignore_ascii_case(name);
            let is_variant = variants.iter().any(|v| v.eq_ignore_ascii_case(name));
            if !is_canonical && !is_variant {
                continue;
            }
            if !is_canonical && self.separated(canonical, name) {
                continue;
            }
            return Some(canonical);
        }
        None
    }

    fn separated(&self, canonical: &str, name: &str) -> bool {
        self.must_separate
            .iter()
            .any(|(main, split)| {
                main.eq_ignore_ascii_case(canonical)
                    && split.iter().any(|s| s.eq_ignore_ascii_case(name))
            })
    }
}

/// Built-in rules for the most common variant clusters. A curated table from
/// configuration replaces this entirely when present.
pub fn default_equivalence_rules() -> EquivalenceRules {
    let keep_together = [
        (
            "Muhammad",
            vec!["Mohammed", "Mohammad", "Mohamed", "Muhammed", "Mohamad"],
        ),
        ("Ahmed", vec!["Ahmad", "Ahmet"]),
        ("Catherine", vec!["Katherine", "Kathryn", "Catharine"]),
        ("Stephen", vec!["Steven"]),
        ("Geoffrey", vec!["Jeffrey", "Jeffery"]),
        ("Philip", vec!["Phillip"]),
        ("Teresa", vec!["Theresa"]),
        ("Sara", vec!["Sarah"]),
        ("Eric", vec!["Erik"]),
        ("Carl", vec!["Karl"]),
        ("Christina", vec!["Kristina"]),
        ("Rebecca", vec!["Rebekah"]),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.into_iter().map(String::from).collect()))
    .collect();

    let must_separate = [
        ("Mary", vec!["Maria", "Marie", "Mia"]),
        ("James", vec!["Jaime", "Jamie", "Jim", "Jimmy"]),
        ("William", vec!["Guillermo", "Billy", "Bill", "Will"]),
        ("Elizabeth", vec!["Betty", "Liz", "Beth", "Eliza"]),
        ("Luis", vec!["Lucas", "Louis", "Luca", "Luke"]),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.into_iter().map(String::from).collect()))
    .collect();

    EquivalenceRules {
        keep_together,
        must_separate,
    }
}

/// Group by case-insensitive canonical name and fold each group into one
/// record. Output order follows first appearance of each group.
pub fn merge_records(
    records: Vec<NameRecord>,
    gender_policy: GenderMergePolicy,
    rules: &EquivalenceRules,
) -> Vec<NameRecord> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<NameRecord>> = HashMap::new();

    for record in records {
        let canonical = rules
            .canonical_for(&record.name)
            .map(str::to_string)
            .unwrap_or_else(|| record.name.clone());
        let key = canonical.to_lowercase();
        let group = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            Vec::new()
        });
        group.push(relabeled(record, canonical));
    }

    order
        .into_iter()
        .map(|key| {
            let group = groups.remove(&key).unwrap_or_default();
            merge_group(group, gender_policy)
        })
        .collect()
}

/// Rename a record to its canonical spelling, remembering the old spelling
/// as a variant.
fn relabeled(mut record: NameRecord, canonical: String) -> NameRecord {
    if record.name != canonical {
        let old = std::mem::replace(&mut record.name, canonical);
        record.variants.push(old);
    }
    record
}

/// Fold one duplicate group into a single record.
pub fn merge_group(group: Vec<NameRecord>, gender_policy: GenderMergePolicy) -> NameRecord {
    let mut iter = group.into_iter();
    let mut merged = match iter.next() {
        Some(first) => first,
        None => return NameRecord::new(""),
    };

    let mut gender_weights: HashMap<String, f64> = HashMap::new();
    let first_weight = record_weight(&merged);
    for (key, value) in merged.gender.iter_mut() {
        gender_weights.insert(key.clone(), first_weight);
        if gender_policy == GenderMergePolicy::WeightedAverage {
            *value *= first_weight;
        }
    }

    for record in iter {
        let weight = record_weight(&record);
        for (country, rank) in record.countries {
            merged
                .countries
                .entry(country)
                .and_modify(|existing| *existing = (*existing).min(rank))
                .or_insert(rank);
        }
        for (key, value) in record.gender {
            let accumulated = match gender_policy {
                GenderMergePolicy::Sum => value,
                GenderMergePolicy::WeightedAverage => value * weight,
            };
            *merged.gender.entry(key.clone()).or_insert(0.0) += accumulated;
            *gender_weights.entry(key).or_insert(0.0) += weight;
        }
        merged.popularity_score = merged.popularity_score.max(record.popularity_score);
        merged.popularity_rank = match (merged.popularity_rank, record.popularity_rank) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        if merged.split_from.is_none() {
            merged.split_from = record.split_from;
        }
        merged.variants.extend(record.variants);
    }

    if gender_policy == GenderMergePolicy::WeightedAverage {
        for (key, value) in merged.gender.iter_mut() {
            let total = gender_weights.get(key).copied().unwrap_or(first_weight);
            if total > 0.0 {
                *value /= total;
            }
        }
    }

    merged.appearances = merged.countries.len();
    let canonical_lower = merged.name.to_lowercase();
    merged
        .variants
        .retain(|variant| variant.to_lowercase() != canonical_lower);
    merged.variants.sort();
    merged.variants.dedup();
    merged
}

/// Merge weight for the weighted-average gender policy.
fn record_weight(record: &NameRecord) -> f64 {
    record.countries.len().max(1) as f64
}
