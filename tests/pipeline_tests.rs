//! End-to-end pipeline scenarios against the library: normalize + merge +
//! rank + shard on small in-memory datasets.

use std::time::{SystemTime, UNIX_EPOCH};

use onomast::data::record::NameRecord;
use onomast::data::validate::validate_shard_coverage;
use onomast::merge::{default_equivalence_rules, merge_records, GenderMergePolicy};
use onomast::normalize::{normalize_record, NormalizePolicy, Outcome};
use onomast::pipeline::rechunk;
use onomast::rank::{rank_records, DEFAULT_SCORE_BASE};
use onomast::shard::{build_index, shard_records, ShardIndex, ShardPolicy};
use onomast::store::write_json_pretty_atomic;

fn raw(name: &str, countries: &[(&str, u32)]) -> NameRecord {
    let mut rec = NameRecord::new(name);
    for (code, rank) in countries {
        rec.countries.insert(code.to_string(), *rank);
    }
    rec.appearances = rec.countries.len();
    rec
}

fn normalize_all(records: Vec<NameRecord>, policy: &NormalizePolicy) -> Vec<NameRecord> {
    let mut kept = Vec::new();
    for record in records {
        match normalize_record(record, policy) {
            Outcome::Accepted(rec) => kept.push(rec),
            Outcome::Split(derived) => kept.extend(derived),
            Outcome::Rejected { .. } => {}
        }
    }
    kept
}

#[test]
fn noah_liam_scenario() {
    let policy = NormalizePolicy::default();
    let rules = default_equivalence_rules();

    let records = vec![
        raw("Noah", &[("US", 1)]),
        raw("noah", &[("GB", 2)]),
        raw("Liam", &[("US", 3)]),
    ];

    let normalized = normalize_all(records, &policy);
    let mut merged = merge_records(normalized, GenderMergePolicy::default(), &rules);
    assert_eq!(merged.len(), 2);

    rank_records(&mut merged, DEFAULT_SCORE_BASE).unwrap();

    let noah = &merged[0];
    assert_eq!(noah.name, "Noah");
    assert_eq!(noah.countries.get("US"), Some(&1));
    assert_eq!(noah.countries.get("GB"), Some(&2));
    assert_eq!(noah.appearances, 2);
    assert_eq!(noah.popularity_rank, Some(1));

    let liam = &merged[1];
    assert_eq!(liam.name, "Liam");
    assert_eq!(liam.popularity_rank, Some(2));
}

#[test]
fn full_run_produces_dense_ranks_and_unique_names() {
    let policy = NormalizePolicy::default();
    let rules = default_equivalence_rules();

    let records = vec![
        raw("Emma", &[("US", 2)]),
        raw("EMMA", &[("DE", 1)]),
        raw("olivia", &[("US", 1)]),
        raw("José", &[("ES", 1)]),
        raw("Anne Marie", &[("FR", 4)]),
        raw("A.franko", &[("US", 900)]),
        raw("", &[]),
    ];

    let normalized = normalize_all(records, &policy);
    let mut merged = merge_records(normalized, GenderMergePolicy::default(), &rules);
    rank_records(&mut merged, DEFAULT_SCORE_BASE).unwrap();

    let mut lower: Vec<String> = merged.iter().map(|r| r.name.to_lowercase()).collect();
    lower.sort();
    lower.dedup();
    assert_eq!(lower.len(), merged.len(), "names must be unique");

    let ranks: Vec<u32> = merged
        .iter()
        .map(|r| r.popularity_rank.unwrap())
        .collect();
    let expected: Vec<u32> = (1..=merged.len() as u32).collect();
    assert_eq!(ranks, expected, "ranks must be dense 1..N");

    assert!(merged.iter().any(|r| r.name == "Jose"));
    assert!(merged.iter().any(|r| r.name == "Anne"));
    assert!(!merged.iter().any(|r| r.name == "A.franko"));
}

#[test]
fn variant_consolidation_raises_canonical_score() {
    let policy = NormalizePolicy::default();
    let rules = default_equivalence_rules();

    let records = vec![
        raw("Muhammad", &[("PK", 1)]),
        raw("Mohammed", &[("EG", 1)]),
        raw("Mohamed", &[("MA", 1)]),
        raw("Oliver", &[("GB", 1)]),
    ];

    let normalized = normalize_all(records, &policy);
    let mut merged = merge_records(normalized, GenderMergePolicy::default(), &rules);
    rank_records(&mut merged, DEFAULT_SCORE_BASE).unwrap();

    assert_eq!(merged[0].name, "Muhammad");
    assert_eq!(merged[0].popularity_rank, Some(1));
    assert_eq!(merged[0].appearances, 3);
    assert!(merged[0].variants.contains(&"Mohammed".to_string()));
}

#[test]
fn shard_concatenation_reproduces_ranked_sequence() {
    let mut records: Vec<NameRecord> = ('a'..='z')
        .flat_map(|a| ('a'..='d').map(move |b| format!("X{a}{b}")))
        .map(|name| raw(&name, &[("US", 50)]))
        .collect();
    rank_records(&mut records, DEFAULT_SCORE_BASE).unwrap();

    let shards = shard_records(
        &records,
        ShardPolicy::HeadPlusTails {
            head_size: 20,
            tail_count: 3,
        },
    )
    .unwrap();

    let concatenated: Vec<String> = shards
        .iter()
        .flat_map(|s| s.records.iter().map(|r| r.name.clone()))
        .collect();
    let original: Vec<String> = records.iter().map(|r| r.name.clone()).collect();
    assert_eq!(concatenated, original);

    let index = build_index(&shards);
    assert_eq!(index.total_names, records.len());
    let mut covered = vec![false; records.len()];
    for entry in index.chunks.values() {
        for rank in entry.start_rank..=entry.end_rank {
            let slot = &mut covered[(rank - 1) as usize];
            assert!(!*slot, "rank {rank} appears in two shards");
            *slot = true;
        }
    }
    assert!(covered.iter().all(|c| *c), "every rank must be covered");
}

#[test]
fn rechunk_output_passes_shard_coverage_validation() {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    let work = std::env::temp_dir().join(format!("onomast-coverage-{stamp}"));

    let mut records: Vec<NameRecord> = ('a'..='t')
        .map(|c| raw(&format!("Name{c}"), &[("US", 10)]))
        .collect();
    rank_records(&mut records, DEFAULT_SCORE_BASE).unwrap();

    let db_path = work.join("db.json");
    let database = serde_json::json!({ "metadata": {}, "names": records });
    write_json_pretty_atomic(&db_path, &database).unwrap();

    let out_dir = work.join("out");
    let count = rechunk(
        &db_path,
        &out_dir,
        ShardPolicy::FixedSize { shard_size: 7 },
    )
    .unwrap();
    assert_eq!(count, 3);

    let index_raw = std::fs::read_to_string(out_dir.join("names-index.json")).unwrap();
    let index: ShardIndex = serde_json::from_str(&index_raw).unwrap();
    let report = validate_shard_coverage(&index, &out_dir);
    assert!(!report.has_errors(), "{:?}", report.diagnostics);

    let _ = std::fs::remove_dir_all(work);
}

#[test]
fn reranking_after_rechunk_changes_nothing() {
    let mut records = vec![
        raw("Noah", &[("US", 1), ("GB", 2)]),
        raw("Liam", &[("US", 3)]),
        raw("Emma", &[("DE", 1)]),
    ];
    rank_records(&mut records, DEFAULT_SCORE_BASE).unwrap();
    let snapshot: Vec<(String, Option<u32>, f64)> = records
        .iter()
        .map(|r| (r.name.clone(), r.popularity_rank, r.popularity_score))
        .collect();

    rank_records(&mut records, DEFAULT_SCORE_BASE).unwrap();
    let again: Vec<(String, Option<u32>, f64)> = records
        .iter()
        .map(|r| (r.name.clone(), r.popularity_rank, r.popularity_score))
        .collect();
    assert_eq!(snapshot, again);
}
