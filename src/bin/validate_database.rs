//! Validate the dataset registry and the database invariants.
//! Checks that each registered path exists and parses, then runs the full
//! record-set checks on the database file.
//! Run: cargo run --bin validate_database

use std::path::Path;

use onomast::data::registry::{load_registry, DEFAULT_REGISTRY_PATH};
use onomast::data::validate::{
    validate_dataset_file, validate_shard_coverage, ValidationSeverity,
};
use onomast::shard::ShardIndex;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_REGISTRY_PATH.to_string());

    if !Path::new(&registry_path).exists() {
        eprintln!("Registry not found: {registry_path}");
        eprintln!("Run the pipeline first: cargo run --bin build_database");
        std::process::exit(1);
    }

    let registry = load_registry(&registry_path);
    let mut ok = 0usize;
    let mut err = 0usize;

    for (name, entry) in &registry {
        let path = Path::new(&entry.path);
        if !path.exists() {
            eprintln!("[{name}] path missing: {}", path.display());
            err += 1;
            continue;
        }
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("[{name}] read failed: {} - {e}", path.display());
                err += 1;
                continue;
            }
        };
        let _: serde_json::Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                eprintln!("[{name}] invalid JSON: {} - {e}", path.display());
                err += 1;
                continue;
            }
        };
        ok += 1;
    }

    println!("Validated {} datasets, {ok} ok, {err} errors", registry.len());

    if let Some(entry) = registry.get("names-database") {
        let report = validate_dataset_file(&entry.path)?;
        for diag in &report.diagnostics {
            println!("{diag}");
        }
        if report.has_errors() {
            let errors = report
                .diagnostics
                .iter()
                .filter(|d| d.severity == ValidationSeverity::Error)
                .count();
            eprintln!("database invariants failed: {errors} error(s)");
            err += errors;
        } else {
            println!("database invariants passed: {}", entry.path);
        }
    }

    if let Some(entry) = registry.get("names-index") {
        let index_path = Path::new(&entry.path);
        match std::fs::read_to_string(index_path)
            .ok()
            .and_then(|raw| serde_json::from_str::<ShardIndex>(&raw).ok())
        {
            Some(index) => {
                let shard_dir = index_path.parent().unwrap_or(Path::new("."));
                let report = validate_shard_coverage(&index, shard_dir);
                for diag in &report.diagnostics {
                    println!("{diag}");
                }
                if report.has_errors() {
                    eprintln!("shard coverage failed: {}", entry.path);
                    err += 1;
                } else {
                    println!("shard coverage passed: {}", entry.path);
                }
            }
            None => {
                eprintln!("[names-index] unreadable shard index: {}", entry.path);
                err += 1;
            }
        }
    }

    if err > 0 {
        std::process::exit(1);
    }
    Ok(())
}
