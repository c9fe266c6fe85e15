//! Command dispatch for the `onomast` binary. Kept separate from main so the
//! dispatcher is testable; returns process exit codes (0 ok, 1 failure,
//! 2 usage).

use std::path::{Path, PathBuf};

use crate::config::{load_config, PipelineConfig, DEFAULT_CONFIG_PATH};
use crate::data::import::{import_csv_source, import_json_source};
use crate::data::loader::load_dataset;
use crate::data::validate::{validate_dataset_file, ValidationSeverity};
use crate::pipeline::{rechunk, run_pipeline};
use crate::shard::ShardPolicy;
use crate::store::write_json_pretty_atomic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Build,
    Chunk,
    Validate,
    Import,
    Stats,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("build") => Some(Command::Build),
        Some("chunk") => Some(Command::Chunk),
        Some("validate") => Some(Command::Validate),
        Some("import") => Some(Command::Import),
        Some("stats") => Some(Command::Stats),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Build) => handle_build(args),
        Some(Command::Chunk) => handle_chunk(args),
        Some(Command::Validate) => handle_validate(args),
        Some(Command::Import) => handle_import(args),
        Some(Command::Stats) => handle_stats(args),
        None => {
            eprintln!("usage: onomast <build|chunk|validate|import|stats>");
            2
        }
    }
}

fn handle_build(args: &[String]) -> i32 {
    let config_path = args
        .get(2)
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);
    let config = if Path::new(config_path).exists() {
        match load_config(config_path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("build failed: {err}");
                return 1;
            }
        }
    } else if args.get(2).is_some() {
        eprintln!("build failed: config '{config_path}' not found");
        return 1;
    } else {
        PipelineConfig::default()
    };

    if config.sources.is_empty() {
        eprintln!("build failed: no source files configured");
        return 1;
    }

    match run_pipeline(&config) {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("build failed: {err}");
            1
        }
    }
}

fn handle_chunk(args: &[String]) -> i32 {
    let Some(database) = args.get(2) else {
        eprintln!("usage: onomast chunk <database.json> [output-dir] [config.yaml]");
        return 2;
    };
    let output_dir = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(crate::config::DEFAULT_OUTPUT_DIR));
    let policy = match args.get(4) {
        Some(config_path) => match load_config(config_path) {
            Ok(config) => config.shard,
            Err(err) => {
                eprintln!("chunk failed: {err}");
                return 1;
            }
        },
        None => ShardPolicy::default(),
    };

    match rechunk(Path::new(database), &output_dir, policy) {
        Ok(count) => {
            println!(
                "chunk complete: {count} shard file(s) in {}",
                output_dir.display()
            );
            0
        }
        Err(err) => {
            eprintln!("chunk failed: {err}");
            1
        }
    }
}

fn handle_validate(args: &[String]) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: onomast validate <dataset.json>");
        return 2;
    };

    match validate_dataset_file(path) {
        Ok(report) => {
            for diag in &report.diagnostics {
                match diag.severity {
                    ValidationSeverity::Error => eprintln!("{diag}"),
                    _ => println!("{diag}"),
                }
            }
            if report.has_errors() {
                let errors = report
                    .diagnostics
                    .iter()
                    .filter(|d| d.severity == ValidationSeverity::Error)
                    .count();
                eprintln!("validation failed: {errors} error(s) in {path}");
                1
            } else {
                println!("validation passed: {path}");
                0
            }
        }
        Err(err) => {
            eprintln!("validation failed: {err}");
            1
        }
    }
}

fn handle_import(args: &[String]) -> i32 {
    let Some(source) = args.get(2) else {
        eprintln!("usage: onomast import <source.json|source.csv> [country] [output.json]");
        return 2;
    };
    let country = args.get(3).map(String::as_str).unwrap_or("US");
    let is_csv = Path::new(source)
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"));

    let result = if is_csv {
        import_csv_source(source, country)
    } else {
        import_json_source(source, country)
    };

    match result {
        Ok((records, report)) => {
            if let Some(output) = args.get(4) {
                if let Err(err) = write_json_pretty_atomic(Path::new(output), &records) {
                    eprintln!("import failed: unable to write '{output}': {err}");
                    return 1;
                }
            }
            println!(
                "import complete: rows={} imported={} skipped={} source='{}'",
                report.total_rows, report.imported, report.skipped, report.source_path
            );
            0
        }
        Err(err) => {
            eprintln!("import failed: {err}");
            1
        }
    }
}

fn handle_stats(args: &[String]) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: onomast stats <database.json>");
        return 2;
    };

    match load_dataset(path) {
        Ok(file) => {
            let ranked = file
                .names
                .iter()
                .filter(|r| r.popularity_rank.is_some())
                .count();
            println!("records: {}", file.names.len());
            println!("ranked: {ranked}");
            if let (Some(first), Some(last)) = (file.names.first(), file.names.last()) {
                println!(
                    "rank span: {}..{}",
                    rank_label(first.popularity_rank),
                    rank_label(last.popularity_rank)
                );
            }
            for record in file.names.iter().take(10) {
                println!(
                    "  {:>6}  {}  score={}",
                    rank_label(record.popularity_rank),
                    record.name,
                    record.popularity_score
                );
            }
            0
        }
        Err(err) => {
            eprintln!("stats failed: {err}");
            1
        }
    }
}

fn rank_label(rank: Option<u32>) -> String {
    rank.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string())
}
