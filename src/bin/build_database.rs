//! Build the full ranked, sharded name database from configured raw sources.
//! Run from project root: cargo run --bin build_database [-- onomast.yaml]

use onomast::config::{load_config, DEFAULT_CONFIG_PATH};
use onomast::pipeline::run_pipeline;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = load_config(&config_path)?;
    if config.sources.is_empty() {
        eprintln!("error: no source files configured in {config_path}");
        std::process::exit(1);
    }

    let report = run_pipeline(&config)?;
    println!(
        "Built database: {} names ranked, {} shard file(s)",
        report.ranked, report.shards_written
    );
    Ok(())
}
