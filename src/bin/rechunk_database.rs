//! Re-shard an already ranked database without changing its contents.
//! Run from project root: cargo run --bin rechunk_database [-- data/namesDatabase.json public/data]

use std::path::Path;

use onomast::config::{DEFAULT_DATABASE_PATH, DEFAULT_OUTPUT_DIR};
use onomast::pipeline::rechunk;
use onomast::shard::ShardPolicy;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let database = args
        .get(1)
        .map(String::as_str)
        .unwrap_or(DEFAULT_DATABASE_PATH);
    let output_dir = args.get(2).map(String::as_str).unwrap_or(DEFAULT_OUTPUT_DIR);

    let count = rechunk(Path::new(database), Path::new(output_dir), ShardPolicy::default())?;
    println!("Wrote {count} shard file(s) + index to {output_dir}");
    Ok(())
}
