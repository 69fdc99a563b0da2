//! Stats command implementation

use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn execute(db_path: PathBuf) -> Result<()> {
    tracing::info!("Reading database stats: {}", db_path.display());

    let db = super::open(&db_path)?;
    let stats = db.stats().context("Failed to read stats")?;

    println!("\nDatabase Stats");
    println!("{}", "=".repeat(60));
    println!("Path: {}", db.path().display());
    println!("Map Size: {} bytes", stats.map_size);
    println!("Buckets: {}", stats.buckets);
    println!("Entries: {}", stats.entries);

    Ok(())
}
