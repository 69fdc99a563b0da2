//! Peek command implementation

use anyhow::{Context, Result};
use quay::prelude::*;
use std::path::PathBuf;

pub fn execute(db_path: PathBuf, bucket: &str, limit: usize) -> Result<()> {
    let db = super::open(&db_path)?;
    let entries = db
        .store()
        .view(|txn| {
            let mut cursor = txn.cursor(bucket.as_bytes())?;
            let mut out = Vec::new();
            while out.len() < limit {
                match cursor.next()? {
                    Some(entry) => out.push(entry),
                    None => break,
                }
            }
            Ok(out)
        })
        .context("Failed to read bucket")?;

    for (key, value) in entries {
        println!("{}\t{}", format_key(&key), String::from_utf8_lossy(&value));
    }
    Ok(())
}

fn format_key(key: &[u8]) -> String {
    match SequenceKey::from_bytes(key) {
        Some(key) => key.value().to_string(),
        None => key.iter().map(|b| format!("{:02x}", b)).collect(),
    }
}
