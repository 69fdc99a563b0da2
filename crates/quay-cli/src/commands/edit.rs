//! Size, push and pop commands

use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn size(db_path: PathBuf, bucket: &str) -> Result<()> {
    let db = super::open(&db_path)?;
    let deque = db.deque(bucket)?;
    println!("{}", deque.size().context("Failed to count bucket")?);
    Ok(())
}

/// Pushes go through a deque so a new bucket is seeded mid key space and
/// either end can grow.
pub fn push(db_path: PathBuf, bucket: &str, value: &str, front: bool) -> Result<()> {
    let db = super::open(&db_path)?;
    let deque = db.deque(bucket)?;
    let bytes = value.as_bytes().to_vec();
    let key = if front {
        deque.enqueue_front_bytes(bytes)
    } else {
        deque.enqueue_back_bytes(bytes)
    }
    .context("Failed to push value")?;

    tracing::debug!(bucket, %key, front, "pushed value");
    println!("{}", key.value());
    Ok(())
}

pub fn pop(db_path: PathBuf, bucket: &str, back: bool) -> Result<()> {
    let db = super::open(&db_path)?;
    let deque = db.deque(bucket)?;
    let value = if back {
        deque.try_dequeue_back_bytes()
    } else {
        deque.try_dequeue_front_bytes()
    }
    .context("Failed to pop value")?;

    if let Some(bytes) = value {
        println!("{}", String::from_utf8_lossy(&bytes));
    }
    Ok(())
}
