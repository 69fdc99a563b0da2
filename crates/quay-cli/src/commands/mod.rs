pub mod edit;
pub mod peek;
pub mod stats;

use anyhow::{Context, Result};
use quay::prelude::*;
use std::path::Path;

pub(crate) fn open(db_path: &Path) -> Result<QuayDb> {
    QuayDb::open(db_path).with_context(|| format!("Failed to open database at {}", db_path.display()))
}
