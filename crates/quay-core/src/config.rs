use crate::{QuayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for an LMDB-backed quay store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the store directory
    pub path: PathBuf,

    /// Maximum map size for LMDB (in bytes)
    /// Default: 1GB
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Sync mode for durability
    #[serde(default)]
    pub sync_mode: SyncMode,

    /// Maximum number of concurrent readers (LMDB specific)
    /// Default: 126
    #[serde(default = "default_max_readers")]
    pub max_readers: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Full durability – calls `fsync()` on every commit.
    Full,

    /// Skips syncing the LMDB meta-page on each commit (default).
    ///
    /// Data pages are still synced. An OS crash may lose the last
    /// transaction but leaves the store consistent.
    #[default]
    NoMetaSync,

    /// Disables `fsync()` entirely. Only for ephemeral or test workloads.
    NoSync,
}

fn default_map_size() -> usize {
    1024 * 1024 * 1024 // 1GB
}

fn default_max_readers() -> u32 {
    126
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            map_size: default_map_size(),
            sync_mode: SyncMode::default(),
            max_readers: default_max_readers(),
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path)?;
        let cfg: Self = serde_json::from_slice(&raw).map_err(|e| {
            QuayError::Config(format!("invalid config {}: {}", path.display(), e))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.map_size == 0 {
            return Err(QuayError::Config("map_size must be positive".into()));
        }
        if self.max_readers == 0 {
            return Err(QuayError::Config("max_readers must be positive".into()));
        }
        Ok(())
    }

    pub fn with_map_size(mut self, map_size: usize) -> Self {
        self.map_size = map_size;
        self
    }

    pub fn with_sync_mode(mut self, sync_mode: SyncMode) -> Self {
        self.sync_mode = sync_mode;
        self
    }

    pub fn with_max_readers(mut self, max_readers: u32) -> Self {
        self.max_readers = max_readers;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = StoreConfig::new("/tmp/quay");
        assert_eq!(cfg.map_size, 1024 * 1024 * 1024);
        assert_eq!(cfg.max_readers, 126);
        assert_eq!(cfg.sync_mode, SyncMode::NoMetaSync);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let cfg = StoreConfig::new("/tmp/quay")
            .with_map_size(64 * 1024 * 1024)
            .with_sync_mode(SyncMode::NoSync)
            .with_max_readers(8);
        assert_eq!(cfg.map_size, 64 * 1024 * 1024);
        assert_eq!(cfg.sync_mode, SyncMode::NoSync);
        assert_eq!(cfg.max_readers, 8);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let cfg = StoreConfig::new("/tmp/quay").with_map_size(0);
        assert!(matches!(cfg.validate(), Err(QuayError::Config(_))));

        let cfg = StoreConfig::new("/tmp/quay").with_max_readers(0);
        assert!(matches!(cfg.validate(), Err(QuayError::Config(_))));
    }

    #[test]
    fn test_from_json_file_applies_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("quay.json");
        std::fs::write(&file, r#"{"path": "/var/lib/quay", "sync_mode": "Full"}"#).unwrap();

        let cfg = StoreConfig::from_json_file(&file).unwrap();
        assert_eq!(cfg.path, PathBuf::from("/var/lib/quay"));
        assert_eq!(cfg.sync_mode, SyncMode::Full);
        assert_eq!(cfg.map_size, default_map_size());
    }

    #[test]
    fn test_from_json_file_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("quay.json");
        std::fs::write(&file, "map_size = 3").unwrap();

        assert!(matches!(
            StoreConfig::from_json_file(&file),
            Err(QuayError::Config(_))
        ));
    }
}
