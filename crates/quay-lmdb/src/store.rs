use lmdb::{Cursor, Database, DatabaseFlags, Environment, EnvironmentFlags, Transaction};
use quay_core::{QuayError, Result, StoreConfig, StoreStats, SyncMode};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::keys::db_names;
use crate::txn::{LmdbReadTxn, LmdbWriteTxn};

/// LMDB-backed bucket store
///
/// Cloning is cheap; clones share the same environment. LMDB admits one
/// write transaction at a time per environment, so `write_txn` blocks while
/// another thread holds one.
#[derive(Clone)]
pub struct LmdbStore {
    env: Arc<Environment>,
    buckets_db: Database,
    entries_db: Database,
    path: PathBuf,
    map_size: usize,
}

impl LmdbStore {
    pub fn open(cfg: StoreConfig) -> Result<Self> {
        cfg.validate()?;

        // Create directory if it doesn't exist
        std::fs::create_dir_all(&cfg.path)?;

        let mut env_builder = Environment::new();
        env_builder.set_max_dbs(2); // buckets, entries
        env_builder.set_map_size(cfg.map_size);
        env_builder.set_max_readers(cfg.max_readers);

        let mut flags = EnvironmentFlags::empty();
        match cfg.sync_mode {
            SyncMode::Full => {}
            SyncMode::NoMetaSync => {
                flags.insert(EnvironmentFlags::NO_META_SYNC);
            }
            SyncMode::NoSync => {
                flags.insert(EnvironmentFlags::NO_SYNC);
            }
        }
        env_builder.set_flags(flags);

        let env = env_builder
            .open(&cfg.path)
            .map_err(|e| QuayError::Io(std::io::Error::other(e)))?;

        let buckets_db = env
            .create_db(Some(db_names::BUCKETS), DatabaseFlags::empty())
            .map_err(|e| QuayError::Transaction(e.to_string()))?;
        let entries_db = env
            .create_db(Some(db_names::ENTRIES), DatabaseFlags::empty())
            .map_err(|e| QuayError::Transaction(e.to_string()))?;

        tracing::info!(
            path = %cfg.path.display(),
            map_size = cfg.map_size,
            sync_mode = ?cfg.sync_mode,
            "opened quay store"
        );

        Ok(Self {
            env: Arc::new(env),
            buckets_db,
            entries_db,
            path: cfg.path,
            map_size: cfg.map_size,
        })
    }

    /// Begin a write transaction, waiting for the environment's writer lock
    pub fn write_txn(&self) -> Result<LmdbWriteTxn<'_>> {
        let txn = self
            .env
            .begin_rw_txn()
            .map_err(|e| QuayError::Transaction(e.to_string()))?;
        Ok(LmdbWriteTxn::new(txn, self.buckets_db, self.entries_db))
    }

    pub fn read_txn(&self) -> Result<LmdbReadTxn<'_>> {
        let txn = self
            .env
            .begin_ro_txn()
            .map_err(|e| QuayError::Transaction(e.to_string()))?;
        Ok(LmdbReadTxn::new(txn, self.buckets_db, self.entries_db))
    }

    /// Run `f` in a write transaction: commit on `Ok`, abort on `Err`
    pub fn update<R, F>(&self, f: F) -> Result<R>
    where
        F: for<'t> FnOnce(&mut LmdbWriteTxn<'t>) -> Result<R>,
    {
        let mut txn = self.write_txn()?;
        match f(&mut txn) {
            Ok(value) => {
                let info = txn.commit()?;
                tracing::trace!(
                    buckets_created = info.buckets_created,
                    entries_written = info.entries_written,
                    entries_deleted = info.entries_deleted,
                    "committed"
                );
                Ok(value)
            }
            Err(e) => {
                txn.abort();
                Err(e)
            }
        }
    }

    /// Run `f` in a read-only transaction
    pub fn view<R, F>(&self, f: F) -> Result<R>
    where
        F: for<'t> FnOnce(&LmdbReadTxn<'t>) -> Result<R>,
    {
        let txn = self.read_txn()?;
        f(&txn)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let txn = self
            .env
            .begin_ro_txn()
            .map_err(|e| QuayError::Transaction(e.to_string()))?;
        let count = |db: Database| -> Result<usize> {
            let mut cursor = txn
                .open_ro_cursor(db)
                .map_err(|e| QuayError::Transaction(e.to_string()))?;
            Ok(cursor.iter_start().count())
        };
        Ok(StoreStats {
            buckets: count(self.buckets_db)?,
            entries: count(self.entries_db)?,
            map_size: self.map_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for LmdbStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LmdbStore")
            .field("path", &self.path)
            .field("map_size", &self.map_size)
            .finish()
    }
}
