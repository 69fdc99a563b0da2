//! Unified quay database interface
//!
//! Owns the LMDB store and hands out queues and deques. Handles on the same
//! bucket name share one session and one consumer gate.

use parking_lot::Mutex;
use quay_core::{Codec, JsonCodec, Result, StoreConfig, StoreStats};
use quay_lmdb::{keys::validate_bucket_name, LmdbStore};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::deque::Deque;
use crate::handle::Shared;
use crate::queue::Queue;
use crate::session::Session;

/// Quay database
///
/// A blocked `dequeue` holds the environment's only write transaction until
/// it receives a value. Writers on other buckets of the same database wait
/// for it, so consumers that block independently of each other belong in
/// separate databases.
pub struct QuayDb {
    store: LmdbStore,
    shared: Mutex<HashMap<Vec<u8>, Arc<Shared>>>,
}

impl QuayDb {
    /// Open a quay database at the given path with default settings
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(StoreConfig::new(path.as_ref()))
    }

    pub fn open_with_config(config: StoreConfig) -> Result<Self> {
        Ok(Self::from_store(LmdbStore::open(config)?))
    }

    pub fn from_store(store: LmdbStore) -> Self {
        Self {
            store,
            shared: Mutex::new(HashMap::new()),
        }
    }

    /// Get reference to the underlying store
    pub fn store(&self) -> &LmdbStore {
        &self.store
    }

    pub fn stats(&self) -> Result<StoreStats> {
        self.store.stats()
    }

    fn shared_for(&self, name: &[u8]) -> Result<Arc<Shared>> {
        validate_bucket_name(name)?;
        let mut shared = self.shared.lock();
        let entry = shared
            .entry(name.to_vec())
            .or_insert_with(|| Shared::new(self.store.clone()));
        Ok(entry.clone())
    }

    /// Session used by queues and deques on `name`
    pub fn session(&self, name: impl AsRef<[u8]>) -> Result<Arc<Session>> {
        Ok(self.shared_for(name.as_ref())?.session.clone())
    }

    /// JSON-encoded queue on bucket `name`
    pub fn queue(&self, name: impl AsRef<[u8]>) -> Result<Queue<JsonCodec>> {
        self.queue_with_codec(name, JsonCodec)
    }

    pub fn queue_with_codec<C>(&self, name: impl AsRef<[u8]>, codec: C) -> Result<Queue<C>>
    where
        C: Codec + Clone + 'static,
    {
        let name = name.as_ref();
        Queue::with_shared(name, self.shared_for(name)?, codec)
    }

    /// JSON-encoded deque on bucket `name`
    pub fn deque(&self, name: impl AsRef<[u8]>) -> Result<Deque<JsonCodec>> {
        self.deque_with_codec(name, JsonCodec)
    }

    pub fn deque_with_codec<C>(&self, name: impl AsRef<[u8]>, codec: C) -> Result<Deque<C>>
    where
        C: Codec + Clone + 'static,
    {
        let name = name.as_ref();
        Deque::with_shared(name, self.shared_for(name)?, codec)
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }
}

impl std::fmt::Debug for QuayDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuayDb")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
