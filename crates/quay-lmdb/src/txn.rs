use lmdb::{Cursor, Database, RoTransaction, RwTransaction, Transaction, WriteFlags};
use quay_core::{
    bucket_label, BucketReader, BucketWriter, CommitInfo, Entry, QuayError, Result,
};
use std::mem;

use crate::cursor::{BucketCursor, EntryCursor, RoBucketCursor, RwBucketCursor};
use crate::keys::{entry_key, validate_bucket_name};

/// Callback run once a write transaction's outcome is final.
///
/// Receives `true` if the data was committed, `false` on abort.
pub type CommitHook = Box<dyn FnOnce(bool) + Send>;

fn closed() -> QuayError {
    QuayError::InvalidState("Transaction already committed".into())
}

/// Commit failure, attributed to the buckets the transaction wrote
fn commit_failure(written: &[Vec<u8>], e: lmdb::Error) -> QuayError {
    if written.is_empty() {
        return QuayError::Transaction(e.to_string());
    }
    let names: Vec<String> = written.iter().map(|b| bucket_label(b)).collect();
    QuayError::Storage {
        bucket: names.join(", "),
        reason: format!("commit failed: {}", e),
    }
}

fn run_hooks(hooks: Vec<CommitHook>, committed: bool) {
    for hook in hooks {
        hook(committed);
    }
}

/// Bucket reads shared by read and write transactions
struct Buckets<'t, T> {
    txn: &'t T,
    buckets_db: Database,
    entries_db: Database,
}

impl<'t, T: Transaction> Buckets<'t, T> {
    fn cursor(&self, bucket: &[u8]) -> Result<RoBucketCursor<'t>> {
        validate_bucket_name(bucket)?;
        let cursor = self
            .txn
            .open_ro_cursor(self.entries_db)
            .map_err(|e| QuayError::storage(bucket, e))?;
        BucketCursor::new(cursor, bucket)
    }

    fn exists(&self, bucket: &[u8]) -> Result<bool> {
        validate_bucket_name(bucket)?;
        match self.txn.get(self.buckets_db, &bucket) {
            Ok(_) => Ok(true),
            Err(lmdb::Error::NotFound) => Ok(false),
            Err(e) => Err(QuayError::storage(bucket, e)),
        }
    }

    fn get(&self, bucket: &[u8], key: &[u8]) -> Result<Option<Vec<u8>>> {
        let full = entry_key(bucket, key)?;
        match self.txn.get(self.entries_db, &full) {
            Ok(bytes) => Ok(Some(bytes.to_vec())),
            Err(lmdb::Error::NotFound) => Ok(None),
            Err(e) => Err(QuayError::storage(bucket, e)),
        }
    }

    fn len(&self, bucket: &[u8]) -> Result<usize> {
        let mut cursor = self.cursor(bucket)?;
        let mut count = 0;
        while cursor.next()?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    fn names(&self) -> Result<Vec<Vec<u8>>> {
        let mut cursor = self
            .txn
            .open_ro_cursor(self.buckets_db)
            .map_err(|e| QuayError::Transaction(e.to_string()))?;
        Ok(cursor.iter_start().map(|(name, _)| name.to_vec()).collect())
    }
}

/// Write transaction over the bucket store
///
/// Aborts on drop unless committed. Hooks registered with
/// [`on_commit`](Self::on_commit) run exactly once with the final outcome.
pub struct LmdbWriteTxn<'a> {
    txn: Option<RwTransaction<'a>>,
    buckets_db: Database,
    entries_db: Database,
    hooks: Vec<CommitHook>,
    stats: CommitInfo,
    written: Vec<Vec<u8>>,
}

impl<'a> LmdbWriteTxn<'a> {
    pub fn new(txn: RwTransaction<'a>, buckets_db: Database, entries_db: Database) -> Self {
        Self {
            txn: Some(txn),
            buckets_db,
            entries_db,
            hooks: Vec::new(),
            stats: CommitInfo::default(),
            written: Vec::new(),
        }
    }

    fn touch(&mut self, bucket: &[u8]) {
        if !self.written.iter().any(|b| b == bucket) {
            self.written.push(bucket.to_vec());
        }
    }

    fn reader(&self) -> Result<Buckets<'_, RwTransaction<'a>>> {
        let txn = self.txn.as_ref().ok_or_else(closed)?;
        Ok(Buckets {
            txn,
            buckets_db: self.buckets_db,
            entries_db: self.entries_db,
        })
    }

    /// Register a hook that learns whether this transaction committed.
    ///
    /// Hooks registered inside a nested transaction move to the parent when
    /// the nested transaction commits, so they fire on the outermost outcome.
    pub fn on_commit(&mut self, hook: impl FnOnce(bool) + Send + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// Run `f` inside a nested transaction.
    ///
    /// If `f` fails, none of its writes reach this transaction and its hooks
    /// see `false`. On success the writes, hooks and counters are folded in.
    pub fn nested<R, F>(&mut self, f: F) -> Result<R>
    where
        F: for<'c> FnOnce(&mut LmdbWriteTxn<'c>) -> Result<R>,
    {
        let (buckets_db, entries_db) = (self.buckets_db, self.entries_db);
        let parent = self.txn.as_mut().ok_or_else(closed)?;
        let child = parent
            .begin_nested_txn()
            .map_err(|e| QuayError::Transaction(e.to_string()))?;
        let mut child = LmdbWriteTxn::new(child, buckets_db, entries_db);

        let value = match f(&mut child) {
            Ok(value) => value,
            Err(e) => {
                tracing::trace!(error = %e, "nested transaction rolled back");
                return Err(e);
            }
        };
        let (hooks, stats, written) = child.commit_nested()?;
        self.hooks.extend(hooks);
        self.stats.absorb(stats);
        for bucket in written {
            self.touch(&bucket);
        }
        Ok(value)
    }

    fn commit_nested(mut self) -> Result<(Vec<CommitHook>, CommitInfo, Vec<Vec<u8>>)> {
        let txn = self.txn.take().ok_or_else(closed)?;
        let hooks = mem::take(&mut self.hooks);
        let written = mem::take(&mut self.written);
        match txn.commit() {
            Ok(()) => Ok((hooks, self.stats, written)),
            Err(e) => {
                run_hooks(hooks, false);
                Err(commit_failure(&written, e))
            }
        }
    }

    /// Read-only cursor over `bucket`
    pub fn cursor(&self, bucket: &[u8]) -> Result<RoBucketCursor<'_>> {
        self.reader()?.cursor(bucket)
    }

    /// Read-write cursor over `bucket`
    pub fn cursor_mut(&mut self, bucket: &[u8]) -> Result<RwBucketCursor<'_>> {
        validate_bucket_name(bucket)?;
        self.touch(bucket);
        let entries_db = self.entries_db;
        let txn = self.txn.as_mut().ok_or_else(closed)?;
        let cursor = txn
            .open_rw_cursor(entries_db)
            .map_err(|e| QuayError::storage(bucket, e))?;
        RwBucketCursor::new(cursor, bucket, &mut self.stats)
    }

    /// Names of all registered buckets
    pub fn bucket_names(&self) -> Result<Vec<Vec<u8>>> {
        self.reader()?.names()
    }

    /// Counters accumulated so far
    pub fn stats(&self) -> CommitInfo {
        self.stats
    }

    pub fn commit(mut self) -> Result<CommitInfo> {
        let txn = self.txn.take().ok_or_else(closed)?;
        let hooks = mem::take(&mut self.hooks);
        match txn.commit() {
            Ok(()) => {
                run_hooks(hooks, true);
                Ok(self.stats)
            }
            Err(e) => {
                run_hooks(hooks, false);
                Err(commit_failure(&self.written, e))
            }
        }
    }

    pub fn abort(mut self) {
        if let Some(txn) = self.txn.take() {
            txn.abort();
        }
        run_hooks(mem::take(&mut self.hooks), false);
    }
}

impl<'a> BucketReader for LmdbWriteTxn<'a> {
    fn bucket_exists(&self, bucket: &[u8]) -> Result<bool> {
        self.reader()?.exists(bucket)
    }

    fn get(&self, bucket: &[u8], key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.reader()?.get(bucket, key)
    }

    fn first(&self, bucket: &[u8]) -> Result<Option<Entry>> {
        self.cursor(bucket)?.first()
    }

    fn last(&self, bucket: &[u8]) -> Result<Option<Entry>> {
        self.cursor(bucket)?.last()
    }

    fn bucket_len(&self, bucket: &[u8]) -> Result<usize> {
        self.reader()?.len(bucket)
    }
}

impl<'a> BucketWriter for LmdbWriteTxn<'a> {
    fn create_bucket_if_absent(&mut self, bucket: &[u8]) -> Result<bool> {
        if self.bucket_exists(bucket)? {
            return Ok(false);
        }
        let buckets_db = self.buckets_db;
        let txn = self.txn.as_mut().ok_or_else(closed)?;
        let created_at = chrono::Utc::now().to_rfc3339();
        txn.put(buckets_db, &bucket, &created_at, WriteFlags::empty())
            .map_err(|e| QuayError::storage(bucket, e))?;
        self.stats.buckets_created += 1;
        self.touch(bucket);
        tracing::debug!(bucket = %bucket_label(bucket), "created bucket");
        Ok(true)
    }

    fn put(&mut self, bucket: &[u8], key: &[u8], value: &[u8]) -> Result<()> {
        if !self.bucket_exists(bucket)? {
            return Err(QuayError::BucketNotFound(bucket_label(bucket)));
        }
        let full = entry_key(bucket, key)?;
        let entries_db = self.entries_db;
        let txn = self.txn.as_mut().ok_or_else(closed)?;
        txn.put(entries_db, &full, &value, WriteFlags::empty())
            .map_err(|e| QuayError::storage(bucket, e))?;
        self.stats.entries_written += 1;
        self.touch(bucket);
        Ok(())
    }

    fn delete(&mut self, bucket: &[u8], key: &[u8]) -> Result<bool> {
        let full = entry_key(bucket, key)?;
        let entries_db = self.entries_db;
        let txn = self.txn.as_mut().ok_or_else(closed)?;
        match txn.del(entries_db, &full, None) {
            Ok(()) => {
                self.stats.entries_deleted += 1;
                self.touch(bucket);
                Ok(true)
            }
            Err(lmdb::Error::NotFound) => Ok(false),
            Err(e) => Err(QuayError::storage(bucket, e)),
        }
    }
}

impl<'a> Drop for LmdbWriteTxn<'a> {
    fn drop(&mut self) {
        if let Some(txn) = self.txn.take() {
            txn.abort();
        }
        run_hooks(mem::take(&mut self.hooks), false);
    }
}

/// Read-only transaction over the bucket store
///
/// Enables concurrent reads without blocking writes or other reads.
pub struct LmdbReadTxn<'a> {
    txn: RoTransaction<'a>,
    buckets_db: Database,
    entries_db: Database,
}

impl<'a> LmdbReadTxn<'a> {
    pub fn new(txn: RoTransaction<'a>, buckets_db: Database, entries_db: Database) -> Self {
        Self {
            txn,
            buckets_db,
            entries_db,
        }
    }

    fn reader(&self) -> Buckets<'_, RoTransaction<'a>> {
        Buckets {
            txn: &self.txn,
            buckets_db: self.buckets_db,
            entries_db: self.entries_db,
        }
    }

    pub fn cursor(&self, bucket: &[u8]) -> Result<RoBucketCursor<'_>> {
        self.reader().cursor(bucket)
    }

    pub fn bucket_names(&self) -> Result<Vec<Vec<u8>>> {
        self.reader().names()
    }
}

impl<'a> BucketReader for LmdbReadTxn<'a> {
    fn bucket_exists(&self, bucket: &[u8]) -> Result<bool> {
        self.reader().exists(bucket)
    }

    fn get(&self, bucket: &[u8], key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.reader().get(bucket, key)
    }

    fn first(&self, bucket: &[u8]) -> Result<Option<Entry>> {
        self.cursor(bucket)?.first()
    }

    fn last(&self, bucket: &[u8]) -> Result<Option<Entry>> {
        self.cursor(bucket)?.last()
    }

    fn bucket_len(&self, bucket: &[u8]) -> Result<usize> {
        self.reader().len(bucket)
    }
}
