//! Cursors confined to a single bucket
//!
//! Entry keys returned here are relative to the bucket; the length-prefixed
//! bucket name is stripped. Moving past either end of the bucket yields
//! `None` rather than an entry from a neighbouring bucket.

use lmdb::{Cursor, RoCursor, RwCursor, WriteFlags};
use lmdb_sys::{MDB_LAST, MDB_NEXT, MDB_PREV, MDB_SET_RANGE};
use quay_core::{CommitInfo, Entry, QuayError, Result};
use std::marker::PhantomData;
use std::os::raw::c_uint;

use crate::keys::{bucket_prefix, prefix_successor};

/// Positional access to the entries of one bucket
pub trait EntryCursor {
    /// Name of the bucket this cursor walks
    fn bucket(&self) -> &[u8];

    fn first(&mut self) -> Result<Option<Entry>>;

    fn last(&mut self) -> Result<Option<Entry>>;

    /// Entry after the current one; `first` when the cursor is unpositioned
    /// or has moved before the first entry
    fn next(&mut self) -> Result<Option<Entry>>;

    /// Entry before the current one; `last` when the cursor is unpositioned
    /// or has moved past the last entry
    fn prev(&mut self) -> Result<Option<Entry>>;

    /// First entry whose key is `>= key`
    fn seek(&mut self, key: &[u8]) -> Result<Option<Entry>>;
}

/// Where a [`BucketCursor`] stands relative to its bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Place {
    Unpositioned,
    At,
    /// Moved past the last entry; the LMDB cursor may sit anywhere
    PastEnd,
    /// Moved before the first entry
    BeforeStart,
}

/// Cursor over one bucket, generic over the LMDB cursor flavour
pub struct BucketCursor<'txn, C> {
    cursor: C,
    bucket: Vec<u8>,
    prefix: Vec<u8>,
    place: Place,
    _txn: PhantomData<&'txn ()>,
}

pub type RoBucketCursor<'txn> = BucketCursor<'txn, RoCursor<'txn>>;

impl<'txn, C: Cursor<'txn>> BucketCursor<'txn, C> {
    pub(crate) fn new(cursor: C, bucket: &[u8]) -> Result<Self> {
        Ok(Self {
            cursor,
            bucket: bucket.to_vec(),
            prefix: bucket_prefix(bucket)?,
            place: Place::Unpositioned,
            _txn: PhantomData,
        })
    }

    /// Run `op`; a miss or a key outside the bucket leaves the cursor at `miss`
    fn fetch(&mut self, key: Option<&[u8]>, op: c_uint, miss: Place) -> Result<Option<Entry>> {
        match self.cursor.get(key, None, op) {
            Ok((Some(found), value)) if found.starts_with(&self.prefix) => {
                self.place = Place::At;
                Ok(Some((found[self.prefix.len()..].to_vec(), value.to_vec())))
            }
            Ok(_) | Err(lmdb::Error::NotFound) => {
                self.place = miss;
                Ok(None)
            }
            Err(e) => Err(QuayError::storage(&self.bucket, e)),
        }
    }
}

impl<'txn, C: Cursor<'txn>> EntryCursor for BucketCursor<'txn, C> {
    fn bucket(&self) -> &[u8] {
        &self.bucket
    }

    fn first(&mut self) -> Result<Option<Entry>> {
        let prefix = self.prefix.clone();
        self.fetch(Some(prefix.as_slice()), MDB_SET_RANGE, Place::PastEnd)
    }

    fn last(&mut self) -> Result<Option<Entry>> {
        let Some(end) = prefix_successor(&self.prefix) else {
            return self.fetch(None, MDB_LAST, Place::BeforeStart);
        };
        match self.cursor.get(Some(end.as_slice()), None, MDB_SET_RANGE) {
            Ok(_) => self.fetch(None, MDB_PREV, Place::BeforeStart),
            Err(lmdb::Error::NotFound) => self.fetch(None, MDB_LAST, Place::BeforeStart),
            Err(e) => Err(QuayError::storage(&self.bucket, e)),
        }
    }

    fn next(&mut self) -> Result<Option<Entry>> {
        match self.place {
            Place::Unpositioned | Place::BeforeStart => self.first(),
            Place::At => self.fetch(None, MDB_NEXT, Place::PastEnd),
            Place::PastEnd => Ok(None),
        }
    }

    fn prev(&mut self) -> Result<Option<Entry>> {
        match self.place {
            Place::Unpositioned | Place::PastEnd => self.last(),
            Place::At => self.fetch(None, MDB_PREV, Place::BeforeStart),
            Place::BeforeStart => Ok(None),
        }
    }

    fn seek(&mut self, key: &[u8]) -> Result<Option<Entry>> {
        let mut target = self.prefix.clone();
        target.extend_from_slice(key);
        self.fetch(Some(target.as_slice()), MDB_SET_RANGE, Place::PastEnd)
    }
}

/// Read-write cursor over one bucket
///
/// Adds in-place writes and deletion of the current entry. Changes are
/// counted in the owning transaction's [`CommitInfo`].
pub struct RwBucketCursor<'txn> {
    inner: BucketCursor<'txn, RwCursor<'txn>>,
    stats: &'txn mut CommitInfo,
}

impl<'txn> RwBucketCursor<'txn> {
    pub(crate) fn new(
        cursor: RwCursor<'txn>,
        bucket: &[u8],
        stats: &'txn mut CommitInfo,
    ) -> Result<Self> {
        Ok(Self {
            inner: BucketCursor::new(cursor, bucket)?,
            stats,
        })
    }

    /// Delete the entry under the cursor.
    ///
    /// Re-position with `seek` on the deleted key to continue walking.
    pub fn delete_current(&mut self) -> Result<()> {
        if self.inner.place != Place::At {
            return Err(QuayError::InvalidState("cursor is not positioned".into()));
        }
        self.inner
            .cursor
            .del(WriteFlags::empty())
            .map_err(|e| QuayError::storage(&self.inner.bucket, e))?;
        self.stats.entries_deleted += 1;
        Ok(())
    }

    /// Store `value` under `key` and leave the cursor on it
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut full = self.inner.prefix.clone();
        full.extend_from_slice(key);
        self.inner
            .cursor
            .put(&full, &value, WriteFlags::empty())
            .map_err(|e| QuayError::storage(&self.inner.bucket, e))?;
        self.inner.place = Place::At;
        self.stats.entries_written += 1;
        Ok(())
    }
}

impl<'txn> EntryCursor for RwBucketCursor<'txn> {
    fn bucket(&self) -> &[u8] {
        self.inner.bucket()
    }

    fn first(&mut self) -> Result<Option<Entry>> {
        self.inner.first()
    }

    fn last(&mut self) -> Result<Option<Entry>> {
        self.inner.last()
    }

    fn next(&mut self) -> Result<Option<Entry>> {
        self.inner.next()
    }

    fn prev(&mut self) -> Result<Option<Entry>> {
        self.inner.prev()
    }

    fn seek(&mut self, key: &[u8]) -> Result<Option<Entry>> {
        self.inner.seek(key)
    }
}
