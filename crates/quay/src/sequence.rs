//! Push/pop primitives over ordered buckets
//!
//! Entries live under [`SequenceKey`]s. A push at the front stores the value
//! one below the current minimum key, a push at the back one above the
//! current maximum; an empty bucket is seeded with the caller's default key.
//! Pops read and delete the extreme entry at the requested end.
//!
//! The plain [`push`]/[`pop`] work against any [`BucketWriter`]. The blocking
//! and signalling variants coordinate through a [`Session`].

use quay_core::{
    bucket_label, observe, BucketWriter, Codec, Position, QuayError, Result, SequenceKey,
};
use quay_lmdb::LmdbWriteTxn;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Instant;

use crate::session::Session;

/// Store `value` at `position`, returning the key it was stored under.
///
/// Fails with `MissingDefaultKey` when the bucket is empty and no default
/// key is given; the bucket is not created in that case.
pub fn push<W>(
    txn: &mut W,
    bucket: &[u8],
    position: Position,
    value: &[u8],
    default_key: Option<SequenceKey>,
) -> Result<SequenceKey>
where
    W: BucketWriter + ?Sized,
{
    let key = match position.extreme(&*txn, bucket)? {
        Some((extreme, _)) => {
            let current =
                SequenceKey::from_bytes(&extreme).ok_or_else(|| QuayError::InvalidKey {
                    bucket: bucket_label(bucket),
                    len: extreme.len(),
                })?;
            current
                .checked_step(position)
                .ok_or_else(|| QuayError::KeySpaceExhausted {
                    bucket: bucket_label(bucket),
                    position,
                })?
        }
        None => default_key.ok_or_else(|| QuayError::MissingDefaultKey(bucket_label(bucket)))?,
    };

    txn.create_bucket_if_absent(bucket)?;
    txn.put(bucket, &key.to_bytes(), value)?;
    observe::record_push(position);
    tracing::trace!(bucket = %bucket_label(bucket), %position, %key, "pushed");
    Ok(key)
}

/// Remove and return the value at `position`.
///
/// `None` if the bucket is missing or empty.
pub fn pop<W>(txn: &mut W, bucket: &[u8], position: Position) -> Result<Option<Vec<u8>>>
where
    W: BucketWriter + ?Sized,
{
    let Some((key, value)) = position.extreme(&*txn, bucket)? else {
        return Ok(None);
    };
    txn.delete(bucket, &key)?;
    observe::record_pop(position);
    Ok(Some(value))
}

/// Pop at `position`, blocking until a value is available.
///
/// `txn` is registered with `session` while waiting, so producers going
/// through [`Session::update`] write into it instead of opening a second
/// write transaction. Fails with `SessionBusy` if another call is already
/// waiting on the same session.
pub fn pop_or_wait(
    txn: &mut LmdbWriteTxn<'_>,
    bucket: &[u8],
    position: Position,
    session: &Session,
) -> Result<Vec<u8>> {
    let started = Instant::now();
    let value = session.host_until(txn, |txn| pop(txn, bucket, position))?;
    observe::record_wait(started.elapsed());
    Ok(value)
}

/// Push while holding the session lock, then wake one waiter
pub fn push_and_signal(
    txn: &mut LmdbWriteTxn<'_>,
    bucket: &[u8],
    position: Position,
    value: &[u8],
    default_key: Option<SequenceKey>,
    session: &Session,
) -> Result<SequenceKey> {
    session.signal_after(|| push(txn, bucket, position, value, default_key))
}

/// Encode `value` with `codec`, then [`push_and_signal`].
///
/// Encoding happens before anything is written.
pub fn push_model_and_signal<T, C>(
    txn: &mut LmdbWriteTxn<'_>,
    bucket: &[u8],
    position: Position,
    value: &T,
    default_key: Option<SequenceKey>,
    session: &Session,
    codec: &C,
) -> Result<SequenceKey>
where
    T: Serialize + ?Sized,
    C: Codec,
{
    let bytes = codec.encode(value)?;
    push_and_signal(txn, bucket, position, &bytes, default_key, session)
}

/// [`pop_or_wait`], then decode with `codec`.
///
/// The element is already deleted inside `txn` when decoding runs. Rolling
/// `txn` back on the returned error restores it; committing loses it.
pub fn pop_model_or_wait<T, C>(
    txn: &mut LmdbWriteTxn<'_>,
    bucket: &[u8],
    position: Position,
    session: &Session,
    codec: &C,
) -> Result<T>
where
    T: DeserializeOwned,
    C: Codec,
{
    let bytes = pop_or_wait(txn, bucket, position, session)?;
    codec.decode(&bytes).map_err(|e| {
        tracing::warn!(
            bucket = %bucket_label(bucket),
            codec = codec.name(),
            error = %e,
            "failed to decode popped value"
        );
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quay_core::{BucketReader, StoreConfig, SyncMode};
    use quay_lmdb::LmdbStore;
    use tempfile::TempDir;

    fn open_store() -> (LmdbStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StoreConfig::new(dir.path())
            .with_map_size(16 * 1024 * 1024)
            .with_sync_mode(SyncMode::NoSync);
        (LmdbStore::open(cfg).unwrap(), dir)
    }

    fn drain(store: &LmdbStore, bucket: &[u8], position: Position) -> Vec<Vec<u8>> {
        store
            .update(|txn| {
                let mut out = Vec::new();
                while let Some(value) = pop(txn, bucket, position)? {
                    out.push(value);
                }
                Ok(out)
            })
            .unwrap()
    }

    #[test]
    fn test_push_back_grows_upward_from_default() {
        let (store, _dir) = open_store();
        let keys = store
            .update(|txn| {
                let a = push(txn, b"q", Position::Back, b"a", Some(SequenceKey::QUEUE_DEFAULT))?;
                let b = push(txn, b"q", Position::Back, b"b", Some(SequenceKey::QUEUE_DEFAULT))?;
                Ok((a, b))
            })
            .unwrap();
        assert_eq!(keys, (SequenceKey::new(0), SequenceKey::new(1)));
        assert_eq!(
            drain(&store, b"q", Position::Front),
            vec![b"a".to_vec(), b"b".to_vec()]
        );
    }

    #[test]
    fn test_push_front_grows_downward() {
        let (store, _dir) = open_store();
        let key = store
            .update(|txn| {
                push(txn, b"d", Position::Front, b"1", Some(SequenceKey::DEQUE_DEFAULT))?;
                push(txn, b"d", Position::Front, b"2", Some(SequenceKey::DEQUE_DEFAULT))
            })
            .unwrap();
        assert_eq!(key.value(), (1 << 63) - 1);
        assert_eq!(
            drain(&store, b"d", Position::Front),
            vec![b"2".to_vec(), b"1".to_vec()]
        );
    }

    #[test]
    fn test_missing_default_key_leaves_bucket_absent() {
        let (store, _dir) = open_store();
        let err = store
            .update(|txn| push(txn, b"never", Position::Back, b"x", None))
            .unwrap_err();
        assert!(matches!(err, QuayError::MissingDefaultKey(_)));
        assert!(err.is_storage());
        assert!(!store.view(|txn| txn.bucket_exists(b"never")).unwrap());
    }

    #[test]
    fn test_default_key_ignored_when_populated() {
        let (store, _dir) = open_store();
        store
            .update(|txn| {
                push(txn, b"q", Position::Back, b"a", Some(SequenceKey::new(10)))?;
                let key = push(txn, b"q", Position::Back, b"b", None)?;
                assert_eq!(key, SequenceKey::new(11));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_front_pushes_cross_single_byte_boundary() {
        let (store, _dir) = open_store();
        store
            .update(|txn| {
                push(txn, b"b", Position::Front, &[0], Some(SequenceKey::new(0x102)))?;
                for i in 1u8..8 {
                    push(txn, b"b", Position::Front, &[i], None)?;
                }
                Ok(())
            })
            .unwrap();

        // last push landed on 0xfb; front order is newest first
        let first = store.view(|txn| txn.first(b"b")).unwrap().unwrap();
        assert_eq!(first.0, SequenceKey::new(0xfb).to_bytes().to_vec());
        let values: Vec<u8> = drain(&store, b"b", Position::Front)
            .into_iter()
            .map(|v| v[0])
            .collect();
        assert_eq!(values, vec![7, 6, 5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_key_space_exhausted() {
        let (store, _dir) = open_store();
        let err = store
            .update(|txn| {
                push(txn, b"lo", Position::Front, b"a", Some(SequenceKey::new(0)))?;
                push(txn, b"lo", Position::Front, b"b", None)
            })
            .unwrap_err();
        assert!(matches!(
            err,
            QuayError::KeySpaceExhausted {
                position: Position::Front,
                ..
            }
        ));

        let err = store
            .update(|txn| {
                push(txn, b"hi", Position::Back, b"a", Some(SequenceKey::new(u64::MAX)))?;
                push(txn, b"hi", Position::Back, b"b", None)
            })
            .unwrap_err();
        assert!(matches!(
            err,
            QuayError::KeySpaceExhausted {
                position: Position::Back,
                ..
            }
        ));
    }

    #[test]
    fn test_foreign_key_width_is_rejected() {
        let (store, _dir) = open_store();
        store
            .update(|txn| {
                txn.create_bucket_if_absent(b"odd")?;
                txn.put(b"odd", &[0x01, 0x00], b"legacy")
            })
            .unwrap();

        let err = store
            .update(|txn| push(txn, b"odd", Position::Back, b"new", None))
            .unwrap_err();
        assert!(matches!(err, QuayError::InvalidKey { len: 2, .. }));

        // pop never parses keys
        assert_eq!(drain(&store, b"odd", Position::Front), vec![b"legacy".to_vec()]);
    }

    #[test]
    fn test_pop_missing_bucket_is_none() {
        let (store, _dir) = open_store();
        let popped = store.update(|txn| pop(txn, b"ghost", Position::Back)).unwrap();
        assert_eq!(popped, None);
    }
}
