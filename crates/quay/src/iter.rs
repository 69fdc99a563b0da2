//! Bucket walks with per-element actions

use bitflags::bitflags;
use quay_core::{Codec, QuayError, Result};
use quay_lmdb::{EntryCursor, LmdbReadTxn, LmdbWriteTxn};
use serde::{de::DeserializeOwned, Serialize};

bitflags! {
    /// What to do with an element after the callback saw it
    ///
    /// Flags combine: `UPDATE | RETURN` stores the modified value and stops.
    /// `DELETE` takes precedence over `UPDATE`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Action: u8 {
        /// Leave the element alone and continue
        const NONE = 1 << 0;
        /// Stop and return the element
        const RETURN = 1 << 1;
        /// Re-encode the (modified) element and store it
        const UPDATE = 1 << 2;
        /// Remove the element
        const DELETE = 1 << 3;
    }
}

/// Walk `bucket` in key order, decoding each value and applying the action
/// `f` returns for it.
///
/// Returns the element `f` marked with `RETURN`, or `None` after the last
/// element. Any error stops the walk; the caller's transaction decides
/// whether earlier updates and deletes are kept.
pub fn for_each<T, C, F>(
    txn: &mut LmdbWriteTxn<'_>,
    bucket: &[u8],
    codec: &C,
    mut f: F,
) -> Result<Option<(Vec<u8>, T)>>
where
    T: Serialize + DeserializeOwned,
    C: Codec,
    F: FnMut(&[u8], &mut T) -> Result<Action>,
{
    let mut cursor = txn.cursor_mut(bucket)?;
    let mut entry = cursor.first()?;
    while let Some((key, bytes)) = entry {
        let mut value: T = codec.decode(&bytes)?;
        let action = f(&key, &mut value)?;

        let deleted = action.contains(Action::DELETE);
        if deleted {
            cursor.delete_current()?;
        } else if action.contains(Action::UPDATE) {
            let bytes = codec.encode(&value)?;
            cursor.put(&key, &bytes)?;
        }

        if action.contains(Action::RETURN) {
            return Ok(Some((key, value)));
        }

        entry = if deleted {
            cursor.seek(&key)?
        } else {
            cursor.next()?
        };
    }
    Ok(None)
}

/// Read-only [`for_each`]; `UPDATE` and `DELETE` fail with `InvalidState`
pub fn for_each_ro<T, C, F>(
    txn: &LmdbReadTxn<'_>,
    bucket: &[u8],
    codec: &C,
    mut f: F,
) -> Result<Option<(Vec<u8>, T)>>
where
    T: DeserializeOwned,
    C: Codec,
    F: FnMut(&[u8], &mut T) -> Result<Action>,
{
    let mut cursor = txn.cursor(bucket)?;
    while let Some((key, bytes)) = cursor.next()? {
        let mut value: T = codec.decode(&bytes)?;
        let action = f(&key, &mut value)?;

        if action.intersects(Action::UPDATE | Action::DELETE) {
            return Err(QuayError::InvalidState(
                "update and delete need a write transaction".into(),
            ));
        }
        if action.contains(Action::RETURN) {
            return Ok(Some((key, value)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simple::{bucket_size, get_from_bucket, put_in_bucket};
    use quay_core::{JsonCodec, StoreConfig, SyncMode};
    use quay_lmdb::LmdbStore;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Task {
        title: String,
        done: bool,
    }

    fn open_store() -> (LmdbStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StoreConfig::new(dir.path())
            .with_map_size(16 * 1024 * 1024)
            .with_sync_mode(SyncMode::NoSync);
        (LmdbStore::open(cfg).unwrap(), dir)
    }

    fn seed(store: &LmdbStore) {
        for (key, title) in [("1", "write"), ("2", "review"), ("3", "ship")] {
            let task = Task {
                title: title.into(),
                done: false,
            };
            let bytes = serde_json::to_vec(&task).unwrap();
            put_in_bucket(store, b"tasks", key.as_bytes(), &bytes).unwrap();
        }
    }

    fn load(store: &LmdbStore, key: &[u8]) -> Option<Task> {
        get_from_bucket(store, b"tasks", key)
            .unwrap()
            .map(|bytes| serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_return_stops_walk() {
        let (store, _dir) = open_store();
        seed(&store);

        let mut seen = Vec::new();
        let found = store
            .update(|txn| {
                for_each(txn, b"tasks", &JsonCodec, |key, task: &mut Task| {
                    seen.push(key.to_vec());
                    if task.title == "review" {
                        Ok(Action::RETURN)
                    } else {
                        Ok(Action::NONE)
                    }
                })
            })
            .unwrap();

        let (key, task) = found.unwrap();
        assert_eq!(key, b"2".to_vec());
        assert_eq!(task.title, "review");
        assert_eq!(seen, vec![b"1".to_vec(), b"2".to_vec()]);
    }

    #[test]
    fn test_update_and_return() {
        let (store, _dir) = open_store();
        seed(&store);

        store
            .update(|txn| {
                for_each(txn, b"tasks", &JsonCodec, |_, task: &mut Task| {
                    task.done = true;
                    Ok(Action::UPDATE | Action::RETURN)
                })
            })
            .unwrap();

        assert!(load(&store, b"1").unwrap().done);
        assert!(!load(&store, b"2").unwrap().done);
    }

    #[test]
    fn test_update_all() {
        let (store, _dir) = open_store();
        seed(&store);

        let found = store
            .update(|txn| {
                for_each(txn, b"tasks", &JsonCodec, |_, task: &mut Task| {
                    task.done = true;
                    Ok(Action::UPDATE)
                })
            })
            .unwrap();
        assert!(found.is_none());
        for key in [b"1", b"2", b"3"] {
            assert!(load(&store, key).unwrap().done);
        }
    }

    #[test]
    fn test_delete_every_other() {
        let (store, _dir) = open_store();
        seed(&store);

        let mut visited = 0;
        store
            .update(|txn| {
                for_each(txn, b"tasks", &JsonCodec, |key, _: &mut Task| {
                    visited += 1;
                    if key == b"2" {
                        Ok(Action::NONE)
                    } else {
                        Ok(Action::DELETE)
                    }
                })
            })
            .unwrap();

        assert_eq!(visited, 3);
        assert_eq!(bucket_size(&store, b"tasks").unwrap(), 1);
        assert!(load(&store, b"2").is_some());
    }

    #[test]
    fn test_callback_error_rolls_back() {
        let (store, _dir) = open_store();
        seed(&store);

        let result = store.update(|txn| {
            for_each(txn, b"tasks", &JsonCodec, |key, _: &mut Task| {
                if key == b"3" {
                    Err(QuayError::InvalidState("stop".into()))
                } else {
                    Ok(Action::DELETE)
                }
            })
        });
        assert!(result.is_err());
        assert_eq!(bucket_size(&store, b"tasks").unwrap(), 3);
    }

    #[test]
    fn test_missing_bucket_yields_nothing() {
        let (store, _dir) = open_store();
        let found = store
            .update(|txn| {
                for_each(txn, b"nothing", &JsonCodec, |_, _: &mut Task| Ok(Action::RETURN))
            })
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_read_only_walk() {
        let (store, _dir) = open_store();
        seed(&store);

        let found = store
            .view(|txn| {
                for_each_ro(txn, b"tasks", &JsonCodec, |_, task: &mut Task| {
                    Ok(if task.title == "ship" {
                        Action::RETURN
                    } else {
                        Action::NONE
                    })
                })
            })
            .unwrap();
        assert_eq!(found.unwrap().0, b"3".to_vec());

        let err = store
            .view(|txn| {
                for_each_ro(txn, b"tasks", &JsonCodec, |_, _: &mut Task| Ok(Action::DELETE))
            })
            .unwrap_err();
        assert!(matches!(err, QuayError::InvalidState(_)));
    }
}
