//! One-shot helpers that run a single operation in a transaction of its own

use quay_core::{BucketReader, BucketWriter, Result};
use quay_lmdb::LmdbStore;

/// Create `bucket` if needed and store `value` under `key`
pub fn put_in_bucket(store: &LmdbStore, bucket: &[u8], key: &[u8], value: &[u8]) -> Result<()> {
    store.update(|txn| {
        txn.create_bucket_if_absent(bucket)?;
        txn.put(bucket, key, value)
    })
}

/// Value under `key`, `None` if the bucket or key is missing
pub fn get_from_bucket(store: &LmdbStore, bucket: &[u8], key: &[u8]) -> Result<Option<Vec<u8>>> {
    store.view(|txn| txn.get(bucket, key))
}

/// Remove `key`; returns whether anything was removed
pub fn delete_from_bucket(store: &LmdbStore, bucket: &[u8], key: &[u8]) -> Result<bool> {
    store.update(|txn| {
        if !txn.bucket_exists(bucket)? {
            return Ok(false);
        }
        txn.delete(bucket, key)
    })
}

/// Number of entries in `bucket`, 0 if it does not exist
pub fn bucket_size(store: &LmdbStore, bucket: &[u8]) -> Result<usize> {
    store.view(|txn| txn.bucket_len(bucket))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quay_core::{QuayError, StoreConfig, SyncMode};
    use tempfile::TempDir;

    fn open_store() -> (LmdbStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StoreConfig::new(dir.path())
            .with_map_size(16 * 1024 * 1024)
            .with_sync_mode(SyncMode::NoSync);
        (LmdbStore::open(cfg).unwrap(), dir)
    }

    #[test]
    fn test_put_get_delete() {
        let (store, _dir) = open_store();
        put_in_bucket(&store, b"config", b"mode", b"fast").unwrap();
        put_in_bucket(&store, b"config", b"level", b"3").unwrap();

        assert_eq!(
            get_from_bucket(&store, b"config", b"mode").unwrap(),
            Some(b"fast".to_vec())
        );
        assert_eq!(bucket_size(&store, b"config").unwrap(), 2);

        assert!(delete_from_bucket(&store, b"config", b"mode").unwrap());
        assert_eq!(get_from_bucket(&store, b"config", b"mode").unwrap(), None);
        assert_eq!(bucket_size(&store, b"config").unwrap(), 1);
    }

    #[test]
    fn test_missing_bucket() {
        let (store, _dir) = open_store();
        assert_eq!(get_from_bucket(&store, b"nothing", b"k").unwrap(), None);
        assert!(!delete_from_bucket(&store, b"nothing", b"k").unwrap());
        assert_eq!(bucket_size(&store, b"nothing").unwrap(), 0);
    }

    #[test]
    fn test_empty_bucket_name() {
        let (store, _dir) = open_store();
        let err = put_in_bucket(&store, b"", b"k", b"v").unwrap_err();
        assert!(matches!(err, QuayError::InvalidBucketName(_)));
    }
}
