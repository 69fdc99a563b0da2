//! Typed values stored under caller-chosen keys

use quay_core::{BucketReader, BucketWriter, Codec, Result};
use quay_lmdb::LmdbStore;
use serde::{de::DeserializeOwned, Serialize};

/// Encode `value` and store it under `key`; the bucket must exist
pub fn put_model<W, T, C>(txn: &mut W, bucket: &[u8], key: &[u8], value: &T, codec: &C) -> Result<()>
where
    W: BucketWriter + ?Sized,
    T: Serialize + ?Sized,
    C: Codec,
{
    let bytes = codec.encode(value)?;
    txn.put(bucket, key, &bytes)
}

/// Load and decode the value under `key`.
///
/// `None` if the bucket or key is missing, or the stored value is empty.
pub fn get_model<R, T, C>(txn: &R, bucket: &[u8], key: &[u8], codec: &C) -> Result<Option<T>>
where
    R: BucketReader + ?Sized,
    T: DeserializeOwned,
    C: Codec,
{
    match txn.get(bucket, key)? {
        Some(bytes) if !bytes.is_empty() => codec.decode(&bytes).map(Some),
        _ => Ok(None),
    }
}

/// Encode `value`, then create the bucket if needed and store it, in one
/// transaction of its own
pub fn put_model_in_bucket<T, C>(
    store: &LmdbStore,
    bucket: &[u8],
    key: &[u8],
    value: &T,
    codec: &C,
) -> Result<()>
where
    T: Serialize + ?Sized,
    C: Codec,
{
    let bytes = codec.encode(value)?;
    crate::simple::put_in_bucket(store, bucket, key, &bytes)
}

pub fn get_model_from_bucket<T, C>(
    store: &LmdbStore,
    bucket: &[u8],
    key: &[u8],
    codec: &C,
) -> Result<Option<T>>
where
    T: DeserializeOwned,
    C: Codec,
{
    store.view(|txn| get_model(txn, bucket, key, codec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quay_core::{BincodeCodec, JsonCodec, QuayError, StoreConfig, SyncMode};
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Account {
        owner: String,
        balance: i64,
    }

    fn open_store() -> (LmdbStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StoreConfig::new(dir.path())
            .with_map_size(16 * 1024 * 1024)
            .with_sync_mode(SyncMode::NoSync);
        (LmdbStore::open(cfg).unwrap(), dir)
    }

    fn alice() -> Account {
        Account {
            owner: "alice".into(),
            balance: 100,
        }
    }

    #[test]
    fn test_put_and_get_model_in_txn() {
        let (store, _dir) = open_store();
        store
            .update(|txn| {
                txn.create_bucket_if_absent(b"accounts")?;
                put_model(txn, b"accounts", b"a", &alice(), &BincodeCodec)
            })
            .unwrap();

        let loaded: Option<Account> = store
            .view(|txn| get_model(txn, b"accounts", b"a", &BincodeCodec))
            .unwrap();
        assert_eq!(loaded, Some(alice()));
    }

    #[test]
    fn test_put_model_requires_bucket() {
        let (store, _dir) = open_store();
        let err = store
            .update(|txn| put_model(txn, b"accounts", b"a", &alice(), &JsonCodec))
            .unwrap_err();
        assert!(matches!(err, QuayError::BucketNotFound(_)));
    }

    #[test]
    fn test_missing_and_empty_values_are_none() {
        let (store, _dir) = open_store();
        crate::simple::put_in_bucket(&store, b"accounts", b"empty", b"").unwrap();

        let empty: Option<Account> =
            get_model_from_bucket(&store, b"accounts", b"empty", &JsonCodec).unwrap();
        assert_eq!(empty, None);
        let missing: Option<Account> =
            get_model_from_bucket(&store, b"accounts", b"nobody", &JsonCodec).unwrap();
        assert_eq!(missing, None);
        let no_bucket: Option<Account> =
            get_model_from_bucket(&store, b"ghosts", b"nobody", &JsonCodec).unwrap();
        assert_eq!(no_bucket, None);
    }

    #[test]
    fn test_model_in_bucket_creates_bucket() {
        let (store, _dir) = open_store();
        put_model_in_bucket(&store, b"accounts", b"a", &alice(), &JsonCodec).unwrap();
        let loaded: Option<Account> =
            get_model_from_bucket(&store, b"accounts", b"a", &JsonCodec).unwrap();
        assert_eq!(loaded, Some(alice()));
    }

    #[test]
    fn test_undecodable_value_is_serialization_error() {
        let (store, _dir) = open_store();
        crate::simple::put_in_bucket(&store, b"accounts", b"bad", b"{oops").unwrap();
        let err = get_model_from_bucket::<Account, _>(&store, b"accounts", b"bad", &JsonCodec)
            .unwrap_err();
        assert!(err.is_serialization());
    }
}
