//! Decoding wrapper around bucket cursors

use quay_core::{bucket_label, Codec, QuayError, Result};
use quay_lmdb::EntryCursor;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Cursor that decodes each value into `T`
///
/// Method names carry an `_entry` suffix to stay clear of `Iterator`'s.
///
/// ```no_run
/// use quay::prelude::*;
/// use quay::ModelCursor;
///
/// # fn main() -> Result<()> {
/// let db = QuayDb::open("./data")?;
/// let txn = db.store().read_txn()?;
/// let cursor = ModelCursor::<_, u64, _>::new(txn.cursor(b"counters")?, JsonCodec);
/// for entry in cursor {
///     let (key, count) = entry?;
///     println!("{}: {}", String::from_utf8_lossy(&key), count);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ModelCursor<Cur, T, C> {
    cursor: Cur,
    codec: C,
    _value: PhantomData<fn() -> T>,
}

impl<Cur, T, C> ModelCursor<Cur, T, C>
where
    Cur: EntryCursor,
    T: DeserializeOwned,
    C: Codec,
{
    pub fn new(cursor: Cur, codec: C) -> Self {
        Self {
            cursor,
            codec,
            _value: PhantomData,
        }
    }

    pub fn first_entry(&mut self) -> Result<Option<(Vec<u8>, T)>> {
        let entry = self.cursor.first()?;
        self.decode(entry)
    }

    pub fn last_entry(&mut self) -> Result<Option<(Vec<u8>, T)>> {
        let entry = self.cursor.last()?;
        self.decode(entry)
    }

    pub fn next_entry(&mut self) -> Result<Option<(Vec<u8>, T)>> {
        let entry = self.cursor.next()?;
        self.decode(entry)
    }

    pub fn prev_entry(&mut self) -> Result<Option<(Vec<u8>, T)>> {
        let entry = self.cursor.prev()?;
        self.decode(entry)
    }

    pub fn seek_entry(&mut self, key: &[u8]) -> Result<Option<(Vec<u8>, T)>> {
        let entry = self.cursor.seek(key)?;
        self.decode(entry)
    }

    pub fn into_inner(self) -> Cur {
        self.cursor
    }

    fn decode(&self, entry: Option<(Vec<u8>, Vec<u8>)>) -> Result<Option<(Vec<u8>, T)>> {
        let Some((key, value)) = entry else {
            return Ok(None);
        };
        match self.codec.decode(&value) {
            Ok(model) => Ok(Some((key, model))),
            Err(e) => Err(QuayError::Serialization(format!(
                "entry {:02x?} in bucket [{}]: {}",
                key,
                bucket_label(self.cursor.bucket()),
                e
            ))),
        }
    }
}

impl<Cur, T, C> Iterator for ModelCursor<Cur, T, C>
where
    Cur: EntryCursor,
    T: DeserializeOwned,
    C: Codec,
{
    type Item = Result<(Vec<u8>, T)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}
