use parking_lot::Mutex;
use quay_core::{BucketReader, Codec, Position, Result, SequenceKey};
use quay_lmdb::{keys::validate_bucket_name, LmdbStore};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::sequence;
use crate::session::Session;

/// Session and consumer gate shared by every handle on one bucket
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) session: Arc<Session>,
    gate: Mutex<()>,
}

impl Shared {
    pub(crate) fn new(store: LmdbStore) -> Arc<Self> {
        Arc::new(Self {
            session: Arc::new(Session::new(store)),
            gate: Mutex::new(()),
        })
    }
}

/// Bucket name, shared session and codec behind a `Queue` or `Deque`
pub(crate) struct SequenceHandle<C> {
    name: Arc<[u8]>,
    shared: Arc<Shared>,
    codec: C,
}

impl<C: Clone> Clone for SequenceHandle<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            shared: self.shared.clone(),
            codec: self.codec.clone(),
        }
    }
}

impl<C> fmt::Debug for SequenceHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceHandle")
            .field("name", &String::from_utf8_lossy(&self.name))
            .finish_non_exhaustive()
    }
}

impl<C> SequenceHandle<C>
where
    C: Codec + Clone + 'static,
{
    pub(crate) fn new(name: &[u8], shared: Arc<Shared>, codec: C) -> Result<Self> {
        validate_bucket_name(name)?;
        Ok(Self {
            name: Arc::from(name),
            shared,
            codec,
        })
    }

    pub(crate) fn name(&self) -> &[u8] {
        &self.name
    }

    pub(crate) fn session(&self) -> &Arc<Session> {
        &self.shared.session
    }

    pub(crate) fn push_bytes(
        &self,
        position: Position,
        default_key: SequenceKey,
        value: Vec<u8>,
    ) -> Result<SequenceKey> {
        let name = self.name.clone();
        let session = self.shared.session.clone();
        self.shared.session.update(move |txn| {
            sequence::push_and_signal(txn, &name, position, &value, Some(default_key), &session)
        })
    }

    pub(crate) fn push_model<T>(
        &self,
        position: Position,
        default_key: SequenceKey,
        value: &T,
    ) -> Result<SequenceKey>
    where
        T: Serialize + ?Sized,
    {
        let bytes = self.codec.encode(value)?;
        self.push_bytes(position, default_key, bytes)
    }

    /// Blocking pop; consumers of one bucket take turns through the gate
    pub(crate) fn pop_bytes(&self, position: Position) -> Result<Vec<u8>> {
        let _gate = self.shared.gate.lock();
        let name = self.name.clone();
        let session = self.shared.session.clone();
        self.shared
            .session
            .update(move |txn| sequence::pop_or_wait(txn, &name, position, &session))
    }

    /// Blocking pop and decode. A decode failure rolls the pop back.
    pub(crate) fn pop_model<T>(&self, position: Position) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let _gate = self.shared.gate.lock();
        let name = self.name.clone();
        let session = self.shared.session.clone();
        let codec = self.codec.clone();
        self.shared.session.update(move |txn| {
            sequence::pop_model_or_wait(txn, &name, position, &session, &codec)
        })
    }

    /// Non-blocking pop. `None` while a blocked consumer waits, since it
    /// claims the next value.
    pub(crate) fn try_pop_bytes(&self, position: Position) -> Result<Option<Vec<u8>>> {
        Ok(self
            .shared
            .session
            .update_unless_waiting(|txn| sequence::pop(txn, &self.name, position))?
            .flatten())
    }

    pub(crate) fn try_pop_model<T>(&self, position: Position) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        Ok(self
            .shared
            .session
            .update_unless_waiting(|txn| {
                sequence::pop(txn, &self.name, position)?
                    .map(|bytes| self.codec.decode(&bytes))
                    .transpose()
            })?
            .flatten())
    }

    pub(crate) fn size(&self) -> Result<usize> {
        self.shared
            .session
            .store()
            .view(|txn| txn.bucket_len(&self.name))
    }
}
