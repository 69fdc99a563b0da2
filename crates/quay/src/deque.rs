//! Persistent double-ended queue
//!
//! Keys start at the middle of the key space so the deque can grow in both
//! directions. Pushing repeatedly at one end and popping from the same end
//! behaves like a stack.

use quay_core::{Codec, JsonCodec, Position, Result, SequenceKey};
use quay_lmdb::LmdbStore;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use crate::handle::{SequenceHandle, Shared};
use crate::session::Session;

/// Double-ended queue over one bucket
#[derive(Debug)]
pub struct Deque<C = JsonCodec> {
    handle: SequenceHandle<C>,
}

impl<C: Clone> Clone for Deque<C> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl<C> Deque<C>
where
    C: Codec + Clone + 'static,
{
    /// Deque on `name` with a session of its own
    pub fn new(store: LmdbStore, name: impl AsRef<[u8]>, codec: C) -> Result<Self> {
        Self::with_shared(name.as_ref(), Shared::new(store), codec)
    }

    pub(crate) fn with_shared(name: &[u8], shared: Arc<Shared>, codec: C) -> Result<Self> {
        Ok(Self {
            handle: SequenceHandle::new(name, shared, codec)?,
        })
    }

    pub fn name(&self) -> &[u8] {
        self.handle.name()
    }

    pub fn session(&self) -> &Arc<Session> {
        self.handle.session()
    }

    pub fn enqueue_front<T>(&self, value: &T) -> Result<SequenceKey>
    where
        T: Serialize + ?Sized,
    {
        self.handle
            .push_model(Position::Front, SequenceKey::DEQUE_DEFAULT, value)
    }

    pub fn enqueue_back<T>(&self, value: &T) -> Result<SequenceKey>
    where
        T: Serialize + ?Sized,
    {
        self.handle
            .push_model(Position::Back, SequenceKey::DEQUE_DEFAULT, value)
    }

    pub fn enqueue_front_bytes(&self, value: impl Into<Vec<u8>>) -> Result<SequenceKey> {
        self.handle
            .push_bytes(Position::Front, SequenceKey::DEQUE_DEFAULT, value.into())
    }

    pub fn enqueue_back_bytes(&self, value: impl Into<Vec<u8>>) -> Result<SequenceKey> {
        self.handle
            .push_bytes(Position::Back, SequenceKey::DEQUE_DEFAULT, value.into())
    }

    /// Remove and decode the front value, blocking while the deque is empty.
    ///
    /// Decode failures roll back as in [`Queue::dequeue`](crate::Queue::dequeue).
    pub fn dequeue_front<T>(&self) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.handle.pop_model(Position::Front)
    }

    /// Remove and decode the back value, blocking while the deque is empty.
    ///
    /// Decode failures roll back as in [`Queue::dequeue`](crate::Queue::dequeue).
    pub fn dequeue_back<T>(&self) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.handle.pop_model(Position::Back)
    }

    pub fn dequeue_front_bytes(&self) -> Result<Vec<u8>> {
        self.handle.pop_bytes(Position::Front)
    }

    pub fn dequeue_back_bytes(&self) -> Result<Vec<u8>> {
        self.handle.pop_bytes(Position::Back)
    }

    pub fn try_dequeue_front<T>(&self) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.handle.try_pop_model(Position::Front)
    }

    pub fn try_dequeue_back<T>(&self) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.handle.try_pop_model(Position::Back)
    }

    pub fn try_dequeue_front_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.handle.try_pop_bytes(Position::Front)
    }

    pub fn try_dequeue_back_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.handle.try_pop_bytes(Position::Back)
    }

    pub fn size(&self) -> Result<usize> {
        self.handle.size()
    }
}
