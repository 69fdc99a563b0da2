//! Persistent single-ended FIFO queue
//!
//! ```no_run
//! use quay::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let db = QuayDb::open("./data")?;
//! let queue = db.queue("jobs")?;
//!
//! queue.enqueue(&"resize image 42")?;
//! let job: String = queue.dequeue()?; // blocks while the queue is empty
//! # Ok(())
//! # }
//! ```

use quay_core::{Codec, JsonCodec, Position, Result, SequenceKey};
use quay_lmdb::LmdbStore;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use crate::handle::{SequenceHandle, Shared};
use crate::session::Session;

/// FIFO queue over one bucket: enqueue at the back, dequeue from the front
///
/// Clones share the same session and consumer gate. Safe to use from many
/// threads; blocked `dequeue` calls are served one at a time.
#[derive(Debug)]
pub struct Queue<C = JsonCodec> {
    handle: SequenceHandle<C>,
}

impl<C: Clone> Clone for Queue<C> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl<C> Queue<C>
where
    C: Codec + Clone + 'static,
{
    /// Queue on `name` with a session of its own
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

    /// Encode `value` and append it
    pub fn enqueue<T>(&self, value: &T) -> Result<SequenceKey>
    where
        T: Serialize + ?Sized,
    {
        self.handle
            .push_model(Position::Back, SequenceKey::QUEUE_DEFAULT, value)
    }

    pub fn enqueue_bytes(&self, value: impl Into<Vec<u8>>) -> Result<SequenceKey> {
        self.handle
            .push_bytes(Position::Back, SequenceKey::QUEUE_DEFAULT, value.into())
    }

    /// Remove and decode the oldest value, blocking while the queue is empty.
    ///
    /// A decode failure rolls the transaction back. A value that was already
    /// stored stays in the queue. A value a producer handed over while this
    /// call waited is discarded instead, and that producer's `enqueue` fails
    /// with `QuayError::Transaction`.
    pub fn dequeue<T>(&self) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.handle.pop_model(Position::Front)
    }

    pub fn dequeue_bytes(&self) -> Result<Vec<u8>> {
        self.handle.pop_bytes(Position::Front)
    }

    /// Non-blocking dequeue; `None` when empty or while a blocked
    /// `dequeue` is waiting for the next value
    pub fn try_dequeue<T>(&self) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.handle.try_pop_model(Position::Front)
    }

    pub fn try_dequeue_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.handle.try_pop_bytes(Position::Front)
    }

    /// Number of queued values; 0 if nothing was ever enqueued
    pub fn size(&self) -> Result<usize> {
        self.handle.size()
    }
}
