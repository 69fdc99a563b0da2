//! Transaction reuse across a blocking pop
//!
//! A consumer blocked in [`pop_or_wait`](crate::sequence::pop_or_wait) keeps
//! its write transaction open, and with it the environment's single writer
//! lock. Producers going through [`Session::update`] must not open a second
//! write transaction then: they hand their work to the waiting thread, which
//! runs it against the open transaction. The transaction never leaves the
//! thread that opened it.
//!
//! Slot lifecycle: `Idle -> Open` when `update` starts its own transaction,
//! `Idle | Open -> Waiting` while a pop waits, and back on return.

use parking_lot::{Condvar, Mutex, MutexGuard};
use quay_core::{observe, QuayError, Result};
use quay_lmdb::{LmdbStore, LmdbWriteTxn};
use std::fmt;
use std::mem;
use std::sync::mpsc;

type Job = Box<dyn for<'t> FnOnce(&mut LmdbWriteTxn<'t>) + Send>;

fn job<F>(f: F) -> Job
where
    F: for<'t> FnOnce(&mut LmdbWriteTxn<'t>) + Send + 'static,
{
    Box::new(f)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// No transaction started through the session
    Idle,
    /// `update` is running its own transaction
    Open,
    /// A blocking pop holds its transaction open
    Waiting,
}

struct SessionState {
    slot: Slot,
    job: Option<Job>,
}

/// Shared transaction slot for one queue or deque
pub struct Session {
    store: LmdbStore,
    state: Mutex<SessionState>,
    /// Wakes the waiting consumer: new data or a handed-off job
    update_signal: Condvar,
    /// Wakes producers: the slot changed or the job slot freed up
    handoff: Condvar,
}

impl Session {
    pub fn new(store: LmdbStore) -> Self {
        Self {
            store,
            state: Mutex::new(SessionState {
                slot: Slot::Idle,
                job: None,
            }),
            update_signal: Condvar::new(),
            handoff: Condvar::new(),
        }
    }

    pub fn store(&self) -> &LmdbStore {
        &self.store
    }

    /// Whether a blocking pop currently holds a transaction on this session
    pub fn is_waiting(&self) -> bool {
        self.state.lock().slot == Slot::Waiting
    }

    /// Run `f` in a write transaction.
    ///
    /// Without a waiting consumer this opens a transaction, runs `f`, and
    /// commits on `Ok` or aborts on `Err`. With one, `f` runs on the
    /// consumer's thread inside a nested transaction of the consumer's
    /// transaction. The result is returned once that transaction commits;
    /// if it rolls back instead, a `Transaction` error is returned.
    ///
    /// `f` must not call `update` on the same session.
    pub fn update<R, F>(&self, f: F) -> Result<R>
    where
        F: for<'t> FnOnce(&mut LmdbWriteTxn<'t>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let mut state = self.state.lock();
        loop {
            match state.slot {
                Slot::Idle => return self.run_open(state, f),
                Slot::Waiting if state.job.is_none() => return self.hand_off(state, f),
                _ => self.handoff.wait(&mut state),
            }
        }
    }

    /// Like [`update`](Self::update), but returns `None` without running `f`
    /// when a consumer is waiting.
    ///
    /// A waiting consumer last saw its bucket empty and is owed whatever
    /// arrives next, so non-blocking pops use this instead of joining the
    /// consumer's transaction.
    pub fn update_unless_waiting<R, F>(&self, f: F) -> Result<Option<R>>
    where
        F: for<'t> FnOnce(&mut LmdbWriteTxn<'t>) -> Result<R>,
    {
        let mut state = self.state.lock();
        loop {
            match state.slot {
                Slot::Idle => return self.run_open(state, f).map(Some),
                Slot::Waiting => return Ok(None),
                Slot::Open => self.handoff.wait(&mut state),
            }
        }
    }

    fn run_open<R, F>(&self, mut state: MutexGuard<'_, SessionState>, f: F) -> Result<R>
    where
        F: for<'t> FnOnce(&mut LmdbWriteTxn<'t>) -> Result<R>,
    {
        state.slot = Slot::Open;
        drop(state);
        let _open = OpenSlot { session: self };
        self.store.update(f)
    }

    fn hand_off<R, F>(&self, mut state: MutexGuard<'_, SessionState>, f: F) -> Result<R>
    where
        F: for<'t> FnOnce(&mut LmdbWriteTxn<'t>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        state.job = Some(job(move |txn| match txn.nested(f) {
            Ok(value) => txn.on_commit(move |committed| {
                observe::record_handoff(committed);
                let outcome = if committed {
                    Ok(value)
                } else {
                    tracing::warn!("hosting transaction rolled back handed-off work");
                    Err(QuayError::Transaction(
                        "hosting transaction rolled back".into(),
                    ))
                };
                let _ = tx.send(outcome);
            }),
            Err(e) => {
                let _ = tx.send(Err(e));
            }
        }));
        self.update_signal.notify_one();
        drop(state);
        tracing::debug!("handed update to waiting transaction");

        rx.recv().map_err(|_| {
            QuayError::Transaction("waiting transaction dropped handed-off work".into())
        })?
    }

    /// Register `txn` as the waiting transaction and retry `attempt` until
    /// it yields a value or fails.
    ///
    /// Handed-off jobs run between attempts, with the session unlocked.
    pub(crate) fn host_until<T, A>(&self, txn: &mut LmdbWriteTxn<'_>, mut attempt: A) -> Result<T>
    where
        A: FnMut(&mut LmdbWriteTxn<'_>) -> Result<Option<T>>,
    {
        let mut registration;
        let mut state = self.state.lock();
        if state.slot == Slot::Waiting {
            return Err(QuayError::SessionBusy(
                "another call is already waiting on this session".into(),
            ));
        }
        let previous = mem::replace(&mut state.slot, Slot::Waiting);
        registration = WaitRegistration {
            session: self,
            previous: Some(previous),
        };
        self.handoff.notify_all();

        let mut waited = false;
        let result = loop {
            while let Some(job) = state.job.take() {
                MutexGuard::unlocked(&mut state, || job(txn));
                self.handoff.notify_all();
            }
            match attempt(txn) {
                Ok(Some(value)) => break Ok(value),
                Ok(None) => {}
                Err(e) => break Err(e),
            }
            if !waited {
                tracing::trace!("waiting for data");
                observe::record_blocked_wait();
                waited = true;
            }
            self.update_signal.wait(&mut state);
        };

        if waited {
            tracing::trace!("woke with data");
        }
        // restore while still locked so no job lands after the last check
        state.slot = registration.disarm();
        drop(state);
        self.handoff.notify_all();
        result
    }

    /// Run `f` holding the session lock, then wake one waiter if it succeeded
    pub(crate) fn signal_after<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let _state = self.state.lock();
        let result = f();
        if result.is_ok() {
            self.update_signal.notify_one();
        }
        result
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Session");
        out.field("store", &self.store);
        if let Some(state) = self.state.try_lock() {
            out.field("slot", &state.slot);
        }
        out.finish_non_exhaustive()
    }
}

/// Returns the slot to `Idle` when `update`'s own transaction ends
struct OpenSlot<'s> {
    session: &'s Session,
}

impl Drop for OpenSlot<'_> {
    fn drop(&mut self) {
        self.session.state.lock().slot = Slot::Idle;
        self.session.handoff.notify_all();
    }
}

/// Undoes a wait registration if the waiting call unwinds
struct WaitRegistration<'s> {
    session: &'s Session,
    previous: Option<Slot>,
}

impl WaitRegistration<'_> {
    fn disarm(&mut self) -> Slot {
        self.previous.take().unwrap_or(Slot::Idle)
    }
}

impl Drop for WaitRegistration<'_> {
    fn drop(&mut self) {
        let Some(previous) = self.previous.take() else {
            return;
        };
        let stranded = {
            let mut state = self.session.state.lock();
            state.slot = previous;
            state.job.take()
        };
        // dropping the job disconnects its producer
        drop(stranded);
        self.session.handoff.notify_all();
    }
}
