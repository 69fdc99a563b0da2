//! Quay: persistent blocking queues over LMDB
//!
//! Quay provides:
//! - **Queue**: a FIFO queue stored in one bucket, with a blocking `dequeue`
//! - **Deque**: a double-ended queue that grows from the middle of the key space
//! - **Session**: lets a blocked consumer's open write transaction absorb
//!   producers' writes instead of deadlocking on the single-writer store
//! - **Sequence primitives**: push/pop at either end of any bucket
//! - **Typed helpers**: codec-driven put/get, decoding cursors, and bucket walks
//!
//! # Quick Start
//!
//! ```no_run
//! use quay::prelude::*;
//! use std::thread;
//!
//! # fn main() -> Result<()> {
//! let db = QuayDb::open("./data")?;
//! let queue = db.queue("emails")?;
//!
//! let consumer = {
//!     let queue = queue.clone();
//!     thread::spawn(move || queue.dequeue::<String>())
//! };
//!
//! queue.enqueue("welcome@example.com")?;
//! assert_eq!(consumer.join().unwrap()?, "welcome@example.com");
//! # Ok(())
//! # }
//! ```

pub mod cursor;
pub mod db;
pub mod deque;
mod handle;
pub mod iter;
pub mod model;
pub mod prelude;
pub mod queue;
pub mod sequence;
pub mod session;
pub mod simple;

// Re-export core types
pub use quay_core::{
    codec::{BincodeCodec, Codec, JsonCodec},
    config::{StoreConfig, SyncMode},
    error::{QuayError, Result},
    keys::{Position, SequenceKey},
    traits::{BucketReader, BucketWriter},
    types::{CommitInfo, Entry, StoreStats},
};

// Re-export implementations
pub use quay_lmdb::{EntryCursor, LmdbReadTxn, LmdbStore, LmdbWriteTxn, RoBucketCursor, RwBucketCursor};

// Re-export main types from this crate
pub use cursor::ModelCursor;
pub use db::QuayDb;
pub use deque::Deque;
pub use iter::{for_each, for_each_ro, Action};
pub use model::{get_model, get_model_from_bucket, put_model, put_model_in_bucket};
pub use queue::Queue;
pub use session::Session;
pub use simple::{bucket_size, delete_from_bucket, get_from_bucket, put_in_bucket};
