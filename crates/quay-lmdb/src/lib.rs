//! LMDB-backed bucket store
//!
//! Named buckets are layered over two LMDB databases: a registry of bucket
//! names and a single ordered entry database whose keys carry a
//! length-prefixed bucket name.
//!
//! Key features:
//! - Write transactions with nested (child) transactions and commit hooks
//! - Read-only transactions for concurrent readers
//! - Cursors confined to one bucket
//! - Sync mode, map size and reader limits taken from `StoreConfig`

pub mod cursor;
pub mod keys;
pub mod store;
pub mod txn;

pub use cursor::{BucketCursor, EntryCursor, RoBucketCursor, RwBucketCursor};
pub use store::LmdbStore;
pub use txn::{CommitHook, LmdbReadTxn, LmdbWriteTxn};
