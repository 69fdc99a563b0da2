//! Quay Core: traits and types shared by the quay storage crates
//!
//! This crate defines the storage-independent pieces of quay:
//! - Bucket traits: the read/write capability the queue primitives need
//! - Sequence keys: fixed-width, order-preserving keys for queue entries
//! - Positions: the front/back ends of a queue or deque
//! - Codecs: pluggable value serialization (JSON, bincode)
//! - Configuration and the shared error type

pub mod codec;
pub mod config;
pub mod error;
pub mod keys;
pub mod observe;
pub mod traits;
pub mod types;

pub use codec::{BincodeCodec, Codec, JsonCodec};
pub use config::{StoreConfig, SyncMode};
pub use error::{bucket_label, QuayError, Result};
pub use keys::{Position, SequenceKey, SEQUENCE_KEY_LEN};
pub use traits::{BucketReader, BucketWriter};
pub use types::{CommitInfo, Entry, StoreStats};
