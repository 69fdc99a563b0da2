//! Quay Prelude
//!
//! Import this to get all commonly used types and traits:
//!
//! ```
//! use quay::prelude::*;
//! ```

// Core types
pub use crate::{CommitInfo, Position, QuayDb, QuayError, Result, SequenceKey, StoreStats};

// Configs
pub use crate::{StoreConfig, SyncMode};

// Traits
pub use crate::{BucketReader, BucketWriter, Codec, EntryCursor};

// Codecs
pub use crate::{BincodeCodec, JsonCodec};

// Queues
pub use crate::{Deque, Queue, Session};

// Storage
pub use crate::{LmdbReadTxn, LmdbStore, LmdbWriteTxn};

// Iteration
pub use crate::{Action, ModelCursor};

// Re-export common external deps
pub use anyhow;
pub use serde::{Deserialize, Serialize};
pub use std::sync::Arc;
pub use tracing;
