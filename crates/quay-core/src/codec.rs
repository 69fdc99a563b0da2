//! Value codecs
//!
//! Queue and bucket values are opaque bytes to the store. A codec turns typed
//! values into those bytes and back; every failure surfaces as
//! [`QuayError::Serialization`].
//!
//! # Example
//!
//! ```
//! use quay_core::{Codec, JsonCodec};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Job {
//!     id: u64,
//! }
//!
//! let bytes = JsonCodec.encode(&Job { id: 7 }).unwrap();
//! let job: Job = JsonCodec.decode(&bytes).unwrap();
//! assert_eq!(job, Job { id: 7 });
//! ```

use crate::{QuayError, Result};
use serde::{de::DeserializeOwned, Serialize};

/// Codec trait for encoding/decoding stored values
pub trait Codec: Send + Sync {
    /// Encode a value to bytes
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode a value from bytes
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;

    /// Codec name, used in logs
    fn name(&self) -> &str;
}

/// JSON codec (human-readable, larger size)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| QuayError::Serialization(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| QuayError::Serialization(e.to_string()))
    }

    fn name(&self) -> &str {
        "json"
    }
}

/// Bincode codec (binary, compact)
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        bincode::serialize(value).map_err(|e| QuayError::Serialization(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        bincode::deserialize(bytes).map_err(|e| QuayError::Serialization(e.to_string()))
    }

    fn name(&self) -> &str {
        "bincode"
    }
}
