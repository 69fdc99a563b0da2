use crate::keys::Position;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuayError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error in bucket [{bucket}]: {reason}")]
    Storage { bucket: String, reason: String },

    #[error("Bucket [{0}] not found")]
    BucketNotFound(String),

    #[error("Invalid bucket name: {0}")]
    InvalidBucketName(String),

    #[error("Bucket [{0}] is empty and no default key was given")]
    MissingDefaultKey(String),

    #[error("Key space exhausted at the {position} of bucket [{bucket}]")]
    KeySpaceExhausted { bucket: String, position: Position },

    #[error("Invalid sequence key in bucket [{bucket}]: expected 8 bytes, found {len}")]
    InvalidKey { bucket: String, len: usize },

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Session busy: {0}")]
    SessionBusy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl QuayError {
    /// Build a storage error carrying the bucket name for context
    pub fn storage(bucket: &[u8], reason: impl ToString) -> Self {
        QuayError::Storage {
            bucket: bucket_label(bucket),
            reason: reason.to_string(),
        }
    }

    /// True for failures reported by (or on behalf of) the storage engine.
    ///
    /// Serialization failures and session misuse are not storage errors.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            QuayError::Storage { .. }
                | QuayError::BucketNotFound(_)
                | QuayError::InvalidBucketName(_)
                | QuayError::MissingDefaultKey(_)
                | QuayError::KeySpaceExhausted { .. }
                | QuayError::InvalidKey { .. }
                | QuayError::Transaction(_)
        )
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, QuayError::Serialization(_))
    }
}

pub type Result<T> = std::result::Result<T, QuayError>;

/// Render a bucket name for error messages and log fields
pub fn bucket_label(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

// Caller-defined errors:
//
// Closures passed to `update` may fail with their own error types. Anything
// implementing `std::error::Error + Send + Sync + 'static` converts into
// `QuayError::Other` through `anyhow`, e.g. `Err(anyhow::anyhow!("rejected"))?`.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_carries_bucket() {
        let err = QuayError::storage(b"jobs", "put failed");
        assert!(err.is_storage());
        assert_eq!(err.to_string(), "Storage error in bucket [jobs]: put failed");
    }

    #[test]
    fn test_error_classification() {
        assert!(QuayError::MissingDefaultKey("q".into()).is_storage());
        assert!(QuayError::Serialization("bad".into()).is_serialization());
        assert!(!QuayError::Serialization("bad".into()).is_storage());
        assert!(!QuayError::SessionBusy("busy".into()).is_storage());
    }

    #[test]
    fn test_bucket_label_is_lossy() {
        assert_eq!(bucket_label(b"queue"), "queue");
        assert_eq!(bucket_label(&[0x71, 0xff]), "q\u{fffd}");
    }
}
