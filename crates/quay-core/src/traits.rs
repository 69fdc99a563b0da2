use crate::error::Result;
use crate::types::Entry;

/// Read access to named buckets
///
/// Keys passed to and returned from these methods are relative to the
/// bucket; the storage layout of bucket names is the backend's business.
/// Reading from a bucket that does not exist is not an error.
pub trait BucketReader {
    /// Whether the bucket has been created
    fn bucket_exists(&self, bucket: &[u8]) -> Result<bool>;

    /// Value stored under `key`, `None` if the bucket or key is missing
    fn get(&self, bucket: &[u8], key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Entry with the lowest key
    fn first(&self, bucket: &[u8]) -> Result<Option<Entry>>;

    /// Entry with the highest key
    fn last(&self, bucket: &[u8]) -> Result<Option<Entry>>;

    /// Number of entries, 0 for a missing bucket
    fn bucket_len(&self, bucket: &[u8]) -> Result<usize>;
}

/// Write access to named buckets within a write transaction
pub trait BucketWriter: BucketReader {
    /// Create the bucket unless it exists; returns true if it was created
    fn create_bucket_if_absent(&mut self, bucket: &[u8]) -> Result<bool>;

    /// Store `value` under `key`; the bucket must exist
    fn put(&mut self, bucket: &[u8], key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove `key`; returns false if nothing was stored there
    fn delete(&mut self, bucket: &[u8], key: &[u8]) -> Result<bool>;
}
