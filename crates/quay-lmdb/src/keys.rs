use quay_core::{QuayError, Result};

/// Bucket names are stored behind a one-byte length prefix
pub const MAX_BUCKET_NAME_LEN: usize = u8::MAX as usize;

/// Database names inside the LMDB environment
pub mod db_names {
    /// Bucket name -> creation timestamp (RFC 3339)
    pub const BUCKETS: &str = "buckets";
    /// Length-prefixed bucket name ‖ entry key -> value
    pub const ENTRIES: &str = "entries";
}

pub fn validate_bucket_name(name: &[u8]) -> Result<()> {
    if name.is_empty() {
        return Err(QuayError::InvalidBucketName(
            "bucket name must not be empty".into(),
        ));
    }
    if name.len() > MAX_BUCKET_NAME_LEN {
        return Err(QuayError::InvalidBucketName(format!(
            "bucket name is {} bytes, limit is {}",
            name.len(),
            MAX_BUCKET_NAME_LEN
        )));
    }
    Ok(())
}

/// `len(name) ‖ name`, the prefix shared by every entry of a bucket
pub fn bucket_prefix(name: &[u8]) -> Result<Vec<u8>> {
    validate_bucket_name(name)?;
    let mut prefix = Vec::with_capacity(1 + name.len());
    prefix.push(name.len() as u8);
    prefix.extend_from_slice(name);
    Ok(prefix)
}

/// Full key of `key` inside bucket `name`
pub fn entry_key(name: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    let mut full = bucket_prefix(name)?;
    full.extend_from_slice(key);
    Ok(full)
}

/// Smallest byte string greater than every string starting with `prefix`.
///
/// `None` when the prefix is all `0xff` bytes (no such string exists).
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}
