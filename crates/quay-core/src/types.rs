use serde::{Deserialize, Serialize};

/// A key/value pair read from a bucket, key relative to the bucket
pub type Entry = (Vec<u8>, Vec<u8>);

/// Counters reported when a write transaction commits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub buckets_created: usize,
    pub entries_written: usize,
    pub entries_deleted: usize,
}

impl CommitInfo {
    /// Fold the counters of a committed nested transaction into this one
    pub fn absorb(&mut self, other: CommitInfo) {
        self.buckets_created += other.buckets_created;
        self.entries_written += other.entries_written;
        self.entries_deleted += other.entries_deleted;
    }
}

/// Store-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub buckets: usize,
    pub entries: usize,
    pub map_size: usize,
}
