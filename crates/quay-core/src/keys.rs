//! Sequence keys and queue positions
//!
//! Queue entries are stored under fixed-width 8-byte big-endian keys. A
//! variable-length encoding (leading zero bytes stripped) would make LMDB's
//! lexicographic order disagree with numeric order whenever two keys differ
//! in length (`[0x01, 0x00]` sorts before `[0xff]`), so the width is fixed.
//!
//! Overflow policy: stepping below `0` at the front or above `u64::MAX` at
//! the back yields `None`; callers report it as `KeySpaceExhausted`.

use crate::error::Result;
use crate::traits::BucketReader;
use crate::types::Entry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of an encoded sequence key in bytes
pub const SEQUENCE_KEY_LEN: usize = 8;

/// Ordering token for a queue entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceKey(u64);

impl SequenceKey {
    /// Seed for single-ended queues, which only grow upward
    pub const QUEUE_DEFAULT: SequenceKey = SequenceKey(0);

    /// Seed for deques: the midpoint of the key space, 2^63
    pub const DEQUE_DEFAULT: SequenceKey = SequenceKey(1 << 63);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    pub fn to_bytes(self) -> [u8; SEQUENCE_KEY_LEN] {
        self.0.to_be_bytes()
    }

    /// Parse an encoded key, `None` unless exactly 8 bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; SEQUENCE_KEY_LEN] = bytes.try_into().ok()?;
        Some(Self(u64::from_be_bytes(bytes)))
    }

    /// The key one step beyond `self` toward `position`
    pub fn checked_step(self, position: Position) -> Option<Self> {
        self.0.checked_add_signed(position.delta()).map(Self)
    }
}

impl From<u64> for SequenceKey {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// An end of a queue or deque
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    /// Lowest key; read with cursor-first, new keys are `extreme - 1`
    Front,
    /// Highest key; read with cursor-last, new keys are `extreme + 1`
    Back,
}

impl Position {
    /// Key step applied when pushing at this end
    pub fn delta(self) -> i64 {
        match self {
            Position::Front => -1,
            Position::Back => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Position::Front => "front",
            Position::Back => "back",
        }
    }

    /// Read the extreme entry of `bucket` at this end
    pub fn extreme<R>(self, reader: &R, bucket: &[u8]) -> Result<Option<Entry>>
    where
        R: BucketReader + ?Sized,
    {
        match self {
            Position::Front => reader.first(bucket),
            Position::Back => reader.last(bucket),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(SequenceKey::QUEUE_DEFAULT.to_bytes(), [0u8; 8]);
        assert_eq!(
            SequenceKey::DEQUE_DEFAULT.to_bytes(),
            [0x80, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_round_trip_bytes() {
        let key = SequenceKey::new(0x0102_0304_0506_0708);
        assert_eq!(SequenceKey::from_bytes(&key.to_bytes()), Some(key));
        assert_eq!(SequenceKey::from_bytes(b"short"), None);
        assert_eq!(SequenceKey::from_bytes(&[0u8; 9]), None);
    }

    #[test]
    fn test_byte_order_matches_numeric_order_across_width_boundary() {
        // 0xff and 0x100 differ in minimal-length encoding width
        let below = SequenceKey::new(0xff);
        let above = SequenceKey::new(0x100);
        assert!(below < above);
        assert!(below.to_bytes() < above.to_bytes());

        // the stripped encoding would invert this pair
        let stripped_below: &[u8] = &[0xff];
        let stripped_above: &[u8] = &[0x01, 0x00];
        assert!(stripped_below > stripped_above);
    }

    #[test]
    fn test_front_steps_stay_ordered() {
        let mut key = SequenceKey::new(0x102);
        let mut previous = key.to_bytes();
        for _ in 0..8 {
            key = key.checked_step(Position::Front).unwrap();
            assert!(key.to_bytes() < previous);
            previous = key.to_bytes();
        }
        assert_eq!(key.value(), 0xfa);
    }

    #[test]
    fn test_step_overflow() {
        assert_eq!(SequenceKey::new(0).checked_step(Position::Front), None);
        assert_eq!(
            SequenceKey::new(u64::MAX).checked_step(Position::Back),
            None
        );
        assert_eq!(
            SequenceKey::DEQUE_DEFAULT.checked_step(Position::Front),
            Some(SequenceKey::new((1 << 63) - 1))
        );
    }

    #[test]
    fn test_position_helpers() {
        assert_eq!(Position::Front.delta(), -1);
        assert_eq!(Position::Back.delta(), 1);
        assert_eq!(SequenceKey::new(0).checked_step(Position::Front), None);
        assert_eq!(SequenceKey::new(u64::MAX).checked_step(Position::Back), None);
        assert_eq!(Position::Back.to_string(), "back");
    }
}
