//! Sequential identifier generation
//!
//! Generates identifiers inside a half-open range `[start, end)`, starting at
//! `start` and incrementing by 1. Insert workers each receive a disjoint range
//! at spawn time so concurrent writers never produce the same identifier.
//! When the end of the range is reached, wraps back to the beginning.

use crate::distribution::KeySource;

/// Sequential identifier generator over a private offset range
#[derive(Debug, Clone)]
pub struct OffsetSequence {
    start: u64,
    end: u64,
    /// Next identifier to hand out
    cursor: u64,
}

impl OffsetSequence {
    /// Create a sequence over `[start, start + len)`
    ///
    /// A zero-length range yields `start` forever.
    pub fn new(start: u64, len: u64) -> Self {
        Self {
            start,
            end: start.saturating_add(len),
            cursor: start,
        }
    }

    /// Range assigned to worker `index` when every worker writes `per_worker` records
    ///
    /// Returns `None` when the range does not fit below `u64::MAX`.
    pub fn for_worker(base: u64, index: u64, per_worker: u64) -> Option<Self> {
        let start = index.checked_mul(per_worker)?.checked_add(base)?;
        start.checked_add(per_worker)?;
        Some(Self::new(start, per_worker))
    }

    /// First identifier of the range
    pub fn start(&self) -> u64 {
        self.start
    }

    /// One past the last identifier of the range
    pub fn end(&self) -> u64 {
        self.end
    }
}

impl KeySource for OffsetSequence {
    fn next_key(&mut self) -> u64 {
        let id = self.cursor;

        self.cursor += 1;
        if self.cursor >= self.end {
            self.cursor = self.start;
        }

        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_basic() {
        let mut seq = OffsetSequence::new(100, 10);

        assert_eq!(seq.next_key(), 100);
        assert_eq!(seq.next_key(), 101);
        assert_eq!(seq.next_key(), 102);
    }

    #[test]
    fn test_sequence_wraparound() {
        let mut seq = OffsetSequence::new(5, 3);

        assert_eq!(seq.next_key(), 5);
        assert_eq!(seq.next_key(), 6);
        assert_eq!(seq.next_key(), 7);
        assert_eq!(seq.next_key(), 5);  // Wrapped
    }

    #[test]
    fn test_sequence_empty_range() {
        let mut seq = OffsetSequence::new(9, 0);
        assert_eq!(seq.next_key(), 9);
        assert_eq!(seq.next_key(), 9);
    }

    #[test]
    fn test_worker_ranges_are_disjoint() {
        let base = 5_000_000;
        let per_worker = 1_000;
        let ranges: Vec<OffsetSequence> = (0..8)
            .map(|i| OffsetSequence::for_worker(base, i, per_worker).unwrap())
            .collect();

        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start());
        }

        let mut seen = std::collections::HashSet::new();
        for mut range in ranges {
            for _ in 0..per_worker {
                assert!(seen.insert(range.next_key()), "identifier handed out twice");
            }
        }
        assert_eq!(seen.len(), 8_000);
    }

    #[test]
    fn test_worker_range_overflow() {
        assert!(OffsetSequence::for_worker(u64::MAX - 10, 3, 100).is_none());
        assert!(OffsetSequence::for_worker(u64::MAX - 10, 0, 100).is_none());
        assert!(OffsetSequence::for_worker(0, u64::MAX, 2).is_none());

        // The last range may end exactly at u64::MAX
        let last = OffsetSequence::for_worker(u64::MAX - 200, 1, 100).unwrap();
        assert_eq!(last.start(), u64::MAX - 100);
        assert_eq!(last.end(), u64::MAX);
    }
}
