//! Session statistics
//!
//! Every stream session counts what it put on the wire and what came back.
//! Counters are plain integers: a session is driven by exactly one worker
//! thread, and the runner only reads them after the pool has drained.
//!
//! # Counting Convention
//!
//! - `writes_issued` counts logical operations (items inside batches), not
//!   wire messages
//! - `reads_completed` counts responses received
//! - `messages_sent` counts wire messages (batches)
//!
//! With a batch size of 10, writing 100 operations issues 100 writes in 10
//! messages and, under a write-then-read policy, completes 10 reads.

pub mod aggregator;

use serde::Serialize;

/// Counters collected by one stream session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Logical operations written
    pub writes_issued: u64,

    /// Responses received
    pub reads_completed: u64,

    /// Wire messages (batches) sent
    pub messages_sent: u64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one batch of `items` logical operations
    #[inline]
    pub fn record_write(&mut self, items: usize) {
        self.writes_issued += items as u64;
        self.messages_sent += 1;
    }

    /// Record one received response
    #[inline]
    pub fn record_read(&mut self) {
        self.reads_completed += 1;
    }

    /// Fold another session's counters into this one
    pub fn merge(&mut self, other: &SessionStats) {
        self.writes_issued += other.writes_issued;
        self.reads_completed += other.reads_completed;
        self.messages_sent += other.messages_sent;
    }
}
