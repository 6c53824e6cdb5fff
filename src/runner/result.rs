//! Outcome of one scenario

use crate::util::time::{calculate_rate, elapsed_seconds};
use chrono::{DateTime, Utc};
use std::time::Instant;

/// Aggregate counts and timing of one scenario
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub name: String,

    /// Instant the start latch was released
    pub start: Instant,

    /// Instant the last worker finished
    pub finish: Instant,

    /// Wall-clock time matching `start`
    pub started_at: DateTime<Utc>,

    /// Responses received across all workers
    pub read_operations: u64,

    /// Logical operations written across all workers
    pub write_operations: u64,

    pub workers: usize,
    pub batch_size: usize,
}

impl BenchmarkResult {
    /// Measured span in seconds
    pub fn elapsed_seconds(&self) -> f64 {
        elapsed_seconds(self.start, self.finish)
    }

    pub fn total_operations(&self) -> u64 {
        self.read_operations + self.write_operations
    }

    /// Reads plus writes per second, 0 for an empty span
    pub fn throughput(&self) -> f64 {
        calculate_rate(self.total_operations(), self.elapsed_seconds())
    }
}
