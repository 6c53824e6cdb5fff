//! Timing utilities
//!
//! Benchmark spans are measured with `std::time::Instant`, which is monotonic
//! and has sub-millisecond resolution on every supported platform.

use std::time::Instant;

/// Seconds between two instants, zero if `finish` precedes `start`
#[inline]
pub fn elapsed_seconds(start: Instant, finish: Instant) -> f64 {
    finish.saturating_duration_since(start).as_secs_f64()
}

/// Operations per second
///
/// Returns 0 for an empty interval instead of dividing by zero.
pub fn calculate_rate(operations: u64, seconds: f64) -> f64 {
    if seconds > 0.0 {
        operations as f64 / seconds
    } else {
        0.0
    }
}
