//! One-shot start gate
//!
//! Every worker of a scenario connects, then parks on the same [`Latch`]. The
//! runner opens it exactly once, right after capturing the start instant, so
//! per-worker setup cost stays out of the measured interval.

use std::sync::{Condvar, Mutex, PoisonError};

/// Countdown latch with a single count
///
/// Once opened, every current and future [`wait`](Latch::wait) returns
/// immediately. The latch cannot be re-armed.
#[derive(Debug)]
pub struct Latch {
    count: Mutex<usize>,
    opened: Condvar,
}

impl Latch {
    /// Create a closed latch
    pub fn new() -> Self {
        Self {
            count: Mutex::new(1),
            opened: Condvar::new(),
        }
    }

    /// Open the latch and release all waiters
    ///
    /// Calling this on an open latch does nothing.
    pub fn count_down(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        if *count > 0 {
            *count -= 1;
            if *count == 0 {
                self.opened.notify_all();
            }
        }
    }

    /// Block until the latch is open
    pub fn wait(&self) {
        let count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        let _open = self
            .opened
            .wait_while(count, |count| *count > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Whether the latch has been opened
    pub fn is_open(&self) -> bool {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner) == 0
    }
}

impl Default for Latch {
    fn default() -> Self {
        Self::new()
    }
}
