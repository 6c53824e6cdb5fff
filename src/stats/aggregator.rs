//! Statistics aggregation
//!
//! Collects the counters of every session of a scenario and merges them into
//! the totals reported by the runner, keeping the per-worker view for
//! debug logging.
//!
//! # Example
//!
//! ```
//! use streambench::stats::{SessionStats, aggregator::StatisticsAggregator};
//!
//! let mut worker0 = SessionStats::new();
//! worker0.record_write(10);
//! worker0.record_read();
//!
//! let mut worker1 = SessionStats::new();
//! worker1.record_write(5);
//!
//! let mut aggregator = StatisticsAggregator::new();
//! aggregator.add_worker(0, worker0);
//! aggregator.add_worker(1, worker1);
//!
//! let total = aggregator.aggregate();
//! assert_eq!(total.writes_issued, 15);
//! assert_eq!(total.reads_completed, 1);
//! ```

use crate::stats::SessionStats;
use std::collections::BTreeMap;

/// Statistics aggregator for the sessions of one scenario
#[derive(Debug, Default)]
pub struct StatisticsAggregator {
    /// Per-worker statistics (worker index → stats)
    workers: BTreeMap<usize, SessionStats>,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add statistics from a worker
    ///
    /// Adding the same worker twice merges the counters.
    pub fn add_worker(&mut self, worker: usize, stats: SessionStats) {
        self.workers.entry(worker).or_default().merge(&stats);
    }

    /// Merged counters over all workers
    pub fn aggregate(&self) -> SessionStats {
        self.workers
            .values()
            .fold(SessionStats::new(), |mut total, stats| {
                total.merge(stats);
                total
            })
    }

    /// Per-worker counters ordered by worker index
    pub fn per_worker(&self) -> impl Iterator<Item = (usize, &SessionStats)> {
        self.workers.iter().map(|(worker, stats)| (*worker, stats))
    }
}
