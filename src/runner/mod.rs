//! Benchmark runner
//!
//! Runs one scenario at a time on a shared [`WorkerPool`]:
//!
//! 1. Submit one task per worker; each task opens its channel and parks on a
//!    shared [`Latch`]
//! 2. Sleep a settle interval so every worker reaches the latch
//! 3. Capture the start instant and release the latch
//! 4. Wait for the pool to drain and capture the finish instant
//! 5. Aggregate the per-session counters into a [`BenchmarkResult`]
//!
//! Connection setup happens before the release and is never measured.
//!
//! # Example
//!
//! ```
//! use streambench::channel::loopback::LoopbackConnector;
//! use streambench::runner::BenchmarkRunner;
//! use streambench::session::Policy;
//! use streambench::worker::WorkerPool;
//! use std::time::Duration;
//!
//! let runner = BenchmarkRunner::new(LoopbackConnector::echo(), WorkerPool::new(4)?)
//!     .with_settle(Duration::from_millis(10));
//! let result = runner.run_scenario("doc", 4, 400, 10, Policy::WriteAllReadAll)?;
//! assert_eq!(result.write_operations, 400);
//! assert_eq!(result.read_operations, 40);
//! # Ok::<(), streambench::HarnessError>(())
//! ```

pub mod result;
pub mod scenario;

pub use result::BenchmarkResult;
pub use scenario::{ScenarioSpec, TrafficMix};

use crate::channel::{default_filler, Connector, Traffic};
use crate::distribution::sequential::OffsetSequence;
use crate::distribution::zipf::ZipfianSampler;
use crate::error::{HarnessError, HarnessResult};
use crate::session::{Policy, SessionPlan, StreamSession, Workload};
use crate::stats::aggregator::StatisticsAggregator;
use crate::stats::SessionStats;
use crate::worker::{Latch, WorkerPool};
use chrono::Utc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Pause between submitting workers and releasing the latch
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(200);

/// Key space of the Zipfian samplers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerSettings {
    pub element_count: u64,
    pub skew: f64,
    /// Base seed; worker `i` uses `seed + i`. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            element_count: 5_000_000,
            skew: 0.9,
            seed: None,
        }
    }
}

impl SamplerSettings {
    fn sampler(&self, worker: usize) -> HarnessResult<ZipfianSampler> {
        match self.seed {
            Some(seed) => ZipfianSampler::with_seed(
                self.element_count,
                self.skew,
                seed.wrapping_add(worker as u64),
            ),
            None => ZipfianSampler::new(self.element_count, self.skew),
        }
    }
}

/// Drives scenarios against the store behind a [`Connector`]
#[derive(Debug)]
pub struct BenchmarkRunner<K: Connector> {
    connector: Arc<K>,
    pool: WorkerPool,
    sampler: SamplerSettings,
    settle: Duration,
    /// First identifier handed to insert workers; `None` means `element_count`
    write_offset_base: Option<u64>,
    filler: Arc<[String]>,
}

impl<K: Connector> BenchmarkRunner<K> {
    pub fn new(connector: K, pool: WorkerPool) -> Self {
        Self {
            connector: Arc::new(connector),
            pool,
            sampler: SamplerSettings::default(),
            settle: DEFAULT_SETTLE,
            write_offset_base: None,
            filler: default_filler(),
        }
    }

    /// Use a different key space
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidParameter`] when the settings cannot
    /// build a sampler.
    pub fn with_sampler(mut self, sampler: SamplerSettings) -> HarnessResult<Self> {
        ZipfianSampler::with_seed(sampler.element_count, sampler.skew, 0)?;
        self.sampler = sampler;
        Ok(self)
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_write_offset_base(mut self, base: u64) -> Self {
        self.write_offset_base = Some(base);
        self
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn connector(&self) -> &K {
        &self.connector
    }

    fn offset_base(&self) -> u64 {
        self.write_offset_base.unwrap_or(self.sampler.element_count)
    }

    /// Run a search-only scenario
    pub fn run_scenario(
        &self,
        name: &str,
        worker_count: usize,
        total_operations: u64,
        batch_size: usize,
        policy: Policy,
    ) -> HarnessResult<BenchmarkResult> {
        self.run(&ScenarioSpec::new(
            name,
            worker_count,
            total_operations,
            batch_size,
            policy,
        ))
    }

    /// Run one scenario and measure it
    ///
    /// # Errors
    ///
    /// Invalid parameters are rejected before any worker starts. Otherwise the
    /// first worker failure (connection, broken stream, panic) is returned once
    /// every worker has finished.
    pub fn run(&self, spec: &ScenarioSpec) -> HarnessResult<BenchmarkResult> {
        if spec.workers == 0 {
            return Err(HarnessError::invalid("workers", "must be at least 1"));
        }
        if spec.workers > self.pool.capacity() {
            tracing::warn!(
                scenario = %spec.name,
                workers = spec.workers,
                capacity = self.pool.capacity(),
                "more workers than pool threads, late workers include setup in the measurement"
            );
        }

        // Build every session input first so a bad parameter never strands
        // workers already parked on the latch
        let per_worker = spec.operations_per_worker();
        let base = self.offset_base();
        let workers = (0..spec.workers)
            .map(|worker| {
                let traffic = spec.traffic_for(worker);
                let plan = SessionPlan::new(per_worker, spec.batch_size, spec.policy_for(traffic))?;
                let workload = match traffic {
                    Traffic::Search => Workload::search(self.sampler.sampler(worker)?),
                    Traffic::Insert => {
                        let offsets = OffsetSequence::for_worker(base, worker as u64, per_worker)
                            .ok_or_else(|| {
                                HarnessError::invalid(
                                    "write_offset_base",
                                    format!(
                                        "{} + {} workers x {} records overflows u64",
                                        base, spec.workers, per_worker
                                    ),
                                )
                            })?;
                        Workload::insert(offsets, Arc::clone(&self.filler))
                    }
                };
                Ok((worker, plan, workload))
            })
            .collect::<HarnessResult<Vec<_>>>()?;

        tracing::info!(
            scenario = %spec.name,
            workers = spec.workers,
            total_operations = spec.total_operations,
            batch_size = spec.batch_size,
            policy = %spec.policy,
            traffic = %spec.traffic,
            "starting scenario"
        );

        let latch = Arc::new(Latch::new());
        let aggregator = Arc::new(Mutex::new(StatisticsAggregator::new()));

        for (worker, plan, workload) in workers {
            let connector = Arc::clone(&self.connector);
            let latch = Arc::clone(&latch);
            let aggregator = Arc::clone(&aggregator);

            self.pool.submit(move || {
                let channel = connector.connect(worker)?;
                latch.wait();

                let stats = StreamSession::new(worker, channel, plan, workload).run()?;
                aggregator
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .add_worker(worker, stats);
                Ok(())
            });
        }

        thread::sleep(self.settle);
        let started_at = Utc::now();
        let start = Instant::now();
        latch.count_down();

        let outcome = self.pool.wait();
        let finish = Instant::now();
        if let Err(err) = outcome {
            tracing::error!(scenario = %spec.name, error = %err, "scenario failed");
            return Err(err);
        }

        let aggregator = aggregator.lock().unwrap_or_else(PoisonError::into_inner);
        for (worker, stats) in aggregator.per_worker() {
            tracing::debug!(
                worker,
                writes = stats.writes_issued,
                reads = stats.reads_completed,
                "worker totals"
            );
        }
        let total = aggregator.aggregate();

        let result = BenchmarkResult {
            name: spec.name.clone(),
            start,
            finish,
            started_at,
            read_operations: total.reads_completed,
            write_operations: total.writes_issued,
            workers: spec.workers,
            batch_size: spec.batch_size,
        };
        tracing::info!(
            scenario = %result.name,
            elapsed_s = result.elapsed_seconds(),
            reads = result.read_operations,
            writes = result.write_operations,
            throughput = result.throughput(),
            "scenario finished"
        );
        Ok(result)
    }

    /// Seed identifiers `0..records` through one write-only insert stream
    ///
    /// Runs on the calling thread and is not measured.
    pub fn preload(&self, records: u64, batch_size: usize) -> HarnessResult<SessionStats> {
        let plan = SessionPlan::new(records, batch_size, Policy::WriteOnly)?;
        if records == 0 {
            return Ok(SessionStats::new());
        }

        tracing::info!(records, batch_size, "preloading records");
        let channel = self.connector.connect(0)?;
        let workload = Workload::insert(OffsetSequence::new(0, records), Arc::clone(&self.filler));
        let stats = StreamSession::new(0, channel, plan, workload).run()?;
        tracing::info!(records = stats.writes_issued, "preload finished");
        Ok(stats)
    }
}
