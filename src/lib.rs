//! streambench - streaming throughput benchmark harness
//!
//! streambench drives YCSB-style traffic through bidirectional streams to a
//! remote store and reports aggregate throughput per scenario.
//!
//! # Architecture
//!
//! - **Key generation**: Zipfian sampler for lookups, private offset ranges for inserts
//! - **Stream sessions**: one channel per worker, four read/write interleavings
//! - **Runner**: latch-aligned start on a reusable worker pool, monotonic timing
//! - **Output**: markdown result table plus optional JSON lines
//!
//! The wire protocol is not part of this crate. Transports plug in through the
//! [`channel::Channel`] and [`channel::Connector`] traits; the in-process
//! [`channel::loopback`] store serves tests and harness-overhead runs.

pub mod channel;
pub mod config;
pub mod distribution;
pub mod error;
pub mod observability;
pub mod output;
pub mod runner;
pub mod session;
pub mod stats;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use distribution::zipf::ZipfianSampler;
pub use error::{HarnessError, HarnessResult};
pub use runner::{BenchmarkResult, BenchmarkRunner, ScenarioSpec};
pub use session::Policy;
