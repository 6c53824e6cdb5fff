//! Stream sessions
//!
//! A [`StreamSession`] wraps one worker's [`Channel`] and drives a fixed
//! number of logical operations through it according to a [`Policy`]. The
//! session owns its key source, so workers never share random state.
//!
//! # Policies
//!
//! | Policy | Write side | Read side |
//! | --- | --- | --- |
//! | `WriteAllReadAll` | all batches, then half-close | one response per batch after the half-close |
//! | `Alternate` | one batch | one response right after each batch |
//! | `WriteOnly` | all batches, then half-close | none |
//! | `Duplex` | all batches, then half-close | concurrent drain until end of stream |
//!
//! A failed write, a missing response or a non-OK terminal status ends the
//! session with [`HarnessError::StreamBroken`].
//!
//! # Example
//!
//! ```
//! use streambench::channel::{Connector, loopback::LoopbackConnector};
//! use streambench::distribution::zipf::ZipfianSampler;
//! use streambench::session::{Policy, SessionPlan, StreamSession, Workload};
//!
//! let channel = LoopbackConnector::echo().connect(0)?;
//! let plan = SessionPlan::new(100, 10, Policy::WriteAllReadAll)?;
//! let workload = Workload::search(ZipfianSampler::with_seed(1_000, 0.9, 7)?);
//!
//! let stats = StreamSession::new(0, channel, plan, workload).run()?;
//! assert_eq!(stats.writes_issued, 100);
//! assert_eq!(stats.reads_completed, 10);
//! # Ok::<(), streambench::HarnessError>(())
//! ```

use crate::channel::{Batch, Channel, KeyedPayload, Status, Traffic};
use crate::distribution::sequential::OffsetSequence;
use crate::distribution::zipf::ZipfianSampler;
use crate::distribution::KeySource;
use crate::error::{HarnessError, HarnessResult};
use crate::stats::SessionStats;
use crate::worker::panic_message;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::thread;

/// Interleaving of writes and reads on one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Send every batch, half-close, then read one response per batch
    #[default]
    WriteAllReadAll,
    /// Send a batch and wait for its response before the next one
    Alternate,
    /// Send every batch and half-close without reading
    WriteOnly,
    /// Read concurrently while writing, until the server ends the stream
    Duplex,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Policy::WriteAllReadAll => "write_all_read_all",
            Policy::Alternate => "alternate",
            Policy::WriteOnly => "write_only",
            Policy::Duplex => "duplex",
        };
        f.write_str(name)
    }
}

/// Amount and shape of the work a session performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPlan {
    /// Logical operations to write
    pub operations: u64,
    /// Maximum logical operations per wire message
    pub batch_size: usize,
    pub policy: Policy,
}

impl SessionPlan {
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidParameter`] for a zero batch size.
    pub fn new(operations: u64, batch_size: usize, policy: Policy) -> HarnessResult<Self> {
        if batch_size == 0 {
            return Err(HarnessError::invalid("batch_size", "must be at least 1"));
        }
        Ok(Self {
            operations,
            batch_size,
            policy,
        })
    }

    /// Number of wire messages: `ceil(operations / batch_size)`
    pub fn batch_count(&self) -> u64 {
        self.operations.div_ceil(self.batch_size as u64)
    }

    /// Sizes of the successive batches; only the last one may be partial
    pub fn batch_sizes(&self) -> impl Iterator<Item = usize> {
        let batch_size = self.batch_size as u64;
        let operations = self.operations;
        (0..self.batch_count()).map(move |index| {
            let remaining = operations - index * batch_size;
            remaining.min(batch_size) as usize
        })
    }
}

/// Source of the payloads a session writes
pub struct Workload {
    traffic: Traffic,
    keys: Box<dyn KeySource>,
    filler: Option<Arc<[String]>>,
}

impl Workload {
    /// Lookups with keys drawn from a Zipfian sampler
    pub fn search(sampler: ZipfianSampler) -> Self {
        Self {
            traffic: Traffic::Search,
            keys: Box::new(sampler),
            filler: None,
        }
    }

    /// New records numbered from the worker's private offset range
    pub fn insert(offsets: OffsetSequence, filler: Arc<[String]>) -> Self {
        Self {
            traffic: Traffic::Insert,
            keys: Box::new(offsets),
            filler: Some(filler),
        }
    }

    pub fn traffic(&self) -> Traffic {
        self.traffic
    }

    fn next_batch(&mut self, items: usize) -> Batch {
        let mut batch = Batch::with_capacity(self.traffic, items);
        for _ in 0..items {
            let id = self.keys.next_key();
            batch.items.push(match &self.filler {
                Some(filler) => KeyedPayload::record(id, filler),
                None => KeyedPayload::search(id),
            });
        }
        batch
    }
}

impl fmt::Debug for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workload")
            .field("traffic", &self.traffic)
            .finish_non_exhaustive()
    }
}

/// One worker's bidirectional exchange
#[derive(Debug)]
pub struct StreamSession<C: Channel> {
    worker: usize,
    channel: C,
    plan: SessionPlan,
    workload: Workload,
    stats: SessionStats,
}

impl<C: Channel> StreamSession<C> {
    pub fn new(worker: usize, channel: C, plan: SessionPlan, workload: Workload) -> Self {
        Self {
            worker,
            channel,
            plan,
            workload,
            stats: SessionStats::new(),
        }
    }

    /// Drive the whole exchange and close the stream
    ///
    /// Consumes the session: nothing can be written or read after the close.
    ///
    /// # Errors
    ///
    /// [`HarnessError::StreamBroken`] when a write fails, an expected response
    /// is missing or the terminal status is not OK. The channel is closed
    /// exactly once on every path.
    pub fn run(mut self) -> HarnessResult<SessionStats> {
        let outcome = match self.plan.policy {
            Policy::WriteAllReadAll => self.write_all_read_all(),
            Policy::Alternate => self.alternate(),
            Policy::WriteOnly => self.write_only(),
            Policy::Duplex => self.duplex(),
        };

        let status = match outcome {
            Ok(()) => self.channel.close(),
            Err(Broken::Closed(status)) => return Err(self.broken(status)),
            Err(Broken::Open(reason)) => {
                let status = self.channel.close();
                return Err(self.broken(with_reason(status, reason)));
            }
            Err(Broken::Fatal(err)) => {
                self.channel.close();
                return Err(err);
            }
        };
        if !status.is_ok() {
            return Err(self.broken(status));
        }

        tracing::debug!(
            worker = self.worker,
            policy = %self.plan.policy,
            traffic = %self.workload.traffic,
            writes = self.stats.writes_issued,
            reads = self.stats.reads_completed,
            messages = self.stats.messages_sent,
            "session finished"
        );
        Ok(self.stats)
    }

    fn write_all_read_all(&mut self) -> Result<(), Broken> {
        self.write_all()?;
        self.channel.writes_done();
        for _ in 0..self.plan.batch_count() {
            self.read_one()?;
        }
        Ok(())
    }

    fn alternate(&mut self) -> Result<(), Broken> {
        for items in self.plan.batch_sizes() {
            send_batch(&self.channel, &mut self.workload, &mut self.stats, items)?;
            self.read_one()?;
        }
        self.channel.writes_done();
        Ok(())
    }

    fn write_only(&mut self) -> Result<(), Broken> {
        self.channel.discard_responses();
        self.write_all()?;
        self.channel.writes_done();
        Ok(())
    }

    fn duplex(&mut self) -> Result<(), Broken> {
        let Self {
            channel,
            plan,
            workload,
            stats,
            ..
        } = self;
        let channel = &*channel;

        let (written, reader) = thread::scope(|scope| {
            let reader = scope.spawn(|| {
                let mut received = 0u64;
                while channel.receive().is_some() {
                    received += 1;
                }
                received
            });

            let written = plan
                .batch_sizes()
                .try_for_each(|items| send_batch(channel, workload, stats, items));
            let written = match written {
                Ok(()) => {
                    channel.writes_done();
                    Ok(())
                }
                // The reader is parked until the stream is torn down
                Err(Broken::Open(reason)) => {
                    Err(Broken::Closed(with_reason(channel.close(), reason)))
                }
                Err(other) => Err(other),
            };

            (written, reader.join())
        });

        let received = reader.map_err(|payload| {
            Broken::Fatal(HarnessError::WorkerPanicked(panic_message(payload.as_ref())))
        });
        written?;
        stats.reads_completed += received?;
        Ok(())
    }

    fn write_all(&mut self) -> Result<(), Broken> {
        for items in self.plan.batch_sizes() {
            send_batch(&self.channel, &mut self.workload, &mut self.stats, items)?;
        }
        Ok(())
    }

    fn read_one(&mut self) -> Result<(), Broken> {
        match self.channel.receive() {
            Some(_) => {
                self.stats.record_read();
                Ok(())
            }
            None => Err(Broken::Open("stream ended before every response arrived")),
        }
    }

    fn broken(&self, status: Status) -> HarnessError {
        tracing::debug!(worker = self.worker, %status, "stream broken");
        HarnessError::StreamBroken(status)
    }
}

/// Why an exchange stopped early
enum Broken {
    /// Channel still open; the reason describes what went wrong
    Open(&'static str),
    /// Channel already closed with this status
    Closed(Status),
    Fatal(HarnessError),
}

fn send_batch<C: Channel>(
    channel: &C,
    workload: &mut Workload,
    stats: &mut SessionStats,
    items: usize,
) -> Result<(), Broken> {
    let batch = workload.next_batch(items);
    if !channel.send(&batch) {
        return Err(Broken::Open("write rejected by the stream"));
    }
    stats.record_write(items);
    Ok(())
}

/// Keep the channel's own status; fill one in when it claims success
fn with_reason(status: Status, reason: &str) -> Status {
    if status.is_ok() {
        Status::new(Status::UNKNOWN, reason, "")
    } else {
        status
    }
}
