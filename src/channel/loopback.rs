//! In-memory loopback store
//!
//! This module provides an implementation of the [`Channel`] contract that never
//! leaves the process. Every accepted batch is echoed back as one response,
//! which makes benchmark runs deterministic and lets the CLI measure the
//! harness's own overhead.
//!
//! # Features
//!
//! - Echo one response per batch, or accept writes silently
//! - Simulated per-batch latency
//! - Fault injection: end the stream early, reject writes, refuse connections
//! - Thread-safe counters shared by every channel of a connector
//!
//! # Example
//!
//! ```
//! use streambench::channel::{Batch, Channel, Connector, KeyedPayload, Traffic};
//! use streambench::channel::loopback::LoopbackConnector;
//!
//! let connector = LoopbackConnector::echo();
//! let channel = connector.connect(0)?;
//!
//! let mut batch = Batch::with_capacity(Traffic::Search, 1);
//! batch.items.push(KeyedPayload::search(42));
//! assert!(channel.send(&batch));
//! channel.writes_done();
//!
//! assert_eq!(channel.receive().map(|echo| echo.items), Some(1));
//! assert!(channel.receive().is_none());
//! assert!(channel.close().is_ok());
//! # Ok::<(), streambench::HarnessError>(())
//! ```

use super::{Batch, Channel, Connector, Status};
use crate::error::{HarnessError, HarnessResult};
use crossbeam::channel::{self, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// Behaviour of loopback channels
#[derive(Debug, Clone)]
pub struct LoopbackConfig {
    /// Echo one response per accepted batch
    pub respond: bool,

    /// Simulated service time per batch
    pub latency: Duration,

    /// End the stream after this many responses have been read
    pub end_stream_after: Option<u64>,

    /// Fail every write after this many batches were accepted
    pub reject_writes_after: Option<u64>,

    /// Refuse to open channels at all
    pub refuse_connections: bool,

    /// Status reported by `close()` after an injected fault
    pub failure_status: Status,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            respond: true,
            latency: Duration::ZERO,
            end_stream_after: None,
            reject_writes_after: None,
            refuse_connections: false,
            failure_status: Status::new(
                Status::UNAVAILABLE,
                "stream terminated by loopback store",
                "injected fault",
            ),
        }
    }
}

/// Counters shared by every channel a connector opened
#[derive(Debug, Default)]
pub struct LoopbackCounters {
    pub connections: AtomicU64,
    /// Batches accepted
    pub messages: AtomicU64,
    /// Logical operations accepted (sum of batch sizes)
    pub items: AtomicU64,
    /// Responses queued for readers
    pub queued: AtomicU64,
    /// Responses handed to readers
    pub responses: AtomicU64,
    pub half_closes: AtomicU64,
}

impl LoopbackCounters {
    pub fn messages(&self) -> u64 {
        self.messages.load(Ordering::SeqCst)
    }

    pub fn items(&self) -> u64 {
        self.items.load(Ordering::SeqCst)
    }

    pub fn queued(&self) -> u64 {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn responses(&self) -> u64 {
        self.responses.load(Ordering::SeqCst)
    }
}

/// Response produced by the loopback store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Echo {
    /// Number of logical operations in the acknowledged batch
    pub items: usize,
}

/// Connector handing out loopback channels
#[derive(Debug, Clone)]
pub struct LoopbackConnector {
    config: LoopbackConfig,
    counters: Arc<LoopbackCounters>,
}

impl LoopbackConnector {
    pub fn new(config: LoopbackConfig) -> Self {
        Self {
            config,
            counters: Arc::new(LoopbackCounters::default()),
        }
    }

    /// Connector whose channels echo every batch without delay
    pub fn echo() -> Self {
        Self::new(LoopbackConfig::default())
    }

    /// Counters aggregated over every channel opened so far
    pub fn counters(&self) -> Arc<LoopbackCounters> {
        Arc::clone(&self.counters)
    }
}

impl Connector for LoopbackConnector {
    type Channel = LoopbackChannel;

    fn connect(&self, worker: usize) -> HarnessResult<LoopbackChannel> {
        if self.config.refuse_connections {
            return Err(HarnessError::StreamBroken(Status::new(
                Status::UNAVAILABLE,
                "connection refused",
                format!("loopback worker {}", worker),
            )));
        }
        self.counters.connections.fetch_add(1, Ordering::SeqCst);
        Ok(LoopbackChannel::new(self.config.clone(), Arc::clone(&self.counters)))
    }
}

/// One loopback stream
#[derive(Debug)]
pub struct LoopbackChannel {
    config: LoopbackConfig,
    counters: Arc<LoopbackCounters>,

    /// Write side of the response queue; dropped on half-close
    responder: Mutex<Option<Sender<Echo>>>,
    responses: Receiver<Echo>,

    accepted: AtomicU64,
    delivered: AtomicU64,
    broken: AtomicBool,
    /// Set once the session declared it will never read
    discarding: AtomicBool,
}

impl LoopbackChannel {
    fn new(config: LoopbackConfig, counters: Arc<LoopbackCounters>) -> Self {
        let (sender, receiver) = channel::unbounded();
        Self {
            config,
            counters,
            responder: Mutex::new(Some(sender)),
            responses: receiver,
            accepted: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            broken: AtomicBool::new(false),
            discarding: AtomicBool::new(false),
        }
    }

    fn break_stream(&self) {
        self.broken.store(true, Ordering::SeqCst);
        self.responder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl Channel for LoopbackChannel {
    type Response = Echo;

    fn send(&self, batch: &Batch) -> bool {
        if self.broken.load(Ordering::SeqCst) {
            return false;
        }

        let accepted = self.accepted.fetch_add(1, Ordering::SeqCst) + 1;
        if self
            .config
            .reject_writes_after
            .is_some_and(|limit| accepted > limit)
        {
            self.break_stream();
            return false;
        }

        if !self.config.latency.is_zero() {
            thread::sleep(self.config.latency);
        }

        let responder = self.responder.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(responder) = responder.as_ref() else {
            // Writing after half-close
            return false;
        };
        if self.config.respond && !self.discarding.load(Ordering::SeqCst) {
            if responder.send(Echo { items: batch.len() }).is_err() {
                return false;
            }
            self.counters.queued.fetch_add(1, Ordering::SeqCst);
        }

        self.counters.messages.fetch_add(1, Ordering::SeqCst);
        self.counters.items.fetch_add(batch.len() as u64, Ordering::SeqCst);
        true
    }

    fn receive(&self) -> Option<Echo> {
        if let Some(limit) = self.config.end_stream_after {
            if self.delivered.load(Ordering::SeqCst) >= limit {
                self.break_stream();
                return None;
            }
        }

        let echo = self.responses.recv().ok()?;
        self.delivered.fetch_add(1, Ordering::SeqCst);
        self.counters.responses.fetch_add(1, Ordering::SeqCst);
        Some(echo)
    }

    fn writes_done(&self) {
        let closed = self
            .responder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if closed.is_some() {
            self.counters.half_closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn discard_responses(&self) {
        self.discarding.store(true, Ordering::SeqCst);
        // Drop anything echoed before the hint
        while self.responses.try_recv().is_ok() {}
    }

    fn close(&self) -> Status {
        // Unblocks a reader still parked in `receive`
        self.responder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if self.broken.load(Ordering::SeqCst) {
            self.config.failure_status.clone()
        } else {
            Status::ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{KeyedPayload, Traffic};

    fn batch(items: usize) -> Batch {
        let mut batch = Batch::with_capacity(Traffic::Search, items);
        batch.items.extend((0..items as u64).map(KeyedPayload::search));
        batch
    }

    #[test]
    fn test_loopback_echoes_each_batch() {
        let connector = LoopbackConnector::echo();
        let channel = connector.connect(0).unwrap();

        for size in [1, 5, 10] {
            assert!(channel.send(&batch(size)));
        }
        channel.writes_done();

        assert_eq!(channel.receive(), Some(Echo { items: 1 }));
        assert_eq!(channel.receive(), Some(Echo { items: 5 }));
        assert_eq!(channel.receive(), Some(Echo { items: 10 }));
        assert_eq!(channel.receive(), None);
        assert!(channel.close().is_ok());

        let counters = connector.counters();
        assert_eq!(counters.messages(), 3);
        assert_eq!(counters.items(), 16);
        assert_eq!(counters.queued(), 3);
        assert_eq!(counters.responses(), 3);
        assert_eq!(counters.half_closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_loopback_silent_mode() {
        let connector = LoopbackConnector::new(LoopbackConfig {
            respond: false,
            ..Default::default()
        });
        let channel = connector.connect(0).unwrap();
        assert!(channel.send(&batch(3)));
        channel.writes_done();
        assert_eq!(channel.receive(), None);
        assert_eq!(connector.counters().items(), 3);
    }

    #[test]
    fn test_loopback_discard_responses() {
        let connector = LoopbackConnector::echo();
        let channel = connector.connect(0).unwrap();

        assert!(channel.send(&batch(2)));
        channel.discard_responses();
        for _ in 0..100 {
            assert!(channel.send(&batch(2)));
        }
        channel.writes_done();

        assert_eq!(channel.receive(), None);
        assert!(channel.close().is_ok());

        let counters = connector.counters();
        assert_eq!(counters.messages(), 101);
        assert_eq!(counters.items(), 202);
        assert_eq!(counters.queued(), 1);
        assert_eq!(counters.responses(), 0);
    }

    #[test]
    fn test_loopback_write_after_half_close_fails() {
        let channel = LoopbackConnector::echo().connect(0).unwrap();
        channel.writes_done();
        assert!(!channel.send(&batch(1)));
    }

    #[test]
    fn test_loopback_end_stream_after() {
        let channel = LoopbackConnector::new(LoopbackConfig {
            end_stream_after: Some(1),
            ..Default::default()
        })
        .connect(0)
        .unwrap();

        assert!(channel.send(&batch(1)));
        assert!(channel.send(&batch(1)));
        assert!(channel.receive().is_some());
        assert!(channel.receive().is_none());

        let status = channel.close();
        assert_eq!(status.code, Status::UNAVAILABLE);
    }

    #[test]
    fn test_loopback_reject_writes_after() {
        let channel = LoopbackConnector::new(LoopbackConfig {
            reject_writes_after: Some(2),
            ..Default::default()
        })
        .connect(0)
        .unwrap();

        assert!(channel.send(&batch(1)));
        assert!(channel.send(&batch(1)));
        assert!(!channel.send(&batch(1)));
        assert!(!channel.send(&batch(1)));
        assert!(!channel.close().is_ok());
    }

    #[test]
    fn test_loopback_refuses_connections() {
        let connector = LoopbackConnector::new(LoopbackConfig {
            refuse_connections: true,
            ..Default::default()
        });
        match connector.connect(3) {
            Err(HarnessError::StreamBroken(status)) => {
                assert_eq!(status.code, Status::UNAVAILABLE);
                assert!(status.details.contains('3'));
            }
            other => panic!("expected StreamBroken, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_close_unblocks_reader() {
        let channel = LoopbackConnector::echo().connect(0).unwrap();
        thread::scope(|scope| {
            let reader = scope.spawn(|| channel.receive());
            thread::sleep(Duration::from_millis(20));
            channel.close();
            assert_eq!(reader.join().unwrap(), None);
        });
    }
}
