//! Worker threads
//!
//! This module provides the execution side of the harness:
//!
//! - **[`WorkerPool`]**: a fixed number of OS threads pulling tasks from a
//!   shared queue, with a completion barrier
//! - **[`Latch`]**: the one-shot gate that aligns the start of measured work
//!
//! # Failure Semantics
//!
//! A task that returns an error or panics is not isolated. The pool records the
//! first failure and hands it back from [`WorkerPool::wait`]; the runner then
//! aborts the whole benchmark run instead of reporting a throughput figure that
//! silently excludes broken streams. Nothing is retried.
//!
//! # Example
//!
//! ```
//! use streambench::worker::WorkerPool;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! let pool = WorkerPool::new(4)?;
//! let done = Arc::new(AtomicU64::new(0));
//! for _ in 0..16 {
//!     let done = Arc::clone(&done);
//!     pool.submit(move || {
//!         done.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     });
//! }
//! pool.wait()?;
//! assert_eq!(done.load(Ordering::SeqCst), 16);
//! # Ok::<(), streambench::HarnessError>(())
//! ```

pub mod latch;

pub use latch::Latch;

use crate::error::{HarnessError, HarnessResult};
use crossbeam::channel::{self, Receiver, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// Unit of work accepted by the pool
pub type Task = Box<dyn FnOnce() -> HarnessResult<()> + Send + 'static>;

/// Fixed-capacity thread pool with a completion barrier
///
/// Created once per program run and reused by every scenario. At most
/// `capacity` tasks execute at the same time; the rest wait in the queue until
/// a thread frees up.
pub struct WorkerPool {
    capacity: usize,

    /// Job queue; `None` only while dropping
    queue: Option<Sender<Task>>,

    threads: Vec<JoinHandle<()>>,

    state: Arc<PoolState>,
}

/// Bookkeeping shared between the pool handle and its threads
#[derive(Default)]
struct PoolState {
    tally: Mutex<Tally>,
    drained: Condvar,
}

#[derive(Default)]
struct Tally {
    /// Submitted tasks that have not finished yet
    outstanding: usize,
    /// First failure since the last `wait()`
    failure: Option<HarnessError>,
}

impl PoolState {
    fn lock(&self) -> std::sync::MutexGuard<'_, Tally> {
        self.tally.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, failure: Option<HarnessError>) {
        let mut tally = self.lock();
        if let Some(err) = failure {
            if tally.failure.is_none() {
                tracing::error!(error = %err, "worker task failed");
                tally.failure = Some(err);
            } else {
                tracing::debug!(error = %err, "additional worker failure");
            }
        }
        tally.outstanding -= 1;
        if tally.outstanding == 0 {
            self.drained.notify_all();
        }
    }
}

impl WorkerPool {
    /// Start a pool with `capacity` threads
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidParameter`] for a zero capacity and
    /// [`HarnessError::Io`] if the OS refuses to spawn a thread.
    pub fn new(capacity: usize) -> HarnessResult<Self> {
        if capacity == 0 {
            return Err(HarnessError::invalid("pool_capacity", "must be at least 1"));
        }

        let (sender, receiver) = channel::unbounded::<Task>();
        let state = Arc::new(PoolState::default());

        let threads = (0..capacity)
            .map(|index| {
                let receiver = receiver.clone();
                let state = Arc::clone(&state);
                thread::Builder::new()
                    .name(format!("streambench-worker-{}", index))
                    .spawn(move || worker_loop(receiver, state))
            })
            .collect::<std::io::Result<Vec<_>>>()?;

        Ok(Self {
            capacity,
            queue: Some(sender),
            threads,
            state,
        })
    }

    /// Maximum number of concurrently running tasks
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Enqueue a task
    ///
    /// Accepted at any time; the task starts as soon as a thread is free.
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() -> HarnessResult<()> + Send + 'static,
    {
        self.state.lock().outstanding += 1;

        let rejected = match &self.queue {
            Some(queue) => queue.send(Box::new(task)).is_err(),
            None => true,
        };
        if rejected {
            self.state.finish(Some(HarnessError::WorkerPanicked(
                "worker pool queue is closed".to_string(),
            )));
        }
    }

    /// Block until every submitted task has finished
    ///
    /// # Errors
    ///
    /// Returns the first task failure recorded since the previous call. The
    /// failure is cleared, so the pool can be reused afterwards.
    pub fn wait(&self) -> HarnessResult<()> {
        let tally = self.state.lock();
        let mut tally = self
            .state
            .drained
            .wait_while(tally, |tally| tally.outstanding > 0)
            .unwrap_or_else(PoisonError::into_inner);

        match tally.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the queue ends every worker loop once it is drained
        self.queue.take();
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("capacity", &self.capacity)
            .field("outstanding", &self.state.lock().outstanding)
            .finish()
    }
}

fn worker_loop(receiver: Receiver<Task>, state: Arc<PoolState>) {
    for task in receiver.iter() {
        let failure = match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err),
            Err(payload) => Some(HarnessError::WorkerPanicked(panic_message(payload.as_ref()))),
        };
        state.finish(failure);
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
