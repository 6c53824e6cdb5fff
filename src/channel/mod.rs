//! Stream channel contract
//!
//! The harness never speaks a wire protocol itself. Everything it needs from the
//! remote store is a bidirectional stream that accepts batches, hands back
//! responses, can be half-closed, and reports a terminal status. Transport
//! crates implement [`Channel`] and [`Connector`] for their stub types; the
//! in-process [`loopback`] implementation backs the tests and the CLI's
//! `loopback` target.
//!
//! # Thread Safety
//!
//! Channel methods take `&self` and channels must be `Sync`: a full-duplex
//! session reads from a scoped thread while the owning worker keeps writing to
//! the same channel.

pub mod loopback;

use crate::error::HarnessResult;
use std::fmt;
use std::sync::Arc;

/// Terminal status reported by a channel when it is closed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Status {
    /// Status code, 0 means success
    pub code: i32,
    pub message: String,
    pub details: String,
}

impl Status {
    /// Code reported by a successfully finished stream
    pub const OK: i32 = 0;

    /// Code used when a stream failed without a more specific reason
    pub const UNKNOWN: i32 = 2;

    /// Code used when the remote end is unreachable or went away
    pub const UNAVAILABLE: i32 = 14;

    pub fn new(code: i32, message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: details.into(),
        }
    }

    /// A successful terminal status
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn is_ok(&self) -> bool {
        self.code == Self::OK
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Code: {}, Details: {}, Message: {}",
            self.code, self.details, self.message
        )
    }
}

/// Shape of the traffic carried by a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Traffic {
    /// Lookups by key, keys drawn from the Zipfian sampler
    Search,
    /// New records, identifiers taken from the worker's offset range
    Insert,
}

impl fmt::Display for Traffic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Traffic::Search => write!(f, "search"),
            Traffic::Insert => write!(f, "insert"),
        }
    }
}

/// Number of filler fields carried by every inserted record
pub const FILLER_FIELD_COUNT: usize = 10;

/// Value of each filler field (50 bytes)
pub const FILLER_FIELD: &str = "1aa_aa_aa_2bb_bb_bb_3cc_cc_cc_4dd_dd_dd_5ee_ee_ee_";

/// Build the filler shared by every record of a run
pub fn default_filler() -> Arc<[String]> {
    (0..FILLER_FIELD_COUNT)
        .map(|_| FILLER_FIELD.to_string())
        .collect()
}

/// One logical operation inside a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedPayload {
    /// Record identifier
    pub id: u64,
    /// Filler field values, present on inserted records only
    pub fields: Option<Arc<[String]>>,
}

impl KeyedPayload {
    /// Lookup of the record with identifier `id`
    pub fn search(id: u64) -> Self {
        Self { id, fields: None }
    }

    /// New record with identifier `id` carrying the given filler
    pub fn record(id: u64, filler: &Arc<[String]>) -> Self {
        Self {
            id,
            fields: Some(Arc::clone(filler)),
        }
    }
}

/// A wire message bundling several logical operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub traffic: Traffic,
    pub items: Vec<KeyedPayload>,
}

impl Batch {
    pub fn with_capacity(traffic: Traffic, capacity: usize) -> Self {
        Self {
            traffic,
            items: Vec::with_capacity(capacity),
        }
    }

    /// Number of logical operations in the batch
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Bidirectional stream to the store under test
///
/// Implementations must be internally synchronized: one thread may call
/// [`send`](Channel::send) while another blocks in
/// [`receive`](Channel::receive).
pub trait Channel: Send + Sync {
    /// Response message type
    type Response: Send;

    /// Write one batch; `false` means the stream is broken
    fn send(&self, batch: &Batch) -> bool;

    /// Block for the next response; `None` is end of stream
    fn receive(&self) -> Option<Self::Response>;

    /// Half-close the write side
    fn writes_done(&self);

    /// The caller will never read a response on this stream
    ///
    /// Transports that buffer responses may stop doing so.
    fn discard_responses(&self) {}

    /// Finish the stream and report its terminal status
    fn close(&self) -> Status;
}

/// Factory opening one channel per worker
pub trait Connector: Send + Sync + 'static {
    type Channel: Channel + 'static;

    /// Open a channel for worker `worker`
    ///
    /// Called before the worker parks on the start latch, so connection cost
    /// is never measured. Failures should be reported as
    /// [`HarnessError::StreamBroken`](crate::HarnessError::StreamBroken).
    fn connect(&self, worker: usize) -> HarnessResult<Self::Channel>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let status = Status::new(14, "connection reset", "peer closed");
        assert_eq!(
            status.to_string(),
            "Code: 14, Details: peer closed, Message: connection reset"
        );
        assert!(!status.is_ok());
        assert!(Status::ok().is_ok());
    }

    #[test]
    fn test_filler_shape() {
        let filler = default_filler();
        assert_eq!(filler.len(), FILLER_FIELD_COUNT);
        assert!(filler.iter().all(|f| f.len() == 50));

        let record = KeyedPayload::record(7, &filler);
        assert_eq!(record.fields.as_deref().map(<[String]>::len), Some(FILLER_FIELD_COUNT));
        assert!(KeyedPayload::search(7).fields.is_none());
    }
}
