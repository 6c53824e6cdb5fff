//! Error types for the benchmark harness
//!
//! Every error in this module is fatal for a benchmark run. Nothing is retried:
//! retrying a broken stream would silently skew the measured throughput, so the
//! first failure is surfaced to the caller and the run is reported as failed.

use crate::channel::Status;
use thiserror::Error;

/// Errors raised by the harness core
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A constructor or scenario argument is outside its valid domain
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter
        name: &'static str,
        /// Human-readable description of the accepted range
        reason: String,
    },

    /// A write or an expected read failed before the exchange completed
    #[error("stream broken. {0}")]
    StreamBroken(Status),

    /// A worker task panicked
    #[error("worker panicked: {0}")]
    WorkerPanicked(String),

    /// Writing benchmark results failed
    #[error("result log error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Terminal status carried by a `StreamBroken` error
    pub fn status(&self) -> Option<&Status> {
        match self {
            Self::StreamBroken(status) => Some(status),
            _ => None,
        }
    }
}

/// Result type used by the harness core
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;
