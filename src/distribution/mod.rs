//! Key generation for benchmark traffic
//!
//! Every batch a stream session sends is filled with numeric identifiers drawn
//! from a [`KeySource`]. Two sources exist, matching the two traffic shapes:
//!
//! - **Zipf**: skewed key popularity for read-shaped traffic, where a small set
//!   of hot keys receives most of the lookups
//! - **Sequential**: monotonically increasing identifiers inside a worker's
//!   private range for write-shaped traffic, so concurrent writers never
//!   produce the same identifier
//!
//! # Example
//!
//! ```
//! use streambench::distribution::{KeySource, zipf::ZipfianSampler};
//!
//! let mut keys = ZipfianSampler::with_seed(1000, 0.9, 7)?;
//! let key = keys.next_key();
//! assert!((1..=1000).contains(&key));
//! # Ok::<(), streambench::HarnessError>(())
//! ```

/// Source of identifiers for batch payloads
///
/// # Thread Safety
///
/// Sources must be `Send` so they can move into a worker thread. They are not
/// meant to be shared: each worker owns its own instance and its own random
/// stream, which keeps draws free of contention.
pub trait KeySource: Send {
    /// Produce the next identifier
    fn next_key(&mut self) -> u64;
}

pub mod sequential;
pub mod zipf;
