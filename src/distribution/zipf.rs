//! Zipfian key sampler
//!
//! Draws keys in `[1, element_count]` with probability mass `P(k) ∝ k^(-s)`
//! using rejection-inversion sampling (Hörmann & Derflinger). Unlike a
//! pre-computed CDF table this needs O(1) memory regardless of the key space
//! size, which matters for key spaces of millions of records.
//!
//! # Algorithm
//!
//! Let `H(x)` be the integral of the hat function `h(x) = x^(-s)`. Each draw:
//!
//! 1. Draws `u` uniformly from `[H(1.5) - 1, H(n + 0.5))`
//! 2. Maps it back through `x = H⁻¹(u)`
//! 3. Rounds and clamps `x` to an integer `k` in `[1, n]`
//! 4. Accepts `k` when `u >= H(k + 0.5) - h(k)`, otherwise redraws
//!
//! There is no cap on redraws. The loop terminates with probability 1 but a
//! single draw has no latency bound.
//!
//! # Example
//!
//! ```
//! use streambench::distribution::zipf::ZipfianSampler;
//!
//! let sampler = ZipfianSampler::with_seed(5_000_000, 0.9, 42)?;
//! let keys: Vec<u64> = sampler.take(3).collect();
//! assert!(keys.iter().all(|k| (1..=5_000_000).contains(k)));
//! # Ok::<(), streambench::HarnessError>(())
//! ```

use super::KeySource;
use crate::error::{HarnessError, HarnessResult};
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Below this magnitude the helper ratios switch to their Taylor expansions
const EPSILON: f64 = 1e-8;

/// `expm1(x) / x`, stable near zero
fn exp_minus_1_over_x(x: f64) -> f64 {
    if x.abs() > EPSILON {
        x.exp_m1() / x
    } else {
        1.0 + x / 2.0 * (1.0 + x / 3.0 * (1.0 + x / 4.0))
    }
}

/// `log1p(x) / x`, stable near zero
fn log1p_over_x(x: f64) -> f64 {
    if x.abs() > EPSILON {
        x.ln_1p() / x
    } else {
        1.0 - x * (0.5 - x * (1.0 / 3.0 - x * 0.25))
    }
}

/// Zipfian sampler over `[1, element_count]`
///
/// Immutable after construction except for its random cursor. Each worker
/// owns one instance; sharing a sampler between threads is not supported.
#[derive(Debug, Clone)]
pub struct ZipfianSampler {
    element_count: u64,
    skew: f64,
    /// `H(1.5) - 1`, lower bound of the proposal interval
    harmonic_at_1_5: f64,
    /// `H(element_count + 0.5)`, upper bound of the proposal interval
    normalization: f64,
    uniform: Uniform<f64>,
    rng: Xoshiro256PlusPlus,
}

impl ZipfianSampler {
    /// Create a sampler seeded from OS entropy
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidParameter`] if `element_count` is zero or
    /// `skew` is not strictly between 0 and 1.
    pub fn new(element_count: u64, skew: f64) -> HarnessResult<Self> {
        Self::with_rng(element_count, skew, Xoshiro256PlusPlus::from_entropy())
    }

    /// Create a sampler with a fixed seed
    ///
    /// Useful for reproducible runs and tests.
    pub fn with_seed(element_count: u64, skew: f64, seed: u64) -> HarnessResult<Self> {
        Self::with_rng(element_count, skew, Xoshiro256PlusPlus::seed_from_u64(seed))
    }

    fn with_rng(element_count: u64, skew: f64, rng: Xoshiro256PlusPlus) -> HarnessResult<Self> {
        if element_count == 0 {
            return Err(HarnessError::invalid("element_count", "must be greater than 0"));
        }
        if !(skew > 0.0 && skew < 1.0) {
            return Err(HarnessError::invalid(
                "skew",
                format!("must be in (0, 1), got {}", skew),
            ));
        }

        let harmonic_at_1_5 = harmonic(skew, 1.5) - 1.0;
        let normalization = harmonic(skew, element_count as f64 + 0.5);

        Ok(Self {
            element_count,
            skew,
            harmonic_at_1_5,
            normalization,
            uniform: Uniform::new(harmonic_at_1_5, normalization),
            rng,
        })
    }

    /// Restart the sequence from a new seed
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    }

    /// Size of the key space
    pub fn element_count(&self) -> u64 {
        self.element_count
    }

    /// Skew exponent
    pub fn skew(&self) -> f64 {
        self.skew
    }

    /// Draw one key in `[1, element_count]`
    pub fn sample(&mut self) -> u64 {
        loop {
            let u = self.uniform.sample(&mut self.rng);
            let x = self.inverse_harmonic(u);
            // `as` saturates, so a NaN or negative candidate lands on 0 and is clamped to 1
            let k = (x.round() as u64).clamp(1, self.element_count);
            if u >= harmonic(self.skew, k as f64 + 0.5) - self.hat(k as f64) {
                return k;
            }
        }
    }

    fn inverse_harmonic(&self, x: f64) -> f64 {
        let t = (x * (1.0 - self.skew)).max(-1.0);
        (log1p_over_x(t) * x).exp()
    }

    fn hat(&self, x: f64) -> f64 {
        (-self.skew * x.ln()).exp()
    }
}

/// Integral of the hat function from 1 to `x`
fn harmonic(skew: f64, x: f64) -> f64 {
    let log_x = x.ln();
    exp_minus_1_over_x((1.0 - skew) * log_x) * log_x
}

impl KeySource for ZipfianSampler {
    #[inline]
    fn next_key(&mut self) -> u64 {
        self.sample()
    }
}

impl Iterator for ZipfianSampler {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        Some(self.sample())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zipf_range_invariant() {
        for (n, skew) in [(1u64, 0.5), (2, 0.9), (100, 0.1), (1000, 0.99), (5_000_000, 0.9)] {
            let mut sampler = ZipfianSampler::with_seed(n, skew, 7).unwrap();
            for _ in 0..10_000 {
                let k = sampler.sample();
                assert!(k >= 1 && k <= n, "key {} outside [1, {}]", k, n);
            }
        }
    }

    #[test]
    fn test_zipf_single_element() {
        let mut sampler = ZipfianSampler::with_seed(1, 0.9, 3).unwrap();
        assert!(sampler.by_ref().take(100).all(|k| k == 1));
    }

    #[test]
    fn test_zipf_skew() {
        let n = 100u64;
        let mut sampler = ZipfianSampler::with_seed(n, 0.9, 42).unwrap();
        let mut counts = vec![0u64; n as usize + 1];

        for _ in 0..1_000_000 {
            counts[sampler.sample() as usize] += 1;
        }

        assert!(
            counts[1] > counts[n as usize],
            "key 1 ({}) should be drawn more often than key {} ({})",
            counts[1], n, counts[n as usize]
        );

        // Coarse ranks: per-key noise can swap neighbours, bucket sums must not
        let buckets: Vec<u64> = counts[1..]
            .chunks(10)
            .map(|chunk| chunk.iter().sum())
            .collect();
        for pair in buckets.windows(2) {
            assert!(pair[0] > pair[1], "bucket frequencies not decreasing: {:?}", buckets);
        }

        // P(1) / P(2) = 2^0.9 ≈ 1.87
        let ratio = counts[1] as f64 / counts[2] as f64;
        assert!((ratio - 2f64.powf(0.9)).abs() < 0.05, "ratio {} off", ratio);
    }

    #[test]
    fn test_zipf_seeded() {
        let a: Vec<u64> = ZipfianSampler::with_seed(1000, 0.9, 12345).unwrap().take(50).collect();
        let b: Vec<u64> = ZipfianSampler::with_seed(1000, 0.9, 12345).unwrap().take(50).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zipf_reseed_restarts_sequence() {
        let mut sampler = ZipfianSampler::with_seed(1000, 0.9, 99).unwrap();
        let first: Vec<u64> = sampler.by_ref().take(20).collect();
        sampler.reseed(99);
        let second: Vec<u64> = sampler.by_ref().take(20).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zipf_invalid_parameters() {
        let cases = [(0u64, 0.9), (10, 0.0), (10, -0.5), (10, 1.0), (10, 1.5), (10, f64::NAN)];
        for (n, skew) in cases {
            match ZipfianSampler::new(n, skew) {
                Err(HarnessError::InvalidParameter { .. }) => {}
                other => {
                    panic!("({}, {}) should be rejected, got {:?}", n, skew, other.map(|_| ()))
                }
            }
        }
    }

    #[test]
    fn test_helpers_taylor_branch_matches_direct() {
        for x in [1e-9, -1e-9, 5e-9] {
            assert!((exp_minus_1_over_x(x) - 1.0).abs() < 1e-8);
            assert!((log1p_over_x(x) - 1.0).abs() < 1e-8);
        }
        let x = 1e-3;
        assert!((exp_minus_1_over_x(x) - x.exp_m1() / x).abs() < 1e-12);
        assert!((log1p_over_x(x) - x.ln_1p() / x).abs() < 1e-12);
    }

    #[test]
    fn test_harmonic_inverse_round_trip() {
        let sampler = ZipfianSampler::with_seed(1000, 0.9, 1).unwrap();
        for x in [1.5, 2.0, 10.0, 500.5] {
            let h = harmonic(0.9, x);
            assert!((sampler.inverse_harmonic(h) - x).abs() < 1e-6);
        }
    }
}
