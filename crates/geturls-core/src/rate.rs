//! Smoothed download rate over a sliding window of samples.
//!
//! Each sample is a (bytes, seconds) pair measured since the previous sample.
//! The rate is `sum(bytes) / sum(seconds)` over the retained window, so a
//! single slow or fast read does not swing the estimate.

use std::collections::VecDeque;
use std::time::Instant;

/// Default number of samples kept in the window.
pub const DEFAULT_WINDOW: usize = 256;

/// Elapsed-time floor used when every retained sample arrived in the same instant.
const MIN_ELAPSED_SECS: f64 = 1e-6;

/// Source of a smoothed bytes-per-second estimate.
///
/// The fetcher consults this at every checkpoint to grow or shrink its chunk size;
/// a rate of exactly zero is treated as a stalled connection.
pub trait RateSource {
    /// Clear all samples and anchor the next delta at `now`.
    fn reset(&mut self, now: Instant);

    /// Add a sample of `bytes` received since the previous call and return the new rate.
    fn record(&mut self, bytes: u64, now: Instant) -> f64;

    /// Current smoothed rate in bytes per second (0 when no bytes were seen).
    fn rate(&self) -> f64;
}

/// Ring-buffer rate tracker: two parallel bounded sequences of byte and time deltas.
#[derive(Debug, Clone)]
pub struct RateTracker {
    capacity: usize,
    bytes: VecDeque<u64>,
    seconds: VecDeque<f64>,
    bytes_sum: u64,
    seconds_sum: f64,
    previous: Instant,
}

impl RateTracker {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            bytes: VecDeque::with_capacity(capacity),
            seconds: VecDeque::with_capacity(capacity),
            bytes_sum: 0,
            seconds_sum: 0.0,
            previous: Instant::now(),
        }
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn compute(&self) -> f64 {
        if self.bytes_sum == 0 {
            return 0.0;
        }
        self.bytes_sum as f64 / self.seconds_sum.max(MIN_ELAPSED_SECS)
    }
}

impl Default for RateTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl RateSource for RateTracker {
    fn reset(&mut self, now: Instant) {
        self.bytes.clear();
        self.seconds.clear();
        self.bytes_sum = 0;
        self.seconds_sum = 0.0;
        self.previous = now;
    }

    fn record(&mut self, bytes: u64, now: Instant) -> f64 {
        let secs = now.saturating_duration_since(self.previous).as_secs_f64();
        self.previous = now;

        if self.bytes.len() == self.capacity {
            if let Some(old) = self.bytes.pop_front() {
                self.bytes_sum -= old;
            }
            if let Some(old) = self.seconds.pop_front() {
                self.seconds_sum -= old;
            }
        }
        self.bytes.push_back(bytes);
        self.seconds.push_back(secs);
        self.bytes_sum += bytes;
        self.seconds_sum += secs;
        // Float eviction can leave a tiny negative residue.
        if self.seconds_sum < 0.0 {
            self.seconds_sum = 0.0;
        }

        self.compute()
    }

    fn rate(&self) -> f64 {
        self.compute()
    }
}
