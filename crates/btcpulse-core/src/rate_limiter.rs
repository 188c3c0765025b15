//! Per-source cool-down tracker.
//!
//! Advisory only: a limited source is skipped by the aggregator, never
//! turned into an error.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::ProviderId;

/// Tracks the last attempt per `(source, operation)` key.
#[derive(Debug, Default)]
pub struct RateLimiter {
    last_attempt: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the record key for a provider/operation pair, e.g. `coingecko:price`.
    pub fn source_key(provider: ProviderId, operation: &str) -> String {
        format!("{}:{operation}", provider.as_str())
    }

    /// `true` when an attempt was recorded for `source_key` less than `window` ago.
    pub fn is_limited(&self, source_key: &str, window: Duration) -> bool {
        if window.is_zero() {
            return false;
        }
        self.records()
            .get(source_key)
            .is_some_and(|last| last.elapsed() < window)
    }

    pub fn mark_attempted(&self, source_key: &str) {
        self.records()
            .insert(source_key.to_owned(), Instant::now());
    }

    /// Time since the last recorded attempt, if any.
    pub fn since_last_attempt(&self, source_key: &str) -> Option<Duration> {
        self.records().get(source_key).map(Instant::elapsed)
    }

    pub fn reset(&self, source_key: &str) {
        self.records().remove(source_key);
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        // A panic while holding the lock cannot leave a half-written Instant behind.
        self.last_attempt
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
