//! Per-client spacing between contact form submissions.
//!
//! Each client may submit once per interval. Clients are keyed by address;
//! entries older than the interval are pruned on every check, so the map only
//! holds clients seen within the last interval.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct ContactLimiter {
    interval: Duration,
    /// Client key to time of its last accepted submission.
    last_accepted: Mutex<HashMap<String, Instant>>,
}

impl ContactLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    /// Check the window for `client` and, if open, record this submission.
    /// Check and record happen under one lock.
    pub fn check_and_record(&self, client: &str) -> bool {
        self.check_and_record_at(client, Instant::now())
    }

    fn check_and_record_at(&self, client: &str, now: Instant) -> bool {
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let interval = self.interval;
        last.retain(|_, at| now.saturating_duration_since(*at) < interval);

        if last.contains_key(client) {
            return false;
        }
        last.insert(client.to_string(), now);
        true
    }

    /// Forget the submission recorded for `client`, reopening its window.
    pub fn release(&self, client: &str) {
        self.last_accepted
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(client);
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.last_accepted
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}
