//! Record identifiers.
//!
//! Identifiers look like creation timestamps in milliseconds, matching the
//! stored data, but the generator never hands out the same value twice:
//! when the clock has not moved past the last id, the next id is last + 1.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

#[derive(Debug)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    /// Start after `highest`, the largest id already in use.
    pub fn seeded(highest: Option<i64>) -> Self {
        Self {
            last: AtomicI64::new(highest.unwrap_or(0)),
        }
    }

    pub fn next(&self) -> i64 {
        self.next_at(Utc::now().timestamp_millis())
    }

    fn next_at(&self, now_millis: i64) -> i64 {
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_millis.max(current + 1);
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => current = actual,
            }
        }
    }
}
