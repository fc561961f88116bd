//! Backoff policy that records how it was used.

use catalog_auth::backoff::Backoff;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Returns a fixed delay (zero by default) and records every attempt number.
///
/// Cloning shares the record, so a test can keep one handle and give the
/// other to a manager.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackoff {
    delay: Duration,
    attempts: Arc<Mutex<Vec<u32>>>,
}

impl RecordingBackoff {
    /// Zero-delay backoff.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Backoff that always waits `delay`.
    pub fn fixed(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            attempts: Arc::default(),
        })
    }

    /// Number of times a delay was requested.
    pub fn calls(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    /// Attempt numbers passed to `delay`, in order.
    pub fn attempts(&self) -> Vec<u32> {
        self.attempts.lock().unwrap().clone()
    }
}

impl Backoff for RecordingBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        self.attempts.lock().unwrap().push(attempt);
        self.delay
    }
}
