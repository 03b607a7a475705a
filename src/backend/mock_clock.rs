//! Mock clock for testing.
//!
//! Time only moves when the test says so. Clones share the same reading, so a
//! test can keep one handle and hand another to the idle loop.

use super::{BackendError, Clock, Timestamp};
use log::debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct ClockState {
    now: Timestamp,
    failing: bool,
    reads: usize,
}

/// Manually driven clock with optional read failures
#[derive(Clone, Debug, Default)]
pub struct MockClock {
    state: Arc<Mutex<ClockState>>,
}

impl MockClock {
    /// Create a clock reading zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock reading `secs` seconds
    pub fn at_secs(secs: u64) -> Self {
        let clock = Self::new();
        clock.set(Timestamp::from_secs(secs));
        clock
    }

    pub fn set(&self, now: Timestamp) {
        self.lock().now = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut state = self.lock();
        state.now = Timestamp::from_duration(state.now.since_origin() + by);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    /// Make every read fail until turned off again
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Number of reads so far, failed ones included
    pub fn reads(&self) -> usize {
        self.lock().reads
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for MockClock {
    fn now(&self) -> Result<Timestamp, BackendError> {
        let mut state = self.lock();
        state.reads += 1;

        if state.failing {
            debug!("[MOCK CLOCK] read failed");
            return Err(BackendError::Query("mock clock unavailable".into()));
        }

        Ok(state.now)
    }
}
