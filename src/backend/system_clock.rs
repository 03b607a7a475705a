//! Monotonic system clock.

use super::{BackendError, Clock, Timestamp};
use std::time::Instant;

/// `Instant`-based clock measuring from its own construction
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Result<Timestamp, BackendError> {
        Ok(Timestamp::from_duration(self.origin.elapsed()))
    }
}
