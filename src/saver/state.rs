//! Idle state machine
//!
//! Two states: armed (a disconnect is pending for the current idle stretch)
//! and disarmed (it already fired, or nothing has armed it yet). Input arms;
//! exceeding the threshold while armed asks for a sweep; completing the sweep
//! disarms until the next input, unless the re-arm policy says otherwise.

use crate::backend::Timestamp;
use crate::saver::config::RearmPolicy;
use std::time::Duration;

/// Outcome of evaluating the state at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleDecision {
    /// Armed, threshold not exceeded yet
    Waiting { idle: Duration },

    /// Not armed; nothing to do until input
    Disarmed { idle: Duration },

    /// Armed and past the threshold: disconnect everything
    Disconnect { idle: Duration },
}

impl IdleDecision {
    pub fn idle(&self) -> Duration {
        match *self {
            IdleDecision::Waiting { idle }
            | IdleDecision::Disarmed { idle }
            | IdleDecision::Disconnect { idle } => idle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleState {
    last_input: Timestamp,
    threshold: Duration,
    armed: bool,
    rearm_policy: RearmPolicy,
}

impl IdleState {
    /// Start tracking at `start`. Armed immediately unless `require_initial_input`.
    pub fn new(
        start: Timestamp,
        threshold: Duration,
        require_initial_input: bool,
        rearm_policy: RearmPolicy,
    ) -> Self {
        Self {
            last_input: start,
            threshold,
            armed: !require_initial_input,
            rearm_policy,
        }
    }

    pub fn last_input(&self) -> Timestamp {
        self.last_input
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Input seen at `now`: restart the idle stretch and arm
    pub fn record_input(&mut self, now: Timestamp) {
        // Never move backwards, even if the clock does
        self.last_input = self.last_input.max(now);
        self.armed = true;
    }

    pub fn idle_time(&self, now: Timestamp) -> Duration {
        now.saturating_duration_since(self.last_input)
    }

    /// Evaluate without changing anything. The threshold is strict:
    /// idle time equal to it does not trigger.
    pub fn evaluate(&self, now: Timestamp) -> IdleDecision {
        let idle = self.idle_time(now);

        if !self.armed {
            IdleDecision::Disarmed { idle }
        } else if idle > self.threshold {
            IdleDecision::Disconnect { idle }
        } else {
            IdleDecision::Waiting { idle }
        }
    }

    /// Apply this tick's input (if any) and evaluate
    pub fn observe(&mut self, input: bool, now: Timestamp) -> IdleDecision {
        if input {
            self.record_input(now);
        }
        self.evaluate(now)
    }

    /// The sweep asked for by `Disconnect` has run
    pub fn complete_sweep(&mut self, now: Timestamp) {
        self.last_input = self.last_input.max(now);
        self.armed = self.rearm_policy == RearmPolicy::EveryThreshold;
    }
}
