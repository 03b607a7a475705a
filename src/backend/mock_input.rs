//! Mock input source for testing.
//!
//! Tests queue button presses and exit requests; the idle loop consumes them
//! on its next poll.

use super::InputSource;
use log::info;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct InputState {
    pressed: bool,
    exit_requested: bool,
    input_polls: usize,
}

/// Scripted input source. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct MockInput {
    state: Arc<Mutex<InputState>>,
}

impl MockInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a button press on the next poll
    pub fn press(&self) {
        info!("[MOCK INPUT] Button pressed");
        self.lock().pressed = true;
    }

    /// Request exit. Stays requested once set.
    pub fn request_exit(&self) {
        info!("[MOCK INPUT] Exit requested");
        self.lock().exit_requested = true;
    }

    /// Number of input polls so far
    pub fn input_polls(&self) -> usize {
        self.lock().input_polls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InputState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl InputSource for MockInput {
    fn poll_exit_requested(&self) -> bool {
        self.lock().exit_requested
    }

    fn poll_any_input(&self) -> bool {
        let mut state = self.lock();
        state.input_polls += 1;
        std::mem::take(&mut state.pressed)
    }
}
