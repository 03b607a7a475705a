//! Diagnostics sink that records lines for assertions.

use super::Diagnostics;
use log::info;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Lines {
    all: Vec<String>,
    errors: Vec<String>,
}

/// Records every line. Clones share the same record.
#[derive(Clone, Debug, Default)]
pub struct RecordingDiagnostics {
    lines: Arc<Mutex<Lines>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines in order, errors included
    pub fn lines(&self) -> Vec<String> {
        self.lock().all.clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lock().errors.clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lock().all.iter().any(|line| line.contains(needle))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Lines> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn log_line(&self, message: &str) {
        info!("[MOCK DIAG] {}", message);
        self.lock().all.push(message.to_string());
    }

    fn error_line(&self, message: &str) {
        info!("[MOCK DIAG] error: {}", message);
        let mut lines = self.lock();
        lines.all.push(message.to_string());
        lines.errors.push(message.to_string());
    }
}
