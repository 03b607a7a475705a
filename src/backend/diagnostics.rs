//! Diagnostics sinks.
//!
//! The service runs without a console, so its diagnostics go through the
//! `log` facade (and from there to the log file when one is configured). The
//! interactive mode prints status lines for the user and mirrors them to the
//! log.

use super::Diagnostics;
use log::{debug, error, info, warn};

/// Forwards diagnostic lines to the log at info level
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn log_line(&self, message: &str) {
        info!("{}", message);
    }

    fn error_line(&self, message: &str) {
        error!("{}", message);
    }
}

/// Prints diagnostic lines to stdout
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleDiagnostics;

impl Diagnostics for ConsoleDiagnostics {
    fn log_line(&self, message: &str) {
        println!("{}", message);
        debug!("{}", message);
    }

    fn error_line(&self, message: &str) {
        println!("{}", message);
        warn!("{}", message);
    }
}
