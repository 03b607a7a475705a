//! Platform collaborators for the idle loop
//!
//! The idle loop only ever talks to the platform through the traits in this
//! module: input polling, a monotonic clock, the connected-controller
//! registry, the disconnect service and a diagnostics sink. Real host
//! implementations and mocks for testing live in the submodules.

pub mod bluetooth;
pub mod combined_input;
pub mod console_input;
pub mod diagnostics;
pub mod system_clock;
pub mod mock_clock;
pub mod mock_devices;
pub mod mock_diagnostics;
pub mod mock_input;

pub use bluetooth::{BluetoothActivity, BluetoothBackend, BluetoothSettings};
pub use combined_input::CombinedInput;
pub use console_input::ConsoleInput;
pub use diagnostics::{ConsoleDiagnostics, LogDiagnostics};
pub use system_clock::SystemClock;

pub use mock_clock::MockClock;
pub use mock_devices::MockDevices;
pub use mock_diagnostics::RecordingDiagnostics;
pub use mock_input::MockInput;

use crate::controller::DeviceId;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Failed to disconnect {device}: {reason}")]
    Disconnect { device: DeviceId, reason: String },

    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceId),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),
}

/// Monotonic clock reading, measured from a clock-defined origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(Duration);

impl Timestamp {
    pub const fn from_duration(since_origin: Duration) -> Self {
        Self(since_origin)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub fn since_origin(&self) -> Duration {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later
    pub fn saturating_duration_since(&self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

/// Input polling interface
pub trait InputSource {
    /// Whether an exit was requested since the last call
    fn poll_exit_requested(&self) -> bool;

    /// Whether any button was pressed since the last call
    fn poll_any_input(&self) -> bool;
}

/// Monotonic time source
pub trait Clock {
    fn now(&self) -> Result<Timestamp, BackendError>;
}

/// Enumerates currently connected controllers
pub trait DeviceRegistry {
    /// Queried fresh on every call; implementations must not serve a stale list.
    fn list_connected(&self) -> Result<Vec<DeviceId>, BackendError>;
}

/// Severs the connection of one controller
pub trait DisconnectService {
    fn disconnect(&self, device: &DeviceId) -> Result<(), BackendError>;
}

/// Best-effort diagnostic output. Never affects control flow.
pub trait Diagnostics {
    fn log_line(&self, message: &str);

    /// Report a failure. Defaults to a plain line.
    fn error_line(&self, message: &str) {
        self.log_line(message);
    }
}

impl<T: InputSource + ?Sized> InputSource for Box<T> {
    fn poll_exit_requested(&self) -> bool {
        (**self).poll_exit_requested()
    }

    fn poll_any_input(&self) -> bool {
        (**self).poll_any_input()
    }
}

impl<T: Diagnostics + ?Sized> Diagnostics for Box<T> {
    fn log_line(&self, message: &str) {
        (**self).log_line(message)
    }

    fn error_line(&self, message: &str) {
        (**self).error_line(message)
    }
}

impl<T: DeviceRegistry + ?Sized> DeviceRegistry for std::sync::Arc<T> {
    fn list_connected(&self) -> Result<Vec<DeviceId>, BackendError> {
        (**self).list_connected()
    }
}

impl<T: DisconnectService + ?Sized> DisconnectService for std::sync::Arc<T> {
    fn disconnect(&self, device: &DeviceId) -> Result<(), BackendError> {
        (**self).disconnect(device)
    }
}
