//! controller-saver: disconnect idle game controllers
//!
//! Watches for controller input and, after a period without any, disconnects
//! every connected controller to save its battery.

pub mod backend;
pub mod controller;
pub mod logging;
pub mod manager;
pub mod saver;

// Re-export commonly used items
pub use backend::{Clock, DeviceRegistry, Diagnostics, DisconnectService, InputSource, Timestamp};
pub use controller::{ControllerAddress, DeviceId};
pub use manager::{ControllerSaver, InitError};
pub use saver::{Config, IdleDisconnectLoop, IdleState, LoopSettings, Mode, RearmPolicy};
