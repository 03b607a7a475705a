//! Bluetooth game controller identity
//!
//! This module provides everything the saver needs to know about a controller
//! without talking to the radio itself:
//! - Manufacturer data and characteristic constants
//! - Hardware address type used as the device identifier
//! - Button-down detection from raw input reports
//! - Cache of controller addresses seen on earlier runs

pub mod constants;
pub mod types;
pub mod report;
pub mod cache;

// Re-export commonly used items
pub use constants::*;
pub use types::*;
pub use report::ButtonTracker;
pub use cache::{CachedController, ControllerCache};
