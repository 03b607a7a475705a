//! Controller protocol constants
//!
//! This module contains the constants needed to recognise controllers:
//! - BLE manufacturer data
//! - Input report characteristic UUID
//! - Input report layout

use uuid::Uuid;

// ============================================================================
// BLE Discovery Constants
// ============================================================================

/// Nintendo Co., Ltd. company ID for BLE manufacturer data
pub const NINTENDO_COMPANY_ID: u16 = 0x0553;

/// Manufacturer data prefix for Joy-Con 2 controllers
pub const JOYCON_DATA_PREFIX: [u8; 5] = [0x01, 0x00, 0x03, 0x7e, 0x05];

/// Local name prefixes that identify a controller when no manufacturer data is advertised
pub const DEFAULT_NAME_PREFIXES: [&str; 3] = ["Joy-Con", "Pro Controller", "Nintendo"];

// ============================================================================
// Input Reports
// ============================================================================

/// TX characteristic UUID (controller -> host, input reports)
pub const TX_CHARACTERISTIC_UUID: Uuid = Uuid::from_u128(0xab7de9be_89fe_49ad_828f_118f09df7fd2);

/// First byte of the button bitfield in an input report.
/// Right Joy-Con buttons live in bytes 4-5, left Joy-Con buttons in bytes 5-6.
pub const REPORT_BUTTONS_START: usize = 4;

/// One past the last byte of the button bitfield
pub const REPORT_BUTTONS_END: usize = 7;
