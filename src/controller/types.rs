//! Controller type definitions
//!
//! The saver identifies controllers by their Bluetooth hardware address, the
//! same way the console's Bluetooth manager does.

use btleplug::api::BDAddr;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier handed to the registry and the disconnect service
pub type DeviceId = ControllerAddress;

/// Six byte Bluetooth hardware address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ControllerAddress([u8; 6]);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid controller address: {0}")]
pub struct AddressParseError(String);

impl ControllerAddress {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl fmt::Display for ControllerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for ControllerAddress {
    type Err = AddressParseError;

    /// Parse "AA:BB:CC:DD:EE:FF" (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.trim().split(':');

        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or_else(|| AddressParseError(s.to_string()))?;
            if part.len() != 2 {
                return Err(AddressParseError(s.to_string()));
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| AddressParseError(s.to_string()))?;
        }

        if parts.next().is_some() {
            return Err(AddressParseError(s.to_string()));
        }

        Ok(Self(bytes))
    }
}

impl TryFrom<String> for ControllerAddress {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ControllerAddress> for String {
    fn from(address: ControllerAddress) -> Self {
        address.to_string()
    }
}

impl From<BDAddr> for ControllerAddress {
    fn from(addr: BDAddr) -> Self {
        Self(addr.into_inner())
    }
}

impl From<ControllerAddress> for BDAddr {
    fn from(address: ControllerAddress) -> Self {
        BDAddr::from(address.0)
    }
}
