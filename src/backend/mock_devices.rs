//! Mock controller registry and disconnect service for testing.
//!
//! Keeps a list of "connected" controllers, records every disconnect attempt
//! and can be told to fail enumeration or specific disconnects.

use super::{BackendError, DeviceRegistry, DisconnectService};
use crate::controller::{ControllerAddress, DeviceId};
use log::info;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct DeviceState {
    connected: Vec<DeviceId>,
    failing: HashSet<DeviceId>,
    list_failing: bool,
    list_calls: usize,
    disconnect_calls: Vec<DeviceId>,
}

/// In-memory registry plus disconnect service. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct MockDevices {
    state: Arc<Mutex<DeviceState>>,
}

impl MockDevices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with `count` connected controllers
    /// (addresses `00:00:00:00:00:01` upwards)
    pub fn with_controllers(count: u8) -> Self {
        let devices = Self::new();
        for i in 1..=count {
            devices.connect(Self::address(i));
        }
        devices
    }

    /// Address used by `with_controllers` for controller number `n`
    pub fn address(n: u8) -> DeviceId {
        ControllerAddress::new([0, 0, 0, 0, 0, n])
    }

    pub fn connect(&self, device: DeviceId) {
        let mut state = self.lock();
        if !state.connected.contains(&device) {
            state.connected.push(device);
        }
    }

    /// Make disconnects of `device` fail
    pub fn fail_disconnect(&self, device: DeviceId) {
        self.lock().failing.insert(device);
    }

    /// Make enumeration fail until turned off again
    pub fn set_list_failing(&self, failing: bool) {
        self.lock().list_failing = failing;
    }

    pub fn connected(&self) -> Vec<DeviceId> {
        self.lock().connected.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    /// Every disconnect attempt in order, failed ones included
    pub fn disconnect_calls(&self) -> Vec<DeviceId> {
        self.lock().disconnect_calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DeviceRegistry for MockDevices {
    fn list_connected(&self) -> Result<Vec<DeviceId>, BackendError> {
        let mut state = self.lock();
        state.list_calls += 1;

        if state.list_failing {
            return Err(BackendError::Query("mock registry unavailable".into()));
        }

        Ok(state.connected.clone())
    }
}

impl DisconnectService for MockDevices {
    fn disconnect(&self, device: &DeviceId) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.disconnect_calls.push(*device);

        if state.failing.contains(device) {
            info!("[MOCK DEVICES] Disconnect FAILED: {}", device);
            return Err(BackendError::Disconnect {
                device: *device,
                reason: "mock failure".into(),
            });
        }

        info!("[MOCK DEVICES] Disconnected: {}", device);
        state.connected.retain(|d| d != device);
        Ok(())
    }
}
