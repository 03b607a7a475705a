//! Bluetooth controller backend (btleplug)
//!
//! Enumerates connected controllers by hardware address, disconnects them, and
//! watches their input reports for button presses. btleplug is async, the idle
//! loop is not: the backend owns a tokio runtime, runs the activity watcher on
//! it and uses `block_on` for the calls the loop makes.

use super::{BackendError, DeviceRegistry, DisconnectService, InputSource};
use crate::controller::cache::{resolve_cache_path, ControllerCache, DEFAULT_CACHE_FILENAME};
use crate::controller::constants::{
    DEFAULT_NAME_PREFIXES, JOYCON_DATA_PREFIX, NINTENDO_COMPANY_ID, TX_CHARACTERISTIC_UUID,
};
use crate::controller::report::ButtonTracker;
use crate::controller::types::{ControllerAddress, DeviceId};
use btleplug::api::{Central, Manager as _, Peripheral as _};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::StreamExt;
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Runtime;

/// Bluetooth settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BluetoothSettings {
    /// Treat every connected peripheral as a controller
    #[serde(default)]
    pub match_all_connected: bool,

    /// Local name prefixes that identify a controller
    #[serde(default = "default_name_prefixes")]
    pub name_prefixes: Vec<String>,

    /// How often the activity watcher looks for newly connected controllers
    #[serde(default = "default_watch_interval_secs")]
    pub watch_interval_secs: u64,

    /// Controller cache file (relative paths resolve next to the executable)
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
}

impl Default for BluetoothSettings {
    fn default() -> Self {
        Self {
            match_all_connected: false,
            name_prefixes: default_name_prefixes(),
            watch_interval_secs: default_watch_interval_secs(),
            cache_file: default_cache_file(),
        }
    }
}

fn default_name_prefixes() -> Vec<String> {
    DEFAULT_NAME_PREFIXES.iter().map(|p| p.to_string()).collect()
}
fn default_watch_interval_secs() -> u64 { 5 }
fn default_cache_file() -> PathBuf { PathBuf::from(DEFAULT_CACHE_FILENAME) }

/// Whether advertised data or name identify a game controller
pub fn is_controller(
    manufacturer_data: &HashMap<u16, Vec<u8>>,
    local_name: Option<&str>,
    name_prefixes: &[String],
) -> bool {
    if let Some(data) = manufacturer_data.get(&NINTENDO_COMPANY_ID) {
        if data.starts_with(&JOYCON_DATA_PREFIX) {
            return true;
        }
    }

    match local_name {
        Some(name) => name_prefixes.iter().any(|prefix| name.starts_with(prefix.as_str())),
        None => false,
    }
}

/// Shared state between the loop thread and the watcher tasks
struct Shared {
    settings: BluetoothSettings,
    cache_path: PathBuf,
    cache: Mutex<ControllerCache>,
    activity: Arc<AtomicBool>,
}

impl Shared {
    fn cache(&self) -> MutexGuard<'_, ControllerCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// btleplug-backed controller registry, disconnect service and activity source
pub struct BluetoothBackend {
    runtime: Runtime,
    _manager: Manager,
    adapter: Adapter,
    shared: Arc<Shared>,
    watching: AtomicBool,
}

impl BluetoothBackend {
    /// Bring up the runtime and the first Bluetooth adapter
    pub fn connect(settings: BluetoothSettings) -> Result<Self, BackendError> {
        let runtime = Runtime::new()
            .map_err(|e| BackendError::Unavailable(format!("Failed to create tokio runtime: {}", e)))?;

        let (manager, adapter) = runtime.block_on(async {
            let manager = Manager::new().await?;
            let adapters = manager.adapters().await?;
            let adapter = adapters
                .into_iter()
                .next()
                .ok_or_else(|| BackendError::Unavailable("No Bluetooth adapters found".into()))?;
            Ok::<_, BackendError>((manager, adapter))
        })?;

        let cache_path = resolve_cache_path(&settings.cache_file);
        let cache = ControllerCache::load(&cache_path);
        info!("Loaded {} cached controllers", cache.len());

        Ok(Self {
            runtime,
            _manager: manager,
            adapter,
            shared: Arc::new(Shared {
                settings,
                cache_path,
                cache: Mutex::new(cache),
                activity: Arc::new(AtomicBool::new(false)),
            }),
            watching: AtomicBool::new(false),
        })
    }

    /// Input source fed by the activity watcher
    pub fn activity(&self) -> BluetoothActivity {
        BluetoothActivity {
            flag: Arc::clone(&self.shared.activity),
        }
    }

    /// Start the activity watcher. Calling it again is a no-op.
    pub fn start_activity_watch(&self) {
        if self.watching.swap(true, Ordering::SeqCst) {
            return;
        }

        let adapter = self.adapter.clone();
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(watch_controllers(adapter, shared));
    }
}

impl DeviceRegistry for BluetoothBackend {
    fn list_connected(&self) -> Result<Vec<DeviceId>, BackendError> {
        let controllers = self
            .runtime
            .block_on(find_controllers(&self.adapter, &self.shared))?;

        Ok(controllers.into_iter().map(|(_, address)| address).collect())
    }
}

impl DisconnectService for BluetoothBackend {
    fn disconnect(&self, device: &DeviceId) -> Result<(), BackendError> {
        self.runtime.block_on(async {
            let target = btleplug::api::BDAddr::from(*device);

            for peripheral in self.adapter.peripherals().await? {
                if peripheral.address() == target {
                    peripheral.disconnect().await.map_err(|e| BackendError::Disconnect {
                        device: *device,
                        reason: e.to_string(),
                    })?;
                    info!("Disconnected {}", self.shared.cache().describe(device));
                    return Ok(());
                }
            }

            Err(BackendError::DeviceNotFound(*device))
        })
    }
}

/// Input source raised by button presses on connected controllers. Never requests exit.
#[derive(Clone, Debug)]
pub struct BluetoothActivity {
    flag: Arc<AtomicBool>,
}

impl InputSource for BluetoothActivity {
    fn poll_exit_requested(&self) -> bool {
        false
    }

    fn poll_any_input(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}

/// List connected peripherals recognised as controllers, caching new ones
async fn find_controllers(
    adapter: &Adapter,
    shared: &Shared,
) -> Result<Vec<(Peripheral, ControllerAddress)>, BackendError> {
    let mut found = Vec::new();
    let mut cache_changed = false;

    for peripheral in adapter.peripherals().await? {
        let connected = match peripheral.is_connected().await {
            Ok(connected) => connected,
            Err(e) => {
                debug!("Skipping peripheral {}: {}", peripheral.address(), e);
                false
            }
        };
        if !connected {
            continue;
        }

        let address = ControllerAddress::from(peripheral.address());
        let properties = peripheral.properties().await.ok().flatten();
        let name = properties.as_ref().and_then(|p| p.local_name.clone());
        let advertised = properties
            .as_ref()
            .map(|p| is_controller(&p.manufacturer_data, name.as_deref(), &shared.settings.name_prefixes))
            .unwrap_or(false);

        let recognised = {
            let mut cache = shared.cache();
            if advertised {
                cache_changed |= cache.add_controller(address, name.clone());
                true
            } else {
                shared.settings.match_all_connected || cache.contains(&address)
            }
        };

        if recognised {
            trace!("Connected controller: {} ({})", address, name.as_deref().unwrap_or("unnamed"));
            found.push((peripheral, address));
        }
    }

    if cache_changed {
        if let Err(e) = shared.cache().save(&shared.cache_path) {
            warn!("Failed to save controller cache: {}", e);
        }
    }

    Ok(found)
}

/// Periodically attach report watchers to newly connected controllers
async fn watch_controllers(adapter: Adapter, shared: Arc<Shared>) {
    let interval = Duration::from_secs(shared.settings.watch_interval_secs.max(1));
    let watched: Arc<Mutex<HashSet<ControllerAddress>>> = Arc::new(Mutex::new(HashSet::new()));

    info!("Controller activity watcher started, checking every {:?}", interval);

    loop {
        match find_controllers(&adapter, &shared).await {
            Ok(controllers) => {
                for (peripheral, address) in controllers {
                    let is_new = watched
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .insert(address);
                    if is_new {
                        tokio::spawn(watch_reports(
                            peripheral,
                            address,
                            Arc::clone(&shared.activity),
                            Arc::clone(&watched),
                        ));
                    }
                }
            }
            Err(e) => warn!("Failed to list controllers for activity watch: {}", e),
        }

        tokio::time::sleep(interval).await;
    }
}

/// Watch one controller until its report stream ends
async fn watch_reports(
    peripheral: Peripheral,
    address: ControllerAddress,
    activity: Arc<AtomicBool>,
    watched: Arc<Mutex<HashSet<ControllerAddress>>>,
) {
    match stream_button_presses(&peripheral, address, &activity).await {
        Ok(true) => debug!("Input reports from {} ended", address),
        // No input report characteristic: stay in the watched set so discovery is not repeated
        Ok(false) => return,
        Err(e) => debug!("Stopped watching {}: {}", address, e),
    }

    watched
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .remove(&address);
}

/// Returns false if the controller exposes no input report characteristic
async fn stream_button_presses(
    peripheral: &Peripheral,
    address: ControllerAddress,
    activity: &AtomicBool,
) -> Result<bool, BackendError> {
    peripheral.discover_services().await?;

    let Some(tx_char) = peripheral
        .characteristics()
        .into_iter()
        .find(|c| c.uuid == TX_CHARACTERISTIC_UUID)
    else {
        debug!("{} has no input report characteristic, not watching", address);
        return Ok(false);
    };

    peripheral.subscribe(&tx_char).await?;
    let mut notifications = peripheral.notifications().await?;
    let mut tracker = ButtonTracker::new();

    debug!("Watching input reports from {}", address);

    while let Some(notification) = notifications.next().await {
        if notification.uuid != TX_CHARACTERISTIC_UUID {
            continue;
        }
        if tracker.update(&notification.value) {
            trace!("Button press on {}", address);
            activity.store(true, Ordering::SeqCst);
        }
    }

    Ok(true)
}
