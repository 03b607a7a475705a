//! Controller address cache
//!
//! Keeps a small JSON file of controllers recognised on earlier runs. Once a
//! controller is connected it often stops advertising manufacturer data, so
//! its address is the only reliable way to recognise it again.

use crate::controller::types::ControllerAddress;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default cache file name
pub const DEFAULT_CACHE_FILENAME: &str = "controller_cache.json";

/// Resolve a cache path: relative paths live next to the executable, or in the
/// current directory if that cannot be determined
pub fn resolve_cache_path(file: &Path) -> PathBuf {
    if file.is_absolute() {
        return file.to_path_buf();
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(file);
        }
    }

    file.to_path_buf()
}

/// Cached controller information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedController {
    pub address: ControllerAddress,

    /// Optional friendly name
    #[serde(default)]
    pub name: Option<String>,
}

/// Controller cache storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerCache {
    /// Map of address string -> controller info
    pub controllers: HashMap<String, CachedController>,
}

impl ControllerCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            controllers: HashMap::new(),
        }
    }

    /// Load cache from disk. A missing or unreadable file yields an empty cache.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(cache) => {
                    debug!("Loaded controller cache from: {}", path.display());
                    cache
                }
                Err(e) => {
                    warn!("Failed to parse cache file {}: {}", path.display(), e);
                    Self::new()
                }
            },
            Err(_) => {
                debug!("No existing cache file found at: {}", path.display());
                Self::new()
            }
        }
    }

    /// Save cache to disk
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;

        debug!("Saved controller cache to: {}", path.display());
        Ok(())
    }

    /// Add or refresh a controller. Returns true if it was not cached before.
    pub fn add_controller(&mut self, address: ControllerAddress, name: Option<String>) -> bool {
        let key = address.to_string();
        let is_new = !self.controllers.contains_key(&key);
        if is_new {
            info!("Caching controller: {} ({})", key, name.as_deref().unwrap_or("unnamed"));
        }

        let name = name.or_else(|| self.controllers.get(&key).and_then(|c| c.name.clone()));
        self.controllers.insert(
            key,
            CachedController { address, name },
        );

        is_new
    }

    /// Get a controller from the cache by address
    pub fn get_controller(&self, address: &ControllerAddress) -> Option<&CachedController> {
        self.controllers.get(&address.to_string())
    }

    pub fn contains(&self, address: &ControllerAddress) -> bool {
        self.controllers.contains_key(&address.to_string())
    }

    /// Address with the cached friendly name, when there is one
    pub fn describe(&self, address: &ControllerAddress) -> String {
        match self.get_controller(address).and_then(|c| c.name.as_deref()) {
            Some(name) => format!("{} ({})", address, name),
            None => address.to_string(),
        }
    }

    /// Get the number of cached controllers
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
