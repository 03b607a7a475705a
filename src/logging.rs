//! Logger initialisation.
//!
//! Log output goes to stderr, or is appended to the configured log file (the
//! service has no console to write to).

use crate::saver::config::LoggingSettings;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};

/// Initialise env_logger. `RUST_LOG` overrides `level` unless logging is disabled.
pub fn init(level: &str, settings: &LoggingSettings) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));

    if !settings.enabled {
        builder.filter_level(log::LevelFilter::Off);
    } else if let Some(path) = &settings.file {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init().context("Logger already initialised")?;
    Ok(())
}
