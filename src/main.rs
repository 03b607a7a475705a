//! Controller Saver - Main Application
//!
//! Disconnects all connected controllers after a period without input.
//! Runs either interactively (status on the console, `+` to exit) or as a
//! background service.

use anyhow::{Context, Result};
use clap::Parser;
use controller_saver::logging;
use controller_saver::saver::{Config, Mode};
use controller_saver::ControllerSaver;
use std::path::{Path, PathBuf};

/// Config file loaded when no --config is given, if present
const DEFAULT_CONFIG_PATH: &str = "configs/default.toml";

/// Disconnect idle game controllers to save their battery.
#[derive(Parser, Debug)]
#[command(name = "controller-saver")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Deployment mode (overrides the config file).
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Idle timeout in seconds (overrides the config file).
    #[arg(long)]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (config, source) = load_config(&args)?;
    logging::init(&args.log_level, &config.logging)?;

    log::info!("controller-saver v{} starting", env!("CARGO_PKG_VERSION"));
    match &source {
        Some(path) => log::info!("Loaded configuration from: {}", path.display()),
        None => log::info!("No config file, using built-in defaults"),
    }
    log::debug!("  - Mode: {:?}", config.mode);
    log::debug!("  - Idle timeout: {:?}", config.threshold());

    ControllerSaver::new(config)
        .run()
        .context("Controller saver failed to start")?;

    Ok(())
}

/// Load the config file (explicit, default path, or built-in defaults) and apply CLI overrides.
///
/// Also returns the file the config came from, so it can be logged once logging is up.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    let source = match &args.config {
        Some(path) => Some(path.clone()),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Some(PathBuf::from(DEFAULT_CONFIG_PATH)),
        None => None,
    };

    let mut config = match &source {
        Some(path) => Config::load(path).context("Failed to load configuration")?,
        None => Config::for_mode(args.mode.unwrap_or_default()),
    };

    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(timeout) = args.timeout {
        config.idle.timeout_secs = Some(timeout);
    }

    config.validate().context("Invalid configuration")?;
    Ok((config, source))
}
