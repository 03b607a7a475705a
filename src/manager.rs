//! Controller saver bring-up
//!
//! Builds the platform collaborators for the configured mode, hands them to
//! the idle loop and runs it. Anything that fails before the loop starts is
//! fatal; once the loop runs, failures are only reported.

use crate::backend::{
    BackendError, BluetoothBackend, CombinedInput, ConsoleDiagnostics, ConsoleInput, LogDiagnostics,
    SystemClock,
};
use crate::saver::config::{Config, Mode};
use crate::saver::idle_loop::{run_forever, Collaborators};
use log::info;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("Failed to start Bluetooth: {0}")]
    Bluetooth(#[source] BackendError),

    #[error("Failed to start console input: {0}")]
    Console(#[from] std::io::Error),

    #[error("Failed to read start time: {0}")]
    Clock(#[source] BackendError),
}

/// Runs the idle disconnect loop for one mode
pub struct ControllerSaver {
    config: Config,
}

impl ControllerSaver {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Start the platform backends and run until exit.
    ///
    /// Returns only in interactive mode (exit requested) or on a fatal
    /// startup failure.
    pub fn run(&self) -> Result<(), InitError> {
        info!("Starting controller saver in {:?} mode", self.config.mode);

        let bluetooth = Arc::new(
            BluetoothBackend::connect(self.config.bluetooth.clone()).map_err(InitError::Bluetooth)?,
        );
        bluetooth.start_activity_watch();

        match self.config.mode {
            Mode::Interactive => self.run_interactive(bluetooth),
            Mode::Service => self.run_service(bluetooth),
        }
    }

    fn run_interactive(&self, bluetooth: Arc<BluetoothBackend>) -> Result<(), InitError> {
        let settings = self.config.loop_settings();
        let console = ConsoleInput::spawn()?;

        println!("ControllerSaver - Disconnect Controllers");
        println!();
        println!("Controllers are disconnected after {}s without input.", settings.threshold.as_secs());
        println!("Press Enter to count as input.");
        println!("Type + and press Enter to exit.");
        println!();

        let collaborators = Collaborators {
            input: CombinedInput::new().with(console).with(bluetooth.activity()),
            clock: SystemClock::new(),
            registry: Arc::clone(&bluetooth),
            disconnector: bluetooth,
            diagnostics: ConsoleDiagnostics,
        };

        run_forever(settings, collaborators).map_err(InitError::Clock)?;

        println!("Exiting.");
        Ok(())
    }

    fn run_service(&self, bluetooth: Arc<BluetoothBackend>) -> Result<(), InitError> {
        info!("Starting service");

        let collaborators = Collaborators {
            input: bluetooth.activity(),
            clock: SystemClock::new(),
            registry: Arc::clone(&bluetooth),
            disconnector: bluetooth,
            diagnostics: LogDiagnostics,
        };

        // The service input never requests exit, so this only returns on a startup failure
        run_forever(self.config.loop_settings(), collaborators).map_err(InitError::Clock)?;
        Ok(())
    }
}
