//! Idle detection and controller disconnect
//!
//! - `config`: TOML configuration and mode-dependent defaults
//! - `state`: the idle state machine
//! - `idle_loop`: the polling loop driving it against the platform backends

pub mod config;
pub mod state;
pub mod idle_loop;

pub use config::{Config, ConfigError, LoopSettings, Mode, RearmPolicy};
pub use idle_loop::{run_forever, Collaborators, IdleDisconnectLoop, SweepReport, TickOutcome};
pub use state::{IdleDecision, IdleState};
