//! The idle disconnect loop
//!
//! One thread, one fixed-interval sleep per tick. Each tick polls input, reads
//! the clock, advances the idle state and, when it says so, sweeps every
//! connected controller off the air. Per-tick failures are reported through
//! diagnostics and never stop the loop.

use crate::backend::{BackendError, Clock, DeviceRegistry, Diagnostics, DisconnectService, InputSource};
use crate::saver::config::{LoopSettings, Mode};
use crate::saver::state::{IdleDecision, IdleState};
use log::{debug, info, trace};
use std::thread;
use std::time::Duration;

/// Everything the loop talks to
pub struct Collaborators<I, C, R, D, G> {
    pub input: I,
    pub clock: C,
    pub registry: R,
    pub disconnector: D,
    pub diagnostics: G,
}

/// Whether the loop keeps going after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Exit,
}

/// Result of one disconnect sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    pub attempted: usize,
    pub failed: usize,
}

pub struct IdleDisconnectLoop<I, C, R, D, G> {
    settings: LoopSettings,
    parts: Collaborators<I, C, R, D, G>,
    state: IdleState,
    /// Input seen on a tick whose clock read failed
    pending_input: bool,
    /// Last whole-second idle value reported to diagnostics
    last_reported_secs: Option<u64>,
    sweeps: usize,
}

impl<I, C, R, D, G> IdleDisconnectLoop<I, C, R, D, G>
where
    I: InputSource,
    C: Clock,
    R: DeviceRegistry,
    D: DisconnectService,
    G: Diagnostics,
{
    /// Read the start time and build the initial state.
    ///
    /// A failing clock here is fatal: without a start time there is nothing
    /// to measure idleness against.
    pub fn new(settings: LoopSettings, parts: Collaborators<I, C, R, D, G>) -> Result<Self, BackendError> {
        let start = parts.clock.now()?;
        let state = IdleState::new(
            start,
            settings.threshold,
            settings.require_initial_input,
            settings.rearm_policy,
        );

        debug!(
            "Idle loop ready: threshold {:?}, tick {:?}, armed {}",
            settings.threshold,
            settings.tick_interval,
            state.is_armed()
        );

        Ok(Self {
            settings,
            parts,
            state,
            pending_input: false,
            last_reported_secs: None,
            sweeps: 0,
        })
    }

    /// Tick until the input source requests exit
    pub fn run_forever(&mut self) {
        info!("Watching for controller input (idle timeout {:?})", self.settings.threshold);

        loop {
            thread::sleep(self.settings.tick_interval);

            if self.tick() == TickOutcome::Exit {
                break;
            }
        }

        info!("Idle loop stopped after {} sweep(s)", self.sweeps);
    }

    /// One poll cycle, without the sleep
    pub fn tick(&mut self) -> TickOutcome {
        if self.parts.input.poll_exit_requested() {
            debug!("Exit requested");
            return TickOutcome::Exit;
        }

        if self.parts.input.poll_any_input() {
            trace!("Input detected");
            self.pending_input = true;
        }

        let now = match self.parts.clock.now() {
            Ok(now) => now,
            Err(e) => {
                self.parts
                    .diagnostics
                    .error_line(&format!("Failed to read clock: {}", e));
                return TickOutcome::Continue;
            }
        };

        let input = std::mem::take(&mut self.pending_input);
        if input {
            self.last_reported_secs = None;
        }

        match self.state.observe(input, now) {
            IdleDecision::Waiting { idle } => self.report_idle(idle),
            IdleDecision::Disarmed { .. } => {}
            IdleDecision::Disconnect { idle } => {
                debug!("No input for {}s, sweeping", idle.as_secs());

                match self.sweep() {
                    Ok(report) => {
                        self.state.complete_sweep(now);
                        self.sweeps += 1;
                        self.last_reported_secs = None;
                        debug!(
                            "Sweep {} done: {} attempted, {} failed, armed {}",
                            self.sweeps,
                            report.attempted,
                            report.failed,
                            self.state.is_armed()
                        );
                    }
                    Err(e) => {
                        // Still armed: the sweep is attempted again next tick
                        self.parts
                            .diagnostics
                            .error_line(&format!("Failed to list connected controllers: {}", e));
                    }
                }
            }
        }

        TickOutcome::Continue
    }

    /// Disconnect every connected controller, one attempt each
    fn sweep(&self) -> Result<SweepReport, BackendError> {
        let devices = self.parts.registry.list_connected()?;
        let diagnostics = &self.parts.diagnostics;
        let mut report = SweepReport::default();

        debug!("Connected controllers: {}", devices.len());
        diagnostics.log_line(match self.settings.mode {
            Mode::Interactive => "Disconnecting ALL controllers:",
            Mode::Service => "Timer met",
        });

        for device in &devices {
            report.attempted += 1;
            diagnostics.log_line(&format!("Disconnecting {}", device));

            if let Err(e) = self.parts.disconnector.disconnect(device) {
                report.failed += 1;
                diagnostics.error_line(&format!("Failed to disconnect {}: {}", device, e));
            }
        }

        diagnostics.log_line(match self.settings.mode {
            Mode::Interactive => "Done.",
            Mode::Service => "All disconnected.",
        });
        Ok(report)
    }

    /// Status line whenever the whole-second idle time changes
    fn report_idle(&mut self, idle: Duration) {
        if !self.settings.report_idle_time {
            return;
        }

        let secs = idle.as_secs();
        if self.last_reported_secs != Some(secs) {
            self.last_reported_secs = Some(secs);
            self.parts
                .diagnostics
                .log_line(&format!("Time since last input: {}s", secs));
        }
    }

    pub fn state(&self) -> &IdleState {
        &self.state
    }

    /// Completed sweeps so far
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    pub fn into_collaborators(self) -> Collaborators<I, C, R, D, G> {
        self.parts
    }
}

/// Build the loop and run it until exit is requested.
///
/// Fails only if the start time cannot be read.
pub fn run_forever<I, C, R, D, G>(
    settings: LoopSettings,
    collaborators: Collaborators<I, C, R, D, G>,
) -> Result<Collaborators<I, C, R, D, G>, BackendError>
where
    I: InputSource,
    C: Clock,
    R: DeviceRegistry,
    D: DisconnectService,
    G: Diagnostics,
{
    let mut idle_loop = IdleDisconnectLoop::new(settings, collaborators)?;
    idle_loop.run_forever();
    Ok(idle_loop.into_collaborators())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockClock, MockDevices, MockInput, RecordingDiagnostics};
    use crate::saver::config::RearmPolicy;

    type TestLoop = IdleDisconnectLoop<MockInput, MockClock, MockDevices, MockDevices, RecordingDiagnostics>;

    fn settings() -> LoopSettings {
        LoopSettings {
            mode: Mode::Service,
            threshold: Duration::from_secs(30),
            tick_interval: Duration::ZERO,
            require_initial_input: false,
            rearm_policy: RearmPolicy::UntilInput,
            report_idle_time: false,
        }
    }

    fn build(settings: LoopSettings, devices: &MockDevices) -> (TestLoop, MockInput, MockClock, RecordingDiagnostics) {
        let input = MockInput::new();
        let clock = MockClock::new();
        let diagnostics = RecordingDiagnostics::new();
        let idle_loop = IdleDisconnectLoop::new(
            settings,
            Collaborators {
                input: input.clone(),
                clock: clock.clone(),
                registry: devices.clone(),
                disconnector: devices.clone(),
                diagnostics: diagnostics.clone(),
            },
        )
        .unwrap();
        (idle_loop, input, clock, diagnostics)
    }

    #[test]
    fn test_failing_start_clock_is_fatal() {
        let clock = MockClock::new();
        clock.set_failing(true);
        let devices = MockDevices::new();

        let result = IdleDisconnectLoop::new(
            settings(),
            Collaborators {
                input: MockInput::new(),
                clock,
                registry: devices.clone(),
                disconnector: devices,
                diagnostics: RecordingDiagnostics::new(),
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_clock_failure_keeps_pending_input() {
        let devices = MockDevices::with_controllers(1);
        let (mut idle_loop, input, clock, diagnostics) = build(settings(), &devices);

        clock.advance_secs(25);
        input.press();
        clock.set_failing(true);
        assert_eq!(idle_loop.tick(), TickOutcome::Continue);
        assert!(!diagnostics.errors().is_empty());

        // The press is applied on the next readable tick
        clock.set_failing(false);
        clock.advance_secs(10);
        idle_loop.tick();
        assert_eq!(idle_loop.state().last_input(), crate::backend::Timestamp::from_secs(35));
        assert!(devices.disconnect_calls().is_empty());
    }

    #[test]
    fn test_idle_time_reported_once_per_second() {
        let mut s = settings();
        s.report_idle_time = true;
        let devices = MockDevices::new();
        let (mut idle_loop, _input, clock, diagnostics) = build(s, &devices);

        idle_loop.tick();
        clock.advance(Duration::from_millis(400));
        idle_loop.tick();
        clock.advance(Duration::from_millis(700));
        idle_loop.tick();

        let reports: Vec<_> = diagnostics
            .lines()
            .into_iter()
            .filter(|l| l.starts_with("Time since last input"))
            .collect();
        assert_eq!(reports, vec!["Time since last input: 0s", "Time since last input: 1s"]);
    }

    #[test]
    fn test_service_sweep_lines() {
        let devices = MockDevices::with_controllers(2);
        let (mut idle_loop, _input, clock, diagnostics) = build(settings(), &devices);

        clock.advance_secs(31);
        idle_loop.tick();

        assert_eq!(
            diagnostics.lines(),
            vec![
                "Timer met",
                "Disconnecting 00:00:00:00:00:01",
                "Disconnecting 00:00:00:00:00:02",
                "All disconnected.",
            ]
        );
    }
}
