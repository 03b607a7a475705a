//! Idle loop behaviour against mock backends: timing, single fire, failures, exit

use controller_saver::backend::{MockClock, MockDevices, MockInput, RecordingDiagnostics};
use controller_saver::saver::{
    run_forever, Collaborators, IdleDisconnectLoop, LoopSettings, Mode, RearmPolicy, TickOutcome,
};
use std::time::Duration;

type TestLoop = IdleDisconnectLoop<MockInput, MockClock, MockDevices, MockDevices, RecordingDiagnostics>;

struct Harness {
    idle_loop: TestLoop,
    input: MockInput,
    clock: MockClock,
    devices: MockDevices,
    diagnostics: RecordingDiagnostics,
}

impl Harness {
    fn new(settings: LoopSettings, devices: MockDevices) -> Self {
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

        Self {
            idle_loop,
            input,
            clock,
            devices,
            diagnostics,
        }
    }

    /// Tick once per second up to and including `until_secs`
    fn run_until(&mut self, until_secs: u64) {
        let mut now = self.clock_secs();
        while now < until_secs {
            self.clock.advance_secs(1);
            now += 1;
            assert_eq!(self.idle_loop.tick(), TickOutcome::Continue);
        }
    }

    fn clock_secs(&self) -> u64 {
        use controller_saver::Clock;
        self.clock.now().unwrap().since_origin().as_secs()
    }

    fn disconnects(&self) -> usize {
        self.devices.disconnect_calls().len()
    }
}

fn settings(threshold_secs: u64) -> LoopSettings {
    LoopSettings {
        mode: Mode::Service,
        threshold: Duration::from_secs(threshold_secs),
        tick_interval: Duration::ZERO,
        require_initial_input: false,
        rearm_policy: RearmPolicy::UntilInput,
        report_idle_time: false,
    }
}

#[test]
fn scenario_a_single_sweep_after_threshold() {
    let mut h = Harness::new(settings(30), MockDevices::with_controllers(2));

    h.run_until(29);
    assert_eq!(h.disconnects(), 0);

    // Exactly at the threshold: still nothing
    h.run_until(30);
    assert_eq!(h.disconnects(), 0);

    h.run_until(31);
    assert_eq!(
        h.devices.disconnect_calls(),
        vec![MockDevices::address(1), MockDevices::address(2)]
    );
    assert_eq!(h.idle_loop.sweeps(), 1);
}

#[test]
fn scenario_b_input_restarts_idle_stretch() {
    let mut h = Harness::new(settings(30), MockDevices::with_controllers(1));

    h.run_until(19);
    h.input.press();
    h.run_until(20);
    assert_eq!(h.idle_loop.state().last_input().since_origin(), Duration::from_secs(20));

    h.run_until(50);
    assert_eq!(h.disconnects(), 0);

    h.run_until(51);
    assert_eq!(h.disconnects(), 1);
}

#[test]
fn scenario_c_failure_does_not_stop_the_sweep() {
    let devices = MockDevices::with_controllers(3);
    devices.fail_disconnect(MockDevices::address(2));
    let mut h = Harness::new(settings(30), devices);

    h.run_until(31);

    assert_eq!(
        h.devices.disconnect_calls(),
        vec![MockDevices::address(1), MockDevices::address(2), MockDevices::address(3)]
    );
    assert_eq!(h.diagnostics.errors().len(), 1);
    assert!(h.diagnostics.errors()[0].contains("00:00:00:00:00:02"));

    // Loop keeps ticking afterwards
    h.run_until(40);
    assert_eq!(h.disconnects(), 3);
}

#[test]
fn scenario_d_exit_before_threshold() {
    let devices = MockDevices::with_controllers(2);
    let mut h = Harness::new(settings(30), devices);

    h.run_until(29);
    h.input.request_exit();
    h.clock.advance_secs(5);

    assert_eq!(h.idle_loop.tick(), TickOutcome::Exit);
    assert_eq!(h.disconnects(), 0);
    assert_eq!(h.devices.list_calls(), 0);
}

#[test]
fn single_fire_per_idle_stretch() {
    let mut h = Harness::new(settings(30), MockDevices::with_controllers(1));

    h.run_until(31);
    assert_eq!(h.idle_loop.sweeps(), 1);

    // Reconnect the controller; no input, so no second sweep however long we wait
    h.devices.connect(MockDevices::address(1));
    h.run_until(200);
    assert_eq!(h.idle_loop.sweeps(), 1);
    assert_eq!(h.disconnects(), 1);
    assert!(!h.idle_loop.state().is_armed());

    // Input re-arms; next stretch fires once more
    h.input.press();
    h.run_until(201);
    h.run_until(232);
    assert_eq!(h.idle_loop.sweeps(), 2);
    assert_eq!(h.disconnects(), 2);
}

#[test]
fn empty_sweep_is_a_no_op() {
    let mut h = Harness::new(settings(30), MockDevices::new());

    h.run_until(31);

    assert_eq!(h.disconnects(), 0);
    assert_eq!(h.devices.list_calls(), 1);
    assert!(h.diagnostics.errors().is_empty());
    assert_eq!(h.idle_loop.sweeps(), 1);
    assert!(!h.idle_loop.state().is_armed());
}

#[test]
fn enumeration_failure_retries_next_tick() {
    let mut h = Harness::new(settings(30), MockDevices::with_controllers(1));
    h.devices.set_list_failing(true);

    h.run_until(32);
    assert_eq!(h.disconnects(), 0);
    assert!(h.idle_loop.state().is_armed());
    assert_eq!(h.devices.list_calls(), 2);

    h.devices.set_list_failing(false);
    h.run_until(33);
    assert_eq!(h.disconnects(), 1);
    assert!(!h.idle_loop.state().is_armed());
}

#[test]
fn initial_input_required_before_arming() {
    let mut s = settings(30);
    s.require_initial_input = true;
    let mut h = Harness::new(s, MockDevices::with_controllers(1));

    h.run_until(100);
    assert_eq!(h.disconnects(), 0);

    h.input.press();
    h.run_until(101);
    h.run_until(131);
    assert_eq!(h.disconnects(), 0);
    h.run_until(132);
    assert_eq!(h.disconnects(), 1);
}

#[test]
fn every_threshold_policy_sweeps_repeatedly() {
    let mut s = settings(30);
    s.rearm_policy = RearmPolicy::EveryThreshold;
    let mut h = Harness::new(s, MockDevices::with_controllers(1));

    h.run_until(31);
    assert_eq!(h.idle_loop.sweeps(), 1);

    h.run_until(62);
    assert_eq!(h.idle_loop.sweeps(), 2);
    // The controller was already gone for the second sweep
    assert_eq!(h.disconnects(), 1);
}

#[test]
fn run_forever_returns_on_exit() {
    let input = MockInput::new();
    let devices = MockDevices::with_controllers(1);
    input.request_exit();

    let parts = run_forever(
        settings(30),
        Collaborators {
            input: input.clone(),
            clock: MockClock::new(),
            registry: devices.clone(),
            disconnector: devices.clone(),
            diagnostics: RecordingDiagnostics::new(),
        },
    )
    .unwrap();

    // Exit is honoured before input is even polled
    assert_eq!(parts.input.input_polls(), 0);
    assert!(devices.disconnect_calls().is_empty());
}

#[test]
fn interactive_status_lines() {
    let mut s = settings(3);
    s.mode = Mode::Interactive;
    s.report_idle_time = true;
    let mut h = Harness::new(s, MockDevices::with_controllers(1));

    h.run_until(4);

    let lines = h.diagnostics.lines();
    assert!(lines.contains(&"Time since last input: 1s".to_string()));
    assert!(lines.contains(&"Time since last input: 3s".to_string()));
    assert_eq!(
        lines[lines.len() - 3..],
        ["Disconnecting ALL controllers:", "Disconnecting 00:00:00:00:00:01", "Done."]
    );
    assert!(!h.diagnostics.contains("Timer met"));
}

#[test]
fn service_status_lines() {
    let mut h = Harness::new(settings(3), MockDevices::with_controllers(1));

    h.run_until(4);

    assert_eq!(
        h.diagnostics.lines(),
        vec!["Timer met", "Disconnecting 00:00:00:00:00:01", "All disconnected."]
    );
}
