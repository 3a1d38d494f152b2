use core::time::Duration;

use glam::Vec3;
use treadmill_core::device::DeviceProxy;
use treadmill_core::estop::EstopPhase;
use treadmill_core::rig::{ControlRig, TickInputs};
use treadmill_core::surface::handle::DEFAULT_PULL_DISTANCE;
use treadmill_core::telemetry::ControlEventKind;

const DT: Duration = Duration::from_millis(100);

#[derive(Default)]
struct RecordingProxy {
    paused: bool,
    pause_calls: Vec<bool>,
    speed_calls: Vec<f32>,
}

impl DeviceProxy for RecordingProxy {
    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        self.pause_calls.push(paused);
    }

    fn set_speed(&mut self, fraction: f32) {
        self.speed_calls.push(fraction);
    }
}

fn full_pull() -> TickInputs {
    TickInputs {
        handle_offset: Some(Vec3::NEG_Y * DEFAULT_PULL_DISTANCE),
        lever_direction: None,
    }
}

#[test]
fn prime_pushes_the_default_speed_once() {
    let mut proxy = RecordingProxy::default();
    let mut rig = ControlRig::default();

    rig.prime(&mut proxy);
    assert_eq!(proxy.speed_calls.len(), 1);
    assert!((proxy.speed_calls[0] - 0.5).abs() < 1e-6);
}

#[test]
fn prime_respects_an_already_paused_device() {
    let mut proxy = RecordingProxy {
        paused: true,
        ..RecordingProxy::default()
    };
    let mut rig = ControlRig::default();

    rig.prime(&mut proxy);
    assert!(proxy.speed_calls.is_empty());
}

#[test]
fn full_pull_fires_and_pauses_within_the_same_tick() {
    let mut proxy = RecordingProxy::default();
    let mut rig = ControlRig::default();
    rig.grab_handle();

    let report = rig.tick(DT, full_pull(), &mut proxy);

    assert!(report.activation_fired);
    assert_eq!(report.estop_phase, EstopPhase::Stopping);
    // The pause lands before the lever's push phase, so no speed call
    // slips through on the triggering tick.
    assert_eq!(report.speed_pushed, None);
    assert!(proxy.is_paused());
    assert!(proxy.speed_calls.is_empty());
}

#[test]
fn paused_device_never_sees_speed_pushes() {
    let mut proxy = RecordingProxy::default();
    let mut rig = ControlRig::default();
    rig.grab_handle();
    rig.tick(DT, full_pull(), &mut proxy);
    assert!(proxy.is_paused());

    for _ in 0..20 {
        let report = rig.tick(DT, TickInputs::default(), &mut proxy);
        assert_eq!(report.speed_pushed, None);
    }
    assert!(proxy.speed_calls.is_empty());
}

#[test]
fn stop_windows_exclude_the_triggering_tick() {
    let mut proxy = RecordingProxy::default();
    let mut rig = ControlRig::default();
    rig.grab_handle();
    rig.tick(Duration::from_secs(1), full_pull(), &mut proxy);

    // The sequence starts counting on the tick after the trigger, so 2.9 s
    // of the 3 s window leaves it still stopping.
    let report = rig.tick(Duration::from_millis(2_900), TickInputs::default(), &mut proxy);
    assert_eq!(report.estop_phase, EstopPhase::Stopping);

    let report = rig.tick(Duration::from_millis(100), TickInputs::default(), &mut proxy);
    assert_eq!(report.estop_phase, EstopPhase::CoolingDown);

    let report = rig.tick(Duration::from_secs(1), TickInputs::default(), &mut proxy);
    assert_eq!(report.estop_phase, EstopPhase::Idle);
    assert_eq!(proxy.pause_calls, vec![true, false]);
}

#[test]
fn speed_pushes_resume_after_the_sequence_clears() {
    let mut proxy = RecordingProxy::default();
    let mut rig = ControlRig::default();
    rig.grab_handle();
    rig.tick(DT, full_pull(), &mut proxy);
    rig.release_handle();

    // Walk past the full 4 s cycle.
    for _ in 0..42 {
        rig.tick(DT, TickInputs::default(), &mut proxy);
    }

    assert!(!proxy.is_paused());
    assert!(
        !proxy.speed_calls.is_empty(),
        "lever pushes never resumed after the sequence cleared"
    );
}

#[test]
fn handle_stays_frozen_while_the_sequence_runs() {
    let mut proxy = RecordingProxy::default();
    let mut rig = ControlRig::default();
    rig.grab_handle();
    rig.tick(DT, full_pull(), &mut proxy);
    rig.release_handle();

    let held_pull = rig.handle().current_pull();
    for _ in 0..5 {
        rig.tick(DT, TickInputs::default(), &mut proxy);
    }
    assert!(rig.sequencer().is_active());
    assert!((rig.handle().current_pull() - held_pull).abs() < f32::EPSILON);
}

#[test]
fn retrigger_during_sequence_does_not_restart_it() {
    let mut proxy = RecordingProxy::default();
    let mut rig = ControlRig::default();
    rig.grab_handle();
    rig.tick(DT, full_pull(), &mut proxy);

    // Yank the handle again mid-sequence: the frozen handle cannot fire,
    // and the pause is applied exactly once.
    rig.release_handle();
    rig.grab_handle();
    for _ in 0..5 {
        let report = rig.tick(DT, full_pull(), &mut proxy);
        assert!(!report.activation_fired);
    }
    assert_eq!(proxy.pause_calls, vec![true]);
}

#[test]
fn lever_drives_speed_every_running_tick() {
    let mut proxy = RecordingProxy::default();
    let mut rig = ControlRig::default();
    rig.grab_lever();

    let radians = 45.0_f32.to_radians();
    let inputs = TickInputs {
        handle_offset: None,
        lever_direction: Some(Vec3::new(0.0, radians.cos(), radians.sin())),
    };

    for _ in 0..3 {
        let report = rig.tick(DT, inputs, &mut proxy);
        let pushed = report.speed_pushed.expect("push expected while running");
        assert!((pushed - 1.0).abs() < 1e-3);
    }
    assert_eq!(proxy.speed_calls.len(), 3);
}

#[test]
fn telemetry_captures_the_sequence_in_order() {
    let mut proxy = RecordingProxy::default();
    let mut rig = ControlRig::default();

    rig.grab_handle();
    rig.tick(DT, full_pull(), &mut proxy);
    rig.release_handle();
    for _ in 0..42 {
        rig.tick(DT, TickInputs::default(), &mut proxy);
    }

    let kinds: Vec<ControlEventKind> = rig
        .events()
        .oldest_first()
        .map(|record| record.kind)
        .filter(|kind| {
            matches!(
                kind,
                ControlEventKind::HandleGrabbed
                    | ControlEventKind::HandleActivated
                    | ControlEventKind::StopEngaged
                    | ControlEventKind::CooldownStarted
                    | ControlEventKind::StopCleared
            )
        })
        .collect();

    assert_eq!(
        kinds,
        vec![
            ControlEventKind::HandleGrabbed,
            ControlEventKind::HandleActivated,
            ControlEventKind::StopEngaged,
            ControlEventKind::CooldownStarted,
            ControlEventKind::StopCleared,
        ]
    );

    // Identifiers are monotonic in recording order.
    let mut previous = None;
    for record in rig.events().oldest_first() {
        if let Some(previous) = previous {
            assert!(record.id > previous);
        }
        previous = Some(record.id);
    }
}

#[test]
fn programmatic_speed_override_reaches_the_device() {
    let mut proxy = RecordingProxy::default();
    let mut rig = ControlRig::default();

    // Hold the lever so auto-return cannot disturb the override mid-tick.
    rig.grab_lever();
    rig.lever_mut().set_speed_fraction(0.25);
    let report = rig.tick(DT, TickInputs::default(), &mut proxy);
    let pushed = report.speed_pushed.expect("push expected while running");
    assert!((pushed - 0.25).abs() < 1e-3);
}
