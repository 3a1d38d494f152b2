use core::time::Duration;

use treadmill_core::device::{DeviceProxy, NoopDeviceProxy};
use treadmill_core::estop::{EstopPhase, EstopSequencer, EstopTimings, VisualState};

/// Proxy that records every call for later inspection.
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

fn timings() -> EstopTimings {
    EstopTimings::new(Duration::from_secs(3), Duration::from_secs(1))
}

#[test]
fn engage_pauses_device_and_enters_stopping() {
    let mut proxy = RecordingProxy::default();
    let mut sequencer = EstopSequencer::new(timings());

    assert!(sequencer.engage(&mut proxy));
    assert_eq!(sequencer.phase(), EstopPhase::Stopping);
    assert!(proxy.is_paused());
    assert_eq!(proxy.pause_calls, vec![true]);
}

#[test]
fn sequence_walks_stopping_then_cooldown_then_idle() {
    let mut proxy = RecordingProxy::default();
    let mut sequencer = EstopSequencer::new(timings());
    sequencer.engage(&mut proxy);

    let report = sequencer.tick(Duration::from_secs(3), &mut proxy);
    assert!(report.entered_cooldown);
    assert!(!report.cleared);
    assert_eq!(sequencer.phase(), EstopPhase::CoolingDown);
    assert!(proxy.is_paused());

    let report = sequencer.tick(Duration::from_secs(1), &mut proxy);
    assert!(report.cleared);
    assert_eq!(sequencer.phase(), EstopPhase::Idle);
    assert!(!proxy.is_paused());
    assert_eq!(proxy.pause_calls, vec![true, false]);
}

#[test]
fn device_reads_paused_at_every_intermediate_tick() {
    let mut proxy = RecordingProxy::default();
    let mut sequencer = EstopSequencer::new(timings());
    sequencer.engage(&mut proxy);

    // Seven 500 ms ticks land just short of the full 4 s cycle.
    for _ in 0..7 {
        sequencer.tick(Duration::from_millis(500), &mut proxy);
        assert!(sequencer.is_active());
        assert!(proxy.is_paused());
    }

    sequencer.tick(Duration::from_millis(500), &mut proxy);
    assert!(!sequencer.is_active());
    assert!(!proxy.is_paused());
}

#[test]
fn retrigger_while_active_is_a_no_op() {
    let mut proxy = RecordingProxy::default();
    let mut sequencer = EstopSequencer::new(timings());

    assert!(sequencer.engage(&mut proxy));
    sequencer.tick(Duration::from_secs(1), &mut proxy);

    // A second activation must neither pause again nor reset the window.
    assert!(!sequencer.engage(&mut proxy));
    assert_eq!(proxy.pause_calls, vec![true]);

    let report = sequencer.tick(Duration::from_secs(2), &mut proxy);
    assert!(
        report.entered_cooldown,
        "stop window was reset by the retrigger"
    );
}

#[test]
fn oversized_step_traverses_both_phases_once() {
    let mut proxy = RecordingProxy::default();
    let mut sequencer = EstopSequencer::new(timings());
    sequencer.engage(&mut proxy);

    let report = sequencer.tick(Duration::from_secs(10), &mut proxy);
    assert!(report.entered_cooldown);
    assert!(report.cleared);
    assert_eq!(sequencer.phase(), EstopPhase::Idle);
    assert_eq!(proxy.pause_calls, vec![true, false]);
}

#[test]
fn remainder_carries_into_the_cooldown_window() {
    let mut proxy = RecordingProxy::default();
    let mut sequencer = EstopSequencer::new(timings());
    sequencer.engage(&mut proxy);

    // 3.5 s leaves 0.5 s already spent in the cooldown.
    sequencer.tick(Duration::from_millis(3_500), &mut proxy);
    assert_eq!(sequencer.phase(), EstopPhase::CoolingDown);
    assert_eq!(sequencer.elapsed_in_phase(), Duration::from_millis(500));

    let report = sequencer.tick(Duration::from_millis(500), &mut proxy);
    assert!(report.cleared);
}

#[test]
fn sequence_runs_to_completion_without_a_device() {
    let mut proxy = NoopDeviceProxy::new();
    let mut sequencer = EstopSequencer::new(timings());

    // Degrade gracefully: timers and visual transitions run even when the
    // proxy drops every call on the floor.
    assert!(sequencer.engage(&mut proxy));
    assert_eq!(sequencer.visual_state(), VisualState::Activated);

    let report = sequencer.tick(Duration::from_secs(3), &mut proxy);
    assert!(report.entered_cooldown);
    assert!(matches!(sequencer.visual_state(), VisualState::Blinking(_)));

    let report = sequencer.tick(Duration::from_secs(1), &mut proxy);
    assert!(report.cleared);
    assert_eq!(sequencer.visual_state(), VisualState::Normal);
}

#[test]
fn cooldown_blink_follows_the_triangle_wave() {
    let mut proxy = RecordingProxy::default();
    let mut sequencer = EstopSequencer::new(timings());
    sequencer.engage(&mut proxy);
    sequencer.tick(Duration::from_secs(3), &mut proxy);

    // At 4 cycles per second, 125 ms into the countdown sits halfway up the
    // first ramp.
    sequencer.tick(Duration::from_millis(125), &mut proxy);
    match sequencer.visual_state() {
        VisualState::Blinking(fraction) => {
            assert!(
                (fraction - 0.5).abs() < 1e-4,
                "expected blend 0.5, got {fraction}"
            );
        }
        other => panic!("expected blinking visuals, got {other:?}"),
    }
}

#[test]
fn zero_length_windows_collapse_in_one_tick() {
    let mut proxy = RecordingProxy::default();
    let mut sequencer = EstopSequencer::new(EstopTimings::new(Duration::ZERO, Duration::ZERO));

    assert!(sequencer.engage(&mut proxy));
    let report = sequencer.tick(Duration::from_millis(1), &mut proxy);
    assert!(report.entered_cooldown);
    assert!(report.cleared);
    assert_eq!(proxy.pause_calls, vec![true, false]);
}

#[test]
fn sequencer_is_reusable_after_completion() {
    let mut proxy = RecordingProxy::default();
    let mut sequencer = EstopSequencer::new(timings());

    sequencer.engage(&mut proxy);
    sequencer.tick(Duration::from_secs(4), &mut proxy);
    assert_eq!(sequencer.phase(), EstopPhase::Idle);

    assert!(sequencer.engage(&mut proxy));
    assert_eq!(sequencer.phase(), EstopPhase::Stopping);
    assert_eq!(proxy.pause_calls, vec![true, false, true]);
}
