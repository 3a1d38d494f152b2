//! Per-tick driver tying the surfaces, the sequencer, and the device
//! together.
//!
//! One rig instance is the single owner of all mutable control state. Each
//! tick runs the same fixed phase order so no component ever observes a
//! half-updated value: surface updates first, then the sequencer, then the
//! speed push. The device proxy is borrowed per call; the application keeps
//! ownership.

use core::time::Duration;

use glam::Vec3;

use crate::device::DeviceProxy;
use crate::estop::{EstopPhase, EstopSequencer, EstopTimings, VisualState};
use crate::surface::Grabbable;
use crate::surface::handle::{EmergencyHandle, HandleConfig};
use crate::surface::lever::{LeverConfig, SpeedLever};
use crate::telemetry::{ControlEventKind, ControlEventRecorder, EventDetail};

/// Minimum change in pushed speed worth a telemetry record.
const SPEED_RECORD_EPSILON: f32 = 1e-4;

/// Gesture samples captured for the current tick.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TickInputs {
    /// Grab offset of the handle from its rest pose, while held.
    pub handle_offset: Option<Vec3>,
    /// Controller-relative direction for the lever, while held.
    pub lever_direction: Option<Vec3>,
}

/// What one control cycle did.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TickReport {
    /// The handle crossed its activation threshold this tick.
    pub activation_fired: bool,
    /// Sequencer phase after the tick.
    pub estop_phase: EstopPhase,
    /// Visual feedback after the tick.
    pub visual: VisualState,
    /// Speed fraction pushed to the device, unless the pause gate held it
    /// back.
    pub speed_pushed: Option<f32>,
}

/// Owns the control surfaces and the sequencer and advances them in
/// lockstep.
pub struct ControlRig {
    handle: EmergencyHandle,
    lever: SpeedLever,
    estop: EstopSequencer,
    recorder: ControlEventRecorder,
    elapsed: Duration,
    last_pushed_speed: Option<f32>,
}

impl ControlRig {
    /// Assembles a rig from its parts.
    #[must_use]
    pub fn new(handle: EmergencyHandle, lever: SpeedLever, estop: EstopSequencer) -> Self {
        Self {
            handle,
            lever,
            estop,
            recorder: ControlEventRecorder::new(),
            elapsed: Duration::ZERO,
            last_pushed_speed: None,
        }
    }

    /// Pushes the lever's resting speed once at start-up, so the belt runs
    /// at the configured default before any gesture arrives. Skipped while
    /// the device reports paused.
    pub fn prime<P: DeviceProxy>(&mut self, proxy: &mut P) {
        if proxy.is_paused() {
            return;
        }

        let fraction = self.lever.speed_fraction();
        proxy.set_speed(fraction);
        self.last_pushed_speed = Some(fraction);
        self.recorder.record(
            ControlEventKind::SpeedChanged,
            EventDetail::Speed(fraction),
            self.elapsed,
        );
    }

    /// Runs one control cycle.
    pub fn tick<P: DeviceProxy>(
        &mut self,
        dt: Duration,
        inputs: TickInputs,
        proxy: &mut P,
    ) -> TickReport {
        self.elapsed += dt;

        // Surface updates. The handle freezes while a sequence is active.
        let fired = self
            .handle
            .tick(dt, inputs.handle_offset, self.estop.is_active())
            .is_some();
        if fired {
            self.recorder.record(
                ControlEventKind::HandleActivated,
                EventDetail::Pull(self.handle.pull_fraction()),
                self.elapsed,
            );
        }
        self.lever.tick(dt, inputs.lever_direction);

        // Advance any running sequence before engaging a fresh one, so the
        // triggering tick's dt never counts toward the stop window.
        let estop_report = self.estop.tick(dt, proxy);
        if estop_report.entered_cooldown {
            self.recorder.record(
                ControlEventKind::CooldownStarted,
                EventDetail::None,
                self.elapsed,
            );
        }
        if estop_report.cleared {
            self.recorder.record(
                ControlEventKind::StopCleared,
                EventDetail::None,
                self.elapsed,
            );
        }
        if fired && self.estop.engage(proxy) {
            self.recorder.record(
                ControlEventKind::StopEngaged,
                EventDetail::None,
                self.elapsed,
            );
        }

        // Speed push, gated on the pause state the sequencer just wrote.
        let speed_pushed = if proxy.is_paused() {
            None
        } else {
            let fraction = self.lever.speed_fraction();
            proxy.set_speed(fraction);
            let changed = self
                .last_pushed_speed
                .is_none_or(|previous| libm::fabsf(previous - fraction) > SPEED_RECORD_EPSILON);
            if changed {
                self.recorder.record(
                    ControlEventKind::SpeedChanged,
                    EventDetail::Speed(fraction),
                    self.elapsed,
                );
            }
            self.last_pushed_speed = Some(fraction);
            Some(fraction)
        };

        TickReport {
            activation_fired: fired,
            estop_phase: self.estop.phase(),
            visual: self.estop.visual_state(),
            speed_pushed,
        }
    }

    /// Begins a grab on the handle and records it.
    pub fn grab_handle(&mut self) {
        self.handle.on_select_start();
        self.recorder.record(
            ControlEventKind::HandleGrabbed,
            EventDetail::Pull(self.handle.pull_fraction()),
            self.elapsed,
        );
    }

    /// Releases the handle and records it.
    pub fn release_handle(&mut self) {
        self.handle.on_select_end();
        self.recorder.record(
            ControlEventKind::HandleReleased,
            EventDetail::Pull(self.handle.pull_fraction()),
            self.elapsed,
        );
    }

    /// Begins a grab on the lever and records it.
    pub fn grab_lever(&mut self) {
        self.lever.on_select_start();
        self.recorder.record(
            ControlEventKind::LeverGrabbed,
            EventDetail::Angle(self.lever.current_angle()),
            self.elapsed,
        );
    }

    /// Releases the lever and records it.
    pub fn release_lever(&mut self) {
        self.lever.on_select_end();
        self.recorder.record(
            ControlEventKind::LeverReleased,
            EventDetail::Angle(self.lever.current_angle()),
            self.elapsed,
        );
    }

    /// Read access to the handle surface.
    #[must_use]
    pub const fn handle(&self) -> &EmergencyHandle {
        &self.handle
    }

    /// Mutable access to the handle surface.
    pub fn handle_mut(&mut self) -> &mut EmergencyHandle {
        &mut self.handle
    }

    /// Read access to the lever surface.
    #[must_use]
    pub const fn lever(&self) -> &SpeedLever {
        &self.lever
    }

    /// Mutable access to the lever surface.
    pub fn lever_mut(&mut self) -> &mut SpeedLever {
        &mut self.lever
    }

    /// Read access to the sequencer.
    #[must_use]
    pub const fn sequencer(&self) -> &EstopSequencer {
        &self.estop
    }

    /// Read access to the control-event log.
    #[must_use]
    pub const fn events(&self) -> &ControlEventRecorder {
        &self.recorder
    }

    /// Simulated time accumulated across ticks.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl Default for ControlRig {
    fn default() -> Self {
        let handle = EmergencyHandle::new(HandleConfig::default())
            .expect("default handle configuration is valid");
        let lever =
            SpeedLever::new(LeverConfig::default()).expect("default lever configuration is valid");
        Self::new(handle, lever, EstopSequencer::new(EstopTimings::default()))
    }
}
