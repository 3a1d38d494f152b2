//! Emergency-stop sequencer.
//!
//! The original interaction is a coroutine: pause the belt, wait out the
//! stop window, blink through a restart countdown, release the pause. Here
//! the same flow is an explicit phase machine advanced by the externally
//! driven tick, so the timing is deterministic and the sequencer never
//! needs a clock of its own. Once engaged, a sequence always runs to
//! completion; operator input cannot shorten either window.

use core::time::Duration;

use crate::device::DeviceProxy;

/// How long the belt stays fully stopped after an activation.
pub const DEFAULT_STOP_DURATION: Duration = Duration::from_secs(3);
/// Blinking countdown observed before the belt restarts.
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(1);
/// Full blink cycles per second during the restart countdown.
pub const BLINK_RATE: f32 = 4.0;

/// Timing template for one emergency-stop cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EstopTimings {
    /// Length of the stop window.
    pub stop_duration: Duration,
    /// Length of the restart countdown.
    pub restart_delay: Duration,
}

impl EstopTimings {
    /// Creates a timing template.
    #[must_use]
    pub const fn new(stop_duration: Duration, restart_delay: Duration) -> Self {
        Self {
            stop_duration,
            restart_delay,
        }
    }
}

impl Default for EstopTimings {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_DURATION, DEFAULT_RESTART_DELAY)
    }
}

/// Phases of an emergency-stop cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EstopPhase {
    /// No sequence is running.
    Idle,
    /// The belt is paused for the stop window.
    Stopping,
    /// The restart countdown is blinking down.
    CoolingDown,
}

impl EstopPhase {
    /// Returns `true` while a sequence owns the device pause state.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, EstopPhase::Stopping | EstopPhase::CoolingDown)
    }
}

/// Feedback signal the rendering layer may observe each tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum VisualState {
    /// Resting appearance.
    Normal,
    /// Fully latched appearance while the belt is stopped.
    Activated,
    /// Countdown blend between activated and normal; `0.0` is fully
    /// activated, `1.0` fully normal.
    Blinking(f32),
}

/// Phase transitions surfaced by [`EstopSequencer::tick`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct EstopTickReport {
    /// The stop window elapsed and the restart countdown began.
    pub entered_cooldown: bool,
    /// The countdown elapsed, the device was released, and the sequencer
    /// returned to idle.
    pub cleared: bool,
}

/// Timed emergency-stop state machine.
///
/// One sequence runs at a time: engaging while a sequence is active is a
/// no-op, so a second activation can neither reset the stop window nor
/// pause the device twice.
#[derive(Clone, Debug)]
pub struct EstopSequencer {
    timings: EstopTimings,
    phase: EstopPhase,
    in_phase: Duration,
}

impl EstopSequencer {
    /// Creates an idle sequencer with the given timing template.
    #[must_use]
    pub const fn new(timings: EstopTimings) -> Self {
        Self {
            timings,
            phase: EstopPhase::Idle,
            in_phase: Duration::ZERO,
        }
    }

    /// Starts a sequence: pauses the device and enters the stop window.
    ///
    /// Returns `false` without touching anything when a sequence is already
    /// running.
    pub fn engage<P: DeviceProxy>(&mut self, proxy: &mut P) -> bool {
        if self.phase.is_active() {
            return false;
        }

        self.phase = EstopPhase::Stopping;
        self.in_phase = Duration::ZERO;
        proxy.set_paused(true);
        true
    }

    /// Advances the sequence by `dt`.
    ///
    /// Any remainder carries across phase boundaries, so one large step can
    /// traverse the whole cycle; the device is still released exactly once.
    pub fn tick<P: DeviceProxy>(&mut self, dt: Duration, proxy: &mut P) -> EstopTickReport {
        let mut report = EstopTickReport::default();
        if self.phase == EstopPhase::Idle {
            return report;
        }

        self.in_phase += dt;

        if self.phase == EstopPhase::Stopping && self.in_phase >= self.timings.stop_duration {
            self.in_phase -= self.timings.stop_duration;
            self.phase = EstopPhase::CoolingDown;
            report.entered_cooldown = true;
        }

        if self.phase == EstopPhase::CoolingDown && self.in_phase >= self.timings.restart_delay {
            self.in_phase = Duration::ZERO;
            self.phase = EstopPhase::Idle;
            proxy.set_paused(false);
            report.cleared = true;
        }

        report
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> EstopPhase {
        self.phase
    }

    /// Returns `true` while a sequence is running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    /// Time accumulated in the current phase.
    #[must_use]
    pub const fn elapsed_in_phase(&self) -> Duration {
        self.in_phase
    }

    /// Configured timing template.
    #[must_use]
    pub const fn timings(&self) -> EstopTimings {
        self.timings
    }

    /// Visual feedback for the current phase.
    ///
    /// During the restart countdown this is a triangle wave blending
    /// between the activated and normal appearance at [`BLINK_RATE`] cycles
    /// per second.
    #[must_use]
    pub fn visual_state(&self) -> VisualState {
        match self.phase {
            EstopPhase::Idle => VisualState::Normal,
            EstopPhase::Stopping => VisualState::Activated,
            EstopPhase::CoolingDown => {
                VisualState::Blinking(ping_pong(self.in_phase.as_secs_f32() * BLINK_RATE, 1.0))
            }
        }
    }
}

/// Bounces `t` back and forth across `[0, length]`.
fn ping_pong(t: f32, length: f32) -> f32 {
    let span = length * 2.0;
    let wrapped = t % span;
    length - libm::fabsf(wrapped - length)
}
