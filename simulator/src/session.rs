//! Interactive session driving the control rig against a simulated belt.
//!
//! The session plays the role of the surrounding application: it owns the
//! simulated treadmill, drives the grab/release lifecycle, synthesizes
//! gesture samples from console state, and advances simulated time. Console
//! replies follow the `OK …`/`ERR …` convention so transcripts stay easy to
//! diff.

use std::io;
use std::time::Duration;

use glam::Vec3;
use tracing::{debug, info};
use treadmill_core::device::DeviceProxy;
use treadmill_core::estop::{EstopPhase, EstopSequencer, VisualState};
use treadmill_core::rig::{ControlRig, TickInputs, TickReport};
use treadmill_core::surface::handle::EmergencyHandle;
use treadmill_core::surface::lever::SpeedLever;
use treadmill_core::surface::{ConfigError, Grabbable};
use treadmill_core::telemetry::EventDetail;

use crate::commands::{Command, ParseFailure, SurfaceTarget, parse_command};
use crate::config::ScenarioConfig;
use crate::transcript::{TranscriptLogger, TranscriptRole};

/// Help catalog rendered by the `help` command.
pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "grab",
        "grab <handle|lever>     - seize a control surface",
    ),
    (
        "release",
        "release <handle|lever>  - let go of a control surface",
    ),
    (
        "pull",
        "pull <fraction>         - set the handle pull, 0.0 to 1.0",
    ),
    (
        "turn",
        "turn <degrees>          - set the lever deflection",
    ),
    (
        "speed",
        "speed <fraction>        - programmatic speed override",
    ),
    (
        "tick",
        "tick [<duration>]       - advance one control cycle",
    ),
    (
        "run",
        "run <duration>          - advance cycles until the span elapses",
    ),
    (
        "status",
        "status                  - display rig and belt state",
    ),
    (
        "events",
        "events                  - dump the control-event log",
    ),
    (
        "help",
        "help [topic]            - show help for a command",
    ),
    (
        "exit",
        "exit                    - leave the session",
    ),
];

/// Host-side stand-in for the treadmill drive.
///
/// Remembers the pause flag and the last commanded speed so the session can
/// display what the belt would be doing.
#[derive(Debug, Default)]
pub struct SimTreadmill {
    paused: bool,
    speed: f32,
}

impl SimTreadmill {
    /// Last commanded belt speed fraction.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }
}

impl DeviceProxy for SimTreadmill {
    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            info!(paused, "belt pause state changed");
        }
        self.paused = paused;
    }

    fn set_speed(&mut self, fraction: f32) {
        debug!(fraction, "belt speed commanded");
        self.speed = fraction;
    }
}

/// One simulator session: rig, belt, console state, and transcript.
pub struct Session {
    rig: ControlRig,
    treadmill: SimTreadmill,
    transcript: Option<TranscriptLogger>,
    tick_len: Duration,
    pull_axis: Vec3,
    pull_distance: f32,
    reference_axis: Vec3,
    lever_ortho: Vec3,
    max_rotation_angle: f32,
    pull_fraction: f32,
    lever_angle: f32,
}

impl Session {
    /// Builds a session from a validated scenario configuration.
    pub fn new(
        config: &ScenarioConfig,
        transcript: Option<TranscriptLogger>,
    ) -> Result<Self, ConfigError> {
        let handle_config = config.handle_config();
        let lever_config = config.lever_config();

        let handle = EmergencyHandle::new(handle_config)?;
        let lever = SpeedLever::new(lever_config)?;
        let sequencer = EstopSequencer::new(config.estop_timings());
        let mut rig = ControlRig::new(handle, lever, sequencer);

        let mut treadmill = SimTreadmill::default();
        rig.prime(&mut treadmill);

        let reference_axis = lever_config.reference_axis.normalize();
        let lever_angle = rig.lever().center_angle();

        Ok(Self {
            rig,
            treadmill,
            transcript,
            tick_len: config.tick_length(),
            pull_axis: handle_config.pull_axis.normalize(),
            pull_distance: handle_config.pull_distance,
            reference_axis,
            lever_ortho: orthogonal_to(reference_axis),
            max_rotation_angle: lever_config.max_rotation_angle,
            pull_fraction: 0.0,
            lever_angle,
        })
    }

    /// Handles one console line, returning the reply lines.
    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        self.log_transcript(TranscriptRole::Host, trimmed)?;

        let lines = match parse_command(trimmed) {
            Ok(command) => self.dispatch(command),
            Err(err) => vec![syntax_error(err)],
        };
        for reply in &lines {
            self.log_transcript(TranscriptRole::Sim, reply)?;
        }
        Ok(lines)
    }

    fn dispatch(&mut self, command: Command) -> Vec<String> {
        match command {
            Command::Grab(SurfaceTarget::Handle) => {
                self.rig.grab_handle();
                vec!["OK handle grabbed".to_string()]
            }
            Command::Grab(SurfaceTarget::Lever) => {
                self.rig.grab_lever();
                // Grabbing a lever mid-pose starts from wherever it sits.
                self.lever_angle = self.rig.lever().current_angle();
                vec!["OK lever grabbed".to_string()]
            }
            Command::Release(SurfaceTarget::Handle) => {
                self.rig.release_handle();
                vec!["OK handle released".to_string()]
            }
            Command::Release(SurfaceTarget::Lever) => {
                self.rig.release_lever();
                vec!["OK lever released".to_string()]
            }
            Command::Pull(fraction) => {
                if !fraction.is_finite() {
                    return vec![format!("ERR value pull fraction `{fraction}` is not finite")];
                }
                self.pull_fraction = fraction.clamp(0.0, 1.0);
                vec![format!("OK pull set to {:.2}", self.pull_fraction)]
            }
            Command::Turn(degrees) => {
                if !degrees.is_finite() {
                    return vec![format!("ERR value lever angle `{degrees}` is not finite")];
                }
                self.lever_angle =
                    degrees.clamp(-self.max_rotation_angle, self.max_rotation_angle);
                vec![format!("OK lever angle set to {:+.1} deg", self.lever_angle)]
            }
            Command::Speed(fraction) => {
                if !fraction.is_finite() {
                    return vec![format!("ERR value speed fraction `{fraction}` is not finite")];
                }
                self.rig.lever_mut().set_speed_fraction(fraction);
                self.lever_angle = self.rig.lever().current_angle();
                vec![format!(
                    "OK speed override {:.2}",
                    self.rig.lever().speed_fraction()
                )]
            }
            Command::Tick(step) => {
                let report = self.advance(step.unwrap_or(self.tick_len));
                vec![self.describe_report(&report)]
            }
            Command::Run(total) => self.run_span(total),
            Command::Status => self.status_lines(),
            Command::Events => self.event_lines(),
            Command::Help(topic) => help_lines(topic.as_deref()),
        }
    }

    fn run_span(&mut self, total: Duration) -> Vec<String> {
        let mut remaining = total;
        let mut ticks: u32 = 0;
        let mut activations: u32 = 0;
        let mut last = None;

        while remaining > Duration::ZERO {
            let step = remaining.min(self.tick_len);
            let report = self.advance(step);
            if report.activation_fired {
                activations += 1;
            }
            remaining -= step;
            ticks += 1;
            last = Some(report);
        }

        let mut lines = vec![format!(
            "ran {ticks} cycles over {:.3}s ({activations} activations)",
            total.as_secs_f64()
        )];
        if let Some(report) = last {
            lines.push(self.describe_report(&report));
        }
        lines
    }

    /// Advances the rig by one cycle of the given length.
    pub fn advance(&mut self, dt: Duration) -> TickReport {
        let inputs = TickInputs {
            handle_offset: self
                .rig
                .handle()
                .is_held()
                .then(|| self.pull_axis * (self.pull_fraction * self.pull_distance)),
            lever_direction: self.rig.lever().is_held().then(|| self.lever_direction()),
        };

        let report = self.rig.tick(dt, inputs, &mut self.treadmill);

        if report.activation_fired {
            info!("emergency activation fired");
            let _ = self.log_transcript(TranscriptRole::Sim, "emergency activation fired");
        }
        report
    }

    /// Advances the rig by the configured tick length.
    pub fn advance_one(&mut self) -> TickReport {
        self.advance(self.tick_len)
    }

    /// Toggles the handle grab, returning the new held state.
    pub fn toggle_handle_grab(&mut self) -> bool {
        if self.rig.handle().is_held() {
            self.rig.release_handle();
            false
        } else {
            self.rig.grab_handle();
            true
        }
    }

    /// Toggles the lever grab, returning the new held state.
    pub fn toggle_lever_grab(&mut self) -> bool {
        if self.rig.lever().is_held() {
            self.rig.release_lever();
            false
        } else {
            self.rig.grab_lever();
            self.lever_angle = self.rig.lever().current_angle();
            true
        }
    }

    /// Nudges the pending pull fraction.
    pub fn nudge_pull(&mut self, delta: f32) {
        self.pull_fraction = (self.pull_fraction + delta).clamp(0.0, 1.0);
    }

    /// Nudges the pending lever deflection.
    pub fn nudge_lever(&mut self, delta_degrees: f32) {
        self.lever_angle = (self.lever_angle + delta_degrees)
            .clamp(-self.max_rotation_angle, self.max_rotation_angle);
    }

    /// Configured control-cycle length.
    #[must_use]
    pub const fn tick_length(&self) -> Duration {
        self.tick_len
    }

    /// One-line summary for the interactive status display.
    #[must_use]
    pub fn status_line(&self) -> String {
        let handle = self.rig.handle();
        let lever = self.rig.lever();
        format!(
            "t=+{:.1}s pull={:.2}{} angle={:+.1}{} phase={} belt={} speed={:.2}",
            self.rig.elapsed().as_secs_f64(),
            handle.pull_fraction(),
            if handle.is_held() { "*" } else { "" },
            lever.current_angle(),
            if lever.is_held() { "*" } else { "" },
            phase_label(self.rig.sequencer().phase()),
            if self.treadmill.is_paused() {
                "paused"
            } else {
                "running"
            },
            self.treadmill.speed(),
        )
    }

    fn describe_report(&self, report: &TickReport) -> String {
        let speed = match report.speed_pushed {
            Some(fraction) => format!("{fraction:.2}"),
            None => "held".to_string(),
        };
        format!(
            "t=+{:.3}s phase={} visual={} speed={}",
            self.rig.elapsed().as_secs_f64(),
            phase_label(report.estop_phase),
            visual_label(report.visual),
            speed
        )
    }

    fn status_lines(&self) -> Vec<String> {
        let handle = self.rig.handle();
        let lever = self.rig.lever();
        vec![
            format!("sim-time  +{:.3}s", self.rig.elapsed().as_secs_f64()),
            format!(
                "handle    pull={:.2} held={} armed={}",
                handle.pull_fraction(),
                yes_no(handle.is_held()),
                yes_no(!handle.is_activated()),
            ),
            format!(
                "lever     angle={:+.1}deg speed={:.2} held={}",
                lever.current_angle(),
                lever.speed_fraction(),
                yes_no(lever.is_held()),
            ),
            format!(
                "sequence  {} ({})",
                phase_label(self.rig.sequencer().phase()),
                visual_label(self.rig.sequencer().visual_state()),
            ),
            format!(
                "belt      {} speed={:.2}",
                if self.treadmill.is_paused() {
                    "paused"
                } else {
                    "running"
                },
                self.treadmill.speed(),
            ),
        ]
    }

    fn event_lines(&self) -> Vec<String> {
        if self.rig.events().is_empty() {
            return vec!["no events recorded".to_string()];
        }

        self.rig
            .events()
            .oldest_first()
            .map(|record| {
                format!(
                    "#{:03} +{:.3}s {}{}",
                    record.id,
                    record.at.as_secs_f64(),
                    record.kind,
                    detail_suffix(record.detail),
                )
            })
            .collect()
    }

    /// Builds the controller direction for the pending lever deflection.
    fn lever_direction(&self) -> Vec3 {
        let radians = self.lever_angle.to_radians();
        self.reference_axis * radians.sin() + self.lever_ortho * radians.cos()
    }

    fn log_transcript(&mut self, role: TranscriptRole, line: &str) -> io::Result<()> {
        let elapsed = self.rig.elapsed();
        match self.transcript.as_mut() {
            Some(transcript) => transcript.append_line(elapsed, role, line),
            None => Ok(()),
        }
    }
}

/// Picks a stable axis orthogonal to the lever's reference axis.
fn orthogonal_to(axis: Vec3) -> Vec3 {
    let mut base = axis.cross(Vec3::Y);
    if base.length_squared() < 1e-6 {
        base = axis.cross(Vec3::X);
    }
    base.normalize()
}

fn syntax_error(err: ParseFailure) -> String {
    format!("ERR syntax {err}")
}

fn help_lines(topic: Option<&str>) -> Vec<String> {
    match topic {
        None => HELP_TOPICS
            .iter()
            .map(|(_, text)| (*text).to_string())
            .collect(),
        Some(topic) => HELP_TOPICS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(topic))
            .map_or_else(
                || vec![format!("ERR help unknown topic `{topic}`")],
                |(_, text)| vec![(*text).to_string()],
            ),
    }
}

fn phase_label(phase: EstopPhase) -> &'static str {
    match phase {
        EstopPhase::Idle => "idle",
        EstopPhase::Stopping => "stopping",
        EstopPhase::CoolingDown => "cooling-down",
    }
}

fn visual_label(visual: VisualState) -> String {
    match visual {
        VisualState::Normal => "normal".to_string(),
        VisualState::Activated => "activated".to_string(),
        VisualState::Blinking(fraction) => format!("blinking({fraction:.2})"),
    }
}

fn detail_suffix(detail: EventDetail) -> String {
    match detail {
        EventDetail::None => String::new(),
        EventDetail::Pull(fraction) => format!(" pull={fraction:.2}"),
        EventDetail::Angle(degrees) => format!(" angle={degrees:+.1}"),
        EventDetail::Speed(fraction) => format!(" speed={fraction:.2}"),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
