//! Scenario configuration for the simulator.
//!
//! A scenario file is a small TOML document overriding the built-in handle,
//! lever, and emergency-stop settings. Every field has a default, so an
//! empty file (or no file at all) yields the stock rig. The sections
//! convert into the core's validated config types; range errors surface
//! when the session is built.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use glam::Vec3;
use serde::Deserialize;
use treadmill_core::estop::{DEFAULT_RESTART_DELAY, DEFAULT_STOP_DURATION, EstopTimings};
use treadmill_core::surface::handle::{
    DEFAULT_ACTIVATION_THRESHOLD, DEFAULT_PULL_DISTANCE, DEFAULT_RETURN_RATE, HandleConfig,
};
use treadmill_core::surface::lever::{
    DEFAULT_MAX_ROTATION_ANGLE, DEFAULT_RETURN_SPEED, DEFAULT_SNAP_POSITIONS,
    DEFAULT_SPEED_PERCENT, LeverConfig,
};

/// Default control-cycle length in milliseconds.
pub const DEFAULT_TICK_MILLIS: u64 = 50;

/// Top-level scenario document.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Control-cycle length in milliseconds for `tick`, `run`, and the
    /// interactive mode.
    pub tick_millis: u64,
    pub handle: HandleSection,
    pub lever: LeverSection,
    pub estop: EstopSection,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            tick_millis: DEFAULT_TICK_MILLIS,
            handle: HandleSection::default(),
            lever: LeverSection::default(),
            estop: EstopSection::default(),
        }
    }
}

/// `[handle]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandleSection {
    pub pull_axis: [f32; 3],
    pub pull_distance: f32,
    pub activation_threshold: f32,
    pub return_rate: f32,
}

impl Default for HandleSection {
    fn default() -> Self {
        Self {
            pull_axis: [0.0, -1.0, 0.0],
            pull_distance: DEFAULT_PULL_DISTANCE,
            activation_threshold: DEFAULT_ACTIVATION_THRESHOLD,
            return_rate: DEFAULT_RETURN_RATE,
        }
    }
}

/// `[lever]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeverSection {
    pub reference_axis: [f32; 3],
    pub max_rotation_angle: f32,
    pub min_speed_percent: f32,
    pub max_speed_percent: f32,
    pub default_speed_percent: f32,
    pub return_to_center: bool,
    pub return_speed: f32,
    pub snap_to_positions: bool,
    pub snap_position_count: u8,
}

impl Default for LeverSection {
    fn default() -> Self {
        Self {
            reference_axis: [0.0, 0.0, 1.0],
            max_rotation_angle: DEFAULT_MAX_ROTATION_ANGLE,
            min_speed_percent: 0.0,
            max_speed_percent: 1.0,
            default_speed_percent: DEFAULT_SPEED_PERCENT,
            return_to_center: true,
            return_speed: DEFAULT_RETURN_SPEED,
            snap_to_positions: false,
            snap_position_count: DEFAULT_SNAP_POSITIONS,
        }
    }
}

/// `[estop]` section, durations in seconds.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EstopSection {
    pub stop_duration_secs: f32,
    pub restart_delay_secs: f32,
}

impl Default for EstopSection {
    fn default() -> Self {
        Self {
            stop_duration_secs: DEFAULT_STOP_DURATION.as_secs_f32(),
            restart_delay_secs: DEFAULT_RESTART_DELAY.as_secs_f32(),
        }
    }
}

/// Errors surfaced while loading a scenario file.
#[derive(Debug)]
pub enum ConfigLoadError {
    Io(io::Error),
    Parse(toml::de::Error),
    /// A duration field was negative or not finite.
    BadDuration { field: &'static str, value: f32 },
}

impl fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigLoadError::Io(err) => write!(f, "cannot read scenario file: {err}"),
            ConfigLoadError::Parse(err) => write!(f, "cannot parse scenario file: {err}"),
            ConfigLoadError::BadDuration { field, value } => {
                write!(f, "{field} must be a non-negative number, got {value}")
            }
        }
    }
}

impl From<io::Error> for ConfigLoadError {
    fn from(value: io::Error) -> Self {
        ConfigLoadError::Io(value)
    }
}

impl From<toml::de::Error> for ConfigLoadError {
    fn from(value: toml::de::Error) -> Self {
        ConfigLoadError::Parse(value)
    }
}

impl ScenarioConfig {
    /// Loads and validates a scenario file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        let config: ScenarioConfig = toml::from_str(&content)?;
        config.validate_durations()?;
        Ok(config)
    }

    fn validate_durations(&self) -> Result<(), ConfigLoadError> {
        let fixtures = [
            ("estop.stop_duration_secs", self.estop.stop_duration_secs),
            ("estop.restart_delay_secs", self.estop.restart_delay_secs),
        ];
        for (field, value) in fixtures {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigLoadError::BadDuration { field, value });
            }
        }
        Ok(())
    }

    /// Control-cycle length, never shorter than one millisecond.
    #[must_use]
    pub fn tick_length(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }

    /// Converts the `[handle]` section into the core configuration.
    #[must_use]
    pub fn handle_config(&self) -> HandleConfig {
        HandleConfig {
            pull_axis: Vec3::from_array(self.handle.pull_axis),
            pull_distance: self.handle.pull_distance,
            activation_threshold: self.handle.activation_threshold,
            return_rate: self.handle.return_rate,
        }
    }

    /// Converts the `[lever]` section into the core configuration.
    #[must_use]
    pub fn lever_config(&self) -> LeverConfig {
        LeverConfig {
            reference_axis: Vec3::from_array(self.lever.reference_axis),
            max_rotation_angle: self.lever.max_rotation_angle,
            min_speed_percent: self.lever.min_speed_percent,
            max_speed_percent: self.lever.max_speed_percent,
            default_speed_percent: self.lever.default_speed_percent,
            return_to_center: self.lever.return_to_center,
            return_speed: self.lever.return_speed,
            snap_to_positions: self.lever.snap_to_positions,
            snap_position_count: self.lever.snap_position_count,
        }
    }

    /// Converts the `[estop]` section into the core timing template.
    ///
    /// Values are pre-validated by [`ScenarioConfig::load_from_file`];
    /// negatives from hand-built sections clamp to zero rather than panic.
    #[must_use]
    pub fn estop_timings(&self) -> EstopTimings {
        EstopTimings::new(
            Duration::from_secs_f32(self.estop.stop_duration_secs.max(0.0)),
            Duration::from_secs_f32(self.estop.restart_delay_secs.max(0.0)),
        )
    }
}
