//! Rotary speed-lever surface.
//!
//! The lever tracks the mapped controller angle immediately while held,
//! relaxes back toward its center detent when released, and exposes the
//! resulting angle as a speed fraction for the device push. A programmatic
//! override bypasses gesture capture entirely.

use core::time::Duration;

use glam::Vec3;

use crate::input::RotaryAxisMapper;

use super::{ConfigError, Grabbable, approach_factor, lerp};

/// Default maximum deflection to either side of center, in degrees.
pub const DEFAULT_MAX_ROTATION_ANGLE: f32 = 45.0;
/// Default speed fraction the lever rests at.
pub const DEFAULT_SPEED_PERCENT: f32 = 0.5;
/// Default relaxation rate back to center, per second.
pub const DEFAULT_RETURN_SPEED: f32 = 5.0;
/// Default number of detents when snapping is enabled.
pub const DEFAULT_SNAP_POSITIONS: u8 = 5;

/// Construction-time settings for a [`SpeedLever`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LeverConfig {
    /// Axis the controller direction is measured against, in local space.
    pub reference_axis: Vec3,
    /// Maximum deflection to either side of center, in degrees.
    pub max_rotation_angle: f32,
    /// Speed fraction commanded at full negative deflection.
    pub min_speed_percent: f32,
    /// Speed fraction commanded at full positive deflection.
    pub max_speed_percent: f32,
    /// Speed fraction the lever rests at when centered.
    pub default_speed_percent: f32,
    /// Whether the lever relaxes back to its rest angle when released.
    pub return_to_center: bool,
    /// Relaxation rate while released, per second.
    pub return_speed: f32,
    /// Whether mapped angles snap to discrete detents.
    pub snap_to_positions: bool,
    /// Number of equally spaced detents across the full range.
    pub snap_position_count: u8,
}

impl Default for LeverConfig {
    fn default() -> Self {
        Self {
            reference_axis: Vec3::Z,
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

/// Rotary speed lever.
///
/// The angle stays in `[-max_rotation_angle, +max_rotation_angle]` at all
/// times; the speed fraction derived from it stays in `[0, 1]`.
#[derive(Clone, Debug)]
pub struct SpeedLever {
    mapper: RotaryAxisMapper,
    min_speed_percent: f32,
    max_speed_percent: f32,
    return_to_center: bool,
    return_speed: f32,
    center_angle: f32,
    current_angle: f32,
    target_angle: f32,
    held: bool,
}

impl SpeedLever {
    /// Validates the configuration and creates a lever resting at its
    /// center angle.
    pub fn new(config: LeverConfig) -> Result<Self, ConfigError> {
        for percent in [
            config.min_speed_percent,
            config.max_speed_percent,
            config.default_speed_percent,
        ] {
            if percent < 0.0 || percent > 1.0 || percent.is_nan() {
                return Err(ConfigError::PercentOutOfRange(percent));
            }
        }
        if config.min_speed_percent > config.max_speed_percent {
            return Err(ConfigError::SpeedRangeInverted {
                min: config.min_speed_percent,
                max: config.max_speed_percent,
            });
        }
        if config.return_speed <= 0.0 || config.return_speed.is_nan() {
            return Err(ConfigError::NonPositiveReturnRate(config.return_speed));
        }
        if config.snap_to_positions && config.snap_position_count == 0 {
            return Err(ConfigError::NoSnapPositions);
        }

        let snap_positions = if config.snap_to_positions {
            config.snap_position_count
        } else {
            0
        };
        let mut mapper = RotaryAxisMapper::new(
            config.reference_axis,
            config.max_rotation_angle,
            snap_positions,
        )?;

        let max = config.max_rotation_angle;
        let center_angle = lerp(-max, max, config.default_speed_percent);
        mapper.reset_to(center_angle);

        Ok(Self {
            mapper,
            min_speed_percent: config.min_speed_percent,
            max_speed_percent: config.max_speed_percent,
            return_to_center: config.return_to_center,
            return_speed: config.return_speed,
            center_angle,
            current_angle: center_angle,
            target_angle: center_angle,
            held: false,
        })
    }

    /// Advances the lever by one control cycle.
    ///
    /// While held, the mapped target angle is applied immediately with no
    /// smoothing. While released, the angle relaxes toward center when
    /// return-to-center is configured.
    pub fn tick(&mut self, dt: Duration, grip_direction: Option<Vec3>) {
        if self.held {
            if let Some(direction) = grip_direction {
                self.target_angle = self.mapper.map(direction);
                self.current_angle = self.target_angle;
            }
        } else if self.return_to_center {
            self.current_angle = lerp(
                self.current_angle,
                self.center_angle,
                approach_factor(self.return_speed, dt),
            );
        }
    }

    /// Speed fraction currently commanded by the lever, in `[0, 1]`.
    #[must_use]
    pub fn speed_fraction(&self) -> f32 {
        let max = self.mapper.max_angle();
        let t = (self.current_angle + max) / (max * 2.0);
        lerp(self.min_speed_percent, self.max_speed_percent, t).clamp(0.0, 1.0)
    }

    /// Programmatic override bypassing gesture capture.
    ///
    /// Clamps the fraction, recomputes the angle, and applies both
    /// immediately.
    pub fn set_speed_fraction(&mut self, fraction: f32) {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let max = self.mapper.max_angle();
        let angle = lerp(-max, max, fraction);
        self.current_angle = angle;
        self.target_angle = angle;
        self.mapper.reset_to(angle);
    }

    /// Current deflection in degrees.
    #[must_use]
    pub const fn current_angle(&self) -> f32 {
        self.current_angle
    }

    /// Rest angle derived from the configured default speed fraction.
    #[must_use]
    pub const fn center_angle(&self) -> f32 {
        self.center_angle
    }

    /// Configured maximum deflection in degrees.
    #[must_use]
    pub const fn max_rotation_angle(&self) -> f32 {
        self.mapper.max_angle()
    }
}

impl Grabbable for SpeedLever {
    fn on_select_start(&mut self) {
        self.held = true;
        // Seed the fail-safe angle so a degenerate first sample holds the
        // pose the operator grabbed at.
        self.mapper.reset_to(self.current_angle);
    }

    fn on_select_end(&mut self) {
        self.held = false;
    }

    fn is_held(&self) -> bool {
        self.held
    }
}
