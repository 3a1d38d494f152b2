//! Emergency pull-handle surface.
//!
//! The handle converts grab offsets into a bounded pull amount, fires a
//! single activation event per excursion past its threshold, and relaxes
//! back to rest when released. While an emergency-stop sequence is active
//! the handle is frozen entirely; the sequence owns the visual and physical
//! state until it completes.

use core::time::Duration;

use glam::Vec3;

use crate::input::PullAxisMapper;

use super::{ActivationEvent, ConfigError, Grabbable, approach_factor, lerp};

/// Default travel distance along the pull axis, in meters.
pub const DEFAULT_PULL_DISTANCE: f32 = 0.3;
/// Default fraction of the travel at which the activation event fires.
pub const DEFAULT_ACTIVATION_THRESHOLD: f32 = 0.8;
/// Auto-return relaxation rate applied while released, per second.
pub const DEFAULT_RETURN_RATE: f32 = 5.0;
/// Remaining pull below which the surface counts as settled and the
/// activation trigger re-arms.
pub const REST_EPSILON: f32 = 0.01;

/// Construction-time settings for an [`EmergencyHandle`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HandleConfig {
    /// Direction the handle travels when pulled, in local space.
    pub pull_axis: Vec3,
    /// Full travel distance along the pull axis.
    pub pull_distance: f32,
    /// Fraction of the travel at which the activation event fires.
    pub activation_threshold: f32,
    /// Auto-return relaxation rate while released, per second.
    pub return_rate: f32,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            pull_axis: Vec3::NEG_Y,
            pull_distance: DEFAULT_PULL_DISTANCE,
            activation_threshold: DEFAULT_ACTIVATION_THRESHOLD,
            return_rate: DEFAULT_RETURN_RATE,
        }
    }
}

/// Emergency pull handle.
///
/// The pull amount stays in `[0, pull_distance]` for every possible input,
/// and the activation event is edge-triggered: holding the handle past the
/// threshold fires exactly once until the trigger re-arms.
#[derive(Clone, Debug)]
pub struct EmergencyHandle {
    mapper: PullAxisMapper,
    activation_threshold: f32,
    return_rate: f32,
    current_pull: f32,
    held: bool,
    activated: bool,
}

impl EmergencyHandle {
    /// Validates the configuration and creates a handle at rest.
    pub fn new(config: HandleConfig) -> Result<Self, ConfigError> {
        if config.activation_threshold <= 0.0
            || config.activation_threshold > 1.0
            || config.activation_threshold.is_nan()
        {
            return Err(ConfigError::ThresholdOutOfRange(config.activation_threshold));
        }
        if config.return_rate <= 0.0 || config.return_rate.is_nan() {
            return Err(ConfigError::NonPositiveReturnRate(config.return_rate));
        }

        let mapper = PullAxisMapper::new(config.pull_axis, config.pull_distance)?;
        Ok(Self {
            mapper,
            activation_threshold: config.activation_threshold,
            return_rate: config.return_rate,
            current_pull: 0.0,
            held: false,
            activated: false,
        })
    }

    /// Advances the handle by one control cycle.
    ///
    /// `grip_offset` is the grab offset from the rest pose, present while
    /// the operator holds the handle. `sequence_active` freezes the handle
    /// for the duration of an emergency-stop sequence, held or not.
    pub fn tick(
        &mut self,
        dt: Duration,
        grip_offset: Option<Vec3>,
        sequence_active: bool,
    ) -> Option<ActivationEvent> {
        if sequence_active {
            return None;
        }

        if self.held {
            if let Some(offset) = grip_offset {
                self.current_pull = self.mapper.map(offset);
            }
            if self.pull_fraction() >= self.activation_threshold && !self.activated {
                self.activated = true;
                return Some(ActivationEvent);
            }
            return None;
        }

        // Released: relax toward rest and re-arm the trigger once settled.
        self.current_pull = lerp(
            self.current_pull,
            0.0,
            approach_factor(self.return_rate, dt),
        );
        if self.current_pull < REST_EPSILON {
            self.activated = false;
        }

        None
    }

    /// Current pull amount along the axis, in `[0, pull_distance]`.
    #[must_use]
    pub const fn current_pull(&self) -> f32 {
        self.current_pull
    }

    /// Current pull as a fraction of full travel.
    #[must_use]
    pub fn pull_fraction(&self) -> f32 {
        self.mapper.fraction(self.current_pull)
    }

    /// Returns the configured travel distance.
    #[must_use]
    pub const fn pull_distance(&self) -> f32 {
        self.mapper.pull_distance()
    }

    /// Reports whether the activation latch is currently set.
    #[must_use]
    pub const fn is_activated(&self) -> bool {
        self.activated
    }
}

impl Grabbable for EmergencyHandle {
    fn on_select_start(&mut self) {
        self.held = true;
        // A fresh grab re-arms the trigger. An in-flight stop sequence is
        // deliberately left untouched.
        self.activated = false;
    }

    fn on_select_end(&mut self) {
        self.held = false;
    }

    fn is_held(&self) -> bool {
        self.held
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MapperError;

    #[test]
    fn rejects_invalid_configuration() {
        let fixtures = [
            (
                HandleConfig {
                    activation_threshold: 0.0,
                    ..HandleConfig::default()
                },
                ConfigError::ThresholdOutOfRange(0.0),
            ),
            (
                HandleConfig {
                    activation_threshold: 1.5,
                    ..HandleConfig::default()
                },
                ConfigError::ThresholdOutOfRange(1.5),
            ),
            (
                HandleConfig {
                    return_rate: 0.0,
                    ..HandleConfig::default()
                },
                ConfigError::NonPositiveReturnRate(0.0),
            ),
            (
                HandleConfig {
                    pull_distance: -1.0,
                    ..HandleConfig::default()
                },
                ConfigError::Mapper(MapperError::NonPositiveRange(-1.0)),
            ),
            (
                HandleConfig {
                    pull_axis: Vec3::ZERO,
                    ..HandleConfig::default()
                },
                ConfigError::Mapper(MapperError::DegenerateAxis),
            ),
        ];

        for (config, expected) in fixtures {
            match EmergencyHandle::new(config) {
                Err(err) => assert_eq!(err, expected),
                Ok(_) => panic!("expected {expected:?} for {config:?}"),
            }
        }
    }

    #[test]
    fn starts_at_rest_and_unarmed() {
        let handle = EmergencyHandle::new(HandleConfig::default()).expect("valid config");
        assert!(handle.current_pull().abs() < f32::EPSILON);
        assert!(!handle.is_held());
        assert!(!handle.is_activated());
    }
}
