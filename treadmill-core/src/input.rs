//! Normalized input mappers for the physical control surfaces.
//!
//! Raw grab samples arrive from the interaction layer as unbounded 3-D
//! offsets or directions. The mappers project them onto the one axis a
//! surface cares about and clamp the result into the surface's working
//! range, so the rest of the core only ever sees bounded scalars.

use core::fmt;

use glam::Vec3;

/// Squared length below which a vector sample is considered degenerate.
const DEGENERATE_LENGTH_SQUARED: f32 = 1e-8;

/// Configuration rejected when constructing a mapper.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MapperError {
    /// The projection axis has (near-)zero length.
    DegenerateAxis,
    /// The working range must be strictly positive.
    NonPositiveRange(f32),
}

impl fmt::Display for MapperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapperError::DegenerateAxis => f.write_str("projection axis has zero length"),
            MapperError::NonPositiveRange(range) => {
                write!(f, "working range must be positive, got {range}")
            }
        }
    }
}

/// Projects grab offsets onto a fixed pull axis and clamps to the travel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PullAxisMapper {
    axis: Vec3,
    pull_distance: f32,
}

impl PullAxisMapper {
    /// Creates a mapper for the given pull axis and travel distance.
    ///
    /// The axis is normalized once here; a degenerate axis or a
    /// non-positive travel is rejected.
    pub fn new(axis: Vec3, pull_distance: f32) -> Result<Self, MapperError> {
        if axis.length_squared() < DEGENERATE_LENGTH_SQUARED {
            return Err(MapperError::DegenerateAxis);
        }
        if pull_distance <= 0.0 || pull_distance.is_nan() {
            return Err(MapperError::NonPositiveRange(pull_distance));
        }

        Ok(Self {
            axis: axis.normalize(),
            pull_distance,
        })
    }

    /// Projects a raw grab offset to a pull amount in `[0, pull_distance]`.
    ///
    /// Offsets pointing away from the pull axis clamp to zero; offsets past
    /// the end of the travel clamp to the full distance.
    #[must_use]
    pub fn map(&self, offset: Vec3) -> f32 {
        let pull = offset.dot(self.axis);
        if pull.is_nan() {
            return 0.0;
        }
        pull.clamp(0.0, self.pull_distance)
    }

    /// Converts a pull amount into the fraction of full travel.
    #[must_use]
    pub fn fraction(&self, pull: f32) -> f32 {
        (pull / self.pull_distance).clamp(0.0, 1.0)
    }

    /// Returns the configured travel distance.
    #[must_use]
    pub const fn pull_distance(&self) -> f32 {
        self.pull_distance
    }
}

/// Maps controller-relative directions onto a clamped, optionally detented
/// lever angle in degrees.
///
/// The mapper is stateful so degenerate samples (a controller sitting on
/// the pivot) can fail safe by holding the last valid angle instead of
/// letting a NaN escape into published state.
#[derive(Copy, Clone, Debug)]
pub struct RotaryAxisMapper {
    reference: Vec3,
    max_angle: f32,
    snap_positions: u8,
    last_angle: f32,
}

impl RotaryAxisMapper {
    /// Creates a mapper around the given reference axis.
    ///
    /// `max_angle` bounds the output to `[-max_angle, +max_angle]` degrees.
    /// `snap_positions` of `0` or `1` disables detent snapping.
    pub fn new(reference: Vec3, max_angle: f32, snap_positions: u8) -> Result<Self, MapperError> {
        if reference.length_squared() < DEGENERATE_LENGTH_SQUARED {
            return Err(MapperError::DegenerateAxis);
        }
        if max_angle <= 0.0 || max_angle.is_nan() {
            return Err(MapperError::NonPositiveRange(max_angle));
        }

        Ok(Self {
            reference: reference.normalize(),
            max_angle,
            snap_positions,
            last_angle: 0.0,
        })
    }

    /// Maps a direction sample to an angle in `[-max_angle, +max_angle]`.
    ///
    /// The angle is the arcsine of the projection onto the reference axis,
    /// clamped and optionally rounded to the nearest detent. A degenerate
    /// direction returns the previous valid angle.
    pub fn map(&mut self, direction: Vec3) -> f32 {
        if direction.length_squared() < DEGENERATE_LENGTH_SQUARED {
            return self.last_angle;
        }

        let dot = direction.normalize().dot(self.reference).clamp(-1.0, 1.0);
        let angle = libm::asinf(dot).to_degrees();
        let angle = self.snap(angle.clamp(-self.max_angle, self.max_angle));
        self.last_angle = angle;
        angle
    }

    /// Re-seeds the fail-safe angle, e.g. when a grab begins at a pose the
    /// mapper has not seen yet.
    pub fn reset_to(&mut self, angle: f32) {
        self.last_angle = angle.clamp(-self.max_angle, self.max_angle);
    }

    /// Returns the configured maximum deflection in degrees.
    #[must_use]
    pub const fn max_angle(&self) -> f32 {
        self.max_angle
    }

    /// Rounds an angle to the nearest of the configured detents.
    fn snap(&self, angle: f32) -> f32 {
        if self.snap_positions <= 1 {
            return angle;
        }

        let step = (self.max_angle * 2.0) / f32::from(self.snap_positions - 1);
        let offset = angle + self.max_angle;
        libm::roundf(offset / step) * step - self.max_angle
    }
}
