//! Treadmill actuator boundary.

/// Interface the control core drives the treadmill through.
///
/// The surrounding application owns the implementation; the core only ever
/// borrows it for the duration of a tick. `set_paused` is idempotent.
/// Honoring the pause state before `set_speed` is the caller's
/// responsibility, not the proxy's.
pub trait DeviceProxy {
    /// Reports whether the belt is currently paused.
    fn is_paused(&self) -> bool;

    /// Pauses or releases the belt.
    fn set_paused(&mut self, paused: bool);

    /// Commands the belt speed as a fraction of its maximum, in `[0, 1]`.
    fn set_speed(&mut self, fraction: f32);
}

/// Proxy that performs no device interaction.
///
/// Stands in when no treadmill is attached: sequences still run their
/// timers and surfaces keep publishing values, the device effects simply go
/// nowhere.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopDeviceProxy;

impl NoopDeviceProxy {
    /// Creates a new no-op proxy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DeviceProxy for NoopDeviceProxy {
    fn is_paused(&self) -> bool {
        false
    }

    fn set_paused(&mut self, _: bool) {}

    fn set_speed(&mut self, _: f32) {}
}
