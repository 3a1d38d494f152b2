//! Control-event log shared by the core and host tooling.
//!
//! Every grab, activation, sequence transition, and effective speed change
//! is recorded into a bounded ring with a simulated-time timestamp, so a
//! session can be inspected or replayed after the fact. Event kinds encode
//! to compact numeric codes for transport over diagnostics channels.

use core::fmt;
use core::time::Duration;

use heapless::{HistoryBuf, OldestOrdered};

/// Identifier assigned to recorded events in arrival order.
pub type EventId = u32;

/// Total number of control events retained in memory.
pub const EVENT_RING_CAPACITY: usize = 64;

/// Discriminated control events shared across targets.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ControlEventKind {
    HandleGrabbed,
    HandleReleased,
    HandleActivated,
    LeverGrabbed,
    LeverReleased,
    StopEngaged,
    CooldownStarted,
    StopCleared,
    SpeedChanged,
    Custom(u16),
}

impl fmt::Display for ControlEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlEventKind::HandleGrabbed => f.write_str("handle-grabbed"),
            ControlEventKind::HandleReleased => f.write_str("handle-released"),
            ControlEventKind::HandleActivated => f.write_str("handle-activated"),
            ControlEventKind::LeverGrabbed => f.write_str("lever-grabbed"),
            ControlEventKind::LeverReleased => f.write_str("lever-released"),
            ControlEventKind::StopEngaged => f.write_str("stop-engaged"),
            ControlEventKind::CooldownStarted => f.write_str("cooldown-started"),
            ControlEventKind::StopCleared => f.write_str("stop-cleared"),
            ControlEventKind::SpeedChanged => f.write_str("speed-changed"),
            ControlEventKind::Custom(code) => write!(f, "custom({code})"),
        }
    }
}

impl ControlEventKind {
    const HANDLE_GRABBED_CODE: u16 = 0x0000;
    const HANDLE_RELEASED_CODE: u16 = 0x0001;
    const HANDLE_ACTIVATED_CODE: u16 = 0x0002;
    const LEVER_GRABBED_CODE: u16 = 0x0003;
    const LEVER_RELEASED_CODE: u16 = 0x0004;
    const STOP_ENGAGED_CODE: u16 = 0x0005;
    const COOLDOWN_STARTED_CODE: u16 = 0x0006;
    const STOP_CLEARED_CODE: u16 = 0x0007;
    const SPEED_CHANGED_CODE: u16 = 0x0008;

    /// Encodes the event into a compact transport-friendly discriminant.
    #[must_use]
    pub const fn to_raw(self) -> u16 {
        match self {
            ControlEventKind::HandleGrabbed => Self::HANDLE_GRABBED_CODE,
            ControlEventKind::HandleReleased => Self::HANDLE_RELEASED_CODE,
            ControlEventKind::HandleActivated => Self::HANDLE_ACTIVATED_CODE,
            ControlEventKind::LeverGrabbed => Self::LEVER_GRABBED_CODE,
            ControlEventKind::LeverReleased => Self::LEVER_RELEASED_CODE,
            ControlEventKind::StopEngaged => Self::STOP_ENGAGED_CODE,
            ControlEventKind::CooldownStarted => Self::COOLDOWN_STARTED_CODE,
            ControlEventKind::StopCleared => Self::STOP_CLEARED_CODE,
            ControlEventKind::SpeedChanged => Self::SPEED_CHANGED_CODE,
            ControlEventKind::Custom(code) => code,
        }
    }

    /// Decodes a raw discriminant, falling back to [`Custom`].
    ///
    /// [`Custom`]: ControlEventKind::Custom
    #[must_use]
    pub const fn from_raw(code: u16) -> Self {
        match code {
            Self::HANDLE_GRABBED_CODE => ControlEventKind::HandleGrabbed,
            Self::HANDLE_RELEASED_CODE => ControlEventKind::HandleReleased,
            Self::HANDLE_ACTIVATED_CODE => ControlEventKind::HandleActivated,
            Self::LEVER_GRABBED_CODE => ControlEventKind::LeverGrabbed,
            Self::LEVER_RELEASED_CODE => ControlEventKind::LeverReleased,
            Self::STOP_ENGAGED_CODE => ControlEventKind::StopEngaged,
            Self::COOLDOWN_STARTED_CODE => ControlEventKind::CooldownStarted,
            Self::STOP_CLEARED_CODE => ControlEventKind::StopCleared,
            Self::SPEED_CHANGED_CODE => ControlEventKind::SpeedChanged,
            other => ControlEventKind::Custom(other),
        }
    }
}

/// Payload carried alongside an event.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EventDetail {
    /// No additional metadata accompanies the event.
    None,
    /// Pull travel fraction at the time of the event.
    Pull(f32),
    /// Lever deflection in degrees at the time of the event.
    Angle(f32),
    /// Speed fraction pushed to the device.
    Speed(f32),
}

/// Event record stored in the ring buffer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ControlEventRecord {
    pub id: EventId,
    /// Simulated time at which the event occurred.
    pub at: Duration,
    pub kind: ControlEventKind,
    pub detail: EventDetail,
}

/// Records control events into a fixed-size ring buffer.
///
/// The ring keeps the most recent [`EVENT_RING_CAPACITY`] records; the
/// oldest is evicted on overflow. Event identifiers are monotonic across
/// evictions.
pub struct ControlEventRecorder<const CAPACITY: usize = EVENT_RING_CAPACITY> {
    ring: HistoryBuf<ControlEventRecord, CAPACITY>,
    next_event_id: EventId,
}

impl<const CAPACITY: usize> ControlEventRecorder<CAPACITY> {
    /// Creates a recorder with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Records an event, returning its identifier.
    pub fn record(&mut self, kind: ControlEventKind, detail: EventDetail, at: Duration) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(ControlEventRecord {
            id,
            at,
            kind,
            detail,
        });

        id
    }

    /// Returns an iterator over the records in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, ControlEventRecord> {
        self.ring.oldest_ordered()
    }

    /// Returns the most recent record, if any.
    pub fn latest(&self) -> Option<&ControlEventRecord> {
        self.ring.recent()
    }

    /// Returns the number of records currently stored.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl<const CAPACITY: usize> Default for ControlEventRecorder<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}
