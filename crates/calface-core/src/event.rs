//! Calendar events at each stage of the layout pipeline.

use serde::{Deserialize, Serialize};

use crate::overlap::TimeSpan;

/// A calendar event as delivered by the calendar source.
///
/// Times are absolute (UTC) milliseconds since the Unix epoch. Nothing is
/// enforced on input; inverted or zero-length events are filtered by clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawEvent {
    /// Event start in UTC milliseconds.
    pub start_ms: i64,
    /// Event end in UTC milliseconds.
    pub end_ms: i64,
    /// Opaque 32-bit color value, passed through to the renderer.
    pub color: u32,
}

impl RawEvent {
    pub const fn new(start_ms: i64, end_ms: i64, color: u32) -> Self {
        Self {
            start_ms,
            end_ms,
            color,
        }
    }
}

/// An event bounded to the display window and shifted into local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClippedEvent {
    /// Start in local-timebase milliseconds.
    pub start_ms: i64,
    /// End in local-timebase milliseconds. Always greater than `start_ms`.
    pub end_ms: i64,
    /// Opaque 32-bit color value.
    pub color: u32,
}

impl ClippedEvent {
    pub const fn new(start_ms: i64, end_ms: i64, color: u32) -> Self {
        Self {
            start_ms,
            end_ms,
            color,
        }
    }

    /// Returns the event length in milliseconds.
    pub const fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// Reinterprets this event as raw input with the same fields.
    pub const fn to_raw(self) -> RawEvent {
        RawEvent::new(self.start_ms, self.end_ms, self.color)
    }
}

/// A clipped event with its assigned band of levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeveledEvent {
    #[serde(flatten)]
    pub event: ClippedEvent,
    /// Lowest level occupied (inclusive).
    pub min_level: u32,
    /// Highest level occupied (inclusive).
    pub max_level: u32,
}

impl LeveledEvent {
    pub const fn new(event: ClippedEvent, min_level: u32, max_level: u32) -> Self {
        Self {
            event,
            min_level,
            max_level,
        }
    }

    /// Returns true if the two bands share at least one level.
    pub const fn shares_level_with(&self, other: &Self) -> bool {
        self.min_level <= other.max_level && other.min_level <= self.max_level
    }
}

/// The output of one layout computation.
///
/// Built once and never mutated afterwards; a newer computation produces a
/// fresh result rather than editing this one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutResult {
    /// Events in the order they were laid out.
    pub events: Vec<LeveledEvent>,
    /// Upper bound of every event's `max_level`. The renderer divides by
    /// `max_level + 1` to map a level onto a fraction of the dial radius.
    pub max_level: u32,
}

impl LayoutResult {
    /// A layout with no events and a max level of zero.
    pub const fn empty() -> Self {
        Self {
            events: Vec::new(),
            max_level: 0,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl TimeSpan for RawEvent {
    fn start_ms(&self) -> i64 {
        self.start_ms
    }

    fn end_ms(&self) -> i64 {
        self.end_ms
    }
}

impl TimeSpan for ClippedEvent {
    fn start_ms(&self) -> i64 {
        self.start_ms
    }

    fn end_ms(&self) -> i64 {
        self.end_ms
    }
}

impl TimeSpan for LeveledEvent {
    fn start_ms(&self) -> i64 {
        self.event.start_ms
    }

    fn end_ms(&self) -> i64 {
        self.event.end_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leveled_event_serializes_flat() {
        let event = LeveledEvent::new(ClippedEvent::new(0, 60_000, 0xFF00_00FF), 1, 3);

        let json = serde_json::to_value(event).unwrap();

        assert_eq!(json["start_ms"], 0);
        assert_eq!(json["end_ms"], 60_000);
        assert_eq!(json["color"], 0xFF00_00FF_u32);
        assert_eq!(json["min_level"], 1);
        assert_eq!(json["max_level"], 3);
    }

    #[test]
    fn shares_level_is_inclusive() {
        let event = ClippedEvent::new(0, 1, 0);
        let low = LeveledEvent::new(event, 0, 2);
        let touching = LeveledEvent::new(event, 2, 4);
        let above = LeveledEvent::new(event, 3, 4);

        assert!(low.shares_level_with(&touching));
        assert!(touching.shares_level_with(&low));
        assert!(!low.shares_level_with(&above));
    }

    #[test]
    fn empty_layout_has_zero_max_level() {
        let layout = LayoutResult::empty();
        assert!(layout.is_empty());
        assert_eq!(layout.max_level, 0);
        assert_eq!(layout, LayoutResult::default());
    }
}
