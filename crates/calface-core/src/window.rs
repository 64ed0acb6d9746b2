//! The rolling 12-hour display window and event clipping.

use chrono::{DateTime, Offset, TimeZone};
use serde::{Deserialize, Serialize};

use crate::event::{ClippedEvent, RawEvent};

/// One hour in milliseconds.
pub const HOUR_MS: i64 = 3_600_000;

/// Width of the display window: one full turn of a 12-hour dial.
pub const WINDOW_MS: i64 = 12 * HOUR_MS;

/// The 12-hour interval currently shown on the dial.
///
/// `start_ms` and `end_ms` are absolute (UTC) milliseconds, the same timebase
/// as [`RawEvent`]. The offset is kept so clipped events can be moved into
/// local time for angle math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub start_ms: i64,
    pub end_ms: i64,
    /// Local time minus UTC, in milliseconds.
    pub utc_offset_ms: i64,
}

impl Window {
    /// Creates a window starting at `start_ms` (UTC).
    pub const fn new(start_ms: i64, utc_offset_ms: i64) -> Self {
        Self {
            start_ms,
            end_ms: start_ms + WINDOW_MS,
            utc_offset_ms,
        }
    }

    /// Computes the window for the given local time.
    ///
    /// The window starts at the top of the current local hour. Flooring happens
    /// on the local wall clock so zones with fractional-hour offsets still get
    /// a window aligned to their own hour boundaries.
    pub fn for_local_time<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let utc_offset_ms = i64::from(now.offset().fix().local_minus_utc()) * 1000;
        let local_ms = now.timestamp_millis() + utc_offset_ms;
        let local_hour_ms = local_ms.div_euclid(HOUR_MS) * HOUR_MS;
        Self::new(local_hour_ms - utc_offset_ms, utc_offset_ms)
    }

    /// Window start expressed in the local timebase.
    pub const fn local_start_ms(&self) -> i64 {
        self.start_ms + self.utc_offset_ms
    }

    /// Clips a single event to the window.
    ///
    /// Returns `None` when nothing of the event is visible, when the clipped
    /// event would be empty or inverted, or when it covers the whole window.
    /// A whole-window event would paint a full ring, so it is dropped.
    pub const fn clip(&self, event: &RawEvent) -> Option<ClippedEvent> {
        let start = if event.start_ms > self.start_ms {
            event.start_ms
        } else {
            self.start_ms
        };
        let end = if event.end_ms < self.end_ms {
            event.end_ms
        } else {
            self.end_ms
        };

        let visible = end > self.start_ms && start < self.end_ms;
        let spans_window = start == self.start_ms && end == self.end_ms;
        if !visible || spans_window || end <= start {
            return None;
        }

        Some(ClippedEvent::new(
            start + self.utc_offset_ms,
            end + self.utc_offset_ms,
            event.color,
        ))
    }
}

/// Clips every event to the window, keeping input order.
pub fn clip_events(events: &[RawEvent], window: &Window) -> Vec<ClippedEvent> {
    let clipped: Vec<_> = events.iter().filter_map(|e| window.clip(e)).collect();
    tracing::debug!(
        input = events.len(),
        visible = clipped.len(),
        window_start_ms = window.start_ms,
        "clipped events to window"
    );
    clipped
}
