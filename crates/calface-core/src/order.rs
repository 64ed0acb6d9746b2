//! Display ordering applied before layout.
//!
//! Both engines place events in input order, so the order decides which
//! events end up on inner levels and which get grouped visually.

use std::cmp::{Ordering, Reverse};

use crate::event::ClippedEvent;
use crate::window::HOUR_MS;

/// Coarse duration class used as the primary sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DurationBucket {
    /// Three hours or longer.
    Long,
    /// One hour up to three hours.
    Medium,
    /// Under one hour.
    Short,
}

impl DurationBucket {
    pub const fn of(event: &ClippedEvent) -> Self {
        let duration = event.duration_ms();
        if duration >= 3 * HOUR_MS {
            Self::Long
        } else if duration >= HOUR_MS {
            Self::Medium
        } else {
            Self::Short
        }
    }
}

/// Compares two events for display placement.
///
/// Longer buckets come first, then ascending color, then ascending end time,
/// then descending start time.
pub fn display_cmp(a: &ClippedEvent, b: &ClippedEvent) -> Ordering {
    DurationBucket::of(a)
        .cmp(&DurationBucket::of(b))
        .then(a.color.cmp(&b.color))
        .then(a.end_ms.cmp(&b.end_ms))
        .then(Reverse(a.start_ms).cmp(&Reverse(b.start_ms)))
}

/// Sorts events into display order. The sort is stable.
pub fn sort_for_display(events: &mut [ClippedEvent]) {
    events.sort_by(display_cmp);
}
