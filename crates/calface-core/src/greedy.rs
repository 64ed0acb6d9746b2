//! Greedy hole-finding layout.
//!
//! Events are placed one at a time in input order. Each event takes the first
//! contiguous run of levels not used by an already-placed event it overlaps.
//! When no such run exists a new top level is created, and placed events that
//! sat on the old top level (and do not overlap the new event) are widened to
//! cover it.
//!
//! This always succeeds. It is O(n²) in the usual case and can approach O(n³)
//! when many events trigger widening, which is fine for the handful of events
//! visible in a 12-hour window.

use crate::event::{ClippedEvent, LayoutResult, LeveledEvent};
use crate::overlap::overlaps;

/// Lays out events in the given order.
pub fn layout(events: &[ClippedEvent]) -> LayoutResult {
    let mut placed: Vec<LeveledEvent> = Vec::with_capacity(events.len());
    let mut max_level_anywhere: u32 = 0;

    for event in events {
        if placed.is_empty() {
            placed.push(LeveledEvent::new(*event, 0, 0));
            continue;
        }

        let forbidden = forbidden_levels(&placed, event, max_level_anywhere);

        if let Some((min_level, max_level)) = find_hole(&forbidden) {
            placed.push(LeveledEvent::new(*event, min_level, max_level));
            continue;
        }

        let new_level = max_level_anywhere + 1;
        for previous in &mut placed {
            if previous.max_level == max_level_anywhere && !overlaps(&*previous, event) {
                previous.max_level = new_level;
            }
        }
        placed.push(LeveledEvent::new(*event, new_level, new_level));
        max_level_anywhere = new_level;
    }

    tracing::debug!(
        events = placed.len(),
        max_level = max_level_anywhere,
        "greedy layout complete"
    );

    LayoutResult {
        events: placed,
        max_level: max_level_anywhere,
    }
}

/// Marks every level used by a placed event that overlaps `event`.
///
/// The returned slice has one extra entry past `max_level_anywhere`, always
/// marked, so a hole search stops there.
fn forbidden_levels(
    placed: &[LeveledEvent],
    event: &ClippedEvent,
    max_level_anywhere: u32,
) -> Vec<bool> {
    let top = max_level_anywhere as usize;
    let mut forbidden = vec![false; top + 2];

    for previous in placed.iter().filter(|p| overlaps(*p, event)) {
        for level in previous.min_level..=previous.max_level {
            forbidden[level as usize] = true;
        }
    }
    forbidden[top + 1] = true;

    forbidden
}

/// Finds the first run of free levels, as an inclusive `(min, max)` pair.
#[expect(
    clippy::cast_possible_truncation,
    reason = "level indices never exceed the number of placed events"
)]
fn find_hole(forbidden: &[bool]) -> Option<(u32, u32)> {
    let start = forbidden.iter().position(|used| !used)?;
    let len = forbidden[start..].iter().take_while(|used| !**used).count();
    Some((start as u32, (start + len - 1) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::check_invariants;

    const MIN: i64 = 60_000;

    fn event(start_min: i64, end_min: i64) -> ClippedEvent {
        ClippedEvent::new(start_min * MIN, end_min * MIN, 0)
    }

    fn bands(result: &LayoutResult) -> Vec<(u32, u32)> {
        result
            .events
            .iter()
            .map(|e| (e.min_level, e.max_level))
            .collect()
    }

    #[test]
    fn empty_input_gives_empty_layout() {
        let result = layout(&[]);
        assert!(result.events.is_empty());
        assert_eq!(result.max_level, 0);
    }

    #[test]
    fn disjoint_events_share_level_zero() {
        let events = [event(0, 30), event(30, 60), event(90, 120), event(200, 300)];
        let result = layout(&events);
        assert_eq!(bands(&result), vec![(0, 0); 4]);
        assert_eq!(result.max_level, 0);
    }

    #[test]
    fn two_overlapping_events_stack() {
        let result = layout(&[event(0, 60), event(30, 90)]);
        assert_eq!(bands(&result), vec![(0, 0), (1, 1)]);
        assert_eq!(result.max_level, 1);
    }

    #[test]
    fn three_mutually_overlapping_events_get_distinct_levels() {
        let result = layout(&[event(0, 60), event(10, 70), event(20, 80)]);
        assert_eq!(bands(&result), vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(result.max_level, 2);
    }

    #[test]
    fn free_event_fills_whole_hole() {
        let result = layout(&[event(0, 60), event(30, 90), event(100, 120)]);
        assert_eq!(bands(&result), vec![(0, 0), (1, 1), (0, 1)]);
        assert_eq!(result.max_level, 1);
    }

    #[test]
    fn hole_starts_at_first_free_level() {
        // The fourth event only overlaps the first, so level 0 is taken and the
        // hole is level 1 (level 2 does not exist yet).
        let events = [event(0, 60), event(30, 90), event(200, 260), event(0, 10)];
        let result = layout(&events);
        assert_eq!(bands(&result), vec![(0, 0), (1, 1), (0, 1), (1, 1)]);
    }

    #[test]
    fn new_level_widens_non_overlapping_top_events() {
        let events = [
            event(0, 60),
            event(100, 200),
            event(50, 150),
            event(300, 400),
            event(120, 130),
        ];
        let result = layout(&events);
        let expected = vec![(0, 0), (0, 0), (1, 1), (0, 2), (2, 2)];
        assert_eq!(bands(&result), expected);
        assert_eq!(result.max_level, 2);
    }

    #[test]
    fn overlapping_events_are_not_widened() {
        let result = layout(&[event(0, 100), event(10, 20), event(15, 90)]);
        // The first event overlaps both others and must stay on level 0.
        assert_eq!(bands(&result), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn random_layouts_hold_invariants() {
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut next = move |bound: i64| {
            seed = seed
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            i64::try_from((seed >> 33) % u64::try_from(bound).unwrap()).unwrap()
        };

        for _ in 0..200 {
            let count = next(15) + 1;
            let events: Vec<_> = (0..count)
                .map(|_| {
                    let start = next(700);
                    event(start, start + next(180) + 1)
                })
                .collect();

            let result = layout(&events);
            assert_eq!(result.events.len(), events.len());
            assert!(check_invariants(&result).is_empty(), "{events:?}");
        }
    }
}
