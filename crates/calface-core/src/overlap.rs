//! The overlap test shared by both layout engines and the sanity pass.

/// Anything with a start and end instant in milliseconds.
pub trait TimeSpan {
    /// Returns the start instant.
    fn start_ms(&self) -> i64;

    /// Returns the end instant.
    fn end_ms(&self) -> i64;
}

/// Returns true if the two intervals intersect.
///
/// The comparison is strict: intervals that only touch at an endpoint
/// (one ends exactly when the other starts) do not overlap.
pub fn overlaps<A, B>(a: &A, b: &B) -> bool
where
    A: TimeSpan + ?Sized,
    B: TimeSpan + ?Sized,
{
    a.start_ms() < b.end_ms() && b.start_ms() < a.end_ms()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ClippedEvent;

    fn span(start: i64, end: i64) -> ClippedEvent {
        ClippedEvent::new(start, end, 0)
    }

    #[test]
    fn partial_overlap_is_symmetric() {
        let a = span(0, 60);
        let b = span(30, 90);
        assert!(overlaps(&a, &b));
        assert!(overlaps(&b, &a));
    }

    #[test]
    fn touching_endpoints_do_not_overlap() {
        let a = span(0, 60);
        let b = span(60, 120);
        assert!(!overlaps(&a, &b));
        assert!(!overlaps(&b, &a));
    }

    #[test]
    fn containment_overlaps() {
        assert!(overlaps(&span(0, 100), &span(10, 20)));
    }

    #[test]
    fn disjoint_spans_do_not_overlap() {
        assert!(!overlaps(&span(0, 10), &span(20, 30)));
    }

    #[test]
    fn identical_spans_overlap() {
        assert!(overlaps(&span(5, 10), &span(5, 10)));
    }
}
