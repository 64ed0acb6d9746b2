//! Core layout engine for a calendar watch face.
//!
//! This crate turns calendar events into bands on a 12-hour dial:
//! - Window: clipping events to the rolling 12-hour display window
//! - Layout: assigning each event a band of levels so overlapping events
//!   never share one, with a constraint solver and a greedy fallback
//! - Refresh: running clip and layout off the render path and publishing
//!   each result as one immutable snapshot

pub mod constraint;
mod event;
pub mod geometry;
pub mod greedy;
pub mod layout;
pub mod order;
mod overlap;
pub mod refresh;
mod window;

pub use constraint::{ConstraintEngine, ConstraintError, DEFAULT_MAX_LEVEL};
pub use event::{ClippedEvent, LayoutResult, LeveledEvent, RawEvent};
pub use geometry::Wedge;
pub use layout::{
    Engine, FailurePolicy, LayoutConfig, LayoutEngine, LayoutOutcome, Orchestrator, Violation,
    check_invariants, compute_layout,
};
pub use order::sort_for_display;
pub use overlap::{TimeSpan, overlaps};
pub use refresh::{Clock, EventSource, RefreshPipeline, Snapshot, SourceError, SystemClock};
pub use window::{HOUR_MS, WINDOW_MS, Window, clip_events};
