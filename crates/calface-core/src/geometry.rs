//! Dial geometry for laid-out events.
//!
//! Turns a leveled event into the angles and radii of the wedge drawn on a
//! 12-hour dial. Drawing itself belongs to the renderer.

use serde::{Deserialize, Serialize};

use crate::event::LeveledEvent;
use crate::window::WINDOW_MS;

/// The annular sector occupied by one event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wedge {
    /// Start angle in degrees, clockwise from 12 o'clock.
    pub start_degrees: f64,
    /// Angular extent in degrees.
    pub sweep_degrees: f64,
    /// Inner edge as a fraction of the band area radius, in `[0, 1]`.
    pub inner_fraction: f64,
    /// Outer edge as a fraction of the band area radius, in `[0, 1]`.
    pub outer_fraction: f64,
}

impl Wedge {
    /// Computes the wedge for an event in a layout with `global_max` levels.
    ///
    /// Level `n` covers radii `n / (global_max + 1)` to
    /// `(n + 1) / (global_max + 1)`, so a band `[min, max]` spans from the
    /// inner edge of `min` to the outer edge of `max`.
    #[expect(
        clippy::cast_precision_loss,
        reason = "millisecond offsets within 12 hours are exact in f64"
    )]
    pub fn for_event(event: &LeveledEvent, global_max: u32) -> Self {
        let dial = WINDOW_MS as f64;
        let offset = event.event.start_ms.rem_euclid(WINDOW_MS) as f64;
        let duration = event.event.duration_ms() as f64;

        let rings = f64::from(global_max) + 1.0;

        Self {
            start_degrees: offset / dial * 360.0,
            sweep_degrees: duration / dial * 360.0,
            inner_fraction: f64::from(event.min_level) / rings,
            outer_fraction: (f64::from(event.max_level) + 1.0) / rings,
        }
    }
}
