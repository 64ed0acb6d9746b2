//! Layout command: clip and lay out an events file for one window.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use calface_core::{
    Engine, LayoutConfig, LayoutOutcome, LeveledEvent, Violation, Wedge, Window, clip_events,
    compute_layout, sort_for_display,
};
use serde::Serialize;

use super::util::{format_local, load_events, resolve_at, write_window_line};

/// JSON output for one laid-out event.
#[derive(Debug, Serialize)]
struct EventReport<'a> {
    #[serde(flatten)]
    event: &'a LeveledEvent,
    wedge: Wedge,
}

/// JSON output for the layout command.
#[derive(Debug, Serialize)]
struct LayoutReport<'a> {
    window: &'a Window,
    engine: Engine,
    fell_back: bool,
    max_level: u32,
    events: Vec<EventReport<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    violations: Option<&'a [Violation]>,
}

/// Runs the layout command.
pub fn run<W: Write>(
    out: &mut W,
    input: &Path,
    at: Option<&str>,
    engine: Option<Engine>,
    json: bool,
    config: &LayoutConfig,
) -> Result<()> {
    let raw = load_events(input)?;
    let now = resolve_at(at)?;
    let window = Window::for_local_time(&now);

    let mut events = clip_events(&raw, &window);
    sort_for_display(&mut events);

    let config = LayoutConfig {
        primary: engine.unwrap_or(config.primary),
        ..*config
    };
    let outcome = compute_layout(&events, &config);

    if json {
        write_json(out, &window, &outcome)
    } else {
        write_text(out, &window, &outcome)
    }
}

/// Writes a layout as JSON.
pub fn write_json<W: Write>(out: &mut W, window: &Window, outcome: &LayoutOutcome) -> Result<()> {
    let result = &outcome.result;
    let report = LayoutReport {
        window,
        engine: outcome.engine,
        fell_back: outcome.fell_back,
        max_level: result.max_level,
        events: result
            .events
            .iter()
            .map(|event| EventReport {
                event,
                wedge: Wedge::for_event(event, result.max_level),
            })
            .collect(),
        violations: (!outcome.violations.is_empty()).then_some(outcome.violations.as_slice()),
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

/// Writes a layout as human-readable text.
pub fn write_text<W: Write>(out: &mut W, window: &Window, outcome: &LayoutOutcome) -> Result<()> {
    write_window_line(out, window)?;

    let fallback = if outcome.fell_back {
        " after solver failure"
    } else {
        ""
    };
    writeln!(
        out,
        "engine {}{fallback}, max level {}",
        outcome.engine, outcome.result.max_level
    )?;

    if outcome.result.is_empty() {
        writeln!(out, "no visible events")?;
    }

    for event in &outcome.result.events {
        writeln!(
            out,
            "{}-{} #{:08x} levels {}..{}",
            format_local(event.event.start_ms, "%H:%M"),
            format_local(event.event.end_ms, "%H:%M"),
            event.event.color,
            event.min_level,
            event.max_level,
        )?;
    }

    for violation in &outcome.violations {
        writeln!(out, "violation: {violation}")?;
    }

    Ok(())
}
