//! Shared utilities for CLI commands.

use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context;
use calface_core::{RawEvent, Window};
use chrono::{DateTime, Duration, FixedOffset, Local, SecondsFormat, Utc};
use regex::Regex;
use serde::Deserialize;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").unwrap());

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Parse a datetime string as either ISO 8601 or relative time.
///
/// Supports:
/// - ISO 8601: "2026-01-15T10:30:00+02:00" (the given offset is kept)
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
///   (resolved in the system's local time zone)
pub fn parse_datetime(s: &str) -> anyhow::Result<DateTime<FixedOffset>> {
    // Try ISO 8601 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }

    // Try relative time: "N hours/minutes/days/weeks ago"
    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid datetime: {s}. Use ISO 8601 (e.g., 2026-01-15T10:30:00Z) or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    // Safe to create Duration now that we've validated the range
    let duration = Duration::minutes(n * minutes_per_unit);
    Ok((Local::now() - duration).fixed_offset())
}

/// Resolves an optional `--at` argument, defaulting to the local time now.
pub fn resolve_at(at: Option<&str>) -> anyhow::Result<DateTime<FixedOffset>> {
    at.map_or_else(|| Ok(Local::now().fixed_offset()), parse_datetime)
}

/// One event as written in an events file.
#[derive(Debug, Deserialize)]
struct EventInput {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    color: u32,
}

impl EventInput {
    fn into_raw(self) -> RawEvent {
        let start = self.start.timestamp_millis();
        let end = self.end.timestamp_millis();
        RawEvent::new(start, end, self.color)
    }
}

/// Reads a JSON array of events.
pub fn load_events(path: &Path) -> anyhow::Result<Vec<RawEvent>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read events file {}", path.display()))?;
    let inputs: Vec<EventInput> = serde_json::from_str(&content)
        .with_context(|| format!("invalid events file {}", path.display()))?;

    Ok(inputs.into_iter().map(EventInput::into_raw).collect())
}

/// Formats local-timebase milliseconds with a chrono format string.
pub fn format_local(ms: i64, fmt: &str) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms).map_or_else(
        || ms.to_string(),
        |dt| dt.naive_utc().format(fmt).to_string(),
    )
}

/// Returns the window's UTC offset, if it is a valid one.
pub fn window_offset(window: &Window) -> Option<FixedOffset> {
    i32::try_from(window.utc_offset_ms / 1000)
        .ok()
        .and_then(FixedOffset::east_opt)
}

/// Writes the `window ...` line shared by several commands.
pub fn write_window_line<W: Write>(out: &mut W, window: &Window) -> std::io::Result<()> {
    let start = window.local_start_ms();
    let end = start + (window.end_ms - window.start_ms);
    let offset = window_offset(window).map_or_else(String::new, |o| format!(" ({o})"));
    writeln!(
        out,
        "window {} .. {}{offset}",
        format_local(start, "%Y-%m-%d %H:%M"),
        format_local(end, "%H:%M"),
    )
}

/// Formats absolute milliseconds as an RFC 3339 UTC timestamp.
pub fn format_utc(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms).map_or_else(
        || ms.to_string(),
        |dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}
