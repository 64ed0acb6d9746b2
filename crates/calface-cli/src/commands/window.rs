//! Window command: show which 12 hours the dial covers.

use std::io::Write;

use anyhow::Result;
use calface_core::Window;

use super::util::{format_utc, resolve_at, write_window_line};

/// Runs the window command.
pub fn run<W: Write>(out: &mut W, at: Option<&str>) -> Result<()> {
    let now = resolve_at(at)?;
    let window = Window::for_local_time(&now);

    write_window_line(out, &window)?;
    writeln!(
        out,
        "utc {} .. {}",
        format_utc(window.start_ms),
        format_utc(window.end_ms)
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn window_for_half_hour_offset() {
        let mut output = Vec::new();
        run(&mut output, Some("2025-03-10T23:45:00+05:30")).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        window 2025-03-10 23:00 .. 11:00 (+05:30)
        utc 2025-03-10T17:30:00Z .. 2025-03-11T05:30:00Z
        ");
    }
}
