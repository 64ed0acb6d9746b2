//! Watch command: keep a layout current for an events file.
//!
//! Stands in for the watch face: the events file plays the calendar, a
//! modification-time poll plays the calendar-changed notification, and each
//! published layout is printed as text.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use calface_core::{EventSource, RawEvent, RefreshPipeline, SourceError, SystemClock, Window};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::layout::write_text;
use super::util::load_events;
use crate::Config;

/// How often the events file is checked for modification.
const FILE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Calendar source backed by a JSON events file, re-read on every fetch.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl EventSource for FileSource {
    fn fetch(&self, _window: &Window) -> Result<Vec<RawEvent>, SourceError> {
        load_events(&self.path).map_err(|err| SourceError::Unavailable(format!("{err:#}")))
    }
}

/// Runs the watch command until interrupted.
pub fn run(input: &Path, config: &Config) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(watch(input.to_path_buf(), config))
}

async fn watch(input: PathBuf, config: &Config) -> Result<()> {
    let source = FileSource::new(input.clone());
    let pipeline = RefreshPipeline::new(source, SystemClock, config.layout);
    let mut updates = pipeline.subscribe();
    let (changes, receiver) = mpsc::channel(1);

    let period = Duration::from_secs(config.tick_secs.max(1));
    let runner = tokio::spawn({
        let pipeline = pipeline.clone();
        async move { pipeline.run(receiver, period).await }
    });
    let last_modified = modified(&input);
    tokio::spawn(poll_file(input, last_modified, changes));

    let mut stdout = std::io::stdout();
    while updates.changed().await.is_ok() {
        let snapshot = Arc::clone(&*updates.borrow_and_update());
        if let Some(window) = snapshot.window {
            write_text(&mut stdout, &window, &snapshot.outcome)?;
            writeln!(stdout)?;
            stdout.flush()?;
        }
    }

    runner.await.context("refresh loop panicked")?;
    Ok(())
}

/// Signals `changes` whenever the file's modification time moves away from
/// `last_modified`.
async fn poll_file(
    path: PathBuf,
    mut last_modified: Option<SystemTime>,
    changes: mpsc::Sender<()>,
) {
    let mut ticker = tokio::time::interval(FILE_POLL_INTERVAL);

    loop {
        ticker.tick().await;
        let current = modified(&path);
        if current == last_modified {
            continue;
        }
        last_modified = current;
        tracing::debug!(path = %path.display(), "events file changed");

        match changes.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Closed(())) => break,
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_source_reports_missing_file() {
        let temp = tempfile::tempdir().unwrap();
        let source = FileSource::new(temp.path().join("missing.json"));

        let err = source.fetch(&Window::new(0, 0)).unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
        assert!(err.to_string().contains("failed to read events file"));
    }

    #[tokio::test]
    async fn file_change_is_signalled() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("events.json");
        let (changes, mut receiver) = mpsc::channel(1);

        let poller = tokio::spawn(poll_file(path.clone(), None, changes));
        std::fs::write(&path, "[]").unwrap();

        assert_eq!(receiver.recv().await, Some(()));
        drop(receiver);
        poller.abort();
    }
}
