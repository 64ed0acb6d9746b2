//! Refresh pipeline: fetch, clip, order, lay out, publish.
//!
//! A [`RefreshPipeline`] owns everything one watch face needs to keep its
//! layout current: the calendar source, a clock, the layout settings, a flag
//! allowing one computation at a time, and the published [`Snapshot`].
//!
//! Work runs on Tokio's blocking pool so the solver never stalls the caller.
//! Each computation builds a fresh snapshot and replaces the published one in
//! a single step, so readers always see a complete layout.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::event::RawEvent;
use crate::layout::{Engine, LayoutConfig, LayoutOutcome, compute_layout};
use crate::order::sort_for_display;
use crate::window::{Window, clip_events};

/// Errors reported by a calendar source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The user has not granted calendar access.
    #[error("calendar access not granted")]
    PermissionDenied,

    /// The calendar could not be queried.
    #[error("calendar unavailable: {0}")]
    Unavailable(String),
}

/// Supplies raw calendar events for a window.
pub trait EventSource: Send + Sync + 'static {
    /// Returns events that may intersect `window`. Extra events are fine;
    /// clipping removes anything not visible.
    fn fetch(&self, window: &Window) -> Result<Vec<RawEvent>, SourceError>;
}

/// Supplies the current local time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The system clock in the system's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// One published layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Increments with every publication. Zero before the first refresh.
    pub generation: u64,
    /// Window the layout was computed for. `None` before the first refresh.
    pub window: Option<Window>,
    pub outcome: LayoutOutcome,
}

impl Snapshot {
    fn initial(engine: Engine) -> Self {
        Self {
            generation: 0,
            window: None,
            outcome: LayoutOutcome::empty(engine),
        }
    }
}

/// Keeps a watch face's layout current.
pub struct RefreshPipeline<S, C = SystemClock> {
    inner: Arc<Inner<S, C>>,
}

impl<S, C> Clone for RefreshPipeline<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S, C> {
    source: S,
    clock: C,
    config: LayoutConfig,
    in_flight: AtomicBool,
    generation: AtomicU64,
    published: watch::Sender<Arc<Snapshot>>,
}

/// Clears the in-flight flag when a refresh ends, including by panic.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: EventSource, C: Clock> RefreshPipeline<S, C> {
    pub fn new(source: S, clock: C, config: LayoutConfig) -> Self {
        let (published, _) = watch::channel(Arc::new(Snapshot::initial(config.primary)));
        Self {
            inner: Arc::new(Inner {
                source,
                clock,
                config,
                in_flight: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                published,
            }),
        }
    }

    /// Returns the most recently published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.inner.published.borrow())
    }

    /// Returns a receiver notified on every publication.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.inner.published.subscribe()
    }

    /// Window for the clock's current local hour.
    pub fn current_window(&self) -> Window {
        Window::for_local_time(&self.inner.clock.now())
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Starts a refresh unless one is already running.
    ///
    /// Returns `None` when a refresh is in flight; the request is dropped, not
    /// queued. Must be called from within a Tokio runtime.
    pub fn request_refresh(&self) -> Option<JoinHandle<()>> {
        if self
            .inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("refresh already in flight, request dropped");
            return None;
        }

        let inner = Arc::clone(&self.inner);
        Some(tokio::task::spawn_blocking(move || {
            let _guard = InFlightGuard(&inner.in_flight);
            inner.refresh();
        }))
    }

    /// Refreshes if the local hour moved since the last publication.
    pub fn on_tick(&self) -> Option<JoinHandle<()>> {
        let window = self.current_window();
        if self.snapshot().window == Some(window) {
            return None;
        }
        tracing::debug!(window_start_ms = window.start_ms, "display window changed");
        self.request_refresh()
    }

    /// Drives refreshes until `changes` closes.
    ///
    /// Every `period` the window is checked for an hour change; every message
    /// on `changes` (a calendar change notification) requests a refresh.
    pub async fn run(&self, mut changes: mpsc::Receiver<()>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.on_tick();
                }
                change = changes.recv() => {
                    if change.is_none() {
                        tracing::debug!("change channel closed, stopping refresh loop");
                        break;
                    }
                    self.request_refresh();
                }
            }
        }
    }
}

impl<S: EventSource, C: Clock> Inner<S, C> {
    fn refresh(&self) {
        let window = Window::for_local_time(&self.clock.now());

        let raw = match self.source.fetch(&window) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "calendar fetch failed, keeping previous layout");
                return;
            }
        };

        let mut events = clip_events(&raw, &window);
        sort_for_display(&mut events);
        let outcome = compute_layout(&events, &self.config);

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(
            generation,
            events = outcome.result.events.len(),
            engine = %outcome.engine,
            fell_back = outcome.fell_back,
            "published layout"
        );

        self.published.send_replace(Arc::new(Snapshot {
            generation,
            window: Some(window),
            outcome,
        }));
    }
}
