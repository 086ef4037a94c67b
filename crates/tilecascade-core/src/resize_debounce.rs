#![forbid(unsafe_code)]

//! Trailing-edge resize debouncer.
//!
//! Hosts report every raw resize with [`ResizeDebouncer::handle_resize`] and
//! poll [`ResizeDebouncer::tick`] once per frame. A size is released only
//! after `delay` has passed without another resize, so a drag that produces
//! dozens of events yields a single layout pass.
//!
//! # Invariants
//!
//! - **Latest-wins**: the final size in a burst is the one released.
//! - **Quiet window**: a release happens at most once per `delay` of
//!   inactivity; every new event restarts the window.
//! - **Deterministic**: timestamps are supplied by the caller, so identical
//!   event sequences produce identical releases.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | `delay = 0` | Every resize is released immediately |
//! | `tick` with no pending size | Returns [`DebounceAction::None`] |
//! | Timestamp earlier than the last event | Treated as zero elapsed time |

use std::time::{Duration, Instant};

use crate::geometry::Viewport;

#[inline]
fn duration_since_or_zero(now: Instant, earlier: Instant) -> Duration {
    now.checked_duration_since(earlier)
        .unwrap_or(Duration::ZERO)
}

/// Outcome of feeding or polling the debouncer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebounceAction {
    /// Nothing to apply yet.
    None,
    /// The viewport settled; apply it.
    Apply {
        viewport: Viewport,
        /// Raw resize events folded into this release.
        coalesced: u32,
        /// Time from the first event of the burst to the release.
        waited: Duration,
    },
}

impl DebounceAction {
    /// The released viewport, if any.
    pub fn viewport(&self) -> Option<Viewport> {
        match self {
            Self::None => None,
            Self::Apply { viewport, .. } => Some(*viewport),
        }
    }
}

/// Latest-wins debouncer for viewport resize streams.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    delay: Duration,
    pending: Option<Viewport>,
    window_start: Option<Instant>,
    last_event: Option<Instant>,
    events_in_window: u32,
    last_applied: Viewport,
}

impl ResizeDebouncer {
    /// Create a debouncer seeded with the current viewport snapshot.
    pub fn new(delay: Duration, initial: Viewport) -> Self {
        Self {
            delay,
            pending: None,
            window_start: None,
            last_event: None,
            events_in_window: 0,
            last_applied: initial,
        }
    }

    /// Most recently released viewport (or the initial snapshot).
    pub fn last_applied(&self) -> Viewport {
        self.last_applied
    }

    /// Whether a size is waiting for its quiet window to elapse.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Instant at which the pending size will be released if no further
    /// event arrives.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending?;
        self.last_event.map(|at| at + self.delay)
    }

    /// Record a raw resize event.
    pub fn handle_resize(&mut self, viewport: Viewport, now: Instant) -> DebounceAction {
        self.pending = Some(viewport);
        self.window_start.get_or_insert(now);
        self.last_event = Some(now);
        self.events_in_window = self.events_in_window.saturating_add(1);
        if self.delay.is_zero() {
            return self.release(now);
        }
        DebounceAction::None
    }

    /// Poll for a settled size.
    pub fn tick(&mut self, now: Instant) -> DebounceAction {
        let Some(last_event) = self.last_event else {
            return DebounceAction::None;
        };
        if self.pending.is_none() || duration_since_or_zero(now, last_event) < self.delay {
            return DebounceAction::None;
        }
        self.release(now)
    }

    /// Drop any pending size without releasing it.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.window_start = None;
        self.last_event = None;
        self.events_in_window = 0;
    }

    fn release(&mut self, now: Instant) -> DebounceAction {
        let Some(viewport) = self.pending.take() else {
            return DebounceAction::None;
        };
        let waited = self
            .window_start
            .map(|start| duration_since_or_zero(now, start))
            .unwrap_or(Duration::ZERO);
        let coalesced = self.events_in_window;
        self.window_start = None;
        self.last_event = None;
        self.events_in_window = 0;
        self.last_applied = viewport;
        DebounceAction::Apply {
            viewport,
            coalesced,
            waited,
        }
    }
}
