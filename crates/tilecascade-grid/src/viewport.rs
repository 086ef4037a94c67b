#![forbid(unsafe_code)]

//! Viewport subscription feeding the layout calculator.
//!
//! [`ViewportWatcher`] turns a raw resize stream into debounced layout
//! changes. The first layout is computed synchronously from the snapshot
//! passed to [`ViewportWatcher::new`], so a grid never waits for a resize
//! event to mount its tiles.
//!
//! Unsubscribing (explicitly, or by dropping the owner) discards any pending
//! size and makes every later event a no-op, so nothing is ever applied to a
//! torn-down layout.

use std::time::Instant;

use tilecascade_core::geometry::Viewport;
use tilecascade_core::resize_debounce::{DebounceAction, ResizeDebouncer};

use crate::layout::{GridLayout, LayoutConfig};

/// A settled resize and the layout it produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutChange {
    pub previous: GridLayout,
    pub layout: GridLayout,
    pub viewport: Viewport,
    /// Raw events folded into this change.
    pub coalesced: u32,
}

impl LayoutChange {
    /// Whether the tile count changed, which requires a full remount.
    pub fn remount_required(&self) -> bool {
        self.previous.tile_count() != self.layout.tile_count()
    }

    /// Whether the grid shape changed at all.
    pub fn is_reshape(&self) -> bool {
        self.previous != self.layout
    }
}

/// Debounced viewport-to-layout subscription.
#[derive(Debug, Clone)]
pub struct ViewportWatcher {
    config: LayoutConfig,
    debouncer: ResizeDebouncer,
    layout: GridLayout,
    subscribed: bool,
}

impl ViewportWatcher {
    /// Subscribe with the current viewport snapshot.
    pub fn new(config: LayoutConfig, snapshot: Viewport) -> Self {
        let snapshot = snapshot.sanitized();
        let layout = config.layout_for(snapshot);
        Self {
            debouncer: ResizeDebouncer::new(config.debounce, snapshot),
            config,
            layout,
            subscribed: true,
        }
    }

    /// Layout currently in effect.
    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    /// Viewport the current layout was computed from.
    pub fn viewport(&self) -> Viewport {
        self.debouncer.last_applied()
    }

    /// Layout configuration.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Whether events are still being accepted.
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Whether a resize is waiting out its debounce window.
    pub fn has_pending(&self) -> bool {
        self.debouncer.has_pending()
    }

    /// When the pending resize will settle.
    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Report a raw resize. With a zero debounce the change applies at once.
    pub fn handle_resize(&mut self, viewport: Viewport, now: Instant) -> Option<LayoutChange> {
        if !self.subscribed {
            return None;
        }
        let action = self.debouncer.handle_resize(viewport.sanitized(), now);
        self.apply(action)
    }

    /// Poll for a settled resize.
    pub fn poll(&mut self, now: Instant) -> Option<LayoutChange> {
        if !self.subscribed {
            return None;
        }
        let action = self.debouncer.tick(now);
        self.apply(action)
    }

    /// Stop listening. Pending sizes are discarded.
    pub fn unsubscribe(&mut self) {
        self.subscribed = false;
        self.debouncer.cancel();
    }

    fn apply(&mut self, action: DebounceAction) -> Option<LayoutChange> {
        let DebounceAction::Apply {
            viewport,
            coalesced,
            ..
        } = action
        else {
            return None;
        };
        let previous = self.layout;
        self.layout = self.config.layout_for(viewport);
        if previous != self.layout {
            tilecascade_core::debug!(
                columns = self.layout.columns,
                rows = self.layout.rows,
                coalesced,
                "grid layout changed"
            );
        }
        Some(LayoutChange {
            previous,
            layout: self.layout,
            viewport,
            coalesced,
        })
    }
}

impl Drop for ViewportWatcher {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const DEBOUNCE: Duration = Duration::from_millis(150);

    #[test]
    fn initial_layout_is_synchronous() {
        let w = ViewportWatcher::new(LayoutConfig::default(), Viewport::new(1800.0, 900.0));
        assert_eq!(w.layout(), GridLayout::new(10, 5));
        assert!(!w.has_pending());
    }

    #[test]
    fn resize_applies_after_debounce() {
        let t0 = Instant::now();
        let mut w = ViewportWatcher::new(LayoutConfig::default(), Viewport::new(800.0, 600.0));
        assert!(w.handle_resize(Viewport::new(1800.0, 900.0), t0).is_none());
        assert!(w.poll(t0 + DEBOUNCE / 2).is_none());
        assert_eq!(w.layout(), GridLayout::new(4, 3));
        let change = w.poll(t0 + DEBOUNCE).unwrap();
        assert_eq!(change.previous, GridLayout::new(4, 3));
        assert_eq!(change.layout, GridLayout::new(10, 5));
        assert!(change.remount_required());
        assert_eq!(w.viewport(), Viewport::new(1800.0, 900.0));
    }

    #[test]
    fn same_count_reshape_does_not_require_remount() {
        let config = LayoutConfig::default().with_debounce(Duration::ZERO);
        // 6x4 and 4x6 both hold 24 tiles.
        let mut w = ViewportWatcher::new(config, Viewport::new(1080.0, 720.0));
        assert_eq!(w.layout(), GridLayout::new(6, 4));
        let change = w
            .handle_resize(Viewport::new(720.0, 1080.0), Instant::now())
            .unwrap();
        assert_eq!(change.layout, GridLayout::new(4, 6));
        assert!(change.is_reshape());
        assert!(!change.remount_required());
    }

    #[test]
    fn unchanged_layout_still_reports() {
        let t0 = Instant::now();
        let mut w = ViewportWatcher::new(LayoutConfig::default(), Viewport::new(800.0, 600.0));
        w.handle_resize(Viewport::new(805.0, 610.0), t0);
        let change = w.poll(t0 + DEBOUNCE).unwrap();
        assert!(!change.is_reshape());
    }

    #[test]
    fn unsubscribe_discards_pending() {
        let t0 = Instant::now();
        let mut w = ViewportWatcher::new(LayoutConfig::default(), Viewport::new(800.0, 600.0));
        w.handle_resize(Viewport::new(1800.0, 900.0), t0);
        w.unsubscribe();
        assert!(w.poll(t0 + DEBOUNCE * 2).is_none());
        assert!(w.handle_resize(Viewport::new(1800.0, 900.0), t0).is_none());
        assert_eq!(w.layout(), GridLayout::new(4, 3));
        assert!(!w.is_subscribed());
    }

    #[test]
    fn malformed_snapshot_is_sanitized() {
        let w = ViewportWatcher::new(LayoutConfig::default(), Viewport::new(f64::NAN, -1.0));
        assert_eq!(w.layout(), GridLayout::new(4, 3));
        assert_eq!(w.viewport(), Viewport::new(0.0, 0.0));
    }
}
