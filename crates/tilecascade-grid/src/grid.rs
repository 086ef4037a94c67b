#![forbid(unsafe_code)]

//! The tile grid: layout subscription, tile arena, and cascade driver in
//! one owner.
//!
//! [`TileGrid`] is the scope that everything else lives in. It mounts one
//! [`Tile`] per cell of the current [`GridLayout`], remounts them when a
//! debounced resize changes the tile count, and exposes `cascade`/`reset`
//! through [`CascadeControl`].
//!
//! The grid also holds the displayable [`GridContent`]: one front payload
//! that every tile shows clipped to its own background offset, and an
//! optional back payload. The engine never looks inside either; a host
//! reads them back through [`TileGrid::front`] and [`TileGrid::back`] when
//! drawing, and paints a plain surface when there is no back payload. Dropping the grid (or calling
//! [`TileGrid::teardown`]) unsubscribes from resizes, clears pending cascade
//! steps, and unmounts every tile.
//!
//! # Usage
//!
//! ```
//! use std::rc::Rc;
//! use std::time::Duration;
//! use tilecascade_core::geometry::Viewport;
//! use tilecascade_core::motion::FixedMotion;
//! use tilecascade_grid::{CascadeControl, Face, GridConfig, TileGrid, TileHandle};
//!
//! let config = GridConfig::default().with_seed(7);
//! let mut grid = TileGrid::new(config, Viewport::new(1800.0, 900.0), Rc::new(FixedMotion::FULL));
//! assert_eq!(grid.tile_count(), 50);
//!
//! grid.cascade();
//! grid.advance(Duration::from_secs(3));
//! assert!(grid.tiles().all(|tile| tile.visible_face() == Face::Back));
//!
//! grid.reset();
//! grid.advance(Duration::from_secs(1));
//! assert!(grid.tiles().all(|tile| tile.visible_face() == Face::Front));
//! ```

use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use rand_pcg::Pcg64Mcg;
use tilecascade_core::geometry::Viewport;
use tilecascade_core::motion::MotionPreference;

use crate::cascade::{CascadeConfig, CascadeControl, CascadeOrchestrator};
use crate::layout::{GridLayout, LayoutConfig, TileId};
use crate::registry::TileRegistry;
use crate::tile::{Tile, TileConfig, TileHandle};
use crate::viewport::{LayoutChange, ViewportWatcher};

/// Complete grid configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridConfig {
    pub layout: LayoutConfig,
    pub tile: TileConfig,
    pub cascade: CascadeConfig,
    /// Seed for cascade randomness. `None` draws a fresh seed.
    pub seed: Option<u64>,
}

impl GridConfig {
    /// Set the layout configuration.
    #[must_use]
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Set the tile configuration.
    #[must_use]
    pub fn with_tile(mut self, tile: TileConfig) -> Self {
        self.tile = tile;
        self
    }

    /// Set the cascade configuration.
    #[must_use]
    pub fn with_cascade(mut self, cascade: CascadeConfig) -> Self {
        self.cascade = cascade;
        self
    }

    /// Make cascades reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Displayable payloads shared by every tile of a grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridContent<F, B = ()> {
    /// Shown on every front face, offset per tile.
    pub front: F,
    /// Shown on every back face. `None` means a plain surface.
    pub back: Option<B>,
}

impl<F, B> GridContent<F, B> {
    /// Content with a front payload and no back payload.
    pub fn new(front: F) -> Self {
        Self { front, back: None }
    }

    /// Set the back payload.
    #[must_use]
    pub fn with_back(mut self, back: B) -> Self {
        self.back = Some(back);
        self
    }
}

/// A viewport-filling grid of flippable tiles.
///
/// `F` and `B` are the front and back payloads; both default to `()` for
/// hosts that draw without content.
pub struct TileGrid<F = (), B = ()> {
    content: GridContent<F, B>,
    tile_config: TileConfig,
    watcher: ViewportWatcher,
    registry: TileRegistry<Tile>,
    orchestrator: CascadeOrchestrator<Pcg64Mcg>,
    motion: Rc<dyn MotionPreference>,
    torn_down: bool,
}

impl<F, B> fmt::Debug for TileGrid<F, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileGrid")
            .field("layout", &self.layout())
            .field("has_back", &self.content.back.is_some())
            .field("tiles", &self.registry.len())
            .field("pending_steps", &self.orchestrator.pending_steps())
            .field("torn_down", &self.torn_down)
            .finish()
    }
}

impl TileGrid {
    /// Build a content-less grid for the current viewport snapshot.
    pub fn new(config: GridConfig, snapshot: Viewport, motion: Rc<dyn MotionPreference>) -> Self {
        Self::with_content(config, snapshot, motion, GridContent::default())
    }
}

impl<F, B> TileGrid<F, B> {
    /// Build a grid showing `content` and mount its tiles.
    pub fn with_content(
        config: GridConfig,
        snapshot: Viewport,
        motion: Rc<dyn MotionPreference>,
        content: GridContent<F, B>,
    ) -> Self {
        let normalized = config.layout.normalized();
        if normalized != config.layout {
            tilecascade_core::warn!(
                requested = ?config.layout,
                using = ?normalized,
                "layout config adjusted"
            );
        }
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut grid = Self {
            content,
            tile_config: config.tile.normalized(),
            watcher: ViewportWatcher::new(config.layout, snapshot),
            registry: TileRegistry::new(),
            orchestrator: CascadeOrchestrator::seeded(config.cascade, seed),
            motion,
            torn_down: false,
        };
        grid.mount_all();
        grid
    }

    /// Front payload shared by every tile.
    pub fn front(&self) -> &F {
        &self.content.front
    }

    /// Back payload, if one was supplied.
    pub fn back(&self) -> Option<&B> {
        self.content.back.as_ref()
    }

    /// Replace the back payload, returning the previous one.
    pub fn set_back(&mut self, back: Option<B>) -> Option<B> {
        std::mem::replace(&mut self.content.back, back)
    }

    /// Layout in effect.
    pub fn layout(&self) -> GridLayout {
        self.watcher.layout()
    }

    /// Viewport the layout was computed from.
    pub fn viewport(&self) -> Viewport {
        self.watcher.viewport()
    }

    /// Number of mounted tiles.
    pub fn tile_count(&self) -> usize {
        self.registry.len()
    }

    /// Tile `id`, if mounted.
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.registry.get(id)
    }

    /// Mutable tile `id`, if mounted.
    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.registry.get_mut(id)
    }

    /// Mounted tiles in id order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.registry.iter().map(|(_, tile)| tile)
    }

    /// Registry backing the grid.
    pub fn registry(&self) -> &TileRegistry<Tile> {
        &self.registry
    }

    /// Cascade steps still waiting for their delay.
    pub fn pending_cascade_steps(&self) -> usize {
        self.orchestrator.pending_steps()
    }

    /// Virtual time elapsed through [`TileGrid::advance`].
    pub fn now(&self) -> Duration {
        self.orchestrator.now()
    }

    /// Whether the grid has been torn down.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Tile under the viewport point `(x, y)`.
    pub fn tile_at(&self, x: f64, y: f64) -> Option<TileId> {
        self.layout().tile_at(self.viewport(), x, y)
    }

    /// Pointer moved onto the tile at `(x, y)`.
    pub fn pointer_enter(&mut self, x: f64, y: f64) -> Option<TileId> {
        let id = self.tile_at(x, y)?;
        self.registry.get_mut(id)?.pointer_enter();
        Some(id)
    }

    /// Click or keyboard activation of tile `id`.
    pub fn activate(&mut self, id: TileId) {
        if let Some(tile) = self.registry.get_mut(id) {
            tile.activate();
        }
    }

    /// Report a raw viewport resize.
    pub fn handle_resize(&mut self, viewport: Viewport, now: Instant) -> Option<LayoutChange> {
        let change = self.watcher.handle_resize(viewport, now)?;
        self.apply_layout_change(&change);
        Some(change)
    }

    /// Apply a resize whose debounce window has elapsed.
    pub fn poll_resize(&mut self, now: Instant) -> Option<LayoutChange> {
        let change = self.watcher.poll(now)?;
        self.apply_layout_change(&change);
        Some(change)
    }

    /// Advance tile animations, auto-reverse countdowns, and cascade steps.
    pub fn advance(&mut self, dt: Duration) {
        self.orchestrator.advance(dt, &mut self.registry);
    }

    /// Flip every tile to back in random order with random timing.
    ///
    /// Returns the number of steps scheduled.
    pub fn cascade_flip(&mut self) -> usize {
        self.orchestrator.cascade_flip(&self.registry).len()
    }

    /// Flip every back-showing tile to front. Returns how many were
    /// commanded.
    pub fn flip_all_to_front(&mut self) -> usize {
        self.orchestrator.flip_all_to_front(&mut self.registry)
    }

    /// Unsubscribe, cancel pending cascade steps, and unmount every tile.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        tilecascade_core::info!(
            tiles = self.registry.len(),
            dropped_steps = self.orchestrator.pending_steps(),
            "grid torn down"
        );
        self.watcher.unsubscribe();
        self.orchestrator.clear();
        self.registry.clear();
    }

    fn apply_layout_change(&mut self, change: &LayoutChange) {
        let span = tilecascade_core::debug_span!(
            "layout_change",
            columns = change.layout.columns,
            rows = change.layout.rows
        );
        let _guard = span.enter();
        if change.remount_required() {
            self.registry.clear();
            self.mount_all();
        } else if change.is_reshape() {
            let layout = change.layout;
            for (id, tile) in self.registry.iter_mut() {
                if let Some(placement) = layout.placement(id) {
                    tile.set_placement(placement);
                }
            }
        }
    }

    fn mount_all(&mut self) {
        let layout = self.watcher.layout();
        for placement in layout.placements() {
            let tile = Tile::new(placement, self.tile_config.clone(), Rc::clone(&self.motion));
            self.registry.register(placement.id, tile);
        }
        tilecascade_core::debug!(
            columns = layout.columns,
            rows = layout.rows,
            tiles = self.registry.len(),
            "tiles mounted"
        );
    }
}

impl<F, B> CascadeControl for TileGrid<F, B> {
    fn cascade(&mut self) {
        self.cascade_flip();
    }

    fn reset(&mut self) {
        self.flip_all_to_front();
    }
}

impl<F, B> Drop for TileGrid<F, B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
