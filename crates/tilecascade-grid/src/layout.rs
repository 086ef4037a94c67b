#![forbid(unsafe_code)]

//! Grid layout calculator.
//!
//! Derives a `columns x rows` grid from the viewport so every tile is roughly
//! `target_tile_px` on a side. Tiles come out rectangular whenever the
//! viewport aspect ratio differs from the grid's, which is intended.
//!
//! # Invariants
//!
//! 1. `min_columns <= columns <= max_columns` and `min_rows <= rows <= max_rows`
//!    for every input, including NaN, negative, and infinite sizes.
//! 2. The calculation is pure: identical inputs give identical layouts.
//! 3. Tile ids enumerate the grid row-major: `col = id % columns`,
//!    `row = id / columns`.

use std::fmt;
use std::time::Duration;

use tilecascade_core::geometry::Viewport;

/// Stable index of a tile within one grid instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub usize);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile#{}", self.0)
    }
}

/// Grid dimensions derived from the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
}

impl GridLayout {
    /// Create a layout. Zero dimensions are raised to one.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns: columns.max(1),
            rows: rows.max(1),
        }
    }

    /// Number of tiles in the grid.
    pub fn tile_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Placement of tile `id`, or `None` if it lies outside the grid.
    pub fn placement(&self, id: TileId) -> Option<TilePlacement> {
        if id.0 >= self.tile_count() {
            return None;
        }
        let columns = self.columns as usize;
        Some(TilePlacement {
            id,
            col: (id.0 % columns) as u32,
            row: (id.0 / columns) as u32,
        })
    }

    /// Every placement in id order.
    pub fn placements(&self) -> impl Iterator<Item = TilePlacement> + '_ {
        (0..self.tile_count()).filter_map(|i| self.placement(TileId(i)))
    }

    /// Tile under the point `(x, y)` of `viewport`.
    pub fn tile_at(&self, viewport: Viewport, x: f64, y: f64) -> Option<TileId> {
        if self.columns == 0 || self.rows == 0 || !viewport.contains(x, y) {
            return None;
        }
        let col = ((x / viewport.width) * f64::from(self.columns)).floor() as u32;
        let row = ((y / viewport.height) * f64::from(self.rows)).floor() as u32;
        let col = col.min(self.columns.saturating_sub(1));
        let row = row.min(self.rows.saturating_sub(1));
        Some(TileId(row as usize * self.columns as usize + col as usize))
    }
}

/// Position of one tile inside its grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilePlacement {
    pub id: TileId,
    pub col: u32,
    pub row: u32,
}

/// Axis-aligned bounds in viewport units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl TilePlacement {
    /// Fraction of the shared background this tile's front face starts at.
    ///
    /// The front content is shifted by this fraction of the viewport so the
    /// tiles together show one seamless image.
    pub fn background_offset(&self, layout: GridLayout) -> (f64, f64) {
        (
            f64::from(self.col) / f64::from(layout.columns),
            f64::from(self.row) / f64::from(layout.rows),
        )
    }

    /// Fraction of the background covered by one tile.
    pub fn extent(layout: GridLayout) -> (f64, f64) {
        (1.0 / f64::from(layout.columns), 1.0 / f64::from(layout.rows))
    }

    /// Bounds of this tile in `viewport` units.
    pub fn bounds(&self, layout: GridLayout, viewport: Viewport) -> TileBounds {
        let (fx, fy) = self.background_offset(layout);
        let (fw, fh) = Self::extent(layout);
        TileBounds {
            x: fx * viewport.width,
            y: fy * viewport.height,
            width: fw * viewport.width,
            height: fh * viewport.height,
        }
    }
}

/// Layout configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Preferred tile edge length in viewport units.
    pub target_tile_px: f64,
    pub min_columns: u32,
    pub max_columns: u32,
    pub min_rows: u32,
    pub max_rows: u32,
    /// Quiet period before a resize is applied.
    pub debounce: Duration,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            target_tile_px: 180.0,
            min_columns: 4,
            max_columns: 14,
            min_rows: 3,
            max_rows: 10,
            debounce: Duration::from_millis(150),
        }
    }
}

impl LayoutConfig {
    /// Set the preferred tile size.
    #[must_use]
    pub fn with_target_tile(mut self, px: f64) -> Self {
        self.target_tile_px = px;
        self
    }

    /// Set the column bounds.
    #[must_use]
    pub fn with_columns(mut self, min: u32, max: u32) -> Self {
        self.min_columns = min;
        self.max_columns = max;
        self
    }

    /// Set the row bounds.
    #[must_use]
    pub fn with_rows(mut self, min: u32, max: u32) -> Self {
        self.min_rows = min;
        self.max_rows = max;
        self
    }

    /// Set the resize debounce window.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Copy with malformed values replaced: a non-positive or non-finite
    /// tile size falls back to the default, minimums are at least one, and
    /// maximums are at least their minimum.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let target_tile_px = if self.target_tile_px.is_finite() && self.target_tile_px > 0.0 {
            self.target_tile_px
        } else {
            Self::default().target_tile_px
        };
        let min_columns = self.min_columns.max(1);
        let min_rows = self.min_rows.max(1);
        Self {
            target_tile_px,
            min_columns,
            max_columns: self.max_columns.max(min_columns),
            min_rows,
            max_rows: self.max_rows.max(min_rows),
            debounce: self.debounce,
        }
    }

    /// Layout for `viewport` under this configuration.
    pub fn layout_for(&self, viewport: Viewport) -> GridLayout {
        compute_grid_layout(viewport.width, viewport.height, self)
    }
}

fn clamp_count(value: f64, min: u32, max: u32) -> u32 {
    let rounded = if value.is_nan() { 0.0 } else { value.round() };
    rounded.clamp(f64::from(min), f64::from(max)) as u32
}

/// Compute the grid for a `width x height` viewport.
///
/// `columns = clamp(round(width / target), min_columns, max_columns)` and
/// likewise for rows. Never fails; malformed inputs land on the bounds.
pub fn compute_grid_layout(width: f64, height: f64, config: &LayoutConfig) -> GridLayout {
    let config = config.normalized();
    let columns = clamp_count(
        width / config.target_tile_px,
        config.min_columns,
        config.max_columns,
    );
    let rows = clamp_count(height / config.target_tile_px, config.min_rows, config.max_rows);
    GridLayout::new(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(min_c: u32, max_c: u32, min_r: u32, max_r: u32) -> LayoutConfig {
        LayoutConfig::default()
            .with_columns(min_c, max_c)
            .with_rows(min_r, max_r)
    }

    #[test]
    fn small_viewport_hits_minimums() {
        let layout = compute_grid_layout(800.0, 600.0, &bounds(4, 14, 3, 10));
        assert_eq!(layout, GridLayout::new(4, 3));
    }

    #[test]
    fn wide_viewport() {
        let layout = compute_grid_layout(1800.0, 900.0, &bounds(4, 14, 3, 10));
        assert_eq!(layout, GridLayout::new(10, 5));
    }

    #[test]
    fn huge_viewport_hits_maximums() {
        let layout = compute_grid_layout(10_000.0, 10_000.0, &bounds(4, 8, 3, 7));
        assert_eq!(layout, GridLayout::new(8, 7));
    }

    #[test]
    fn half_rounds_up() {
        // 990 / 180 = 5.5
        let layout = compute_grid_layout(990.0, 990.0, &LayoutConfig::default());
        assert_eq!(layout, GridLayout::new(6, 6));
    }

    #[test]
    fn malformed_sizes_are_clamped() {
        let config = LayoutConfig::default();
        assert_eq!(
            compute_grid_layout(f64::NAN, -500.0, &config),
            GridLayout::new(4, 3)
        );
        assert_eq!(
            compute_grid_layout(f64::INFINITY, f64::NEG_INFINITY, &config),
            GridLayout::new(14, 3)
        );
    }

    #[test]
    fn malformed_config_is_normalized() {
        let config = LayoutConfig::default()
            .with_target_tile(0.0)
            .with_columns(0, 0)
            .with_rows(6, 2);
        let normalized = config.normalized();
        assert_eq!(normalized.target_tile_px, 180.0);
        assert_eq!((normalized.min_columns, normalized.max_columns), (1, 1));
        assert_eq!((normalized.min_rows, normalized.max_rows), (6, 6));
        assert_eq!(
            compute_grid_layout(1800.0, 900.0, &config),
            GridLayout::new(1, 6)
        );
    }

    #[test]
    fn placement_is_row_major() {
        let layout = GridLayout::new(4, 3);
        assert_eq!(layout.tile_count(), 12);
        let p = layout.placement(TileId(6)).unwrap();
        assert_eq!((p.col, p.row), (2, 1));
        assert!(layout.placement(TileId(12)).is_none());
        assert_eq!(layout.placements().count(), 12);
    }

    #[test]
    fn background_offsets_tile_the_image() {
        let layout = GridLayout::new(4, 2);
        let p = layout.placement(TileId(7)).unwrap();
        assert_eq!(p.background_offset(layout), (0.75, 0.5));
        assert_eq!(TilePlacement::extent(layout), (0.25, 0.5));
        let b = p.bounds(layout, Viewport::new(400.0, 200.0));
        assert_eq!(
            b,
            TileBounds {
                x: 300.0,
                y: 100.0,
                width: 100.0,
                height: 100.0
            }
        );
    }

    #[test]
    fn hit_testing() {
        let layout = GridLayout::new(4, 2);
        let vp = Viewport::new(400.0, 200.0);
        assert_eq!(layout.tile_at(vp, 0.0, 0.0), Some(TileId(0)));
        assert_eq!(layout.tile_at(vp, 399.0, 199.0), Some(TileId(7)));
        assert_eq!(layout.tile_at(vp, 150.0, 120.0), Some(TileId(5)));
        assert_eq!(layout.tile_at(vp, 400.0, 10.0), None);
    }

    #[test]
    fn hit_testing_empty_layout() {
        let vp = Viewport::new(100.0, 100.0);
        let no_columns = GridLayout { columns: 0, rows: 3 };
        assert_eq!(no_columns.tile_at(vp, 10.0, 10.0), None);
        let no_rows = GridLayout { columns: 3, rows: 0 };
        assert_eq!(no_rows.tile_at(vp, 10.0, 10.0), None);
        assert_eq!(no_rows.placements().count(), 0);
    }

    #[test]
    fn tile_id_display() {
        assert_eq!(TileId(3).to_string(), "tile#3");
    }
}
