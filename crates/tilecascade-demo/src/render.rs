#![forbid(unsafe_code)]

//! Character-cell rendering of the grid.
//!
//! Terminal rows are roughly twice as tall as columns are wide, so one row
//! spans [`ROW_UNITS`] viewport units vertically. A flipping tile is drawn
//! as the projection of a card rotating about its horizontal axis: at
//! rotation `θ` only the middle `|cos θ|` of the tile's height is painted,
//! and the painted rows are stretched from the face's own rows.
//!
//! The grid carries [`FrontArt`] and an optional [`BackArt`]. Without back
//! art, back faces are a plain surface.

use std::io::{self, Write};

use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::{cursor, queue};
use tilecascade_grid::{Face, GridContent, TileGrid, TileId, TilePlacement, Viewport};

/// Viewport units covered by one terminal row.
pub const ROW_UNITS: f64 = 2.0;

/// Below this `|cos θ|` a tile is edge-on and nothing is painted.
const EDGE_ON: f64 = 1e-3;

const PLAIN_BACK: Color = Color::Rgb {
    r: 44,
    g: 44,
    b: 50,
};

/// Front payload: a banner written across the shared background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontArt {
    pub banner: String,
}

impl Default for FrontArt {
    fn default() -> Self {
        Self {
            banner: " TILE CASCADE ".to_owned(),
        }
    }
}

/// Back payload: a fill glyph over a per-tile shade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackArt {
    pub glyph: char,
}

impl Default for BackArt {
    fn default() -> Self {
        Self { glyph: '░' }
    }
}

pub type DemoGrid = TileGrid<FrontArt, BackArt>;

/// Content the demo starts with.
pub fn demo_content() -> GridContent<FrontArt, BackArt> {
    GridContent::new(FrontArt::default()).with_back(BackArt::default())
}

/// Grid viewport for a terminal of `cols x rows`; the last row is the
/// status line.
pub fn viewport_for(cols: u16, rows: u16) -> Viewport {
    Viewport::new(
        f64::from(cols),
        f64::from(rows.saturating_sub(1)) * ROW_UNITS,
    )
}

/// Viewport point at the centre of terminal cell `(col, row)`.
pub fn cell_center(col: u16, row: u16) -> (f64, f64) {
    (f64::from(col) + 0.5, (f64::from(row) + 0.5) * ROW_UNITS)
}

/// Project tile-local vertical position `v` in `[-1, 1]` through a rotation
/// of `rotation_deg` about the horizontal axis.
///
/// Returns the face seen at `v` and the face-local position it shows, or
/// `None` if `v` falls outside the foreshortened card.
pub fn project(rotation_deg: f32, v: f64) -> Option<(Face, f64)> {
    let cos = f64::from(rotation_deg).to_radians().cos();
    let scale = cos.abs();
    if scale < EDGE_ON || v.abs() > scale {
        return None;
    }
    let face = if cos >= 0.0 { Face::Front } else { Face::Back };
    Some((face, v / scale))
}

/// What one terminal cell shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Empty,
    /// Front face. `(gx, gy)` is the position in the shared background,
    /// both in `[0, 1]`.
    Front { gx: f64, gy: f64, edge: bool },
    Back { id: TileId, edge: bool },
}

/// Resolve the paint for terminal cell `(col, row)`.
pub fn paint_cell<F, B>(grid: &TileGrid<F, B>, viewport: Viewport, col: u16, row: u16) -> Paint {
    let layout = grid.layout();
    let (x, y) = cell_center(col, row);
    let Some(tile) = layout
        .tile_at(viewport, x, y)
        .and_then(|id| grid.tile(id))
    else {
        return Paint::Empty;
    };
    let placement = tile.placement();
    let bounds = placement.bounds(layout, viewport);
    if bounds.width <= 0.0 || bounds.height <= 0.0 {
        return Paint::Empty;
    }
    let u = ((x - bounds.x) / bounds.width).clamp(0.0, 1.0);
    let v = ((y - bounds.y) / bounds.height) * 2.0 - 1.0;
    let edge = x - bounds.x < 1.0;

    match project(tile.rotation(), v) {
        None => Paint::Empty,
        Some((Face::Front, src)) => {
            let (ox, oy) = placement.background_offset(layout);
            let (ew, eh) = TilePlacement::extent(layout);
            Paint::Front {
                gx: ox + u * ew,
                gy: oy + (src + 1.0) / 2.0 * eh,
                edge,
            }
        }
        Some((Face::Back, _)) => Paint::Back {
            id: tile.id(),
            edge,
        },
    }
}

fn lerp(a: f64, b: f64, t: f64) -> u8 {
    (a + (b - a) * t.clamp(0.0, 1.0)).round().clamp(0.0, 255.0) as u8
}

fn front_color(gx: f64, gy: f64, edge: bool) -> Color {
    let dim = if edge { 0.75 } else { 1.0 };
    Color::Rgb {
        r: (f64::from(lerp(30.0, 230.0, gx)) * dim) as u8,
        g: (f64::from(lerp(70.0, 200.0, gy)) * dim) as u8,
        b: (f64::from(lerp(220.0, 90.0, gx)) * dim) as u8,
    }
}

/// Background, foreground and glyph of a back-face cell.
fn back_cell(back: Option<&BackArt>, id: TileId, edge: bool) -> (Color, Color, char) {
    match back {
        Some(art) => (back_color(id, edge), Color::DarkGrey, art.glyph),
        None => (PLAIN_BACK, PLAIN_BACK, ' '),
    }
}

fn back_color(id: TileId, edge: bool) -> Color {
    let hue = (id.0 * 47) % 360;
    let (r, g, b) = match hue / 120 {
        0 => (60, 30 + hue / 4, 45),
        1 => (35, 60, 30 + (hue - 120) / 4),
        _ => (30 + (hue - 240) / 4, 35, 60),
    };
    let dim = if edge { 20 } else { 0 };
    Color::Rgb {
        r: (r as u8).saturating_sub(dim),
        g: (g as u8).saturating_sub(dim),
        b: (b as u8).saturating_sub(dim),
    }
}

/// Character of `banner` at background position `(gx, gy)`, with the
/// banner laid across the middle row of a `cols x rows` area.
fn banner_char(banner: &str, gx: f64, gy: f64, cols: u16, rows: u16) -> Option<char> {
    if rows == 0 || cols == 0 {
        return None;
    }
    let cell_row = (gy * f64::from(rows)).floor() as i64;
    if cell_row != i64::from(rows / 2) {
        return None;
    }
    let len = banner.chars().count() as i64;
    let start = (i64::from(cols) - len) / 2;
    let index = (gx * f64::from(cols)).floor() as i64 - start;
    if index < 0 || index >= len {
        return None;
    }
    banner.chars().nth(index as usize)
}

/// Overlay state drawn on top of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hud {
    pub focus: Option<TileId>,
    pub reduced_motion: bool,
}

/// Draw the whole frame for a `cols x rows` terminal.
pub fn draw(
    out: &mut impl Write,
    grid: &DemoGrid,
    (cols, rows): (u16, u16),
    hud: &Hud,
) -> io::Result<()> {
    let viewport = viewport_for(cols, rows);
    let grid_rows = rows.saturating_sub(1);
    let focus_cell = hud.focus.and_then(|id| focus_cell(grid, viewport, id));

    for row in 0..grid_rows {
        queue!(out, cursor::MoveTo(0, row))?;
        for col in 0..cols {
            let (bg, fg, ch, text) = match paint_cell(grid, viewport, col, row) {
                Paint::Empty => (Color::Black, Color::Black, ' ', false),
                Paint::Front { gx, gy, edge } => {
                    let banner = banner_char(&grid.front().banner, gx, gy, cols, grid_rows);
                    (
                        front_color(gx, gy, edge),
                        Color::White,
                        banner.unwrap_or(' '),
                        banner.is_some(),
                    )
                }
                Paint::Back { id, edge } => {
                    let (bg, fg, ch) = back_cell(grid.back(), id, edge);
                    (bg, fg, ch, false)
                }
            };
            // Focus marker never hides banner text.
            let (fg, ch) = if !text && focus_cell == Some((col, row)) {
                (Color::White, '◆')
            } else {
                (fg, ch)
            };
            queue!(out, SetBackgroundColor(bg), SetForegroundColor(fg), Print(ch))?;
        }
    }

    let layout = grid.layout();
    let status = format!(
        " c cascade  r reset  m motion:{}  b back art  arrows+enter  q quit  | {}x{} tiles, {} pending",
        if hud.reduced_motion { "reduced" } else { "full" },
        layout.columns,
        layout.rows,
        grid.pending_cascade_steps(),
    );
    let status: String = status.chars().take(usize::from(cols)).collect();
    queue!(
        out,
        cursor::MoveTo(0, grid_rows),
        ResetColor,
        Print(format!("{status:<width$}", width = usize::from(cols))),
    )?;
    out.flush()
}

fn focus_cell<F, B>(
    grid: &TileGrid<F, B>,
    viewport: Viewport,
    id: TileId,
) -> Option<(u16, u16)> {
    let placement = grid.tile(id)?.placement();
    let b = placement.bounds(grid.layout(), viewport);
    let col = (b.x + b.width / 2.0).floor();
    let row = ((b.y + b.height / 2.0) / ROW_UNITS).floor();
    if col < 0.0 || row < 0.0 {
        return None;
    }
    Some((col as u16, row as u16))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;
    use tilecascade_core::motion::FixedMotion;
    use tilecascade_grid::{GridConfig, GridLayout, LayoutConfig, TileHandle};

    fn grid(cols: u16, rows: u16) -> DemoGrid {
        let config = GridConfig::default()
            .with_seed(0)
            .with_layout(LayoutConfig::default().with_target_tile(12.0));
        TileGrid::with_content(
            config,
            viewport_for(cols, rows),
            Rc::new(FixedMotion::REDUCED),
            demo_content(),
        )
    }

    fn frame(g: &DemoGrid, size: (u16, u16)) -> String {
        let mut buf = Vec::new();
        let hud = Hud {
            focus: None,
            reduced_motion: true,
        };
        draw(&mut buf, g, size, &hud).unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn viewport_excludes_status_row() {
        assert_eq!(viewport_for(120, 41), Viewport::new(120.0, 80.0));
        assert_eq!(viewport_for(10, 0), Viewport::new(10.0, 0.0));
    }

    #[test]
    fn projection_at_rest() {
        assert_eq!(project(0.0, 0.5), Some((Face::Front, 0.5)));
        let (face, src) = project(180.0, -0.5).unwrap();
        assert_eq!(face, Face::Back);
        assert!((src + 0.5).abs() < 1e-9);
    }

    #[test]
    fn projection_foreshortens() {
        let (face, src) = project(60.0, 0.4).unwrap();
        assert_eq!(face, Face::Front);
        assert!((src - 0.8).abs() < 1e-6);
        assert!(project(60.0, 0.6).is_none());
        assert!(project(90.0, 0.5).is_none());
    }

    #[test]
    fn elastic_overshoot_still_projects() {
        let (face, _) = project(195.0, 0.0).unwrap();
        assert_eq!(face, Face::Back);
        let (face, _) = project(-10.0, 0.0).unwrap();
        assert_eq!(face, Face::Front);
    }

    #[test]
    fn front_cells_sample_shared_background() {
        let g = grid(120, 41);
        assert_eq!(g.layout(), GridLayout::new(10, 7));
        let vp = viewport_for(120, 41);
        match paint_cell(&g, vp, 0, 0) {
            Paint::Front { gx, gy, edge } => {
                assert!(gx < 0.01 && gy < 0.05);
                assert!(edge);
            }
            other => panic!("expected front, got {other:?}"),
        }
        match paint_cell(&g, vp, 119, 39) {
            Paint::Front { gx, gy, .. } => assert!(gx > 0.99 && gy > 0.95),
            other => panic!("expected front, got {other:?}"),
        }
    }

    #[test]
    fn back_tiles_paint_back() {
        let mut g = grid(120, 41);
        let vp = viewport_for(120, 41);
        g.tile_mut(TileId(0)).unwrap().flip(Some(Face::Back), None);
        assert_eq!(
            paint_cell(&g, vp, 5, 1),
            Paint::Back {
                id: TileId(0),
                edge: false
            }
        );
    }

    #[test]
    fn back_art_is_drawn_when_supplied() {
        let art = BackArt { glyph: '#' };
        let (bg, fg, ch) = back_cell(Some(&art), TileId(3), false);
        assert_eq!(ch, '#');
        assert_eq!(bg, back_color(TileId(3), false));
        assert_eq!(fg, Color::DarkGrey);

        let mut g = grid(40, 13);
        g.set_back(Some(art));
        for tile in 0..g.tile_count() {
            g.tile_mut(TileId(tile)).unwrap().flip(Some(Face::Back), None);
        }
        assert!(frame(&g, (40, 13)).contains('#'));
    }

    #[test]
    fn missing_back_art_falls_back_to_plain_surface() {
        assert_eq!(
            back_cell(None, TileId(3), false),
            (PLAIN_BACK, PLAIN_BACK, ' ')
        );
        assert_eq!(
            back_cell(None, TileId(8), true),
            (PLAIN_BACK, PLAIN_BACK, ' ')
        );

        let mut g = grid(40, 13);
        assert_eq!(g.set_back(None), Some(BackArt::default()));
        for tile in 0..g.tile_count() {
            g.tile_mut(TileId(tile)).unwrap().flip(Some(Face::Back), None);
        }
        assert!(!frame(&g, (40, 13)).contains('░'));
    }

    #[test]
    fn banner_sits_on_middle_row() {
        let banner = FrontArt::default().banner;
        let len = banner.chars().count();
        let start = (100 - len) / 2;
        let gx = (start as f64 + 1.5) / 100.0;
        let gy = 10.5 / 20.0;
        assert_eq!(banner_char(&banner, gx, gy, 100, 20), banner.chars().nth(1));
        assert_eq!(banner_char(&banner, gx, 0.1, 100, 20), None);
        assert_eq!(banner_char(&banner, 0.0, gy, 100, 20), None);
    }

    #[test]
    fn banner_comes_from_front_content() {
        let g = TileGrid::with_content(
            GridConfig::default().with_seed(0),
            viewport_for(40, 13),
            Rc::new(FixedMotion::REDUCED),
            GridContent::<FrontArt, BackArt>::new(FrontArt {
                banner: "HELLO".to_owned(),
            }),
        );
        let text = frame(&g, (40, 13));
        assert!(text.contains('E') && text.contains('L'));
        assert!(!text.contains('A'));
    }

    #[test]
    fn draw_writes_full_frame() {
        let g = grid(40, 13);
        let mut buf = Vec::new();
        let hud = Hud {
            focus: Some(TileId(0)),
            reduced_motion: true,
        };
        draw(&mut buf, &g, (40, 13), &hud).unwrap();
        let text = String::from_utf8_lossy(&buf);
        assert!(text.contains("motion:reduced"));
        assert!(text.contains('◆'));
    }
}
