#![forbid(unsafe_code)]

//! Input handling for the demo, kept apart from the terminal so it can be
//! driven from tests.

use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use tilecascade_core::motion::{MotionPreference, MotionToggle};
use tilecascade_grid::{CascadeControl, GridConfig, TileGrid, TileId, Viewport};

use crate::render::{self, BackArt, DemoGrid, Hud};

pub struct App {
    grid: DemoGrid,
    /// Back art parked while the grid shows plain backs.
    stashed_back: Option<BackArt>,
    motion: MotionToggle,
    size: (u16, u16),
    hovered: Option<TileId>,
    focus: TileId,
    quit: bool,
}

impl App {
    pub fn new(config: GridConfig, size: (u16, u16), motion: MotionToggle) -> Self {
        let grid = TileGrid::with_content(
            config,
            render::viewport_for(size.0, size.1),
            Rc::new(motion.clone()),
            render::demo_content(),
        );
        Self {
            grid,
            stashed_back: None,
            motion,
            size,
            hovered: None,
            focus: TileId(0),
            quit: false,
        }
    }

    pub fn grid(&self) -> &DemoGrid {
        &self.grid
    }

    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn hud(&self) -> Hud {
        Hud {
            focus: Some(self.focus),
            reduced_motion: self.motion.reduced_motion(),
        }
    }

    fn viewport(&self) -> Viewport {
        render::viewport_for(self.size.0, self.size.1)
    }

    /// Tile drawn under terminal cell `(col, row)` at the current size.
    fn hit(&self, col: u16, row: u16) -> Option<TileId> {
        let (x, y) = render::cell_center(col, row);
        self.grid.layout().tile_at(self.viewport(), x, y)
    }

    pub fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(cols, rows) => {
                self.size = (cols, rows);
                self.hovered = None;
                if self.grid.handle_resize(self.viewport(), now).is_some() {
                    self.clamp_focus();
                }
            }
            _ => {}
        }
    }

    /// Advance the grid clock and apply any settled resize.
    pub fn tick(&mut self, dt: Duration, now: Instant) {
        if self.grid.poll_resize(now).is_some() {
            self.clamp_focus();
        }
        self.grid.advance(dt);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => self.quit = true,
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char('c') => self.grid.cascade(),
            KeyCode::Char('r') => self.grid.reset(),
            KeyCode::Char('m') => {
                let reduced = self.motion.toggle();
                tracing::info!(reduced, "reduced motion toggled");
            }
            KeyCode::Char('b') => {
                let shown = self.grid.set_back(self.stashed_back.take());
                self.stashed_back = shown;
                tracing::info!(back_art = self.grid.back().is_some(), "back art toggled");
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.grid.activate(self.focus),
            KeyCode::Left => self.move_focus(-1, 0),
            KeyCode::Right => self.move_focus(1, 0),
            KeyCode::Up => self.move_focus(0, -1),
            KeyCode::Down => self.move_focus(0, 1),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let id = self.hit(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                if id != self.hovered {
                    self.hovered = id;
                    if let Some(tile) = id.and_then(|id| self.grid.tile_mut(id)) {
                        tile.pointer_enter();
                    }
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(id) = id {
                    self.focus = id;
                    self.grid.activate(id);
                }
            }
            _ => {}
        }
    }

    fn move_focus(&mut self, dx: i64, dy: i64) {
        let layout = self.grid.layout();
        let columns = i64::from(layout.columns);
        let rows = i64::from(layout.rows);
        let index = self.focus.0 as i64;
        let col = (index % columns + dx).clamp(0, columns - 1);
        let row = (index / columns + dy).clamp(0, rows - 1);
        self.focus = TileId((row * columns + col) as usize);
    }

    fn clamp_focus(&mut self) {
        let count = self.grid.tile_count();
        if self.focus.0 >= count {
            self.focus = TileId(count.saturating_sub(1));
        }
    }
}
