#![forbid(unsafe_code)]

//! Cascade tile grid engine.
//!
//! A viewport is divided into a grid of square-ish tiles. Each tile flips
//! between a front face (a slice of one shared background) and a back face,
//! reverts to front on its own a few seconds after landing on back, and can
//! be driven collectively: [`TileGrid::cascade_flip`] flips every tile to
//! back in random order with random timing, and
//! [`TileGrid::flip_all_to_front`] brings them all forward again.
//!
//! All timing runs on a virtual clock advanced by the host through
//! [`TileGrid::advance`], so behaviour is deterministic under test and a
//! seeded grid replays the same cascade every run.

pub mod cascade;
pub mod grid;
pub mod layout;
pub mod registry;
pub mod tile;
pub mod viewport;

pub use cascade::{CascadeConfig, CascadeControl, CascadeOrchestrator, ScheduledFlip, plan_cascade};
pub use grid::{GridConfig, GridContent, TileGrid};
pub use layout::{
    GridLayout, LayoutConfig, TileBounds, TileId, TilePlacement, compute_grid_layout,
};
pub use registry::{MountEpoch, TileRegistry};
pub use tile::{Face, FlipPhase, Tile, TileConfig, TileHandle, TileStats, flip_duration_secs};
pub use viewport::{LayoutChange, ViewportWatcher};

pub use tilecascade_core::geometry::Viewport;
