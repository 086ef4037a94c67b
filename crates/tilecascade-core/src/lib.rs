#![forbid(unsafe_code)]

//! Core: animation primitives, virtual-time scheduling, resize debouncing,
//! and motion preferences for the tile cascade grid.

pub mod animation;
pub mod geometry;
pub mod logging;
pub mod motion;
pub mod resize_debounce;
pub mod timer_queue;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, info, trace, warn};
