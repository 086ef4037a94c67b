#![forbid(unsafe_code)]

//! Tile flip state machine.
//!
//! Each [`Tile`] owns its visible [`Face`], at most one in-flight flip tween,
//! and at most one auto-reverse countdown. Time reaches the tile only through
//! [`TileHandle::advance`], so all transitions are driven by the owner's
//! clock.
//!
//! # States
//!
//! ```text
//!            flip(back)                    tween done
//!   Front ───────────────▶ Flipping ───────────────────▶ Back ──┐
//!     ▲                                                          │ auto-reverse
//!     └──────────────── Flipping ◀───────────────────────────────┘ (flip(front))
//! ```
//!
//! With reduced motion the `Flipping` state is skipped and the face changes
//! on the spot.
//!
//! # Invariants
//!
//! 1. While flipping, every `flip` call is ignored.
//! 2. A `flip` whose resolved target equals the visible face is ignored: no
//!    animation starts and no countdown is touched.
//! 3. `visible_face()` reports the pre-transition face until the tween lands.
//! 4. Landing on `Back` arms exactly one auto-reverse countdown; any accepted
//!    `flip` disarms it first.
//! 5. After [`TileHandle::unmount`] the tile holds no countdown or tween and
//!    ignores every further command.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tilecascade_core::animation::{Animation, Easing, Tween};
use tilecascade_core::motion::MotionPreference;

use crate::layout::{TileId, TilePlacement};

/// Which side of a tile is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Face {
    #[default]
    Front,
    Back,
}

impl Face {
    /// The other side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }

    /// Rest rotation about the horizontal axis, in degrees.
    pub fn angle(self) -> f32 {
        match self {
            Self::Front => 0.0,
            Self::Back => 180.0,
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Front => "front",
            Self::Back => "back",
        })
    }
}

/// Coarse state of the flip machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipPhase {
    Front,
    Back,
    Flipping,
}

/// Capability a tile exposes to its registry.
///
/// `flip` and `visible_face` are the whole command surface. `advance` and
/// `unmount` are lifecycle hooks driven by the owner; handles with no
/// internal timers can keep the default no-ops.
pub trait TileHandle {
    /// Request a flip to `to` (or to the opposite face when `None`) over
    /// `duration` (or the tile's default when `None` or zero).
    fn flip(&mut self, to: Option<Face>, duration: Option<Duration>);

    /// Stable visible face. Unchanged while a transition is in flight.
    fn visible_face(&self) -> Face;

    /// Advance the tile's own timers by `dt`.
    fn advance(&mut self, _dt: Duration) {}

    /// Cancel timers and in-flight animation ahead of removal.
    fn unmount(&mut self) {}
}

/// Convert a seconds value into a flip duration.
///
/// Returns `None` for zero, negative, or non-finite inputs so the caller
/// falls back to the tile default.
pub fn flip_duration_secs(secs: f64) -> Option<Duration> {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

/// Per-tile timing configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TileConfig {
    /// Flip duration when the caller does not supply one.
    pub flip_duration: Duration,
    /// How long a tile shows its back before flipping to front on its own.
    pub auto_reverse_delay: Duration,
    /// Curve applied to the flip rotation.
    pub easing: Easing,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            flip_duration: Duration::from_millis(700),
            auto_reverse_delay: Duration::from_millis(3000),
            easing: Easing::FLIP,
        }
    }
}

impl TileConfig {
    /// Set the default flip duration.
    #[must_use]
    pub fn with_flip_duration(mut self, duration: Duration) -> Self {
        self.flip_duration = duration;
        self
    }

    /// Set the auto-reverse delay.
    #[must_use]
    pub fn with_auto_reverse_delay(mut self, delay: Duration) -> Self {
        self.auto_reverse_delay = delay;
        self
    }

    /// Set the flip easing.
    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Copy with zero durations replaced by the defaults.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let defaults = Self::default();
        Self {
            flip_duration: if self.flip_duration.is_zero() {
                defaults.flip_duration
            } else {
                self.flip_duration
            },
            auto_reverse_delay: if self.auto_reverse_delay.is_zero() {
                defaults.auto_reverse_delay
            } else {
                self.auto_reverse_delay
            },
            easing: self.easing,
        }
    }
}

/// Counters for observing a tile from tests and overlays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileStats {
    /// Flip tweens started.
    pub animations_started: u64,
    /// Face changes that completed (animated or instantaneous).
    pub landings: u64,
    /// Auto-reverse countdowns that expired.
    pub auto_reverses: u64,
    /// `flip` calls ignored because a tween was in flight.
    pub rejected_while_flipping: u64,
}

#[derive(Debug, Clone, Copy)]
struct Flight {
    target: Face,
    tween: Tween,
}

/// One grid cell with its own flip state machine.
pub struct Tile {
    placement: TilePlacement,
    config: TileConfig,
    motion: Rc<dyn MotionPreference>,
    visible: Face,
    flight: Option<Flight>,
    auto_reverse: Option<Duration>,
    mounted: bool,
    stats: TileStats,
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tile")
            .field("id", &self.placement.id)
            .field("visible", &self.visible)
            .field("phase", &self.phase())
            .field("auto_reverse", &self.auto_reverse)
            .field("mounted", &self.mounted)
            .finish()
    }
}

impl Tile {
    /// Create a tile showing its front face.
    pub fn new(
        placement: TilePlacement,
        config: TileConfig,
        motion: Rc<dyn MotionPreference>,
    ) -> Self {
        Self {
            placement,
            config: config.normalized(),
            motion,
            visible: Face::Front,
            flight: None,
            auto_reverse: None,
            mounted: true,
            stats: TileStats::default(),
        }
    }

    /// Identity within the grid.
    pub fn id(&self) -> TileId {
        self.placement.id
    }

    /// Position within the grid.
    pub fn placement(&self) -> TilePlacement {
        self.placement
    }

    /// Move the tile without touching its state.
    pub fn set_placement(&mut self, placement: TilePlacement) {
        self.placement = placement;
    }

    /// Current coarse state.
    pub fn phase(&self) -> FlipPhase {
        match (self.flight, self.visible) {
            (Some(_), _) => FlipPhase::Flipping,
            (None, Face::Front) => FlipPhase::Front,
            (None, Face::Back) => FlipPhase::Back,
        }
    }

    /// Whether a tween is in flight.
    pub fn is_flipping(&self) -> bool {
        self.flight.is_some()
    }

    /// Face the in-flight tween is heading to.
    pub fn flip_target(&self) -> Option<Face> {
        self.flight.map(|flight| flight.target)
    }

    /// Live rotation in degrees: 0 is front, 180 is back. The elastic
    /// easing can carry this past either end while flipping.
    pub fn rotation(&self) -> f32 {
        match &self.flight {
            Some(flight) => flight.tween.value(),
            None => self.visible.angle(),
        }
    }

    /// Whether an auto-reverse countdown is armed.
    pub fn auto_reverse_pending(&self) -> bool {
        self.auto_reverse.is_some()
    }

    /// Time left on the auto-reverse countdown.
    pub fn auto_reverse_remaining(&self) -> Option<Duration> {
        self.auto_reverse
    }

    /// Whether the tile still accepts commands.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Counters.
    pub fn stats(&self) -> TileStats {
        self.stats
    }

    /// Pointer entered the tile: toggle it.
    pub fn pointer_enter(&mut self) {
        self.flip(None, None);
    }

    /// Click or keyboard activation: bring a back-showing tile to front.
    pub fn activate(&mut self) {
        if self.visible == Face::Back {
            self.flip(Some(Face::Front), None);
        }
    }

    fn land(&mut self, face: Face) {
        self.flight = None;
        self.visible = face;
        self.stats.landings += 1;
        if face == Face::Back {
            self.auto_reverse = Some(self.config.auto_reverse_delay);
        }
        tilecascade_core::trace!(tile = self.placement.id.0, face = %face, "tile landed");
    }
}

impl TileHandle for Tile {
    fn flip(&mut self, to: Option<Face>, duration: Option<Duration>) {
        if !self.mounted {
            return;
        }
        if self.flight.is_some() {
            self.stats.rejected_while_flipping += 1;
            return;
        }
        let target = to.unwrap_or(self.visible.opposite());
        if target == self.visible {
            return;
        }

        self.auto_reverse = None;

        if self.motion.reduced_motion() {
            self.land(target);
            return;
        }

        let duration = duration
            .filter(|d| !d.is_zero())
            .unwrap_or(self.config.flip_duration);
        let tween =
            Tween::new(self.visible.angle(), target.angle(), duration).easing(self.config.easing);
        self.flight = Some(Flight { target, tween });
        self.stats.animations_started += 1;
    }

    fn visible_face(&self) -> Face {
        self.visible
    }

    fn advance(&mut self, dt: Duration) {
        if !self.mounted {
            return;
        }
        let mut remaining = dt;
        loop {
            if let Some(flight) = self.flight.as_mut() {
                flight.tween.tick(remaining);
                if !flight.tween.is_complete() {
                    return;
                }
                let (target, overshoot) = (flight.target, flight.tween.overshoot());
                self.land(target);
                remaining = overshoot;
                continue;
            }
            if let Some(left) = self.auto_reverse {
                if remaining < left {
                    self.auto_reverse = Some(left - remaining);
                    return;
                }
                remaining -= left;
                self.auto_reverse = None;
                self.stats.auto_reverses += 1;
                self.flip(Some(Face::Front), None);
                continue;
            }
            return;
        }
    }

    fn unmount(&mut self) {
        self.mounted = false;
        self.flight = None;
        self.auto_reverse = None;
    }
}
