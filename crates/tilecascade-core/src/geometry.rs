#![forbid(unsafe_code)]

//! Viewport geometry.

/// Viewport dimensions in host units (CSS pixels, terminal cells, ...).
///
/// Values are carried as `f64` so hosts with fractional pixel sizes do not
/// lose precision. Non-finite or negative values are tolerated and
/// normalized by [`Viewport::sanitized`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Create a viewport.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Copy with NaN and negative dimensions replaced by zero.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let fix = |v: f64| if v.is_nan() || v < 0.0 { 0.0 } else { v };
        Self {
            width: fix(self.width),
            height: fix(self.height),
        }
    }

    /// Whether the point lies inside `[0, width) x [0, height)`.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width && y < self.height
    }
}

impl From<(u16, u16)> for Viewport {
    fn from((width, height): (u16, u16)) -> Self {
        Self::new(f64::from(width), f64::from(height))
    }
}
