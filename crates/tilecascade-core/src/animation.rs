#![forbid(unsafe_code)]

//! Tween animation primitive.
//!
//! A [`Tween`] interpolates an `f32` between two values over a duration,
//! shaped by an [`Easing`] curve. Time never advances on its own: the owner
//! calls [`Animation::tick`] with a delta, which keeps every transition
//! deterministic under a virtual clock.
//!
//! Completion is observed by polling [`Animation::is_complete`] after a tick.
//! Time that elapsed past the end is reported by [`Animation::overshoot`] so
//! the owner can forward it into whatever happens next (for example, a
//! countdown that should start the instant the tween lands).
//!
//! # Invariants
//!
//! 1. Progress is monotonically non-decreasing across ticks.
//! 2. `value()` equals `from` before the first tick and `to` once complete.
//! 3. A zero duration is replaced by one nanosecond, so the first tick
//!    always completes the tween.
//! 4. Overshooting easings (see [`Easing::Elastic`]) may return values
//!    outside `[from, to]` while running, never after completion.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Easing
// ---------------------------------------------------------------------------

/// Easing curve applied to normalized progress `t` in `[0, 1]`.
///
/// `Linear` stays within `[0, 1]`. `Elastic` overshoots past 1 and
/// oscillates back, settling exactly at 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    /// Constant velocity.
    Linear,
    /// Exponentially decaying sine spring.
    ///
    /// `amplitude` scales the overshoot (values below 1 are treated as 1),
    /// `period` is the oscillation period in normalized time.
    Elastic { amplitude: f32, period: f32 },
}

impl Easing {
    /// The springy curve used for tile flips.
    pub const FLIP: Self = Self::Elastic {
        amplitude: 1.0,
        period: 0.5,
    };

    /// Map `t` through the curve. Input is clamped to `[0, 1]`.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::Elastic { amplitude, period } => elastic_out(t, amplitude, period),
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Self::FLIP
    }
}

fn elastic_out(t: f32, amplitude: f32, period: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let amplitude = if amplitude.is_finite() { amplitude.max(1.0) } else { 1.0 };
    let period = if period.is_finite() && period > 0.0 {
        period
    } else {
        0.3
    };
    let tau = std::f32::consts::TAU;
    let shift = period / tau * (1.0 / amplitude).asin();
    amplitude * 2f32.powf(-10.0 * t) * ((t - shift) * tau / period).sin() + 1.0
}

// ---------------------------------------------------------------------------
// Animation trait
// ---------------------------------------------------------------------------

/// A time-based animation driven by explicit ticks.
pub trait Animation {
    /// Advance the animation by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end.
    fn is_complete(&self) -> bool;

    /// Current output value.
    fn value(&self) -> f32;

    /// Time elapsed past completion.
    fn overshoot(&self) -> Duration {
        Duration::ZERO
    }
}

// ---------------------------------------------------------------------------
// Tween
// ---------------------------------------------------------------------------

/// Interpolates from `from` to `to` over a duration with an easing curve.
///
/// Elapsed time is tracked as a [`Duration`] so accumulation does not drift
/// and the overshoot past completion is exact.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    from: f32,
    to: f32,
    elapsed: Duration,
    duration: Duration,
    easing: Easing,
}

impl Tween {
    /// Create a linear tween from `from` to `to` over `duration`.
    pub fn new(from: f32, to: f32, duration: Duration) -> Self {
        Self {
            from,
            to,
            elapsed: Duration::ZERO,
            duration: if duration.is_zero() {
                Duration::from_nanos(1)
            } else {
                duration
            },
            easing: Easing::Linear,
        }
    }

    /// Set the easing curve (builder).
    #[must_use]
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Raw linear progress (before easing), in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        (t as f32).clamp(0.0, 1.0)
    }
}

impl Animation for Tween {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        if self.is_complete() {
            return self.to;
        }
        self.from + (self.to - self.from) * self.easing.apply(self.progress())
    }

    fn overshoot(&self) -> Duration {
        self.elapsed.saturating_sub(self.duration)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MS_100: Duration = Duration::from_millis(100);
    const MS_700: Duration = Duration::from_millis(700);

    #[test]
    fn easing_endpoints() {
        for easing in [Easing::Linear, Easing::FLIP] {
            assert!(easing.apply(0.0).abs() < 1e-6, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?} at 1");
        }
    }

    #[test]
    fn easing_clamps_input() {
        assert_eq!(Easing::Linear.apply(-1.0), 0.0);
        assert_eq!(Easing::Linear.apply(2.0), 1.0);
        assert_eq!(Easing::FLIP.apply(f32::NAN), 0.0);
    }

    #[test]
    fn elastic_overshoots() {
        let peak = (1..100)
            .map(|i| Easing::FLIP.apply(i as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.0, "elastic curve should overshoot, peak={peak}");
    }

    #[test]
    fn elastic_tolerates_bad_parameters() {
        let easing = Easing::Elastic {
            amplitude: f32::NAN,
            period: -1.0,
        };
        let v = easing.apply(0.5);
        assert!(v.is_finite());
    }

    #[test]
    fn tween_starts_at_from() {
        let tween = Tween::new(0.0, 180.0, MS_700);
        assert_eq!(tween.value(), 0.0);
        assert!(!tween.is_complete());
    }

    #[test]
    fn tween_linear_midpoint() {
        let mut tween = Tween::new(0.0, 180.0, Duration::from_millis(200));
        tween.tick(MS_100);
        assert!((tween.value() - 90.0).abs() < 1e-3);
    }

    #[test]
    fn tween_lands_exactly_on_target() {
        let mut tween = Tween::new(0.0, 180.0, MS_700).easing(Easing::FLIP);
        tween.tick(MS_700);
        assert!(tween.is_complete());
        assert_eq!(tween.value(), 180.0);
    }

    #[test]
    fn tween_reverse_direction() {
        let mut tween = Tween::new(180.0, 0.0, MS_100);
        tween.tick(Duration::from_millis(50));
        assert!((tween.value() - 90.0).abs() < 1e-3);
    }

    #[test]
    fn tween_zero_duration_completes_on_first_tick() {
        let mut tween = Tween::new(0.0, 1.0, Duration::ZERO);
        assert!(!tween.is_complete());
        tween.tick(Duration::from_nanos(1));
        assert!(tween.is_complete());
    }

    #[test]
    fn tween_reports_overshoot() {
        let mut tween = Tween::new(0.0, 1.0, MS_100);
        tween.tick(Duration::from_millis(130));
        assert_eq!(tween.overshoot(), Duration::from_millis(30));
        assert_eq!(tween.progress(), 1.0);
    }
}
