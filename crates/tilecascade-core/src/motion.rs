#![forbid(unsafe_code)]

//! Reduced-motion capability.
//!
//! Hosts answer a single question: should transitions be instantaneous?
//! Consumers query [`MotionPreference::reduced_motion`] once per transition
//! attempt instead of caching the answer, so a preference that changes at
//! runtime takes effect on the next transition.
//!
//! # Sources
//!
//! - [`FixedMotion`]: constant answer, useful in tests.
//! - [`MotionToggle`]: shared, runtime-switchable flag for single-threaded hosts.
//! - [`EnvMotionPreference`]: read once from `TILECASCADE_REDUCED_MOTION`.

use std::cell::Cell;
use std::env;
use std::rc::Rc;

/// Environment variable consulted by [`EnvMotionPreference::detect`].
pub const REDUCED_MOTION_ENV: &str = "TILECASCADE_REDUCED_MOTION";

/// Read-only query for the host's reduced-motion setting.
pub trait MotionPreference {
    /// `true` when transitions should be applied without animation.
    fn reduced_motion(&self) -> bool;
}

impl<T: MotionPreference + ?Sized> MotionPreference for Rc<T> {
    fn reduced_motion(&self) -> bool {
        (**self).reduced_motion()
    }
}

/// A preference that never changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedMotion(pub bool);

impl FixedMotion {
    /// Full motion.
    pub const FULL: Self = Self(false);
    /// Reduced motion.
    pub const REDUCED: Self = Self(true);
}

impl MotionPreference for FixedMotion {
    fn reduced_motion(&self) -> bool {
        self.0
    }
}

/// Shared runtime toggle. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct MotionToggle {
    reduced: Rc<Cell<bool>>,
}

impl MotionToggle {
    /// Create a toggle with the given initial value.
    #[must_use]
    pub fn new(reduced: bool) -> Self {
        Self {
            reduced: Rc::new(Cell::new(reduced)),
        }
    }

    /// Set the flag.
    pub fn set(&self, reduced: bool) {
        self.reduced.set(reduced);
    }

    /// Flip the flag and return the new value.
    pub fn toggle(&self) -> bool {
        let next = !self.reduced.get();
        self.reduced.set(next);
        next
    }
}

impl MotionPreference for MotionToggle {
    fn reduced_motion(&self) -> bool {
        self.reduced.get()
    }
}

/// Preference derived from the process environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvMotionPreference {
    reduced: bool,
}

impl EnvMotionPreference {
    /// Detect from `TILECASCADE_REDUCED_MOTION`.
    ///
    /// Any value other than empty, `0`, `false`, `no`, or `off`
    /// (case-insensitive) enables reduced motion.
    #[must_use]
    pub fn detect() -> Self {
        Self::from_value(env::var(REDUCED_MOTION_ENV).ok().as_deref())
    }

    fn from_value(value: Option<&str>) -> Self {
        let reduced = match value {
            None => false,
            Some(raw) => {
                let raw = raw.trim();
                !(raw.is_empty()
                    || raw == "0"
                    || raw.eq_ignore_ascii_case("false")
                    || raw.eq_ignore_ascii_case("no")
                    || raw.eq_ignore_ascii_case("off"))
            }
        };
        Self { reduced }
    }
}

impl MotionPreference for EnvMotionPreference {
    fn reduced_motion(&self) -> bool {
        self.reduced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_values() {
        assert!(!EnvMotionPreference::from_value(None).reduced_motion());
        assert!(!EnvMotionPreference::from_value(Some("")).reduced_motion());
        assert!(!EnvMotionPreference::from_value(Some("0")).reduced_motion());
        assert!(!EnvMotionPreference::from_value(Some("FALSE")).reduced_motion());
        assert!(!EnvMotionPreference::from_value(Some(" off ")).reduced_motion());
        assert!(EnvMotionPreference::from_value(Some("1")).reduced_motion());
        assert!(EnvMotionPreference::from_value(Some("reduce")).reduced_motion());
    }

    #[test]
    fn toggle_is_shared_between_clones() {
        let toggle = MotionToggle::new(false);
        let observer = toggle.clone();
        assert!(!observer.reduced_motion());
        assert!(toggle.toggle());
        assert!(observer.reduced_motion());
        toggle.set(false);
        assert!(!observer.reduced_motion());
    }

    #[test]
    fn rc_dyn_forwards() {
        let pref: Rc<dyn MotionPreference> = Rc::new(FixedMotion::REDUCED);
        assert!(pref.reduced_motion());
    }
}
