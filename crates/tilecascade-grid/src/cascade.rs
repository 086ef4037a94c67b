#![forbid(unsafe_code)]

//! Cascade orchestration.
//!
//! A cascade flips every mounted tile to its back in a shuffled order. The
//! tile at shuffled position `i` starts after
//! `i * base_step + uniform(0, jitter_max)` and flips over
//! `uniform(min_flip_duration, max_flip_duration)`. The result reads as
//! "random tiles flip at random times", not as a positional wave.
//!
//! Planning ([`plan_cascade`]) is pure given the RNG, so a seeded RNG yields
//! the same order, delays, and durations every run. Execution is owned by
//! [`CascadeOrchestrator`], which enqueues the plan on a virtual-time
//! [`TimerQueue`] and dispatches steps as its clock passes them.
//!
//! # Invariants
//!
//! 1. A cascade over `N` mounted tiles schedules exactly `N` steps.
//! 2. Every delay lies in `[0, (N - 1) * base_step + jitter_max]`.
//! 3. Every duration lies in `[min_flip_duration, max_flip_duration]`.
//! 4. Overlapping cascades are allowed; earlier steps are never cancelled.
//!    Tiles already flipping or already showing back ignore the extra
//!    command.
//! 5. A step whose tile was unmounted, or remounted since planning, is
//!    dropped without touching any tile.

use std::time::Duration;

use rand::Rng;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg64Mcg;
use tilecascade_core::timer_queue::TimerQueue;

use crate::layout::TileId;
use crate::registry::{MountEpoch, TileRegistry};
use crate::tile::{Face, TileHandle};

/// Cascade timing configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeConfig {
    /// Added delay per shuffled position.
    pub base_step: Duration,
    /// Upper bound of the uniform random delay added to every step.
    pub jitter_max: Duration,
    /// Shortest flip duration.
    pub min_flip_duration: Duration,
    /// Longest flip duration.
    pub max_flip_duration: Duration,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            base_step: Duration::from_millis(3),
            jitter_max: Duration::from_millis(1000),
            min_flip_duration: Duration::from_millis(400),
            max_flip_duration: Duration::from_millis(1000),
        }
    }
}

impl CascadeConfig {
    /// Set the per-position step.
    #[must_use]
    pub fn with_base_step(mut self, step: Duration) -> Self {
        self.base_step = step;
        self
    }

    /// Set the jitter bound.
    #[must_use]
    pub fn with_jitter_max(mut self, jitter: Duration) -> Self {
        self.jitter_max = jitter;
        self
    }

    /// Set the flip duration range.
    #[must_use]
    pub fn with_flip_durations(mut self, min: Duration, max: Duration) -> Self {
        self.min_flip_duration = min;
        self.max_flip_duration = max;
        self
    }

    /// Copy with an inverted duration range swapped.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let (min, max) = if self.min_flip_duration <= self.max_flip_duration {
            (self.min_flip_duration, self.max_flip_duration)
        } else {
            (self.max_flip_duration, self.min_flip_duration)
        };
        Self {
            base_step: self.base_step,
            jitter_max: self.jitter_max,
            min_flip_duration: min,
            max_flip_duration: max,
        }
    }

    /// Latest possible start for a cascade over `count` tiles.
    pub fn max_span(&self, count: usize) -> Duration {
        let steps = u32::try_from(count.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_step
            .saturating_mul(steps)
            .saturating_add(self.jitter_max)
    }
}

/// One deferred `flip(back, duration)` produced by a cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledFlip {
    pub id: TileId,
    pub epoch: MountEpoch,
    /// Shuffled position, 0-based.
    pub order: usize,
    /// Delay from the cascade trigger.
    pub delay: Duration,
    /// Flip duration handed to the tile.
    pub duration: Duration,
}

fn uniform_duration<R: Rng + ?Sized>(rng: &mut R, low: Duration, high: Duration) -> Duration {
    if high <= low {
        return low;
    }
    let secs = rng.random_range(low.as_secs_f64()..=high.as_secs_f64());
    Duration::from_secs_f64(secs).clamp(low, high)
}

/// Shuffle `entries` and assign each a start delay and flip duration.
///
/// The returned steps are in shuffled order.
pub fn plan_cascade<R: Rng + ?Sized>(
    mut entries: Vec<(TileId, MountEpoch)>,
    config: &CascadeConfig,
    rng: &mut R,
) -> Vec<ScheduledFlip> {
    let config = config.normalized();
    entries.shuffle(rng);
    entries
        .into_iter()
        .enumerate()
        .map(|(order, (id, epoch))| {
            let base = config
                .base_step
                .saturating_mul(u32::try_from(order).unwrap_or(u32::MAX));
            let jitter = uniform_duration(rng, Duration::ZERO, config.jitter_max);
            let duration =
                uniform_duration(rng, config.min_flip_duration, config.max_flip_duration);
            ScheduledFlip {
                id,
                epoch,
                order,
                delay: base.saturating_add(jitter),
                duration,
            }
        })
        .collect()
}

/// The two commands a host can issue to a grid.
///
/// Hosts bind these to input (a key, a button) and hold the grid through
/// this trait only, without reaching into its registry.
pub trait CascadeControl {
    /// Start a cascade.
    fn cascade(&mut self);
    /// Flip every back-showing tile to front.
    fn reset(&mut self);
}

/// Drives cascades against a [`TileRegistry`] on a virtual clock.
#[derive(Debug)]
pub struct CascadeOrchestrator<R = Pcg64Mcg> {
    config: CascadeConfig,
    rng: R,
    queue: TimerQueue<ScheduledFlip>,
    cascades: u64,
    stale_dropped: u64,
}

impl CascadeOrchestrator<Pcg64Mcg> {
    /// Orchestrator with a reproducible RNG.
    pub fn seeded(config: CascadeConfig, seed: u64) -> Self {
        Self::new(config, Pcg64Mcg::seed_from_u64(seed))
    }
}

impl<R: Rng> CascadeOrchestrator<R> {
    /// Orchestrator drawing randomness from `rng`.
    pub fn new(config: CascadeConfig, rng: R) -> Self {
        Self {
            config: config.normalized(),
            rng,
            queue: TimerQueue::new(),
            cascades: 0,
            stale_dropped: 0,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.queue.now()
    }

    /// Steps waiting for their delay to elapse.
    pub fn pending_steps(&self) -> usize {
        self.queue.len()
    }

    /// Cascades started so far.
    pub fn cascades(&self) -> u64 {
        self.cascades
    }

    /// Steps dropped because their tile was gone.
    pub fn stale_dropped(&self) -> u64 {
        self.stale_dropped
    }

    /// Plan and enqueue a cascade over every tile mounted right now.
    ///
    /// Returns the plan in shuffled order.
    pub fn cascade_flip<H: TileHandle>(
        &mut self,
        registry: &TileRegistry<H>,
    ) -> Vec<ScheduledFlip> {
        let plan = plan_cascade(registry.snapshot(), &self.config, &mut self.rng);
        for step in &plan {
            self.queue.schedule(step.delay, *step);
        }
        self.cascades += 1;
        tilecascade_core::debug!(
            tiles = plan.len(),
            span_ms = self.config.max_span(plan.len()).as_millis() as u64,
            pending = self.queue.len(),
            "cascade planned"
        );
        plan
    }

    /// Send every back-showing tile to front immediately.
    pub fn flip_all_to_front<H: TileHandle>(&mut self, registry: &mut TileRegistry<H>) -> usize {
        let commanded = registry.flip_all_to_front();
        tilecascade_core::debug!(commanded, "grid reset");
        commanded
    }

    /// Advance the clock by `dt`, interleaving tile timers with due
    /// cascade steps so each step lands at its exact virtual time.
    pub fn advance<H: TileHandle>(&mut self, dt: Duration, registry: &mut TileRegistry<H>) {
        let target = self.queue.now().saturating_add(dt);
        while let Some(deadline) = self.queue.next_deadline() {
            if deadline > target {
                break;
            }
            registry.advance_all(deadline.saturating_sub(self.queue.now()));
            self.queue.advance_to(deadline);
            while let Some(step) = self.queue.pop_due() {
                self.dispatch(step, registry);
            }
        }
        registry.advance_all(target.saturating_sub(self.queue.now()));
        self.queue.advance_to(target);
    }

    /// Drop every pending step.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    fn dispatch<H: TileHandle>(&mut self, step: ScheduledFlip, registry: &mut TileRegistry<H>) {
        match registry.get_current_mut(step.id, step.epoch) {
            Some(handle) => handle.flip(Some(Face::Back), Some(step.duration)),
            None => {
                self.stale_dropped += 1;
                tilecascade_core::trace!(tile = step.id.0, "stale cascade step dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn entries(n: usize) -> Vec<(TileId, MountEpoch)> {
        let mut reg: TileRegistry<Recorder> = TileRegistry::new();
        for i in 0..n {
            reg.register(TileId(i), Recorder::default());
        }
        reg.snapshot()
    }

    #[derive(Debug, Default)]
    struct Recorder {
        face: Face,
        calls: Vec<(Option<Face>, Option<Duration>, Duration)>,
        clock: Duration,
    }

    impl TileHandle for Recorder {
        fn flip(&mut self, to: Option<Face>, duration: Option<Duration>) {
            self.calls.push((to, duration, self.clock));
        }

        fn visible_face(&self) -> Face {
            self.face
        }

        fn advance(&mut self, dt: Duration) {
            self.clock += dt;
        }
    }

    #[test]
    fn plan_covers_every_tile_once() {
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        let plan = plan_cascade(entries(40), &CascadeConfig::default(), &mut rng);
        assert_eq!(plan.len(), 40);
        let ids: HashSet<_> = plan.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), 40);
        for (i, step) in plan.iter().enumerate() {
            assert_eq!(step.order, i);
        }
    }

    #[test]
    fn plan_respects_bounds() {
        let config = CascadeConfig::default();
        let mut rng = Pcg64Mcg::seed_from_u64(99);
        let plan = plan_cascade(entries(50), &config, &mut rng);
        let span = config.max_span(50);
        assert_eq!(span, Duration::from_millis(49 * 3 + 1000));
        for step in &plan {
            assert!(step.delay <= span, "{step:?}");
            let base = Duration::from_millis(3 * step.order as u64);
            assert!(step.delay >= base);
            assert!(step.delay <= base + config.jitter_max);
            assert!(step.duration >= Duration::from_millis(400));
            assert!(step.duration <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn seeded_plans_reproduce() {
        let config = CascadeConfig::default();
        let a = plan_cascade(entries(25), &config, &mut Pcg64Mcg::seed_from_u64(1234));
        let b = plan_cascade(entries(25), &config, &mut Pcg64Mcg::seed_from_u64(1234));
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_shuffle_differently() {
        let config = CascadeConfig::default();
        let a = plan_cascade(entries(25), &config, &mut Pcg64Mcg::seed_from_u64(1));
        let b = plan_cascade(entries(25), &config, &mut Pcg64Mcg::seed_from_u64(2));
        let order = |p: &[ScheduledFlip]| p.iter().map(|s| s.id).collect::<Vec<_>>();
        assert_ne!(order(&a), order(&b));
    }

    #[test]
    fn empty_registry_plans_nothing() {
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        assert!(plan_cascade(Vec::new(), &CascadeConfig::default(), &mut rng).is_empty());
    }

    #[test]
    fn zero_jitter_and_fixed_duration() {
        let config = CascadeConfig::default()
            .with_jitter_max(Duration::ZERO)
            .with_flip_durations(Duration::from_millis(500), Duration::from_millis(500));
        let mut rng = Pcg64Mcg::seed_from_u64(3);
        let plan = plan_cascade(entries(4), &config, &mut rng);
        for step in plan {
            assert_eq!(step.delay, Duration::from_millis(3 * step.order as u64));
            assert_eq!(step.duration, Duration::from_millis(500));
        }
    }

    #[test]
    fn inverted_duration_range_is_swapped() {
        let config = CascadeConfig::default()
            .with_flip_durations(Duration::from_millis(900), Duration::from_millis(100))
            .normalized();
        assert_eq!(config.min_flip_duration, Duration::from_millis(100));
        assert_eq!(config.max_flip_duration, Duration::from_millis(900));
    }

    #[test]
    fn orchestrator_dispatches_each_step_at_its_delay() {
        let mut reg = TileRegistry::new();
        for i in 0..6 {
            reg.register(TileId(i), Recorder::default());
        }
        let mut orch = CascadeOrchestrator::seeded(CascadeConfig::default(), 42);
        let plan = orch.cascade_flip(&reg);
        assert_eq!(orch.pending_steps(), 6);
        assert!(reg.iter().all(|(_, r)| r.calls.is_empty()));

        orch.advance(Duration::from_secs(2), &mut reg);
        assert_eq!(orch.pending_steps(), 0);
        for step in plan {
            let calls = &reg.get(step.id).unwrap().calls;
            assert_eq!(calls.len(), 1);
            let (to, duration, at) = calls[0];
            assert_eq!(to, Some(Face::Back));
            assert_eq!(duration, Some(step.duration));
            assert_eq!(at, step.delay);
        }
    }

    #[test]
    fn overlapping_cascades_accumulate() {
        let mut reg = TileRegistry::new();
        for i in 0..3 {
            reg.register(TileId(i), Recorder::default());
        }
        let mut orch = CascadeOrchestrator::seeded(CascadeConfig::default(), 5);
        orch.cascade_flip(&reg);
        orch.advance(Duration::from_millis(100), &mut reg);
        orch.cascade_flip(&reg);
        orch.advance(Duration::from_secs(3), &mut reg);
        assert_eq!(orch.cascades(), 2);
        assert!(reg.iter().all(|(_, r)| r.calls.len() == 2));
    }

    #[test]
    fn unmounted_tile_step_is_dropped() {
        let mut reg = TileRegistry::new();
        for i in 0..4 {
            reg.register(TileId(i), Recorder::default());
        }
        let mut orch = CascadeOrchestrator::seeded(CascadeConfig::default(), 8);
        orch.cascade_flip(&reg);
        let gone = reg.unregister(TileId(2)).unwrap();
        reg.register(TileId(3), Recorder::default());
        orch.advance(Duration::from_secs(2), &mut reg);
        assert!(gone.calls.is_empty());
        assert!(reg.get(TileId(3)).unwrap().calls.is_empty());
        assert_eq!(orch.stale_dropped(), 2);
        assert_eq!(reg.get(TileId(0)).unwrap().calls.len(), 1);
    }

    #[test]
    fn reset_only_touches_back_tiles() {
        let mut reg = TileRegistry::new();
        reg.register(TileId(0), Recorder::default());
        reg.register(
            TileId(1),
            Recorder {
                face: Face::Back,
                ..Recorder::default()
            },
        );
        let mut orch = CascadeOrchestrator::seeded(CascadeConfig::default(), 0);
        assert_eq!(orch.flip_all_to_front(&mut reg), 1);
        assert!(reg.get(TileId(0)).unwrap().calls.is_empty());
        assert_eq!(reg.get(TileId(1)).unwrap().calls.len(), 1);
    }

    #[test]
    fn clear_cancels_pending_steps() {
        let mut reg = TileRegistry::new();
        reg.register(TileId(0), Recorder::default());
        let mut orch = CascadeOrchestrator::seeded(CascadeConfig::default(), 11);
        orch.cascade_flip(&reg);
        orch.clear();
        orch.advance(Duration::from_secs(5), &mut reg);
        assert!(reg.get(TileId(0)).unwrap().calls.is_empty());
        assert_eq!(orch.now(), Duration::from_secs(5));
    }
}
