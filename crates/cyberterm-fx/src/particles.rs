#![forbid(unsafe_code)]

//! Pointer-driven particle trail.
//!
//! Pointer moves pass through a [`PointerThrottle`]; each processed sample
//! spawns one particle with a tier-dependent probability. A repeating tick
//! advances every live particle (position += velocity, life -= 1,
//! size *= decay) and retires those that ran out of life or shrank below the
//! minimum size.
//!
//! # Invariants
//!
//! 1. The live count never exceeds `max_particles`; the oldest particle is
//!    dropped to make room.
//! 2. Particle ids are unique for the lifetime of the system.
//! 3. On `low-resource` nothing spawns and no tick is scheduled.
//! 4. After unmount the particle list is empty and stays empty.

use std::collections::VecDeque;
use std::ops::Range;
use std::time::Duration;

use cyberterm_core::lifecycle::{Lifecycle, MountGuard, MountState};
use cyberterm_core::pointer::{PointerSample, PointerThrottle};
use cyberterm_core::timer::{TimerId, TimerQueue};
use cyberterm_core::{DeviceTier, FxRng, Mountable};
use serde::{Deserialize, Serialize};

use crate::palette::{NEON, Rgb};

/// One decorative particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Unique id.
    pub id: u64,
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
    /// Diameter.
    pub size: f32,
    /// Horizontal velocity per tick.
    pub velocity_x: f32,
    /// Vertical velocity per tick.
    pub velocity_y: f32,
    /// Ticks left to live.
    pub remaining_life: u32,
    /// Fill colour.
    pub color: Rgb,
}

impl Particle {
    fn advance(&mut self, decay: f32) {
        self.x += self.velocity_x;
        self.y += self.velocity_y;
        self.remaining_life = self.remaining_life.saturating_sub(1);
        self.size *= decay;
    }

    fn is_alive(&self, min_size: f32) -> bool {
        self.remaining_life > 0 && self.size >= min_size
    }
}

/// Particle tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Live particle cap.
    pub max_particles: usize,
    /// Simulation tick in milliseconds.
    pub tick_ms: u64,
    /// Minimum spacing between processed pointer moves, in milliseconds.
    pub throttle_ms: u64,
    /// Initial size range (min).
    pub size_min: f32,
    /// Initial size range (max).
    pub size_max: f32,
    /// Velocity is drawn from `-max_speed..max_speed` on each axis.
    pub max_speed: f32,
    /// Initial life range in ticks (min).
    pub life_min: u32,
    /// Initial life range in ticks (max).
    pub life_max: u32,
    /// Size multiplier applied each tick.
    pub decay: f32,
    /// Particles smaller than this are retired.
    pub min_size: f32,
    /// Spawn probability per processed move on the full tier.
    pub spawn_full: f64,
    /// Spawn probability on the tablet tier.
    pub spawn_tablet: f64,
    /// Spawn probability on the mobile tier.
    pub spawn_mobile: f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max_particles: 50,
            tick_ms: 16,
            throttle_ms: 16,
            size_min: 2.0,
            size_max: 6.0,
            max_speed: 1.0,
            life_min: 20,
            life_max: 60,
            decay: 0.96,
            min_size: 0.5,
            spawn_full: 0.3,
            spawn_tablet: 0.2,
            spawn_mobile: 0.1,
        }
    }
}

impl ParticleConfig {
    /// Spawn probability for `tier`. Always zero on `low-resource`.
    #[must_use]
    pub fn spawn_probability(&self, tier: DeviceTier) -> f64 {
        match tier {
            DeviceTier::Full => self.spawn_full,
            DeviceTier::Tablet => self.spawn_tablet,
            DeviceTier::Mobile => self.spawn_mobile,
            DeviceTier::LowResource => 0.0,
        }
    }

    /// Simulation tick.
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Pointer throttle interval.
    #[must_use]
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    fn size_range(&self) -> Range<f32> {
        self.size_min..self.size_max
    }

    fn life_range(&self) -> Range<u32> {
        self.life_min..self.life_max.saturating_add(1)
    }

    /// Validate ranges. An empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.tick_ms == 0 {
            errors.push("particles.tick_ms must be > 0".into());
        }
        let sizes_ok =
            self.size_min > 0.0 && self.size_min <= self.size_max && self.size_max.is_finite();
        if !sizes_ok {
            errors.push(format!(
                "particles.size_min..size_max must be finite, 0 < min <= max, got {}..{}",
                self.size_min, self.size_max
            ));
        }
        if !(self.max_speed >= 0.0 && self.max_speed.is_finite()) {
            errors.push(format!("particles.max_speed must be >= 0, got {}", self.max_speed));
        }
        if self.life_min == 0 || self.life_min > self.life_max {
            errors.push(format!(
                "particles.life_min must be in [1, life_max], got {}..{}",
                self.life_min, self.life_max
            ));
        }
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            errors.push(format!("particles.decay must be in (0, 1], got {}", self.decay));
        }
        if !(self.min_size >= 0.0 && self.min_size.is_finite()) {
            errors.push(format!("particles.min_size must be >= 0, got {}", self.min_size));
        }
        for (name, p) in [
            ("spawn_full", self.spawn_full),
            ("spawn_tablet", self.spawn_tablet),
            ("spawn_mobile", self.spawn_mobile),
        ] {
            if !(0.0..=1.0).contains(&p) {
                errors.push(format!("particles.{name} must be in [0, 1], got {p}"));
            }
        }
        errors
    }
}

/// Counters for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParticleStats {
    /// Pointer moves offered.
    pub moves_seen: u64,
    /// Moves that passed the throttle.
    pub moves_processed: u64,
    /// Particles created.
    pub spawned: u64,
    /// Particles retired by life or size.
    pub retired: u64,
    /// Particles dropped to respect the cap.
    pub evicted: u64,
    /// Simulation ticks run.
    pub ticks: u64,
}

/// Owner of the live particle list.
#[derive(Debug)]
pub struct ParticleSystem {
    tier: DeviceTier,
    config: ParticleConfig,
    spawn_probability: f64,
    rng: FxRng,
    particles: VecDeque<Particle>,
    next_id: u64,
    throttle: PointerThrottle,
    queue: TimerQueue<()>,
    tick_timer: Option<TimerId>,
    lifecycle: Lifecycle,
    stats: ParticleStats,
}

impl ParticleSystem {
    /// Create an unmounted system.
    #[must_use]
    pub fn new(tier: DeviceTier, config: ParticleConfig, rng: FxRng) -> Self {
        let spawn_probability = config.spawn_probability(tier);
        let throttle = PointerThrottle::new(config.throttle());
        Self {
            tier,
            particles: VecDeque::with_capacity(config.max_particles),
            config,
            spawn_probability,
            rng,
            next_id: 1,
            throttle,
            queue: TimerQueue::new(),
            tick_timer: None,
            lifecycle: Lifecycle::new(),
            stats: ParticleStats::default(),
        }
    }

    /// Live particles, oldest first.
    pub fn particles(&self) -> impl ExactSizeIterator<Item = &Particle> + '_ {
        self.particles.iter()
    }

    /// Number of live particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether no particle is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Spawn probability in effect for this tier.
    #[must_use]
    pub fn spawn_probability(&self) -> f64 {
        self.spawn_probability
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> ParticleStats {
        self.stats
    }

    /// Session tier.
    #[must_use]
    pub fn tier(&self) -> DeviceTier {
        self.tier
    }

    /// Observer for captured work.
    #[must_use]
    pub fn guard(&self) -> MountGuard {
        self.lifecycle.guard()
    }

    /// Handle of the repeating simulation tick, if scheduled.
    #[must_use]
    pub fn tick_timer(&self) -> Option<TimerId> {
        self.tick_timer.filter(|&id| self.queue.contains(id))
    }

    /// Offer a pointer move observed at `now`.
    ///
    /// Returns `true` if a particle was spawned. Moves are ignored entirely
    /// when unmounted or when the tier never spawns.
    pub fn pointer_moved(&mut self, sample: PointerSample, now: Duration) -> bool {
        if !self.lifecycle.is_mounted() || self.spawn_probability <= 0.0 {
            return false;
        }
        self.stats.moves_seen += 1;
        match self.throttle.push(sample, now) {
            Some(sample) => self.process(sample),
            None => false,
        }
    }

    fn process(&mut self, sample: PointerSample) -> bool {
        self.stats.moves_processed += 1;
        if self.config.max_particles == 0 || !self.rng.chance(self.spawn_probability) {
            return false;
        }
        while self.particles.len() >= self.config.max_particles {
            self.particles.pop_front();
            self.stats.evicted += 1;
        }
        let particle = self.make_particle(sample);
        tracing::trace!(
            target: "cyberterm.particles",
            id = particle.id,
            x = particle.x,
            y = particle.y,
            "particle spawned"
        );
        self.particles.push_back(particle);
        self.stats.spawned += 1;
        true
    }

    fn make_particle(&mut self, sample: PointerSample) -> Particle {
        let id = self.next_id;
        self.next_id += 1;
        let speed = self.config.max_speed;
        let color = self.rng.index(NEON.len()).map_or(NEON[0], |i| NEON[i]);
        Particle {
            id,
            x: sample.x,
            y: sample.y,
            size: self.rng.range_f32(self.config.size_range()),
            velocity_x: self.rng.range_f32(-speed..speed),
            velocity_y: self.rng.range_f32(-speed..speed),
            remaining_life: self.rng.range_u32(self.config.life_range()),
            color,
        }
    }

    /// Run one simulation step immediately.
    pub fn step(&mut self) {
        if !self.lifecycle.is_mounted() {
            return;
        }
        self.stats.ticks += 1;
        let decay = self.config.decay;
        let min_size = self.config.min_size;
        let before = self.particles.len();
        for particle in &mut self.particles {
            particle.advance(decay);
        }
        self.particles.retain(|p| p.is_alive(min_size));
        self.stats.retired += (before - self.particles.len()) as u64;
    }

    /// Fire a captured timer immediately.
    ///
    /// Returns `false` (and changes nothing) when unmounted or when the
    /// handle is no longer pending.
    pub fn fire(&mut self, id: TimerId) -> bool {
        if !self.lifecycle.is_mounted() {
            tracing::debug!(
                target: "cyberterm.particles",
                timer = id.raw(),
                state = ?self.lifecycle.state(),
                "ignoring timer fired outside mount"
            );
            return false;
        }
        match self.queue.fire(id) {
            Some(fired) => {
                self.on_tick(fired.at);
                true
            }
            None => false,
        }
    }

    fn on_tick(&mut self, at: Duration) {
        if let Some(sample) = self.throttle.flush(at) {
            self.process(sample);
        }
        self.step();
    }
}

impl Mountable for ParticleSystem {
    fn name(&self) -> &'static str {
        "particles"
    }

    fn mount(&mut self, now: Duration) {
        if !self.lifecycle.mount() {
            tracing::debug!(
                target: "cyberterm.particles",
                state = ?self.lifecycle.state(),
                "mount ignored"
            );
            return;
        }
        self.queue = TimerQueue::starting_at(now);
        if !self.tier.decorative_enabled() {
            tracing::debug!(target: "cyberterm.particles", tier = %self.tier, "disabled for tier");
            return;
        }
        self.tick_timer = Some(self.queue.every(self.config.tick(), ()));
        tracing::debug!(
            target: "cyberterm.particles",
            tier = %self.tier,
            spawn_probability = self.spawn_probability,
            cap = self.config.max_particles,
            "mounted"
        );
    }

    fn unmount(&mut self) {
        if !self.lifecycle.unmount() {
            return;
        }
        let cancelled = self.queue.cancel_all();
        self.tick_timer = None;
        self.throttle.clear();
        self.particles.clear();
        tracing::debug!(
            target: "cyberterm.particles",
            cancelled,
            spawned = self.stats.spawned,
            "unmounted"
        );
    }

    fn advance_to(&mut self, now: Duration) {
        if !self.lifecycle.is_mounted() {
            return;
        }
        while let Some(fired) = self.queue.poll(now) {
            self.on_tick(fired.at);
        }
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.queue.next_deadline()
    }

    fn mount_state(&self) -> MountState {
        self.lifecycle.state()
    }
}

impl Drop for ParticleSystem {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn eager() -> ParticleConfig {
        ParticleConfig {
            spawn_full: 1.0,
            spawn_tablet: 1.0,
            spawn_mobile: 1.0,
            ..ParticleConfig::default()
        }
    }

    fn mounted(tier: DeviceTier, config: ParticleConfig) -> ParticleSystem {
        let mut system = ParticleSystem::new(tier, config, FxRng::seeded(11));
        system.mount(Duration::ZERO);
        system
    }

    #[test]
    fn spawns_at_pointer_position() {
        let mut system = mounted(DeviceTier::Full, eager());
        assert!(system.pointer_moved(PointerSample::new(120.0, 48.0), ms(0)));
        let particle = system.particles().next().unwrap();
        assert_eq!((particle.x, particle.y), (120.0, 48.0));
        assert!((2.0..6.0).contains(&particle.size));
        assert!((20..=60).contains(&particle.remaining_life));
        assert!(NEON.contains(&particle.color));
    }

    #[test]
    fn tick_moves_ages_and_shrinks() {
        let mut system = mounted(DeviceTier::Full, eager());
        system.pointer_moved(PointerSample::new(0.0, 0.0), ms(0));
        let before = system.particles().next().unwrap().clone();
        system.advance_to(ms(16));
        let after = system.particles().next().unwrap();
        assert_eq!(after.x, before.x + before.velocity_x);
        assert_eq!(after.y, before.y + before.velocity_y);
        assert_eq!(after.remaining_life, before.remaining_life - 1);
        assert!((after.size - before.size * 0.96).abs() < 1e-6);
    }

    #[test]
    fn particles_retire_by_life() {
        let config = ParticleConfig {
            life_min: 3,
            life_max: 3,
            decay: 1.0,
            ..eager()
        };
        let mut system = mounted(DeviceTier::Full, config);
        system.pointer_moved(PointerSample::new(0.0, 0.0), ms(0));
        system.advance_to(ms(32));
        assert_eq!(system.len(), 1);
        system.advance_to(ms(48));
        assert!(system.is_empty());
        assert_eq!(system.stats().retired, 1);
    }

    #[test]
    fn particles_retire_by_size() {
        let config = ParticleConfig {
            size_min: 1.0,
            size_max: 1.0,
            decay: 0.4,
            min_size: 0.5,
            ..eager()
        };
        let mut system = mounted(DeviceTier::Full, config);
        system.pointer_moved(PointerSample::new(0.0, 0.0), ms(0));
        system.advance_to(ms(16));
        assert!(system.is_empty(), "1.0 * 0.4 < 0.5");
    }

    #[test]
    fn cap_evicts_oldest() {
        let config = ParticleConfig {
            max_particles: 5,
            throttle_ms: 0,
            ..eager()
        };
        let mut system = ParticleSystem::new(DeviceTier::Full, config, FxRng::seeded(5));
        system.mount(Duration::ZERO);
        for i in 0..8 {
            system.pointer_moved(PointerSample::new(i as f32, 0.0), ms(i));
        }
        assert_eq!(system.len(), 5);
        let ids: Vec<u64> = system.particles().map(|p| p.id).collect();
        assert_eq!(ids, vec![4, 5, 6, 7, 8]);
        assert_eq!(system.stats().evicted, 3);
    }

    #[test]
    fn throttle_coalesces_and_flushes_on_tick() {
        let mut system = mounted(DeviceTier::Full, eager());
        assert!(system.pointer_moved(PointerSample::new(1.0, 1.0), ms(0)));
        assert!(!system.pointer_moved(PointerSample::new(2.0, 2.0), ms(3)));
        assert!(!system.pointer_moved(PointerSample::new(9.0, 9.0), ms(6)));
        assert_eq!(system.len(), 1);

        system.advance_to(ms(16));
        assert_eq!(system.len(), 2);
        let newest = system.particles().last().unwrap();
        // Spawned at the coalesced position, then stepped once.
        assert_eq!(newest.x, 9.0 + newest.velocity_x);
        assert_eq!(system.stats().moves_processed, 2);
    }

    #[test]
    fn low_resource_never_spawns() {
        let mut system = mounted(DeviceTier::LowResource, eager());
        for i in 0..500 {
            assert!(!system.pointer_moved(PointerSample::new(i as f32, 0.0), ms(i * 20)));
        }
        system.advance_to(ms(20_000));
        assert_eq!(system.len(), 0);
        assert_eq!(system.tick_timer(), None);
        assert_eq!(system.spawn_probability(), 0.0);
    }

    #[test]
    fn tier_sets_spawn_probability() {
        let config = ParticleConfig::default();
        assert_eq!(config.spawn_probability(DeviceTier::Full), 0.3);
        assert_eq!(config.spawn_probability(DeviceTier::Tablet), 0.2);
        assert_eq!(config.spawn_probability(DeviceTier::Mobile), 0.1);
        assert_eq!(config.spawn_probability(DeviceTier::LowResource), 0.0);
    }

    #[test]
    fn unmounted_system_ignores_input() {
        let mut system = ParticleSystem::new(DeviceTier::Full, eager(), FxRng::seeded(1));
        assert!(!system.pointer_moved(PointerSample::new(0.0, 0.0), ms(0)));
        system.step();
        assert_eq!(system.stats(), ParticleStats::default());
    }

    #[test]
    fn unmount_clears_and_captured_tick_is_noop() {
        let mut system = mounted(DeviceTier::Full, eager());
        system.pointer_moved(PointerSample::new(0.0, 0.0), ms(0));
        let captured = system.tick_timer().unwrap();
        system.unmount();

        assert!(system.is_empty());
        assert!(!system.fire(captured));
        assert!(!system.pointer_moved(PointerSample::new(5.0, 5.0), ms(100)));
        system.advance_to(ms(10_000));
        assert!(system.is_empty());
        assert_eq!(system.next_deadline(), None);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ParticleConfig =
            serde_json::from_str(r#"{"max_particles": 12, "spawn_full": 0.5}"#).unwrap();
        assert_eq!(config.max_particles, 12);
        assert_eq!(config.spawn_probability(DeviceTier::Full), 0.5);
        assert_eq!(config.tick(), ms(16));
        assert_eq!(config.life_min, 20);
    }

    #[test]
    fn validate_reports_bad_ranges() {
        let config = ParticleConfig {
            life_min: 10,
            life_max: 5,
            decay: 1.5,
            spawn_mobile: -0.1,
            ..ParticleConfig::default()
        };
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("life_min")));
        assert!(errors.iter().any(|e| e.contains("decay")));
        assert!(errors.iter().any(|e| e.contains("spawn_mobile")));
        assert!(ParticleConfig::default().validate().is_empty());
    }

    #[test]
    fn unbounded_size_is_rejected_and_never_panics() {
        let config = ParticleConfig {
            size_max: f32::INFINITY,
            spawn_full: 1.0,
            ..ParticleConfig::default()
        };
        assert!(config.validate().iter().any(|e| e.contains("size_max")));

        let mut system = mounted(DeviceTier::Full, config);
        assert!(system.pointer_moved(PointerSample::new(1.0, 1.0), ms(0)));
        assert_eq!(system.particles().next().map(|p| p.size), Some(2.0));
    }
}
