#![forbid(unsafe_code)]

//! The hero mount point.
//!
//! [`HeroMount::mount`] builds and mounts the terminal session, the ambient
//! scheduler, and the particle system for one device tier. All three share
//! one virtual clock (time since mount) which the host moves forward with
//! [`HeroMount::advance_to`]. The decorative subsystems run independently of
//! the session phase; none of them can block another.
//!
//! The only thing flowing back to the host is [`HeroFrame`], a plain
//! snapshot for rendering.

use std::time::Duration;

use cyberterm_core::lifecycle::{Lifecycle, MountGuard, MountState};
use cyberterm_core::{DeviceTier, FxRng, Mountable, PointerSample};
use cyberterm_fx::{
    AmbientScheduler, AmbientStats, EffectFlags, Particle, ParticleStats, ParticleSystem,
};
use cyberterm_shell::{
    BootCallback, Outcome, SessionPhase, TerminalSession, TranscriptEntry, WallClock,
};

use crate::config::{HeroConfig, HeroConfigError};

const AMBIENT_STREAM: u64 = 0xA4B1;
const PARTICLE_STREAM: u64 = 0x9A27;

/// What the host passes at mount time.
pub struct MountConfig {
    /// Session tier, fixed for the mount's lifetime.
    pub tier: DeviceTier,
    /// Run once when the boot sequence completes.
    pub on_boot_complete: Option<BootCallback>,
}

impl std::fmt::Debug for MountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountConfig")
            .field("tier", &self.tier)
            .field("on_boot_complete", &self.on_boot_complete.is_some())
            .finish()
    }
}

impl MountConfig {
    /// Mount config for `tier` with no callback.
    #[must_use]
    pub fn new(tier: DeviceTier) -> Self {
        Self {
            tier,
            on_boot_complete: None,
        }
    }

    /// Add a boot-complete callback.
    #[must_use]
    pub fn on_boot_complete(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_boot_complete = Some(Box::new(callback));
        self
    }
}

/// Render snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct HeroFrame {
    /// Virtual time of the snapshot.
    pub at: Duration,
    /// Session tier.
    pub tier: DeviceTier,
    /// Session phase.
    pub phase: SessionPhase,
    /// Fully revealed boot lines.
    pub boot_lines: Vec<String>,
    /// Partially revealed boot line.
    pub current_line: Option<String>,
    /// Transcript rows, oldest first.
    pub transcript: Vec<TranscriptEntry>,
    /// Whether the input affordance is enabled.
    pub input_enabled: bool,
    /// Active ambient effects.
    pub effects: EffectFlags,
    /// Highlighted call-to-action while the highlight is active.
    pub highlighted: Option<usize>,
    /// Live particles, oldest first.
    pub particles: Vec<Particle>,
}

/// Counters across the decorative subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeroStats {
    /// Ambient scheduler counters.
    pub ambient: AmbientStats,
    /// Particle counters.
    pub particles: ParticleStats,
}

/// A mounted hero.
#[derive(Debug)]
pub struct HeroMount {
    tier: DeviceTier,
    session: TerminalSession,
    ambient: AmbientScheduler,
    particles: ParticleSystem,
    lifecycle: Lifecycle,
    now: Duration,
}

impl HeroMount {
    /// Build every subsystem from `config` and mount them at virtual time
    /// zero.
    ///
    /// # Errors
    ///
    /// Fails if `config` has range errors or an unusable catalog.
    pub fn mount(config: &HeroConfig, mount: MountConfig) -> Result<Self, HeroConfigError> {
        Self::mount_inner(config, mount, None)
    }

    /// Same as [`mount`](Self::mount) with an explicit clock for `date`.
    pub fn mount_with_clock(
        config: &HeroConfig,
        mount: MountConfig,
        clock: Box<dyn WallClock>,
    ) -> Result<Self, HeroConfigError> {
        Self::mount_inner(config, mount, Some(clock))
    }

    fn mount_inner(
        config: &HeroConfig,
        mount: MountConfig,
        clock: Option<Box<dyn WallClock>>,
    ) -> Result<Self, HeroConfigError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(HeroConfigError::Validation(errors));
        }
        let table = config.command_table()?;
        let tier = mount.tier;
        let mut rng = FxRng::from_optional_seed(config.seed);

        let mut session = match clock {
            Some(clock) => {
                TerminalSession::with_clock(tier, config.terminal.clone(), table, clock)
            }
            None => TerminalSession::new(tier, config.terminal.clone(), table),
        };
        session.set_boot_callback(mount.on_boot_complete);
        let ambient =
            AmbientScheduler::new(tier, config.ambient.clone(), rng.fork(AMBIENT_STREAM));
        let particles =
            ParticleSystem::new(tier, config.particles.clone(), rng.fork(PARTICLE_STREAM));

        let mut hero = Self {
            tier,
            session,
            ambient,
            particles,
            lifecycle: Lifecycle::new(),
            now: Duration::ZERO,
        };
        hero.lifecycle.mount();
        for part in hero.parts_mut() {
            part.mount(Duration::ZERO);
            tracing::trace!(
                target: "cyberterm.host",
                part = part.name(),
                state = ?part.mount_state(),
                "part mounted"
            );
        }
        tracing::debug!(
            target: "cyberterm.host",
            tier = %tier,
            seed = ?config.seed,
            "hero mounted"
        );
        Ok(hero)
    }

    fn parts_mut(&mut self) -> [&mut dyn Mountable; 3] {
        [&mut self.session, &mut self.ambient, &mut self.particles]
    }

    fn parts(&self) -> [&dyn Mountable; 3] {
        [&self.session, &self.ambient, &self.particles]
    }

    /// Session tier.
    #[must_use]
    pub fn tier(&self) -> DeviceTier {
        self.tier
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Mount state of the hero as a whole.
    #[must_use]
    pub fn state(&self) -> MountState {
        self.lifecycle.state()
    }

    /// Whether the hero is mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.lifecycle.is_mounted()
    }

    /// Observer for work running outside the hero (input readers).
    #[must_use]
    pub fn guard(&self) -> MountGuard {
        self.lifecycle.guard()
    }

    /// The terminal session.
    #[must_use]
    pub fn session(&self) -> &TerminalSession {
        &self.session
    }

    /// The ambient scheduler.
    #[must_use]
    pub fn ambient(&self) -> &AmbientScheduler {
        &self.ambient
    }

    /// The particle system.
    #[must_use]
    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// Decorative counters.
    #[must_use]
    pub fn stats(&self) -> HeroStats {
        HeroStats {
            ambient: self.ambient.stats(),
            particles: self.particles.stats(),
        }
    }

    /// Run every subsystem's due work up to `now`. Time never moves
    /// backwards; an earlier `now` is a no-op.
    pub fn advance_to(&mut self, now: Duration) {
        if !self.lifecycle.is_mounted() || now < self.now {
            return;
        }
        self.now = now;
        for part in self.parts_mut() {
            part.advance_to(now);
        }
    }

    /// Earliest pending deadline across subsystems.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.parts()
            .into_iter()
            .filter_map(|part| part.next_deadline())
            .min()
    }

    /// Forward a pointer move observed at `now`. Returns `true` if a
    /// particle spawned.
    pub fn pointer_moved(&mut self, x: f32, y: f32, now: Duration) -> bool {
        self.advance_to(now);
        if !self.lifecycle.is_mounted() {
            return false;
        }
        self.particles
            .pointer_moved(PointerSample::new(x, y), self.now)
    }

    /// Submit a line to the terminal.
    pub fn submit(&mut self, line: &str) -> Outcome {
        self.session.submit(line)
    }

    /// Recall the next older input line.
    pub fn history_previous(&mut self) -> Option<&str> {
        self.session.history_previous()
    }

    /// Recall the next newer input line.
    pub fn history_next(&mut self) -> Option<&str> {
        self.session.history_next()
    }

    /// Snapshot for rendering.
    #[must_use]
    pub fn frame(&self) -> HeroFrame {
        let view = self.session.view();
        HeroFrame {
            at: self.now,
            tier: self.tier,
            phase: view.phase,
            boot_lines: view.boot_lines.to_vec(),
            current_line: view.current_line.map(str::to_owned),
            transcript: view.transcript.iter().cloned().collect(),
            input_enabled: view.input_enabled,
            effects: self.ambient.flags(),
            highlighted: self.ambient.highlighted_target(),
            particles: self.particles.particles().cloned().collect(),
        }
    }

    /// Tear every subsystem down. Idempotent.
    pub fn unmount(&mut self) {
        if !self.lifecycle.unmount() {
            return;
        }
        for part in self.parts_mut() {
            part.unmount();
        }
        tracing::debug!(
            target: "cyberterm.host",
            at_ms = self.now.as_millis() as u64,
            "hero unmounted"
        );
    }
}

impl Drop for HeroMount {
    fn drop(&mut self) {
        self.unmount();
    }
}
