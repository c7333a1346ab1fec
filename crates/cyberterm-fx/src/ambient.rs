#![forbid(unsafe_code)]

//! Ambient effect scheduler.
//!
//! Owns one repeating trigger per decorative effect (glitch, scan-line,
//! data-stream, attention highlight). At each period tick a trigger rolls its
//! probability; on success the effect's flag is set and a one-shot reset is
//! scheduled for the effect's active duration.
//!
//! # Invariants
//!
//! 1. A trigger that fires while its flag is set is a no-op: it neither
//!    re-rolls nor extends the pending reset.
//! 2. At most one reset is pending per effect.
//! 3. After [`AmbientScheduler::unmount`] no timer is pending and the flags
//!    never change again, whatever the caller does.
//! 4. On the `low-resource` tier nothing is scheduled at all.
//!
//! # Tier scaling
//!
//! Periods are scaled by [`DeviceTier::scale_period`]; an effect whose
//! `min_tier` is more capable than the session tier is never scheduled.

use std::time::Duration;

use bitflags::bitflags;
use cyberterm_core::lifecycle::{Lifecycle, MountGuard, MountState};
use cyberterm_core::timer::{Fired, TimerId, TimerQueue};
use cyberterm_core::{DeviceTier, FxRng, Mountable};
use serde::{Deserialize, Serialize};

bitflags! {
    /// Which ambient effects are currently active.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EffectFlags: u8 {
        /// Glitch distortion on the hero text.
        const GLITCH = 1;
        /// Scan-line sweep over the terminal.
        const SCANLINE = 1 << 1;
        /// Falling data-stream backdrop.
        const DATA_STREAM = 1 << 2;
        /// Attention highlight on one call-to-action.
        const HIGHLIGHT = 1 << 3;
    }
}

/// An ambient effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EffectKind {
    /// Glitch distortion.
    Glitch,
    /// Scan-line sweep.
    Scanline,
    /// Data-stream backdrop.
    DataStream,
    /// Attention highlight.
    Highlight,
}

impl EffectKind {
    /// Every effect, in scheduling order.
    pub const ALL: [Self; 4] = [Self::Glitch, Self::Scanline, Self::DataStream, Self::Highlight];

    /// The flag this effect toggles.
    #[must_use]
    pub const fn flag(self) -> EffectFlags {
        match self {
            Self::Glitch => EffectFlags::GLITCH,
            Self::Scanline => EffectFlags::SCANLINE,
            Self::DataStream => EffectFlags::DATA_STREAM,
            Self::Highlight => EffectFlags::HIGHLIGHT,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Glitch => 0,
            Self::Scanline => 1,
            Self::DataStream => 2,
            Self::Highlight => 3,
        }
    }

    /// Field name in [`AmbientConfig`].
    #[must_use]
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::Glitch => "glitch",
            Self::Scanline => "scanline",
            Self::DataStream => "data_stream",
            Self::Highlight => "highlight",
        }
    }

    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Glitch => "glitch",
            Self::Scanline => "scanline",
            Self::DataStream => "data-stream",
            Self::Highlight => "highlight",
        }
    }
}

/// Timing of one ambient effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    /// Base trigger period in milliseconds (full tier).
    pub period_ms: u64,
    /// Probability the effect fires at each trigger tick.
    pub probability: f64,
    /// How long the flag stays set, in milliseconds.
    pub active_ms: u64,
    /// Least capable tier that runs this effect.
    pub min_tier: DeviceTier,
}

impl EffectSpec {
    /// Base trigger period.
    #[must_use]
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Active duration.
    #[must_use]
    pub fn active_for(&self) -> Duration {
        Duration::from_millis(self.active_ms)
    }
}

/// Effect table for the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    /// Glitch timing.
    pub glitch: EffectSpec,
    /// Scan-line timing.
    pub scanline: EffectSpec,
    /// Data-stream timing.
    pub data_stream: EffectSpec,
    /// Highlight timing.
    pub highlight: EffectSpec,
    /// Number of elements the highlight can land on.
    pub highlight_targets: usize,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            glitch: EffectSpec {
                period_ms: 5_000,
                probability: 0.3,
                active_ms: 200,
                min_tier: DeviceTier::Mobile,
            },
            scanline: EffectSpec {
                period_ms: 8_000,
                probability: 0.5,
                active_ms: 2_000,
                min_tier: DeviceTier::Tablet,
            },
            data_stream: EffectSpec {
                period_ms: 3_000,
                probability: 0.4,
                active_ms: 1_500,
                min_tier: DeviceTier::Full,
            },
            highlight: EffectSpec {
                period_ms: 4_000,
                probability: 0.6,
                active_ms: 1_000,
                min_tier: DeviceTier::Mobile,
            },
            highlight_targets: 3,
        }
    }
}

impl AmbientConfig {
    /// Timing for `kind`.
    #[must_use]
    pub fn spec(&self, kind: EffectKind) -> &EffectSpec {
        match kind {
            EffectKind::Glitch => &self.glitch,
            EffectKind::Scanline => &self.scanline,
            EffectKind::DataStream => &self.data_stream,
            EffectKind::Highlight => &self.highlight,
        }
    }

    /// Validate ranges. An empty list means the table is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for kind in EffectKind::ALL {
            let spec = self.spec(kind);
            let name = kind.config_key();
            if spec.period_ms == 0 {
                errors.push(format!("ambient.{name}.period_ms must be > 0"));
            }
            if !(0.0..=1.0).contains(&spec.probability) {
                errors.push(format!(
                    "ambient.{name}.probability must be in [0, 1], got {}",
                    spec.probability
                ));
            }
            if spec.active_ms == 0 {
                errors.push(format!("ambient.{name}.active_ms must be > 0"));
            }
        }
        errors
    }
}

/// Counters for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AmbientStats {
    /// Trigger ticks observed.
    pub ticks: u64,
    /// Ticks that set a flag.
    pub triggers_fired: u64,
    /// Resets that cleared a flag.
    pub resets_fired: u64,
    /// Ticks skipped because the flag was already set.
    pub already_active: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AmbientTimer {
    Trigger(EffectKind),
    Reset(EffectKind),
}

/// Owner of every ambient effect timer for one session.
#[derive(Debug)]
pub struct AmbientScheduler {
    tier: DeviceTier,
    config: AmbientConfig,
    rng: FxRng,
    queue: TimerQueue<AmbientTimer>,
    lifecycle: Lifecycle,
    triggers: Vec<(EffectKind, TimerId)>,
    resets: [Option<TimerId>; 4],
    flags: EffectFlags,
    highlighted: Option<usize>,
    stats: AmbientStats,
}

impl AmbientScheduler {
    /// Create an unmounted scheduler.
    #[must_use]
    pub fn new(tier: DeviceTier, config: AmbientConfig, rng: FxRng) -> Self {
        Self {
            tier,
            config,
            rng,
            queue: TimerQueue::new(),
            lifecycle: Lifecycle::new(),
            triggers: Vec::new(),
            resets: [None; 4],
            flags: EffectFlags::empty(),
            highlighted: None,
            stats: AmbientStats::default(),
        }
    }

    /// Scaled trigger period for `kind`, or `None` if it does not run on
    /// this tier.
    #[must_use]
    pub fn trigger_period(&self, kind: EffectKind) -> Option<Duration> {
        let spec = self.config.spec(kind);
        if !self.tier.meets(spec.min_tier) || spec.probability <= 0.0 {
            return None;
        }
        self.tier.scale_period(spec.period())
    }

    /// Effects that run on this tier.
    #[must_use]
    pub fn enabled_effects(&self) -> Vec<EffectKind> {
        EffectKind::ALL
            .into_iter()
            .filter(|&kind| self.trigger_period(kind).is_some())
            .collect()
    }

    /// Currently active flags.
    #[must_use]
    pub fn flags(&self) -> EffectFlags {
        self.flags
    }

    /// Whether `kind` is active.
    #[must_use]
    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.flags.contains(kind.flag())
    }

    /// Index of the highlighted element while the highlight is active.
    #[must_use]
    pub fn highlighted_target(&self) -> Option<usize> {
        self.highlighted
    }

    /// Session tier.
    #[must_use]
    pub fn tier(&self) -> DeviceTier {
        self.tier
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> AmbientStats {
        self.stats
    }

    /// Observer for captured work.
    #[must_use]
    pub fn guard(&self) -> MountGuard {
        self.lifecycle.guard()
    }

    /// Handles of every pending timer (triggers and resets).
    #[must_use]
    pub fn pending_timers(&self) -> Vec<TimerId> {
        let mut ids: Vec<TimerId> = self.queue.ids().collect();
        ids.sort_unstable();
        ids
    }

    /// Handle of the repeating trigger for `kind`, if scheduled.
    #[must_use]
    pub fn trigger_timer(&self, kind: EffectKind) -> Option<TimerId> {
        self.triggers
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|&(_, id)| id)
            .filter(|&id| self.queue.contains(id))
    }

    /// Handle of the pending reset for `kind`, if the effect is active.
    #[must_use]
    pub fn pending_reset(&self, kind: EffectKind) -> Option<TimerId> {
        self.resets[kind.index()]
    }

    /// Fire a captured timer immediately.
    ///
    /// Returns `false` (and changes nothing) when the scheduler is not
    /// mounted or the handle is no longer pending.
    pub fn fire(&mut self, id: TimerId) -> bool {
        if !self.lifecycle.is_mounted() {
            tracing::debug!(
                target: "cyberterm.ambient",
                timer = id.raw(),
                state = ?self.lifecycle.state(),
                "ignoring timer fired outside mount"
            );
            return false;
        }
        match self.queue.fire(id) {
            Some(fired) => {
                self.handle(fired);
                true
            }
            None => false,
        }
    }

    fn handle(&mut self, fired: Fired<AmbientTimer>) {
        match fired.payload {
            AmbientTimer::Trigger(kind) => self.on_trigger(kind),
            AmbientTimer::Reset(kind) => self.on_reset(kind),
        }
    }

    fn on_trigger(&mut self, kind: EffectKind) {
        self.stats.ticks += 1;
        if self.flags.contains(kind.flag()) {
            self.stats.already_active += 1;
            tracing::trace!(target: "cyberterm.ambient", effect = kind.as_str(), "already active");
            return;
        }
        let spec = *self.config.spec(kind);
        if !self.rng.chance(spec.probability) {
            return;
        }

        self.flags.insert(kind.flag());
        if kind == EffectKind::Highlight {
            self.highlighted = self.rng.index(self.config.highlight_targets);
        }
        let reset = self.queue.after(spec.active_for(), AmbientTimer::Reset(kind));
        self.resets[kind.index()] = Some(reset);
        self.stats.triggers_fired += 1;
        tracing::trace!(
            target: "cyberterm.ambient",
            effect = kind.as_str(),
            at_ms = self.queue.now().as_millis() as u64,
            active_ms = spec.active_ms,
            "effect on"
        );
    }

    fn on_reset(&mut self, kind: EffectKind) {
        self.resets[kind.index()] = None;
        self.flags.remove(kind.flag());
        if kind == EffectKind::Highlight {
            self.highlighted = None;
        }
        self.stats.resets_fired += 1;
        tracing::trace!(target: "cyberterm.ambient", effect = kind.as_str(), "effect off");
    }
}

impl Mountable for AmbientScheduler {
    fn name(&self) -> &'static str {
        "ambient"
    }

    fn mount(&mut self, now: Duration) {
        if !self.lifecycle.mount() {
            tracing::debug!(
                target: "cyberterm.ambient",
                state = ?self.lifecycle.state(),
                "mount ignored"
            );
            return;
        }
        self.queue = TimerQueue::starting_at(now);
        if !self.tier.decorative_enabled() {
            tracing::debug!(target: "cyberterm.ambient", tier = %self.tier, "disabled for tier");
            return;
        }
        for kind in EffectKind::ALL {
            if let Some(period) = self.trigger_period(kind) {
                let id = self.queue.every(period, AmbientTimer::Trigger(kind));
                self.triggers.push((kind, id));
            }
        }
        tracing::debug!(
            target: "cyberterm.ambient",
            tier = %self.tier,
            effects = self.triggers.len(),
            "mounted"
        );
    }

    fn unmount(&mut self) {
        if !self.lifecycle.unmount() {
            return;
        }
        let cancelled = self.queue.cancel_all();
        self.triggers.clear();
        self.resets = [None; 4];
        self.flags = EffectFlags::empty();
        self.highlighted = None;
        tracing::debug!(target: "cyberterm.ambient", cancelled, "unmounted");
    }

    fn advance_to(&mut self, now: Duration) {
        if !self.lifecycle.is_mounted() {
            return;
        }
        while let Some(fired) = self.queue.poll(now) {
            self.handle(fired);
        }
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.queue.next_deadline()
    }

    fn mount_state(&self) -> MountState {
        self.lifecycle.state()
    }
}

impl Drop for AmbientScheduler {
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

    fn always(kind_filter: Option<EffectKind>) -> AmbientConfig {
        let mut config = AmbientConfig::default();
        for kind in EffectKind::ALL {
            let spec = match kind {
                EffectKind::Glitch => &mut config.glitch,
                EffectKind::Scanline => &mut config.scanline,
                EffectKind::DataStream => &mut config.data_stream,
                EffectKind::Highlight => &mut config.highlight,
            };
            spec.probability = match kind_filter {
                Some(only) if only != kind => 0.0,
                _ => 1.0,
            };
        }
        config
    }

    fn mounted(tier: DeviceTier, config: AmbientConfig) -> AmbientScheduler {
        let mut scheduler = AmbientScheduler::new(tier, config, FxRng::seeded(3));
        scheduler.mount(Duration::ZERO);
        scheduler
    }

    #[test]
    fn full_tier_runs_every_effect_at_base_period() {
        let scheduler = mounted(DeviceTier::Full, AmbientConfig::default());
        assert_eq!(scheduler.enabled_effects(), EffectKind::ALL.to_vec());
        assert_eq!(scheduler.trigger_period(EffectKind::Glitch), Some(ms(5_000)));
        assert_eq!(scheduler.pending_timers().len(), 4);
    }

    #[test]
    fn tablet_lengthens_periods_and_drops_heavy_effects() {
        let scheduler = mounted(DeviceTier::Tablet, AmbientConfig::default());
        assert_eq!(scheduler.trigger_period(EffectKind::Glitch), Some(ms(7_500)));
        assert_eq!(scheduler.trigger_period(EffectKind::DataStream), None);
        assert_eq!(
            scheduler.enabled_effects(),
            vec![EffectKind::Glitch, EffectKind::Scanline, EffectKind::Highlight]
        );
    }

    #[test]
    fn mobile_keeps_only_light_effects() {
        let scheduler = mounted(DeviceTier::Mobile, AmbientConfig::default());
        assert_eq!(
            scheduler.enabled_effects(),
            vec![EffectKind::Glitch, EffectKind::Highlight]
        );
        assert_eq!(scheduler.trigger_period(EffectKind::Highlight), Some(ms(8_000)));
    }

    #[test]
    fn low_resource_schedules_nothing() {
        let mut scheduler = mounted(DeviceTier::LowResource, always(None));
        assert!(scheduler.pending_timers().is_empty());
        scheduler.advance_to(ms(60_000));
        assert!(scheduler.flags().is_empty());
        assert_eq!(scheduler.stats().ticks, 0);
    }

    #[test]
    fn flag_sets_then_resets_after_active_duration() {
        let mut scheduler = mounted(DeviceTier::Full, always(Some(EffectKind::Glitch)));
        scheduler.advance_to(ms(4_999));
        assert!(!scheduler.is_active(EffectKind::Glitch));
        scheduler.advance_to(ms(5_000));
        assert!(scheduler.is_active(EffectKind::Glitch));
        assert!(scheduler.pending_reset(EffectKind::Glitch).is_some());
        scheduler.advance_to(ms(5_199));
        assert!(scheduler.is_active(EffectKind::Glitch));
        scheduler.advance_to(ms(5_200));
        assert!(!scheduler.is_active(EffectKind::Glitch));
        assert_eq!(scheduler.pending_reset(EffectKind::Glitch), None);
        assert_eq!(scheduler.stats().resets_fired, 1);
    }

    #[test]
    fn retrigger_while_active_is_idempotent() {
        let mut config = always(Some(EffectKind::Scanline));
        // Active longer than the period so the next tick lands mid-effect.
        config.scanline.active_ms = 10_000;
        let mut scheduler = mounted(DeviceTier::Full, config);

        scheduler.advance_to(ms(8_000));
        assert!(scheduler.is_active(EffectKind::Scanline));
        scheduler.advance_to(ms(16_000));
        assert_eq!(scheduler.stats().already_active, 1);
        assert_eq!(scheduler.stats().triggers_fired, 1);
        // The reset from the first trigger still lands at 18s, not 26s.
        scheduler.advance_to(ms(18_000));
        assert!(!scheduler.is_active(EffectKind::Scanline));
    }

    #[test]
    fn highlight_picks_a_target() {
        let mut scheduler = mounted(DeviceTier::Full, always(Some(EffectKind::Highlight)));
        scheduler.advance_to(ms(4_000));
        let target = scheduler.highlighted_target().unwrap();
        assert!(target < 3);
        scheduler.advance_to(ms(5_000));
        assert_eq!(scheduler.highlighted_target(), None);
    }

    #[test]
    fn zero_probability_never_fires() {
        let mut config = always(None);
        config.glitch.probability = 0.0;
        let mut scheduler = mounted(DeviceTier::Full, config);
        assert!(!scheduler.enabled_effects().contains(&EffectKind::Glitch));
        assert_eq!(scheduler.trigger_timer(EffectKind::Glitch), None);
        for step in 1..=24 {
            scheduler.advance_to(ms(step * 5_000));
            assert!(!scheduler.is_active(EffectKind::Glitch));
        }
    }

    #[test]
    fn unmount_cancels_everything_and_freezes_flags() {
        let mut scheduler = mounted(DeviceTier::Full, always(None));
        scheduler.advance_to(ms(5_000));
        let captured = scheduler.pending_timers();
        assert!(!captured.is_empty());

        scheduler.unmount();
        assert!(scheduler.pending_timers().is_empty());
        assert!(scheduler.flags().is_empty());

        let stats = scheduler.stats();
        for id in captured {
            assert!(!scheduler.fire(id));
        }
        scheduler.advance_to(ms(600_000));
        assert!(scheduler.flags().is_empty());
        assert_eq!(scheduler.stats(), stats);
    }

    #[test]
    fn unmount_is_idempotent_and_blocks_remount() {
        let mut scheduler = mounted(DeviceTier::Full, always(None));
        scheduler.unmount();
        scheduler.unmount();
        scheduler.mount(ms(10));
        assert_eq!(scheduler.mount_state(), MountState::TornDown);
        assert!(scheduler.pending_timers().is_empty());
    }

    #[test]
    fn validate_reports_bad_ranges() {
        let mut config = AmbientConfig::default();
        config.glitch.period_ms = 0;
        config.highlight.probability = 1.5;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("ambient.glitch.period_ms")));
        assert!(errors.iter().any(|e| e.contains("ambient.highlight.probability")));
        assert!(AmbientConfig::default().validate().is_empty());
    }
}
