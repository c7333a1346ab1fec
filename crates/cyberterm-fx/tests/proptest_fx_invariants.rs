//! Property-based invariant tests for ambient effects and particles.
//!
//! 1. The live particle count never exceeds the configured cap
//! 2. Particle ids are unique and strictly increasing in spawn order
//! 3. A low-resource system never spawns and never schedules
//! 4. After unmount nothing changes, whatever the caller does
//! 5. Ambient flags only ever contain effects enabled for the tier

use std::collections::HashSet;
use std::time::Duration;

use cyberterm_core::{DeviceTier, FxRng, Mountable, PointerSample};
use cyberterm_fx::{AmbientConfig, AmbientScheduler, EffectFlags, ParticleConfig, ParticleSystem};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Move { dt: u64, x: f32, y: f32 },
    Advance(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..40, -500.0f32..500.0, -500.0f32..500.0).prop_map(|(dt, x, y)| Op::Move { dt, x, y }),
        (0u64..200).prop_map(Op::Advance),
    ]
}

fn tier_strategy() -> impl Strategy<Value = DeviceTier> {
    prop_oneof![
        Just(DeviceTier::Full),
        Just(DeviceTier::Tablet),
        Just(DeviceTier::Mobile),
        Just(DeviceTier::LowResource),
    ]
}

proptest! {
    #[test]
    fn particle_cap_and_ids_hold(
        seed in any::<u64>(),
        cap in 0usize..20,
        ops in prop::collection::vec(op_strategy(), 1..300),
    ) {
        let config = ParticleConfig {
            max_particles: cap,
            spawn_full: 1.0,
            ..ParticleConfig::default()
        };
        let mut system = ParticleSystem::new(DeviceTier::Full, config, FxRng::seeded(seed));
        system.mount(Duration::ZERO);
        let mut now = Duration::ZERO;
        let mut seen = HashSet::new();
        let mut last_id = 0;

        for op in ops {
            match op {
                Op::Move { dt, x, y } => {
                    now += Duration::from_millis(dt);
                    system.pointer_moved(PointerSample::new(x, y), now);
                }
                Op::Advance(dt) => {
                    now += Duration::from_millis(dt);
                    system.advance_to(now);
                }
            }
            prop_assert!(system.len() <= cap);
            for particle in system.particles() {
                if seen.insert(particle.id) {
                    prop_assert!(particle.id > last_id, "ids must grow");
                    last_id = particle.id;
                }
            }
        }
    }

    #[test]
    fn low_resource_particles_stay_empty(
        seed in any::<u64>(),
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let mut system = ParticleSystem::new(
            DeviceTier::LowResource,
            ParticleConfig::default(),
            FxRng::seeded(seed),
        );
        system.mount(Duration::ZERO);
        prop_assert_eq!(system.next_deadline(), None);
        let mut now = Duration::ZERO;
        for op in ops {
            match op {
                Op::Move { dt, x, y } => {
                    now += Duration::from_millis(dt);
                    prop_assert!(!system.pointer_moved(PointerSample::new(x, y), now));
                }
                Op::Advance(dt) => {
                    now += Duration::from_millis(dt);
                    system.advance_to(now);
                }
            }
            prop_assert!(system.is_empty());
        }
    }

    #[test]
    fn unmounted_particles_are_frozen(
        seed in any::<u64>(),
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let mut system =
            ParticleSystem::new(DeviceTier::Full, ParticleConfig::default(), FxRng::seeded(seed));
        system.mount(Duration::ZERO);
        let captured = system.tick_timer();
        system.unmount();
        let stats = system.stats();
        let mut now = Duration::ZERO;
        for op in ops {
            match op {
                Op::Move { dt, x, y } => {
                    now += Duration::from_millis(dt);
                    system.pointer_moved(PointerSample::new(x, y), now);
                }
                Op::Advance(dt) => {
                    now += Duration::from_millis(dt);
                    system.advance_to(now);
                }
            }
            if let Some(id) = captured {
                prop_assert!(!system.fire(id));
            }
            prop_assert!(system.is_empty());
            prop_assert_eq!(system.stats(), stats);
        }
    }

    #[test]
    fn ambient_flags_respect_tier(
        seed in any::<u64>(),
        tier in tier_strategy(),
        steps in prop::collection::vec(1u64..2_000, 1..60),
    ) {
        let mut scheduler =
            AmbientScheduler::new(tier, AmbientConfig::default(), FxRng::seeded(seed));
        scheduler.mount(Duration::ZERO);
        let allowed = scheduler
            .enabled_effects()
            .into_iter()
            .fold(EffectFlags::empty(), |acc, kind| acc | kind.flag());
        let mut now = Duration::ZERO;
        for step in steps {
            now += Duration::from_millis(step);
            scheduler.advance_to(now);
            prop_assert!(allowed.contains(scheduler.flags()));
        }
        if tier == DeviceTier::LowResource {
            prop_assert_eq!(scheduler.next_deadline(), None);
        }

        scheduler.unmount();
        prop_assert_eq!(scheduler.flags(), EffectFlags::empty());
        prop_assert!(scheduler.pending_timers().is_empty());
        scheduler.advance_to(now + Duration::from_secs(60));
        prop_assert_eq!(scheduler.flags(), EffectFlags::empty());
    }
}
