//! Property-based tests across the mounted hero.
//!
//! 1. Particles never exceed the cap, for any input sequence and tier
//! 2. The transcript never exceeds its capacity
//! 3. Low-resource heroes never spawn particles or set effect flags
//! 4. Boot completes exactly once and input is only accepted afterwards

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cyberterm::core::DeviceTier;
use cyberterm::fx::EffectFlags;
use cyberterm::shell::Outcome;
use cyberterm::{HeroConfig, HeroMount, MountConfig};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Move { dt: u64, x: f32, y: f32 },
    Wait(u64),
    Submit(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u64..30, 0.0f32..1920.0, 0.0f32..1080.0)
            .prop_map(|(dt, x, y)| Op::Move { dt, x, y }),
        2 => (0u64..3_000).prop_map(Op::Wait),
        1 => "(help|clear|echo [a-z ]{0,10}|date|about|[a-z]{1,6})".prop_map(Op::Submit),
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
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn hero_bounds_hold(
        seed in any::<u64>(),
        tier in tier_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..150),
    ) {
        let mut config = HeroConfig { seed: Some(seed), ..HeroConfig::default() };
        config.terminal.transcript_capacity = 8;
        config.terminal.reveal_delay_ms = 2;
        config.particles.max_particles = 12;
        let cap = config.particles.max_particles;

        let booted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&booted);
        let mount = MountConfig::new(tier).on_boot_complete(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let mut hero = HeroMount::mount(&config, mount).unwrap();
        let mut now = Duration::ZERO;

        for op in ops {
            match op {
                Op::Move { dt, x, y } => {
                    now += Duration::from_millis(dt);
                    hero.pointer_moved(x, y, now);
                }
                Op::Wait(dt) => {
                    now += Duration::from_millis(dt);
                    hero.advance_to(now);
                }
                Op::Submit(line) => {
                    let enabled = hero.frame().input_enabled;
                    let outcome = hero.submit(&line);
                    prop_assert_eq!(outcome == Outcome::Rejected, !enabled);
                }
            }
            let frame = hero.frame();
            prop_assert!(frame.particles.len() <= cap);
            prop_assert!(frame.transcript.len() <= 8);
            prop_assert!(booted.load(Ordering::SeqCst) <= 1);
            prop_assert_eq!(booted.load(Ordering::SeqCst) == 1, frame.input_enabled);
            if tier == DeviceTier::LowResource {
                prop_assert!(frame.particles.is_empty());
                prop_assert_eq!(frame.effects, EffectFlags::empty());
            }
        }
    }
}
