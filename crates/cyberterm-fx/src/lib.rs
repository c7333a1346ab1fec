#![forbid(unsafe_code)]

//! Decorative effects for the CyberTerm hero.
//!
//! - [`AmbientScheduler`]: periodic glitch, scan-line, data-stream, and
//!   highlight flags with probabilistic triggers and timed resets.
//! - [`ParticleSystem`]: a bounded pointer trail with throttled spawning.
//!
//! Both are tier-aware and disable themselves entirely on `low-resource`
//! hosts. Rendering is left to the host; this crate only exposes state.

pub mod ambient;
pub mod palette;
pub mod particles;

pub use ambient::{
    AmbientConfig, AmbientScheduler, AmbientStats, EffectFlags, EffectKind, EffectSpec,
};
pub use palette::{NEON, Rgb};
pub use particles::{Particle, ParticleConfig, ParticleStats, ParticleSystem};
