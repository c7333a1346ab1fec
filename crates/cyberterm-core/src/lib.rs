#![cfg_attr(not(test), forbid(unsafe_code))]

//! Core: timers, mount lifecycles, device tiers, and input throttling.
//!
//! # Role in CyberTerm
//! `cyberterm-core` is the scheduling layer. It replaces ad hoc browser
//! timers with an owned, cancellable [`TimerQueue`](timer::TimerQueue) and
//! gives every subsystem the same mount contract ([`Mountable`]).
//!
//! # Primary responsibilities
//! - **TimerQueue**: virtual-time one-shot and repeating timers.
//! - **Lifecycle / MountGuard**: `Idle → Mounted → TornDown` signal shared with
//!   captured work.
//! - **DeviceTier**: capability classification with a fixed precedence.
//! - **FxRng**: seedable randomness for decorative effects.
//! - **PointerThrottle**: latest-wins rate limiting of pointer moves.
//!
//! # How it fits in the system
//! `cyberterm-text`, `cyberterm-fx`, and `cyberterm-shell` build their
//! subsystems on these primitives; the `cyberterm` host drives them all with
//! one clock.

pub mod lifecycle;
#[cfg(feature = "tracing-subscriber")]
pub mod logging;
pub mod mountable;
pub mod pointer;
pub mod rng;
pub mod tier;
pub mod timer;

pub use lifecycle::{Lifecycle, MountGuard, MountState};
pub use mountable::Mountable;
pub use pointer::{DEFAULT_POINTER_INTERVAL, PointerSample, PointerThrottle};
pub use rng::FxRng;
pub use tier::{Capabilities, DeviceTier, ParseTierError};
pub use timer::{Fired, Repeat, TimerId, TimerQueue};
