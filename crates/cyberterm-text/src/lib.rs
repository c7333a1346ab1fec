#![forbid(unsafe_code)]

//! Text reveal for CyberTerm.
//!
//! Turns a string into a lazily revealed, grapheme-aware prefix sequence
//! ([`Reveal`]) and schedules it on a cooperative timer ([`RevealEngine`]).
//! The terminal session uses it for boot lines; low-resource hosts use the
//! skip mode so text appears without animation.

pub mod reveal;

pub use reveal::{Reveal, RevealEngine, RevealEvent, RevealMode};
