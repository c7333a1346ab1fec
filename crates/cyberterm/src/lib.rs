#![forbid(unsafe_code)]

//! CyberTerm: a headless hero terminal with ambient effects.
//!
//! This crate is the host layer. It loads a [`HeroConfig`], mounts the
//! terminal session and the decorative subsystems behind one
//! [`HeroMount`], and offers a real-time [`Driver`] plus the `cyberterm`
//! binary. The subsystem crates are re-exported for hosts that want to
//! drive pieces individually.
//!
//! ```
//! use cyberterm::{HeroConfig, HeroMount, MountConfig};
//! use cyberterm::core::DeviceTier;
//! use std::time::Duration;
//!
//! let config = HeroConfig { seed: Some(1), ..HeroConfig::default() };
//! let mut hero = HeroMount::mount(&config, MountConfig::new(DeviceTier::Full)).unwrap();
//! hero.advance_to(Duration::from_secs(10));
//! assert!(hero.frame().input_enabled);
//! ```

pub mod cli;
pub mod config;
pub mod driver;
pub mod host;

pub use config::{HeroConfig, HeroConfigError};
pub use driver::{Driver, spawn_line_reader};
pub use host::{HeroFrame, HeroMount, HeroStats, MountConfig};

pub use cyberterm_core as core;
pub use cyberterm_fx as fx;
pub use cyberterm_shell as shell;
pub use cyberterm_text as text;
