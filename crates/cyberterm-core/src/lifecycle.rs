#![forbid(unsafe_code)]

//! Mount lifecycle signal.
//!
//! A [`Lifecycle`] is owned by a subsystem and moves through
//! `Idle → Mounted → TornDown` exactly once. [`MountGuard`]s are cheap clones
//! handed to anything that captures work on the subsystem's behalf (input
//! reader threads, deferred callbacks). Captured work checks
//! [`MountGuard::is_mounted`] before touching state, so nothing mutates a
//! subsystem after it has been torn down.
//!
//! ```
//! use cyberterm_core::lifecycle::{Lifecycle, MountState};
//!
//! let lifecycle = Lifecycle::new();
//! let guard = lifecycle.guard();
//! assert!(!guard.is_mounted());
//!
//! assert!(lifecycle.mount());
//! assert!(guard.is_mounted());
//!
//! assert!(lifecycle.unmount());
//! assert_eq!(guard.state(), MountState::TornDown);
//! assert!(!lifecycle.mount(), "a torn-down lifecycle never remounts");
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Where a subsystem is in its mount lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    /// Constructed, not yet started.
    Idle,
    /// Started; timers may be pending.
    Mounted,
    /// Stopped for good. Terminal.
    TornDown,
}

impl MountState {
    const fn to_raw(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Mounted => 1,
            Self::TornDown => 2,
        }
    }

    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Mounted,
            _ => Self::TornDown,
        }
    }
}

struct LifecycleInner {
    state: AtomicU8,
}

impl LifecycleInner {
    fn state(&self) -> MountState {
        MountState::from_raw(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: MountState, to: MountState) -> bool {
        self.state
            .compare_exchange(from.to_raw(), to.to_raw(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Owner side of a mount lifecycle.
///
/// Dropping the owner does **not** tear down: subsystems call
/// [`unmount`](Self::unmount) from their own `stop`/`Drop` so teardown and
/// timer cancellation always happen together.
pub struct Lifecycle {
    inner: Arc<LifecycleInner>,
}

/// Observer side of a mount lifecycle.
#[derive(Clone)]
pub struct MountGuard {
    inner: Arc<LifecycleInner>,
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state())
            .finish()
    }
}

impl std::fmt::Debug for MountGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountGuard")
            .field("state", &self.state())
            .finish()
    }
}

impl Lifecycle {
    /// Create an idle lifecycle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LifecycleInner {
                state: AtomicU8::new(MountState::Idle.to_raw()),
            }),
        }
    }

    /// Obtain a guard observing this lifecycle.
    #[must_use]
    pub fn guard(&self) -> MountGuard {
        MountGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Move `Idle → Mounted`. Returns `false` from any other state.
    pub fn mount(&self) -> bool {
        self.inner.transition(MountState::Idle, MountState::Mounted)
    }

    /// Move to `TornDown`. Returns `true` only for the call that performed the
    /// transition; later calls are no-ops.
    ///
    /// An idle lifecycle can be torn down directly (a subsystem that was
    /// never started still must not start later).
    pub fn unmount(&self) -> bool {
        self.inner.transition(MountState::Mounted, MountState::TornDown)
            || self.inner.transition(MountState::Idle, MountState::TornDown)
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> MountState {
        self.inner.state()
    }

    /// Whether the lifecycle is currently mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.state() == MountState::Mounted
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl MountGuard {
    /// Current state.
    #[must_use]
    pub fn state(&self) -> MountState {
        self.inner.state()
    }

    /// Whether captured work may still touch the owner's state.
    #[inline]
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.state() == MountState::Mounted
    }

    /// Whether the owner has been torn down.
    #[inline]
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.state() == MountState::TornDown
    }
}
