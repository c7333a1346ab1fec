#![forbid(unsafe_code)]

//! The seam between a host view and its time-driven subsystems.

use std::time::Duration;

use crate::lifecycle::MountState;

/// A subsystem with scheduled work that a host mounts, drives, and tears down.
///
/// Time is the virtual clock of the host: a [`Duration`] since the page
/// mounted. Hosts call [`advance_to`](Self::advance_to) with a monotonically
/// increasing `now`, and may sleep until [`next_deadline`](Self::next_deadline).
///
/// # Contract
///
/// - `mount` starts scheduled work at most once.
/// - `unmount` cancels every timer the subsystem created. Afterwards no call,
///   including a late `advance_to`, mutates observable state.
/// - `unmount` is idempotent and implementors also run it on `Drop`.
pub trait Mountable {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Start scheduled work at `now`.
    fn mount(&mut self, now: Duration);

    /// Cancel all scheduled work. Idempotent.
    fn unmount(&mut self);

    /// Run every timer due at or before `now`.
    fn advance_to(&mut self, now: Duration);

    /// Earliest pending deadline, if any.
    fn next_deadline(&self) -> Option<Duration>;

    /// Current lifecycle state.
    fn mount_state(&self) -> MountState;

    /// Whether the subsystem is mounted.
    fn is_mounted(&self) -> bool {
        self.mount_state() == MountState::Mounted
    }
}
