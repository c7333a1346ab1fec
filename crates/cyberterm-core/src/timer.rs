#![forbid(unsafe_code)]

//! Cooperative timer queue.
//!
//! A [`TimerQueue`] stands in for `setTimeout` / `setInterval` on a single
//! cooperative thread. Time is virtual: the owner advances the queue with
//! [`TimerQueue::poll`] and receives due timers one at a time, so handlers
//! can schedule follow-up timers relative to the instant the previous one
//! fired.
//!
//! # Invariants
//!
//! 1. Timers fire in deadline order; equal deadlines fire in scheduling order.
//! 2. A cancelled timer never fires, even if its deadline has passed.
//! 3. A repeating timer fires once per elapsed period (catch-up on large jumps).
//! 4. `now()` never moves backwards.
//!
//! # Failure Modes
//!
//! - Zero period: clamped to [`MIN_PERIOD`] so a repeating timer cannot spin.
//! - Polling with `until < now()`: returns nothing and leaves `now()` as is.
//!
//! # Usage
//!
//! ```
//! use cyberterm_core::timer::TimerQueue;
//! use std::time::Duration;
//!
//! let mut queue = TimerQueue::new();
//! let blink = queue.every(Duration::from_millis(500), "blink");
//! queue.after(Duration::from_millis(200), "hello");
//!
//! let fired: Vec<_> = queue
//!     .drain_due(Duration::from_millis(1000))
//!     .into_iter()
//!     .map(|f| f.payload)
//!     .collect();
//! assert_eq!(fired, vec!["hello", "blink", "blink"]);
//!
//! assert!(queue.cancel(blink));
//! assert!(queue.is_empty());
//! ```

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::Duration;

use ahash::AHashMap;

/// Shortest period a repeating timer may have.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Opaque handle for a scheduled timer.
///
/// Ids are unique for the lifetime of the queue that issued them and are
/// never reused, so a stale id can be cancelled or fired safely (both are
/// no-ops).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Raw numeric value, for logging.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Whether a timer fires once or keeps rescheduling itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// Fire once, then forget.
    Once,
    /// Fire every `period` until cancelled.
    Every(Duration),
}

/// A timer that came due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<E> {
    /// Handle of the timer that fired.
    pub id: TimerId,
    /// Deadline the timer fired at (virtual time).
    pub at: Duration,
    /// Payload supplied when the timer was scheduled.
    pub payload: E,
}

#[derive(Debug)]
struct Slot<E> {
    deadline: Duration,
    /// Sequence number of the live heap entry; older entries are stale.
    seq: u64,
    repeat: Repeat,
    payload: E,
}

/// Single-threaded queue of one-shot and repeating timers.
#[derive(Debug)]
pub struct TimerQueue<E> {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    heap: BinaryHeap<Reverse<(Duration, u64, TimerId)>>,
    slots: AHashMap<TimerId, Slot<E>>,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerQueue<E> {
    /// Create an empty queue at virtual time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Duration::ZERO)
    }

    /// Create an empty queue whose clock starts at `now`.
    #[must_use]
    pub fn starting_at(now: Duration) -> Self {
        Self {
            now,
            next_id: 1,
            next_seq: 0,
            heap: BinaryHeap::new(),
            slots: AHashMap::new(),
        }
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `payload` to fire once, `delay` from now.
    pub fn after(&mut self, delay: Duration, payload: E) -> TimerId {
        self.insert(self.now + delay, Repeat::Once, payload)
    }

    /// Schedule `payload` to fire every `period`, first at `now + period`.
    pub fn every(&mut self, period: Duration, payload: E) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.insert(self.now + period, Repeat::Every(period), payload)
    }

    fn insert(&mut self, deadline: Duration, repeat: Repeat, payload: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let seq = self.bump_seq();
        self.heap.push(Reverse((deadline, seq, id)));
        self.slots.insert(
            id,
            Slot {
                deadline,
                seq,
                repeat,
                payload,
            },
        );
        tracing::trace!(
            target: "cyberterm.timer",
            timer = id.raw(),
            deadline_ms = deadline.as_millis() as u64,
            ?repeat,
            "timer scheduled"
        );
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Cancel a pending timer.
    ///
    /// Returns `true` if the timer was pending. Cancelling an unknown,
    /// already-fired, or already-cancelled id is a no-op.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let removed = self.slots.remove(&id).is_some();
        if removed {
            tracing::trace!(target: "cyberterm.timer", timer = id.raw(), "timer cancelled");
        }
        removed
    }

    /// Cancel every pending timer. Returns how many were pending.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.slots.len();
        self.slots.clear();
        self.heap.clear();
        count
    }

    /// Whether `id` is still pending.
    #[must_use]
    pub fn contains(&self, id: TimerId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no timers are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Handles of all pending timers, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = TimerId> + '_ {
        self.slots.keys().copied()
    }

    /// Earliest pending deadline, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.slots.values().map(|slot| slot.deadline).min()
    }

    /// Deadline of a specific pending timer.
    #[must_use]
    pub fn deadline_of(&self, id: TimerId) -> Option<Duration> {
        self.slots.get(&id).map(|slot| slot.deadline)
    }
}

impl<E: Clone> TimerQueue<E> {
    /// Pop the next timer due at or before `until`.
    ///
    /// The queue clock moves to the fired timer's deadline, so anything the
    /// caller schedules while handling it is relative to that instant. When
    /// nothing else is due the clock settles at `until` and `None` is
    /// returned.
    pub fn poll(&mut self, until: Duration) -> Option<Fired<E>> {
        while let Some(&Reverse((deadline, seq, id))) = self.heap.peek() {
            if deadline > until {
                break;
            }
            self.heap.pop();

            let live = matches!(self.slots.get(&id), Some(slot) if slot.seq == seq);
            if !live {
                // Cancelled or superseded entry.
                continue;
            }

            self.now = self.now.max(deadline);
            if let Some(fired) = self.take_due(id, deadline) {
                return Some(fired);
            }
        }
        self.now = self.now.max(until);
        None
    }

    /// Collect every timer due at or before `until`, in firing order.
    pub fn drain_due(&mut self, until: Duration) -> Vec<Fired<E>> {
        let mut fired = Vec::new();
        while let Some(next) = self.poll(until) {
            fired.push(next);
        }
        fired
    }

    /// Fire a pending timer immediately at the current virtual time.
    ///
    /// Repeating timers are rescheduled one period from now. Returns `None`
    /// if `id` is not pending.
    pub fn fire(&mut self, id: TimerId) -> Option<Fired<E>> {
        self.take_due(id, self.now)
    }

    fn take_due(&mut self, id: TimerId, at: Duration) -> Option<Fired<E>> {
        let repeat = self.slots.get(&id)?.repeat;
        let payload = match repeat {
            Repeat::Once => self.slots.remove(&id)?.payload,
            Repeat::Every(period) => {
                let seq = self.bump_seq();
                let next = at + period;
                let slot = self.slots.get_mut(&id)?;
                slot.deadline = next;
                slot.seq = seq;
                let payload = slot.payload.clone();
                self.heap.push(Reverse((next, seq, id)));
                payload
            }
        };
        tracing::trace!(
            target: "cyberterm.timer",
            timer = id.raw(),
            at_ms = at.as_millis() as u64,
            "timer fired"
        );
        Some(Fired { id, at, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn one_shot_fires_once_at_deadline() {
        let mut q = TimerQueue::new();
        let id = q.after(ms(100), 'a');
        assert!(q.poll(ms(99)).is_none());
        assert_eq!(q.now(), ms(99));

        let fired = q.poll(ms(100)).unwrap();
        assert_eq!(fired.id, id);
        assert_eq!(fired.at, ms(100));
        assert_eq!(fired.payload, 'a');
        assert!(q.poll(ms(1000)).is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn fires_in_deadline_order_with_stable_ties() {
        let mut q = TimerQueue::new();
        q.after(ms(30), "c");
        q.after(ms(10), "a");
        q.after(ms(20), "b1");
        q.after(ms(20), "b2");
        let order: Vec<_> = q.drain_due(ms(50)).into_iter().map(|f| f.payload).collect();
        assert_eq!(order, vec!["a", "b1", "b2", "c"]);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut q = TimerQueue::new();
        let id = q.after(ms(10), ());
        assert!(q.cancel(id));
        assert!(!q.cancel(id), "second cancel is a no-op");
        assert!(q.drain_due(ms(100)).is_empty());
    }

    #[test]
    fn repeating_timer_catches_up_on_large_jump() {
        let mut q = TimerQueue::new();
        q.every(ms(100), ());
        let fired = q.drain_due(ms(350));
        let times: Vec<_> = fired.iter().map(|f| f.at).collect();
        assert_eq!(times, vec![ms(100), ms(200), ms(300)]);
        assert_eq!(q.next_deadline(), Some(ms(400)));
    }

    #[test]
    fn zero_period_is_clamped() {
        let mut q = TimerQueue::new();
        q.every(Duration::ZERO, ());
        assert_eq!(q.drain_due(ms(5)).len(), 5);
    }

    #[test]
    fn scheduling_during_poll_is_relative_to_fire_time() {
        let mut q = TimerQueue::new();
        q.after(ms(10), 1u32);
        let first = q.poll(ms(100)).unwrap();
        assert_eq!(q.now(), first.at);
        q.after(ms(5), 2u32);
        let second = q.poll(ms(100)).unwrap();
        assert_eq!(second.at, ms(15));
        assert_eq!(second.payload, 2);
    }

    #[test]
    fn fire_invokes_pending_timer_immediately() {
        let mut q = TimerQueue::starting_at(ms(50));
        let once = q.after(ms(500), "once");
        let tick = q.every(ms(100), "tick");

        assert_eq!(q.fire(once).map(|f| f.payload), Some("once"));
        assert!(!q.contains(once));
        assert!(q.fire(once).is_none());

        let fired = q.fire(tick).unwrap();
        assert_eq!(fired.at, ms(50));
        assert_eq!(q.deadline_of(tick), Some(ms(150)));
        // The superseded heap entry at 150ms (original) must not double-fire.
        assert_eq!(q.drain_due(ms(160)).len(), 1);
    }

    #[test]
    fn cancel_all_empties_queue() {
        let mut q = TimerQueue::new();
        let a = q.after(ms(1), ());
        q.every(ms(2), ());
        assert_eq!(q.cancel_all(), 2);
        assert!(q.is_empty());
        assert!(q.fire(a).is_none());
        assert!(q.drain_due(ms(10)).is_empty());
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut q: TimerQueue<()> = TimerQueue::new();
        q.poll(ms(100));
        q.poll(ms(40));
        assert_eq!(q.now(), ms(100));
    }

    #[test]
    fn ids_are_unique() {
        let mut q = TimerQueue::new();
        let a = q.after(ms(1), ());
        q.poll(ms(1));
        let b = q.after(ms(1), ());
        assert_ne!(a, b);
        assert_eq!(format!("{a}"), "timer#1");
    }
}
