#![forbid(unsafe_code)]

//! Typewriter reveal of a single line.
//!
//! [`Reveal`] is the pure sequence: a lazy, finite, fused iterator over
//! progressively longer prefixes of its target, one extended grapheme
//! cluster at a time. It cannot be rewound; once consumed (or cancelled) it
//! yields nothing more.
//!
//! [`RevealEngine`] schedules a `Reveal` on a [`TimerQueue`], suspending the
//! per-character delay between clusters. Replacing or cancelling the running
//! reveal cancels its timer and bumps an epoch, so a stale step can never
//! mutate the visible text.
//!
//! ```
//! use cyberterm_text::reveal::Reveal;
//! use std::time::Duration;
//!
//! let prefixes: Vec<String> = Reveal::new("héy", Duration::from_millis(30)).collect();
//! assert_eq!(prefixes, vec!["h", "hé", "héy"]);
//!
//! let skipped: Vec<String> = Reveal::skip("boot ok").collect();
//! assert_eq!(skipped, vec!["boot ok"]);
//! ```

use std::iter::FusedIterator;
use std::time::Duration;

use cyberterm_core::timer::{Fired, TimerId, TimerQueue};
use unicode_segmentation::UnicodeSegmentation;

/// How a reveal emits its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealMode {
    /// One grapheme cluster per step.
    Typewriter,
    /// The whole string in a single step.
    Skip,
}

/// Lazy prefix sequence for one target string.
#[derive(Debug, Clone)]
pub struct Reveal {
    text: String,
    /// Byte length of the visible prefix after each step.
    steps: Vec<usize>,
    cursor: usize,
    mode: RevealMode,
    delay: Duration,
    cancelled: bool,
}

impl Reveal {
    /// Typewriter reveal with `delay` between clusters.
    ///
    /// An empty target still emits one (empty) prefix so completion is
    /// observable.
    #[must_use]
    pub fn new(text: impl Into<String>, delay: Duration) -> Self {
        let text = text.into();
        let mut steps: Vec<usize> = text
            .grapheme_indices(true)
            .map(|(start, cluster)| start + cluster.len())
            .collect();
        if steps.is_empty() {
            steps.push(0);
        }
        Self {
            text,
            steps,
            cursor: 0,
            mode: RevealMode::Typewriter,
            delay,
            cancelled: false,
        }
    }

    /// Already-complete reveal: a single step carrying the whole string.
    #[must_use]
    pub fn skip(text: impl Into<String>) -> Self {
        let text = text.into();
        let steps = vec![text.len()];
        Self {
            text,
            steps,
            cursor: 0,
            mode: RevealMode::Skip,
            delay: Duration::ZERO,
            cancelled: false,
        }
    }

    /// Build a reveal in the given mode.
    #[must_use]
    pub fn with_mode(text: impl Into<String>, delay: Duration, mode: RevealMode) -> Self {
        match mode {
            RevealMode::Typewriter => Self::new(text, delay),
            RevealMode::Skip => Self::skip(text),
        }
    }

    /// The full target string.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.text
    }

    /// The prefix emitted so far.
    #[must_use]
    pub fn visible(&self) -> &str {
        match self.cursor {
            0 => "",
            n => &self.text[..self.steps[n - 1]],
        }
    }

    /// Delay between steps.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Emission mode.
    #[must_use]
    pub fn mode(&self) -> RevealMode {
        self.mode
    }

    /// Steps left to emit (zero once cancelled).
    #[must_use]
    pub fn remaining(&self) -> usize {
        if self.cancelled {
            0
        } else {
            self.steps.len() - self.cursor
        }
    }

    /// Whether every step has been emitted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.cursor == self.steps.len()
    }

    /// Whether the reveal was abandoned.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Abandon the reveal. The visible prefix stays as it is.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Emit the next step without allocating. Returns the new visible byte
    /// length.
    pub fn step(&mut self) -> Option<usize> {
        if self.remaining() == 0 {
            return None;
        }
        let len = self.steps[self.cursor];
        self.cursor += 1;
        Some(len)
    }
}

impl Iterator for Reveal {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.step().map(|len| self.text[..len].to_owned())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Reveal {}
impl FusedIterator for Reveal {}

/// Progress reported by [`RevealEngine::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealEvent {
    /// One more cluster became visible; more follow.
    Advanced {
        /// Visible prefix length in bytes.
        visible_len: usize,
    },
    /// The final step was emitted.
    Completed,
}

/// Drives one [`Reveal`] at a time on its own timer queue.
#[derive(Debug)]
pub struct RevealEngine {
    queue: TimerQueue<u64>,
    current: Option<Reveal>,
    pending: Option<TimerId>,
    epoch: u64,
}

impl Default for RevealEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RevealEngine {
    /// Idle engine at virtual time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Duration::ZERO)
    }

    /// Idle engine whose clock starts at `now`.
    #[must_use]
    pub fn starting_at(now: Duration) -> Self {
        Self {
            queue: TimerQueue::starting_at(now),
            current: None,
            pending: None,
            epoch: 0,
        }
    }

    /// Engine clock.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.queue.now()
    }

    /// Start `reveal` now, replacing any running reveal.
    pub fn start(&mut self, reveal: Reveal) {
        self.start_after(Duration::ZERO, reveal);
    }

    /// Start `reveal` after `pause`, replacing any running reveal.
    ///
    /// The first step is emitted `pause + reveal.delay()` from now.
    pub fn start_after(&mut self, pause: Duration, reveal: Reveal) {
        self.invalidate();
        tracing::trace!(
            target: "cyberterm.reveal",
            epoch = self.epoch,
            steps = reveal.remaining(),
            mode = ?reveal.mode(),
            "reveal started"
        );
        let first = pause + reveal.delay();
        self.current = Some(reveal);
        self.pending = Some(self.queue.after(first, self.epoch));
    }

    /// Abandon the running reveal. Its visible prefix is kept; no further
    /// step will be emitted.
    pub fn cancel(&mut self) {
        if let Some(reveal) = self.current.as_mut() {
            if !reveal.is_complete() {
                tracing::debug!(
                    target: "cyberterm.reveal",
                    epoch = self.epoch,
                    remaining = reveal.remaining(),
                    "reveal cancelled"
                );
            }
            reveal.cancel();
        }
        self.invalidate();
    }

    fn invalidate(&mut self) {
        if let Some(id) = self.pending.take() {
            self.queue.cancel(id);
        }
        self.epoch += 1;
    }

    /// Run the next step due at or before `until`.
    ///
    /// Returns one event at a time; the engine clock sits at the step's
    /// deadline, so a follow-up [`start`](Self::start) issued while handling
    /// [`RevealEvent::Completed`] begins at the exact completion instant.
    pub fn poll(&mut self, until: Duration) -> Option<RevealEvent> {
        while let Some(fired) = self.queue.poll(until) {
            if let Some(event) = self.handle(fired) {
                return Some(event);
            }
        }
        None
    }

    /// Fire a captured step timer immediately.
    ///
    /// Stale or cancelled handles are a no-op and return `None`.
    pub fn fire(&mut self, id: TimerId) -> Option<RevealEvent> {
        let fired = self.queue.fire(id)?;
        self.handle(fired)
    }

    fn handle(&mut self, fired: Fired<u64>) -> Option<RevealEvent> {
        if fired.payload != self.epoch {
            tracing::trace!(
                target: "cyberterm.reveal",
                timer = fired.id.raw(),
                "stale step dropped"
            );
            return None;
        }
        self.pending = None;
        let reveal = self.current.as_mut()?;
        let visible_len = reveal.step()?;
        if reveal.remaining() == 0 {
            return Some(RevealEvent::Completed);
        }
        let delay = reveal.delay();
        self.pending = Some(self.queue.after(delay, self.epoch));
        Some(RevealEvent::Advanced { visible_len })
    }

    /// Visible prefix of the current reveal (empty when idle).
    #[must_use]
    pub fn visible(&self) -> &str {
        self.current.as_ref().map_or("", Reveal::visible)
    }

    /// The current reveal, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Reveal> {
        self.current.as_ref()
    }

    /// Whether a step is scheduled.
    #[must_use]
    pub fn is_revealing(&self) -> bool {
        self.pending.is_some()
    }

    /// Handle of the scheduled step, if any.
    #[must_use]
    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending
    }

    /// Deadline of the scheduled step, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.next_deadline()
    }
}
