#![forbid(unsafe_code)]

//! Pointer-move throttling.
//!
//! Raw pointer events can arrive far faster than anything downstream wants
//! to process. [`PointerThrottle`] lets at most one sample through per
//! interval and coalesces the rest with a "latest wins" rule: a burst of
//! moves collapses to the last position, which is released by
//! [`PointerThrottle::flush`] once the interval has elapsed.
//!
//! ```
//! use cyberterm_core::pointer::{PointerSample, PointerThrottle};
//! use std::time::Duration;
//!
//! let mut throttle = PointerThrottle::new(Duration::from_millis(16));
//! let ms = Duration::from_millis;
//!
//! assert!(throttle.push(PointerSample::new(1.0, 1.0), ms(0)).is_some());
//! assert!(throttle.push(PointerSample::new(2.0, 2.0), ms(4)).is_none());
//! assert!(throttle.push(PointerSample::new(3.0, 3.0), ms(8)).is_none());
//!
//! assert_eq!(throttle.flush(ms(10)), None, "interval not yet elapsed");
//! assert_eq!(throttle.flush(ms(16)), Some(PointerSample::new(3.0, 3.0)));
//! ```

use std::time::Duration;

/// Default processing interval (~60 Hz).
pub const DEFAULT_POINTER_INTERVAL: Duration = Duration::from_millis(16);

/// A pointer position in host coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
}

impl PointerSample {
    /// Create a sample.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Rate limiter for pointer samples.
///
/// Not thread-safe; owned by the single subsystem consuming the samples.
#[derive(Debug, Clone)]
pub struct PointerThrottle {
    interval: Duration,
    last_processed: Option<Duration>,
    pending: Option<PointerSample>,
    coalesced: u64,
}

impl Default for PointerThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_POINTER_INTERVAL)
    }
}

impl PointerThrottle {
    /// Create a throttle passing at most one sample per `interval`.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_processed: None,
            pending: None,
            coalesced: 0,
        }
    }

    /// The processing interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn ready(&self, now: Duration) -> bool {
        self.last_processed
            .is_none_or(|last| now.saturating_sub(last) >= self.interval)
    }

    /// Offer a sample observed at `now`.
    ///
    /// Returns the sample if it should be processed immediately. Otherwise it
    /// replaces any pending sample and `None` is returned.
    pub fn push(&mut self, sample: PointerSample, now: Duration) -> Option<PointerSample> {
        if self.ready(now) {
            self.last_processed = Some(now);
            self.pending = None;
            Some(sample)
        } else {
            if self.pending.replace(sample).is_some() {
                self.coalesced += 1;
            }
            None
        }
    }

    /// Release the pending sample if the interval has elapsed.
    pub fn flush(&mut self, now: Duration) -> Option<PointerSample> {
        if self.pending.is_some() && self.ready(now) {
            self.last_processed = Some(now);
            return self.pending.take();
        }
        None
    }

    /// Whether a coalesced sample is waiting.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any pending sample.
    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// How many samples were overwritten by a later one.
    #[must_use]
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn at(v: f32) -> PointerSample {
        PointerSample::new(v, v)
    }

    #[test]
    fn first_sample_passes() {
        let mut t = PointerThrottle::default();
        assert_eq!(t.push(at(1.0), ms(100)), Some(at(1.0)));
    }

    #[test]
    fn burst_collapses_to_last_value() {
        let mut t = PointerThrottle::new(ms(16));
        t.push(at(0.0), ms(0));
        for i in 1..=10 {
            assert!(t.push(at(i as f32), ms(i)).is_none());
        }
        assert_eq!(t.coalesced_count(), 9);
        assert_eq!(t.flush(ms(16)), Some(at(10.0)));
        assert!(!t.has_pending());
        assert_eq!(t.flush(ms(100)), None);
    }

    #[test]
    fn flush_restarts_interval() {
        let mut t = PointerThrottle::new(ms(16));
        t.push(at(0.0), ms(0));
        t.push(at(1.0), ms(5));
        assert!(t.flush(ms(20)).is_some());
        assert!(t.push(at(2.0), ms(30)).is_none(), "within 16ms of the flush");
        assert!(t.push(at(3.0), ms(36)).is_some());
    }

    #[test]
    fn processed_samples_are_spaced_by_interval() {
        let mut t = PointerThrottle::new(ms(16));
        let mut processed = Vec::new();
        for now in 0..200 {
            if t.push(at(now as f32), ms(now)).is_some() {
                processed.push(now);
            }
        }
        assert!(processed.windows(2).all(|w| w[1] - w[0] >= 16));
        assert_eq!(processed.len(), 13);
    }

    #[test]
    fn clear_drops_pending() {
        let mut t = PointerThrottle::new(ms(16));
        t.push(at(0.0), ms(0));
        t.push(at(1.0), ms(1));
        t.clear();
        assert_eq!(t.flush(ms(50)), None);
    }
}
