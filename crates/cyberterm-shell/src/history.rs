#![forbid(unsafe_code)]

//! Recall buffer for submitted lines.
//!
//! Arrow-key style navigation: [`InputHistory::previous`] walks toward older
//! lines, [`InputHistory::next`] back toward the blank prompt. Recording a
//! line resets the cursor. Consecutive duplicates are stored once.

use std::collections::VecDeque;

/// Default number of remembered lines.
pub const DEFAULT_HISTORY_DEPTH: usize = 32;

/// Bounded input history.
#[derive(Debug, Clone)]
pub struct InputHistory {
    lines: VecDeque<String>,
    depth: usize,
    cursor: Option<usize>,
}

impl Default for InputHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl InputHistory {
    /// Empty history remembering at most `depth` lines. A depth of zero
    /// records nothing.
    #[must_use]
    pub fn new(depth: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(depth),
            depth,
            cursor: None,
        }
    }

    /// Remember a submitted line. Blank lines are ignored.
    pub fn record(&mut self, line: &str) {
        self.cursor = None;
        let line = line.trim();
        if line.is_empty() || self.depth == 0 {
            return;
        }
        if self.lines.back().is_some_and(|last| last == line) {
            return;
        }
        if self.lines.len() == self.depth {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_owned());
    }

    /// Step to the next older line. Stays on the oldest line once reached.
    pub fn previous(&mut self) -> Option<&str> {
        let last = self.lines.len().checked_sub(1)?;
        let index = match self.cursor {
            None => last,
            Some(i) => i.saturating_sub(1),
        };
        self.cursor = Some(index);
        self.lines.get(index).map(String::as_str)
    }

    /// Step to the next newer line. Returns `None` (blank prompt) after the
    /// newest line.
    pub fn next(&mut self) -> Option<&str> {
        let index = self.cursor? + 1;
        if index < self.lines.len() {
            self.cursor = Some(index);
            self.lines.get(index).map(String::as_str)
        } else {
            self.cursor = None;
            None
        }
    }

    /// Leave navigation without recording anything.
    pub fn reset_cursor(&mut self) {
        self.cursor = None;
    }

    /// Remembered lines, oldest first.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Number of remembered lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(lines: &[&str]) -> InputHistory {
        let mut history = InputHistory::new(8);
        for line in lines {
            history.record(line);
        }
        history
    }

    #[test]
    fn walks_back_and_forth() {
        let mut h = filled(&["help", "about", "date"]);
        assert_eq!(h.previous(), Some("date"));
        assert_eq!(h.previous(), Some("about"));
        assert_eq!(h.previous(), Some("help"));
        assert_eq!(h.previous(), Some("help"));
        assert_eq!(h.next(), Some("about"));
        assert_eq!(h.next(), Some("date"));
        assert_eq!(h.next(), None);
        assert_eq!(h.next(), None);
    }

    #[test]
    fn collapses_consecutive_duplicates() {
        let h = filled(&["help", "help", "date", "help"]);
        assert_eq!(h.iter().collect::<Vec<_>>(), ["help", "date", "help"]);
    }

    #[test]
    fn ignores_blank_and_trims() {
        let h = filled(&["   ", "", "  echo hi  "]);
        assert_eq!(h.iter().collect::<Vec<_>>(), ["echo hi"]);
    }

    #[test]
    fn bounded_by_depth() {
        let mut h = InputHistory::new(2);
        for line in ["a", "b", "c"] {
            h.record(line);
        }
        assert_eq!(h.iter().collect::<Vec<_>>(), ["b", "c"]);
    }

    #[test]
    fn record_resets_cursor() {
        let mut h = filled(&["a", "b"]);
        h.previous();
        h.previous();
        h.record("c");
        assert_eq!(h.previous(), Some("c"));
    }

    #[test]
    fn empty_history_navigates_nowhere() {
        let mut h = InputHistory::default();
        assert_eq!(h.previous(), None);
        assert_eq!(h.next(), None);
        let mut zero = InputHistory::new(0);
        zero.record("x");
        assert!(zero.is_empty());
    }
}
