#![forbid(unsafe_code)]

//! Bounded command/response history.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default capacity, in entries.
pub const DEFAULT_TRANSCRIPT_CAPACITY: usize = 50;

/// One transcript row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TranscriptEntry {
    /// A submitted line, trimmed, original case.
    Command {
        /// The line.
        text: String,
    },
    /// The reply to the preceding command.
    Response {
        /// Reply lines in order.
        lines: Vec<String>,
    },
}

impl TranscriptEntry {
    /// Command text, if this is a command row.
    #[must_use]
    pub fn command_text(&self) -> Option<&str> {
        match self {
            Self::Command { text } => Some(text),
            Self::Response { .. } => None,
        }
    }

    /// Response lines, if this is a response row.
    #[must_use]
    pub fn response_lines(&self) -> Option<&[String]> {
        match self {
            Self::Command { .. } => None,
            Self::Response { lines } => Some(lines),
        }
    }
}

/// FIFO-evicting transcript.
///
/// Capacity counts entries, not submissions. A response left at the front
/// without its command is evicted with it.
#[derive(Debug, Clone)]
pub struct Transcript {
    entries: VecDeque<TranscriptEntry>,
    capacity: usize,
    evicted: u64,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSCRIPT_CAPACITY)
    }
}

impl Transcript {
    /// Empty transcript holding at most `capacity` entries (minimum 2, so a
    /// command and its response always fit together).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            evicted: 0,
        }
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TranscriptEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Entries evicted since creation.
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Append a command and its response, then evict from the front.
    pub fn record(&mut self, command: impl Into<String>, lines: Vec<String>) {
        self.entries.push_back(TranscriptEntry::Command {
            text: command.into(),
        });
        self.entries.push_back(TranscriptEntry::Response { lines });
        self.evict();
    }

    fn evict(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
        }
        while matches!(self.entries.front(), Some(TranscriptEntry::Response { .. })) {
            self.entries.pop_front();
            self.evicted += 1;
        }
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a TranscriptEntry;
    type IntoIter = std::collections::vec_deque::Iter<'a, TranscriptEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
