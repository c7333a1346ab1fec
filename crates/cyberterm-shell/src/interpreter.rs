#![forbid(unsafe_code)]

//! Line interpreter.
//!
//! [`Interpreter::submit`] is total: any string is valid input. The line is
//! trimmed, split on whitespace, and the first word (lower-cased) is
//! dispatched through the [`CommandTable`]. Every outcome except `clear` and
//! blank input appends one command row and one response row to the
//! [`Transcript`].

use std::fmt::Write as _;

use chrono::{Local, NaiveDateTime, SubsecRound};

use crate::command::{CommandAction, CommandTable};
use crate::transcript::Transcript;

/// Source of local wall-clock time for `date`.
pub trait WallClock: Send {
    /// Current local time.
    fn now(&self) -> NaiveDateTime;
}

/// The host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl WallClock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Result of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Blank input; nothing changed.
    Ignored,
    /// Input is disabled (boot in progress or session torn down).
    Rejected,
    /// The transcript was wiped.
    Cleared,
    /// A command row and this response were appended.
    Responded(Vec<String>),
}

/// Counters for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterpreterStats {
    /// Non-blank submissions.
    pub submitted: u64,
    /// Submissions naming no known command.
    pub unknown: u64,
    /// `clear` submissions.
    pub cleared: u64,
}

/// Command dispatcher bound to a transcript.
pub struct Interpreter {
    table: CommandTable,
    transcript: Transcript,
    clock: Box<dyn WallClock>,
    stats: InterpreterStats,
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("commands", &self.table.len())
            .field("transcript_len", &self.transcript.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Interpreter {
    /// Interpreter over `table` with an empty transcript of `capacity`
    /// entries, reading time from the system clock.
    #[must_use]
    pub fn new(table: CommandTable, capacity: usize) -> Self {
        Self::with_clock(table, capacity, Box::new(SystemClock))
    }

    /// Same as [`new`](Self::new) with an explicit clock.
    #[must_use]
    pub fn with_clock(table: CommandTable, capacity: usize, clock: Box<dyn WallClock>) -> Self {
        Self {
            table,
            transcript: Transcript::new(capacity),
            clock,
            stats: InterpreterStats::default(),
        }
    }

    /// The command table.
    #[must_use]
    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    /// The transcript.
    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> InterpreterStats {
        self.stats
    }

    /// Interpret one line.
    pub fn submit(&mut self, line: &str) -> Outcome {
        let line = line.trim();
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Outcome::Ignored;
        };
        self.stats.submitted += 1;

        let action = self.table.lookup(first).map(|spec| spec.action().clone());
        let lines = match action {
            Some(CommandAction::Clear) => {
                let removed = self.transcript.clear();
                self.stats.cleared += 1;
                tracing::debug!(target: "cyberterm.session", removed, "transcript cleared");
                return Outcome::Cleared;
            }
            Some(CommandAction::Help) => self.table.help_lines(),
            Some(CommandAction::Echo) => vec![words.collect::<Vec<_>>().join(" ")],
            Some(CommandAction::Date) => vec![self.timestamp()],
            Some(CommandAction::Static(lines)) => lines,
            None => {
                self.stats.unknown += 1;
                tracing::trace!(target: "cyberterm.session", command = first, "unknown command");
                self.table.unknown_response().to_vec()
            }
        };
        self.transcript.record(line, lines.clone());
        Outcome::Responded(lines)
    }

    fn timestamp(&self) -> String {
        let now = self.clock.now().trunc_subsecs(0);
        let mut out = String::new();
        if write!(out, "{}", now.format(self.table.date_format())).is_err() {
            out.clear();
            let _ = write!(out, "{}", now.format("%Y-%m-%d %H:%M:%S"));
        }
        out
    }
}
