#![forbid(unsafe_code)]

//! Boot-sequenced terminal session.
//!
//! # State machine
//!
//! ```text
//! Booting{0} -> Booting{1} -> ... -> AwaitingInput <-> Processing
//! ```
//!
//! While booting, each boot line is revealed through a [`RevealEngine`]; the
//! next line starts only after the current one completes, separated by the
//! configured pause. Input is disabled until the last line completes, at
//! which point the boot-complete callback runs exactly once.
//!
//! # Invariants
//!
//! 1. `Booting -> AwaitingInput` happens exactly once, after exactly N line
//!    completions in order.
//! 2. Submissions while booting (or after unmount) are rejected without
//!    touching the transcript or the history.
//! 3. After unmount no reveal step runs, whatever the caller does.

use std::time::Duration;

use cyberterm_core::lifecycle::{Lifecycle, MountGuard, MountState};
use cyberterm_core::timer::TimerId;
use cyberterm_core::{DeviceTier, Mountable};
use cyberterm_text::{Reveal, RevealEngine, RevealEvent, RevealMode};
use serde::{Deserialize, Serialize};

use crate::command::CommandTable;
use crate::history::{DEFAULT_HISTORY_DEPTH, InputHistory};
use crate::interpreter::{Interpreter, Outcome, WallClock};
use crate::transcript::{DEFAULT_TRANSCRIPT_CAPACITY, Transcript};

/// Callback run once when boot completes.
pub type BootCallback = Box<dyn FnOnce() + Send>;

/// Terminal tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Lines shown before input is enabled.
    pub boot_lines: Vec<String>,
    /// Delay between revealed characters, in milliseconds.
    pub reveal_delay_ms: u64,
    /// Pause between consecutive boot lines, in milliseconds.
    pub line_pause_ms: u64,
    /// Transcript capacity in entries.
    pub transcript_capacity: usize,
    /// Remembered input lines.
    pub history_depth: usize,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            boot_lines: [
                "Initializing secure connection...",
                "Loading neural interface...",
                "Decrypting portfolio data...",
                "System ready. Type 'help' to begin.",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            reveal_delay_ms: 30,
            line_pause_ms: 150,
            transcript_capacity: DEFAULT_TRANSCRIPT_CAPACITY,
            history_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl TerminalConfig {
    /// Per-character reveal delay.
    #[must_use]
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    /// Pause between boot lines.
    #[must_use]
    pub fn line_pause(&self) -> Duration {
        Duration::from_millis(self.line_pause_ms)
    }

    /// Validate ranges. An empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.transcript_capacity < 2 {
            errors.push(format!(
                "terminal.transcript_capacity must be >= 2, got {}",
                self.transcript_capacity
            ));
        }
        if self.reveal_delay_ms > 10_000 {
            errors.push(format!(
                "terminal.reveal_delay_ms must be <= 10000, got {}",
                self.reveal_delay_ms
            ));
        }
        if self.line_pause_ms > 60_000 {
            errors.push(format!(
                "terminal.line_pause_ms must be <= 60000, got {}",
                self.line_pause_ms
            ));
        }
        errors
    }
}

/// Where the session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Revealing boot line `line`.
    Booting {
        /// Index of the line being revealed.
        line: usize,
    },
    /// Ready for a submission.
    AwaitingInput,
    /// Handling a submission (never observed between calls).
    Processing,
}

/// Read-only snapshot for renderers.
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
    /// Boot lines fully revealed so far.
    pub boot_lines: &'a [String],
    /// Partially revealed line while booting.
    pub current_line: Option<&'a str>,
    /// Command/response rows.
    pub transcript: &'a Transcript,
    /// Phase at snapshot time.
    pub phase: SessionPhase,
    /// Whether the input affordance is enabled.
    pub input_enabled: bool,
}

/// Terminal widget state: boot sequence, then interpreter.
pub struct TerminalSession {
    tier: DeviceTier,
    config: TerminalConfig,
    interpreter: Interpreter,
    history: InputHistory,
    engine: RevealEngine,
    revealed: Vec<String>,
    phase: SessionPhase,
    lifecycle: Lifecycle,
    on_boot_complete: Option<BootCallback>,
    boot_completed_at: Option<Duration>,
}

impl std::fmt::Debug for TerminalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSession")
            .field("tier", &self.tier)
            .field("phase", &self.phase)
            .field("state", &self.lifecycle.state())
            .field("revealed", &self.revealed.len())
            .field("interpreter", &self.interpreter)
            .field("boot_callback_pending", &self.on_boot_complete.is_some())
            .finish_non_exhaustive()
    }
}

impl TerminalSession {
    /// Unmounted session reading time from the system clock.
    #[must_use]
    pub fn new(tier: DeviceTier, config: TerminalConfig, table: CommandTable) -> Self {
        let interpreter = Interpreter::new(table, config.transcript_capacity);
        Self::with_interpreter(tier, config, interpreter)
    }

    /// Unmounted session with an explicit clock for `date`.
    #[must_use]
    pub fn with_clock(
        tier: DeviceTier,
        config: TerminalConfig,
        table: CommandTable,
        clock: Box<dyn WallClock>,
    ) -> Self {
        let interpreter = Interpreter::with_clock(table, config.transcript_capacity, clock);
        Self::with_interpreter(tier, config, interpreter)
    }

    fn with_interpreter(
        tier: DeviceTier,
        config: TerminalConfig,
        interpreter: Interpreter,
    ) -> Self {
        Self {
            tier,
            history: InputHistory::new(config.history_depth),
            config,
            interpreter,
            engine: RevealEngine::new(),
            revealed: Vec::new(),
            phase: SessionPhase::Booting { line: 0 },
            lifecycle: Lifecycle::new(),
            on_boot_complete: None,
            boot_completed_at: None,
        }
    }

    /// Run `callback` once when boot completes.
    #[must_use]
    pub fn on_boot_complete(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_boot_complete = Some(Box::new(callback));
        self
    }

    /// Set or replace the boot-complete callback in place.
    pub fn set_boot_callback(&mut self, callback: Option<BootCallback>) {
        self.on_boot_complete = callback;
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether submissions are accepted.
    #[must_use]
    pub fn input_enabled(&self) -> bool {
        self.lifecycle.is_mounted() && self.phase == SessionPhase::AwaitingInput
    }

    /// Virtual time at which boot completed.
    #[must_use]
    pub fn boot_completed_at(&self) -> Option<Duration> {
        self.boot_completed_at
    }

    /// Session tier.
    #[must_use]
    pub fn tier(&self) -> DeviceTier {
        self.tier
    }

    /// The interpreter (table, transcript, counters).
    #[must_use]
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// The transcript.
    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        self.interpreter.transcript()
    }

    /// Observer for captured work.
    #[must_use]
    pub fn guard(&self) -> MountGuard {
        self.lifecycle.guard()
    }

    /// Handle of the pending reveal step, if any.
    #[must_use]
    pub fn pending_timer(&self) -> Option<TimerId> {
        self.engine.pending_timer()
    }

    /// Snapshot for rendering.
    #[must_use]
    pub fn view(&self) -> SessionView<'_> {
        let current_line = match self.phase {
            SessionPhase::Booting { .. } if self.lifecycle.is_mounted() => {
                Some(self.engine.visible())
            }
            _ => None,
        };
        SessionView {
            boot_lines: &self.revealed,
            current_line,
            transcript: self.interpreter.transcript(),
            phase: self.phase,
            input_enabled: self.input_enabled(),
        }
    }

    /// Submit one line of input.
    pub fn submit(&mut self, line: &str) -> Outcome {
        if !self.input_enabled() {
            tracing::debug!(
                target: "cyberterm.session",
                phase = ?self.phase,
                state = ?self.lifecycle.state(),
                "submission rejected"
            );
            return Outcome::Rejected;
        }
        self.phase = SessionPhase::Processing;
        self.history.record(line);
        let outcome = self.interpreter.submit(line);
        self.phase = SessionPhase::AwaitingInput;
        outcome
    }

    /// Recall the next older submitted line.
    pub fn history_previous(&mut self) -> Option<&str> {
        self.history.previous()
    }

    /// Recall the next newer submitted line (`None` at the blank prompt).
    pub fn history_next(&mut self) -> Option<&str> {
        self.history.next()
    }

    /// The input history.
    #[must_use]
    pub fn history(&self) -> &InputHistory {
        &self.history
    }

    /// Fire a captured reveal timer immediately.
    ///
    /// Returns `false` (and changes nothing) when unmounted or when the
    /// handle is stale.
    pub fn fire(&mut self, id: TimerId) -> bool {
        if !self.lifecycle.is_mounted() {
            tracing::debug!(
                target: "cyberterm.session",
                timer = id.raw(),
                state = ?self.lifecycle.state(),
                "ignoring timer fired outside mount"
            );
            return false;
        }
        match self.engine.fire(id) {
            Some(event) => {
                self.handle(event);
                true
            }
            None => false,
        }
    }

    fn reveal_for(&self, index: usize) -> Option<Reveal> {
        let text = self.config.boot_lines.get(index)?;
        let mode = if self.tier.animates_text() {
            RevealMode::Typewriter
        } else {
            RevealMode::Skip
        };
        Some(Reveal::with_mode(text.as_str(), self.config.reveal_delay(), mode))
    }

    fn handle(&mut self, event: RevealEvent) {
        let RevealEvent::Completed = event else {
            return;
        };
        let SessionPhase::Booting { line } = self.phase else {
            return;
        };
        self.revealed.push(self.engine.visible().to_owned());
        tracing::debug!(target: "cyberterm.session", line, "boot line revealed");
        let next = line + 1;
        match self.reveal_for(next) {
            Some(reveal) => {
                self.phase = SessionPhase::Booting { line: next };
                self.engine.start_after(self.config.line_pause(), reveal);
            }
            None => self.finish_boot(self.engine.now()),
        }
    }

    fn finish_boot(&mut self, at: Duration) {
        self.phase = SessionPhase::AwaitingInput;
        self.boot_completed_at = Some(at);
        tracing::debug!(
            target: "cyberterm.session",
            lines = self.revealed.len(),
            at_ms = at.as_millis() as u64,
            "boot complete"
        );
        if let Some(callback) = self.on_boot_complete.take() {
            callback();
        }
    }
}

impl Mountable for TerminalSession {
    fn name(&self) -> &'static str {
        "terminal"
    }

    fn mount(&mut self, now: Duration) {
        if !self.lifecycle.mount() {
            tracing::debug!(
                target: "cyberterm.session",
                state = ?self.lifecycle.state(),
                "mount ignored"
            );
            return;
        }
        self.engine = RevealEngine::starting_at(now);
        tracing::debug!(
            target: "cyberterm.session",
            tier = %self.tier,
            boot_lines = self.config.boot_lines.len(),
            "mounted"
        );
        match self.reveal_for(0) {
            Some(reveal) => {
                self.phase = SessionPhase::Booting { line: 0 };
                self.engine.start(reveal);
            }
            None => self.finish_boot(now),
        }
    }

    fn unmount(&mut self) {
        if !self.lifecycle.unmount() {
            return;
        }
        self.engine.cancel();
        self.on_boot_complete = None;
        tracing::debug!(target: "cyberterm.session", phase = ?self.phase, "unmounted");
    }

    fn advance_to(&mut self, now: Duration) {
        if !self.lifecycle.is_mounted() {
            return;
        }
        while let Some(event) = self.engine.poll(now) {
            self.handle(event);
        }
    }

    fn next_deadline(&self) -> Option<Duration> {
        if !self.lifecycle.is_mounted() {
            return None;
        }
        self.engine.next_deadline()
    }

    fn mount_state(&self) -> MountState {
        self.lifecycle.state()
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.unmount();
    }
}
