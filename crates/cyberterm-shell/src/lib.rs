#![forbid(unsafe_code)]

//! The CyberTerm terminal: command table, interpreter, transcript, input
//! history, and the boot-sequenced [`TerminalSession`] that ties them to the
//! text reveal engine.
//!
//! The interpreter is total over string input and synchronous; the session
//! owns the only scheduled work (boot line reveals) and follows the shared
//! [`Mountable`](cyberterm_core::Mountable) contract.

pub mod command;
pub mod history;
pub mod interpreter;
pub mod session;
pub mod transcript;

pub use command::{
    ActionKind, CatalogEntry, CatalogError, CommandAction, CommandCatalog, CommandSpec,
    CommandTable,
};
pub use history::InputHistory;
pub use interpreter::{FixedClock, Interpreter, InterpreterStats, Outcome, SystemClock, WallClock};
pub use session::{BootCallback, SessionPhase, SessionView, TerminalConfig, TerminalSession};
pub use transcript::{Transcript, TranscriptEntry};
