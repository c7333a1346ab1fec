#![forbid(unsafe_code)]

//! Command table and its injected catalog.
//!
//! A [`CommandCatalog`] is plain configuration: locale-specific command names,
//! descriptions, static responses, the unknown-command text, and the date
//! format. [`CommandTable::from_catalog`] checks it once and builds a
//! case-insensitive lookup where every entry resolves to a [`CommandAction`].
//!
//! # Invariants
//!
//! 1. Every name listed by `help` resolves in the table.
//! 2. Names are unique ignoring case, non-empty, and contain no whitespace.
//! 3. A usable table always binds the `help` action.

use std::fmt;

use ahash::AHashMap;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

/// Default `date` format (`Tue Mar  4 09:15:02 2025`).
pub const DEFAULT_DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Default reply to an unrecognized command.
pub const DEFAULT_UNKNOWN_COMMAND: &str = "Command not found. Type 'help' for available commands.";

/// Gap between the padded name column and the description in `help` output.
const HELP_GAP: usize = 2;

/// Handler kind named by a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// List the table.
    Help,
    /// Wipe the transcript.
    Clear,
    /// Repeat the arguments.
    Echo,
    /// Print the current local time.
    Date,
    /// Print the entry's fixed lines.
    #[default]
    Static,
}

impl ActionKind {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Clear => "clear",
            Self::Echo => "echo",
            Self::Date => "date",
            Self::Static => "static",
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Command name as typed (matched ignoring case).
    pub name: String,
    /// One-line description for `help`.
    pub description: String,
    /// Handler kind.
    #[serde(default)]
    pub action: ActionKind,
    /// Response lines for [`ActionKind::Static`]; ignored otherwise.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<String>,
}

impl CatalogEntry {
    /// Entry bound to a dynamic handler.
    #[must_use]
    pub fn builtin(name: &str, description: &str, action: ActionKind) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            action,
            lines: Vec::new(),
        }
    }

    /// Entry with a fixed response.
    #[must_use]
    pub fn fixed(name: &str, description: &str, lines: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            action: ActionKind::Static,
            lines: lines.iter().map(|&line| line.to_owned()).collect(),
        }
    }
}

/// Locale-specific command data injected by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandCatalog {
    /// Entries in `help` order.
    pub commands: Vec<CatalogEntry>,
    /// Single-line reply to any unrecognized command.
    pub unknown_command: String,
    /// `strftime` format used by `date`.
    pub date_format: String,
}

impl Default for CommandCatalog {
    /// The built-in English catalog.
    fn default() -> Self {
        Self {
            commands: vec![
                CatalogEntry::builtin("help", "Show available commands", ActionKind::Help),
                CatalogEntry::fixed(
                    "about",
                    "Who we are",
                    &[
                        "We design and build fast, secure software for the web.",
                        "Small team, senior engineers, no hand-offs.",
                    ],
                ),
                CatalogEntry::fixed(
                    "services",
                    "What we build",
                    &[
                        "- Web applications and APIs",
                        "- Cloud infrastructure and automation",
                        "- Security reviews and hardening",
                    ],
                ),
                CatalogEntry::fixed(
                    "projects",
                    "Recent work",
                    &["Browse case studies in the projects section below."],
                ),
                CatalogEntry::fixed(
                    "contact",
                    "How to reach us",
                    &["Use the contact form or write to hello@example.com."],
                ),
                CatalogEntry::builtin("echo", "Print the given text", ActionKind::Echo),
                CatalogEntry::builtin("date", "Show the current date and time", ActionKind::Date),
                CatalogEntry::builtin("clear", "Clear the terminal", ActionKind::Clear),
            ],
            unknown_command: DEFAULT_UNKNOWN_COMMAND.to_owned(),
            date_format: DEFAULT_DATE_FORMAT.to_owned(),
        }
    }
}

impl CommandCatalog {
    /// Check the catalog, reporting the first problem.
    pub fn check(&self) -> Result<(), CatalogError> {
        let mut seen: AHashMap<String, usize> = AHashMap::with_capacity(self.commands.len());
        for (index, entry) in self.commands.iter().enumerate() {
            if entry.name.is_empty() {
                return Err(CatalogError::EmptyName { index });
            }
            if entry.name.chars().any(char::is_whitespace) {
                return Err(CatalogError::WhitespaceInName {
                    name: entry.name.clone(),
                });
            }
            if seen.insert(entry.name.to_lowercase(), index).is_some() {
                return Err(CatalogError::DuplicateName {
                    name: entry.name.clone(),
                });
            }
        }
        if !self
            .commands
            .iter()
            .any(|entry| entry.action == ActionKind::Help)
        {
            return Err(CatalogError::MissingBuiltin {
                action: ActionKind::Help,
            });
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(CatalogError::InvalidDateFormat {
                format: self.date_format.clone(),
            });
        }
        Ok(())
    }
}

/// A catalog that cannot be turned into a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// An entry has an empty name.
    EmptyName {
        /// Position in the catalog.
        index: usize,
    },
    /// A name contains whitespace and could never be typed as one word.
    WhitespaceInName {
        /// The offending name.
        name: String,
    },
    /// Two entries share a name ignoring case.
    DuplicateName {
        /// The second occurrence.
        name: String,
    },
    /// No entry binds a required handler.
    MissingBuiltin {
        /// The missing handler.
        action: ActionKind,
    },
    /// The date format has an unknown specifier.
    InvalidDateFormat {
        /// The rejected format.
        format: String,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName { index } => write!(f, "command #{index} has an empty name"),
            Self::WhitespaceInName { name } => {
                write!(f, "command name {name:?} contains whitespace")
            }
            Self::DuplicateName { name } => write!(f, "duplicate command name {name:?}"),
            Self::MissingBuiltin { action } => {
                write!(f, "no command is bound to the {} handler", action.as_str())
            }
            Self::InvalidDateFormat { format } => write!(f, "invalid date format {format:?}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// What a recognized command does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
    /// List every entry.
    Help,
    /// Wipe the transcript.
    Clear,
    /// Repeat the arguments joined by single spaces.
    Echo,
    /// Print the current local time.
    Date,
    /// Print fixed lines.
    Static(Vec<String>),
}

/// A resolved table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    name: String,
    description: String,
    action: CommandAction,
}

impl CommandSpec {
    /// Name as listed.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description for `help`.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Handler.
    #[must_use]
    pub fn action(&self) -> &CommandAction {
        &self.action
    }
}

/// Closed, case-insensitive set of recognized commands.
#[derive(Debug, Clone)]
pub struct CommandTable {
    entries: Vec<CommandSpec>,
    index: AHashMap<String, usize>,
    unknown: Vec<String>,
    date_format: String,
}

impl Default for CommandTable {
    /// The built-in English table.
    fn default() -> Self {
        Self::build(CommandCatalog::default())
    }
}

impl CommandTable {
    /// Check `catalog` and build a table from it.
    pub fn from_catalog(catalog: CommandCatalog) -> Result<Self, CatalogError> {
        catalog.check()?;
        Ok(Self::build(catalog))
    }

    fn build(catalog: CommandCatalog) -> Self {
        let entries: Vec<CommandSpec> = catalog
            .commands
            .into_iter()
            .map(|entry| CommandSpec {
                action: match entry.action {
                    ActionKind::Help => CommandAction::Help,
                    ActionKind::Clear => CommandAction::Clear,
                    ActionKind::Echo => CommandAction::Echo,
                    ActionKind::Date => CommandAction::Date,
                    ActionKind::Static => CommandAction::Static(entry.lines),
                },
                name: entry.name,
                description: entry.description,
            })
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, spec)| (spec.name.to_lowercase(), i))
            .collect();
        Self {
            entries,
            index,
            unknown: vec![catalog.unknown_command],
            date_format: catalog.date_format,
        }
    }

    /// Look up `name` ignoring case.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&CommandSpec> {
        self.index
            .get(&name.to_lowercase())
            .and_then(|&i| self.entries.get(i))
    }

    /// Entries in listing order.
    #[must_use]
    pub fn entries(&self) -> &[CommandSpec] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty (never true for a checked catalog).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reply to an unrecognized command.
    #[must_use]
    pub fn unknown_response(&self) -> &[String] {
        &self.unknown
    }

    /// `strftime` format for `date`.
    #[must_use]
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// `help` output: one line per entry, names padded to a common display
    /// width.
    #[must_use]
    pub fn help_lines(&self) -> Vec<String> {
        let column = self
            .entries
            .iter()
            .map(|spec| spec.name.width())
            .max()
            .unwrap_or(0)
            + HELP_GAP;
        self.entries
            .iter()
            .map(|spec| {
                let pad = column.saturating_sub(spec.name.width());
                format!("{}{}{}", spec.name, " ".repeat(pad), spec.description)
            })
            .collect()
    }
}
