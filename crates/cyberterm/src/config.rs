#![forbid(unsafe_code)]

//! Hero configuration.
//!
//! Every tunable of the hero lives in one [`HeroConfig`], loadable from TOML
//! or JSON. Every section uses `#[serde(default)]`, so a partial file only
//! overrides what it names.
//!
//! # Example (TOML)
//!
//! ```toml
//! seed = 7
//!
//! [capabilities]
//! viewport_width = 820
//!
//! [terminal]
//! reveal_delay_ms = 20
//! boot_lines = ["Booting...", "Ready."]
//!
//! [ambient.glitch]
//! period_ms = 4000
//! probability = 0.5
//! active_ms = 150
//! min_tier = "mobile"
//!
//! [particles]
//! max_particles = 30
//! ```

use std::fmt;
use std::path::Path;

use cyberterm_core::{Capabilities, DeviceTier};
use cyberterm_fx::{AmbientConfig, ParticleConfig};
use cyberterm_shell::{CatalogError, CommandCatalog, CommandTable, TerminalConfig};
use serde::{Deserialize, Serialize};

/// Complete hero configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroConfig {
    /// Forced tier; classified from `capabilities` when absent.
    pub tier: Option<DeviceTier>,
    /// RNG seed for decorative effects; OS entropy when absent.
    pub seed: Option<u64>,
    /// Host-probed capabilities.
    pub capabilities: Capabilities,
    /// Boot sequence, transcript, and input history.
    pub terminal: TerminalConfig,
    /// Locale-specific command data.
    pub catalog: CommandCatalog,
    /// Ambient effect table.
    pub ambient: AmbientConfig,
    /// Pointer particle tunables.
    pub particles: ParticleConfig,
}

impl HeroConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, HeroConfigError> {
        toml::from_str(s).map_err(HeroConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, HeroConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(HeroConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, HeroConfigError> {
        serde_json::from_str(s).map_err(HeroConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, HeroConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(HeroConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Load a file, picking the format from its extension (`.json` is JSON,
    /// anything else TOML).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HeroConfigError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_file(path)
        } else {
            Self::from_toml_file(path)
        }
    }

    /// Serialize to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Tier for this session: the forced tier, or the classified one.
    #[must_use]
    pub fn resolve_tier(&self) -> DeviceTier {
        self.tier
            .unwrap_or_else(|| DeviceTier::classify(&self.capabilities))
    }

    /// Validate all numeric ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid. Catalog problems are reported separately by
    /// [`command_table`](Self::command_table).
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.terminal.validate();
        errors.extend(self.ambient.validate());
        errors.extend(self.particles.validate());
        errors
    }

    /// Build the command table from the catalog.
    pub fn command_table(&self) -> Result<CommandTable, HeroConfigError> {
        CommandTable::from_catalog(self.catalog.clone()).map_err(HeroConfigError::Catalog)
    }

    /// Check everything, returning the config unchanged when usable.
    pub fn validated(self) -> Result<Self, HeroConfigError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(HeroConfigError::Validation(errors));
        }
        self.catalog.check().map_err(HeroConfigError::Catalog)?;
        Ok(self)
    }
}

/// Errors from loading or checking a [`HeroConfig`].
#[derive(Debug)]
pub enum HeroConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Range errors, all of them.
    Validation(Vec<String>),
    /// The command catalog is unusable.
    Catalog(CatalogError),
}

impl fmt::Display for HeroConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => write!(f, "validation errors: {}", errors.join("; ")),
            Self::Catalog(e) => write!(f, "command catalog: {e}"),
        }
    }
}

impl std::error::Error for HeroConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Catalog(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
