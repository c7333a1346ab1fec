#![forbid(unsafe_code)]

//! Command-line front end.

use std::io;
use std::path::PathBuf;

use clap::Parser;
use cyberterm_core::DeviceTier;
use cyberterm_core::logging::{self, LogFormat};
use thiserror::Error;

use crate::config::{HeroConfig, HeroConfigError};
use crate::driver::{Driver, spawn_line_reader};
use crate::host::{HeroMount, MountConfig};

/// Default log filter when `CYBERTERM_LOG` is unset.
pub const DEFAULT_LOG_DIRECTIVE: &str = "warn";

#[derive(Debug, Parser)]
#[command(
    name = "cyberterm",
    about = "Run the CyberTerm hero terminal in your shell",
    version
)]
pub struct Cli {
    /// Configuration file (TOML, or JSON with a .json extension).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Force a device tier (full, tablet, mobile, low-resource).
    #[arg(long)]
    pub tier: Option<DeviceTier>,

    /// Seed for decorative randomness.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long = "log-json")]
    pub log_json: bool,
}

impl Cli {
    /// Load the configuration and apply command-line overrides.
    pub fn hero_config(&self) -> Result<HeroConfig, HeroConfigError> {
        let mut config = match &self.config {
            Some(path) => HeroConfig::from_file(path)?,
            None => HeroConfig::default(),
        };
        if let Some(tier) = self.tier {
            config.tier = Some(tier);
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        config.validated()
    }
}

/// Failures surfaced by the binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] HeroConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A global subscriber was already installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl CliError {
    /// Process exit code.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Io(_) => 1,
            Self::Logging(_) => 3,
        }
    }
}

pub fn run_from_env() -> Result<(), CliError> {
    run(Cli::parse())
}

pub fn run(cli: Cli) -> Result<(), CliError> {
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    logging::install(format, DEFAULT_LOG_DIRECTIVE)
        .map_err(|e| CliError::Logging(e.to_string()))?;

    let config = cli.hero_config()?;
    let tier = config.resolve_tier();
    tracing::info!(target: "cyberterm.host", tier = %tier, "starting");

    let hero = HeroMount::mount(&config, MountConfig::new(tier))?;
    let (input, _reader) = spawn_line_reader(io::BufReader::new(io::stdin()), hero.guard());
    let mut driver = Driver::new(hero);
    let stdout = io::stdout();
    driver.run(&input, &mut stdout.lock())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "cyberterm",
            "--tier",
            "low_resource",
            "--seed",
            "9",
            "--log-json",
        ])
        .unwrap();
        assert_eq!(cli.tier, Some(DeviceTier::LowResource));
        assert_eq!(cli.seed, Some(9));
        assert!(cli.log_json);
        assert!(cli.config.is_none());
    }

    #[test]
    fn rejects_unknown_tier() {
        assert!(Cli::try_parse_from(["cyberterm", "--tier", "toaster"]).is_err());
    }

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.toml");
        std::fs::write(&path, "seed = 1\ntier = \"mobile\"\n").unwrap();
        let args: Vec<OsString> = vec![
            "cyberterm".into(),
            "--config".into(),
            path.into_os_string(),
            "--seed".into(),
            "5".into(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let config = cli.hero_config().unwrap();
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.tier, Some(DeviceTier::Mobile));
    }

    #[test]
    fn invalid_file_maps_to_config_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.json");
        std::fs::write(&path, r#"{"particles": {"tick_ms": 0}}"#).unwrap();
        let args: Vec<OsString> =
            vec!["cyberterm".into(), "--config".into(), path.into_os_string()];
        let cli = Cli::try_parse_from(args).unwrap();
        let err = CliError::from(cli.hero_config().unwrap_err());
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("configuration error: validation errors"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn io_errors_convert_with_source() {
        let err: CliError = io::Error::new(io::ErrorKind::BrokenPipe, "closed").into();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "I/O error: closed");
        assert!(std::error::Error::source(&err).is_some());
        assert!(std::error::Error::source(&CliError::Logging("x".into())).is_none());
    }
}
