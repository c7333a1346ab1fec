#![forbid(unsafe_code)]

//! Subscriber installation for binaries.
//!
//! Library code only emits `tracing` events under `cyberterm.*` targets;
//! binaries call [`install`] once at startup. Output goes to stderr so it
//! never interleaves with terminal output on stdout.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::TryInitError;

/// Environment variable holding the filter directive.
pub const LOG_ENV: &str = "CYBERTERM_LOG";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, compact lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Install the global subscriber.
///
/// The filter comes from [`LOG_ENV`], falling back to `default_directive`
/// (for example `"warn"` or `"cyberterm=debug"`).
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn install(format: LogFormat, default_directive: &str) -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    }
}
