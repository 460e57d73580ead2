//! Log subscriber installation.

use crate::config::{LogFormat, LoggingSettings};
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

/// Targets held at `warn` unless `RUST_LOG` says otherwise.
const QUIET_TARGETS: [&str; 3] = ["hyper", "reqwest", "tower_http"];

/// Errors raised while installing the log subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter {directive:?}: {source}")]
    Filter {
        /// Directive that failed to parse.
        directive: String,
        /// Parser error.
        source: ParseError,
    },

    /// A global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

/// Builds the event filter.
///
/// A non-empty `rust_log` is used verbatim. Otherwise `level` applies to
/// everything except the HTTP stack, which is kept at `warn`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the directive is malformed.
pub fn build_filter(rust_log: Option<&str>, level: &str) -> Result<EnvFilter, TelemetryError> {
    let directive = match rust_log.map(str::trim).filter(|value| !value.is_empty()) {
        Some(explicit) => explicit.to_owned(),
        None => QUIET_TARGETS
            .iter()
            .fold(level.to_owned(), |acc, target| format!("{acc},{target}=warn")),
    };
    EnvFilter::try_new(&directive).map_err(|source| TelemetryError::Filter { directive, source })
}

/// Installs the global `tracing` subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is malformed or a subscriber
/// is already installed.
pub fn init_tracing(settings: &LoggingSettings) -> Result<(), TelemetryError> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(rust_log.as_deref(), &settings.level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    }
    .map_err(|err| TelemetryError::Install(err.to_string()))
}
