//! Structured logging to stderr.
//!
//! Stdout is reserved for command output, so every layer writes to stderr.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Pretty => init_pretty_logging(filter),
    }
}

fn init_json_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

fn init_pretty_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names.
pub mod events {
    /// A rule-set file has been loaded.
    pub const RULES_LOADED: &str = "rules_loaded";

    /// A rule-set or draft file could not be read.
    pub const LOAD_FAILED: &str = "load_failed";

    /// A rule set is not save-eligible.
    pub const VALIDATION_FAILURE: &str = "validation_failure";

    /// A rule set has been written in canonical form.
    pub const RULES_NORMALIZED: &str = "rules_normalized";

    /// A draft has been compared with its baseline.
    pub const DRAFT_COMPARED: &str = "draft_compared";
}

/// Helper macros for structured logging with standard fields.
#[macro_export]
macro_rules! log_rules_loaded {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::RULES_LOADED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_load_failed {
    ($($field:tt)*) => {
        tracing::error!(
            event = $crate::logging::events::LOAD_FAILED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_validation_failure {
    ($($field:tt)*) => {
        tracing::warn!(
            event = $crate::logging::events::VALIDATION_FAILURE,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_rules_normalized {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::RULES_NORMALIZED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_draft_compared {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::DRAFT_COMPARED,
            $($field)*
        )
    };
}
