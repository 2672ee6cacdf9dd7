//! Structured logging: JSON lines to stdout, or pretty output for local runs.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// `RUST_LOG` wins over the configured level when set.
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
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

fn init_pretty_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .pretty()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Standard log event names.
pub mod events {
    /// Service is starting up.
    pub const STARTUP: &str = "startup";

    /// Server is listening on an address.
    pub const LISTENING: &str = "listening";

    /// Server has stopped accepting connections.
    pub const SHUTDOWN: &str = "shutdown";

    /// The ruleset has been loaded and the rule engine built.
    pub const RULESET_LOADED: &str = "ruleset_loaded";

    /// A document went through the validation pipeline.
    pub const VALIDATION_COMPLETED: &str = "validation_completed";

    /// An upload was refused before validation.
    pub const UPLOAD_REJECTED: &str = "upload_rejected";

    /// A validated document was handed to the catalog.
    pub const DOCUMENT_PUBLISHED: &str = "document_published";

    /// The catalog refused or failed to take a validated document.
    pub const PUBLISH_FAILED: &str = "publish_failed";
}

#[macro_export]
macro_rules! log_startup {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::STARTUP,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_listening {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::LISTENING,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_shutdown {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::SHUTDOWN,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_ruleset_loaded {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::RULESET_LOADED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_upload_rejected {
    ($($field:tt)*) => {
        tracing::warn!(
            event = $crate::logging::events::UPLOAD_REJECTED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_validation_completed {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::VALIDATION_COMPLETED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_document_published {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::DOCUMENT_PUBLISHED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_publish_failed {
    ($($field:tt)*) => {
        tracing::error!(
            event = $crate::logging::events::PUBLISH_FAILED,
            $($field)*
        )
    };
}
