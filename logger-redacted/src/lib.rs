pub mod config;
pub mod redactor;

pub use config::*;
pub use redactor::*;

use error_common::{Classified, FailureKind};
use thiserror::Error;
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging system with credential redaction
///
/// Every formatted event passes through a [`CredentialRedactor`] before it is
/// written, so passwords, bearer tokens and session cookies that end up in a
/// message or field never reach stdout.
///
/// # Example
///
/// ```rust,no_run
/// use logger_redacted::{init, LoggerConfig};
///
/// init(&LoggerConfig::default()).expect("logging");
/// tracing::info!(username = "nurse@hospital.org", "login attempt");
/// // Output: ... login attempt username="EMAIL[...]"
/// ```
#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Logger already initialized: {0}")]
    AlreadyInitialized(String),
}

impl Classified for LoggerError {
    fn kind(&self) -> FailureKind {
        match self {
            LoggerError::InvalidFilter(_) => FailureKind::Configuration,
            LoggerError::AlreadyInitialized(_) => FailureKind::Internal,
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Errors
///
/// Fails when the configured level is not a valid filter directive or when a
/// global subscriber is already installed.
pub fn init(config: &LoggerConfig) -> Result<(), LoggerError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.default_directive())
            .map_err(|e| LoggerError::InvalidFilter(e.to_string()))?,
    };

    let writer = RedactingMakeWriter::new(std::io::stdout, CredentialRedactor::new(config.redaction()));

    if config.json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(writer)
                    .json(),
            )
            .try_init()
            .map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .try_init()
            .map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))
    }
}
