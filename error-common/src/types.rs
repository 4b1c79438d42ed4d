use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::codes;

/// Failure categories shared by every crate of the authentication core.
///
/// Expected outcomes (denial, expiry, bad password) map onto one of these
/// kinds instead of surfacing as opaque errors, so callers at the boundary can
/// decide between "show a message", "redirect to login" and "just log it".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Login rejected by the authentication service
    InvalidCredentials,
    /// Verify/refresh explicitly rejected; the local session is gone
    SessionInvalidated,
    /// Network or service error; state is preserved and retried later
    TransientFailure,
    /// Capability, ownership or organization check failed
    AuthorizationDenied,
    /// Session cache entry unreadable or past its maximum age
    MalformedCache,
    /// Invalid or missing configuration
    Configuration,
    /// Anything else
    Internal,
}

impl FailureKind {
    /// Stable error code for logs and API responses
    pub fn code(self) -> &'static str {
        match self {
            FailureKind::InvalidCredentials => codes::authentication::INVALID_CREDENTIALS,
            FailureKind::SessionInvalidated => codes::authentication::SESSION_INVALIDATED,
            FailureKind::TransientFailure => codes::authentication::SERVICE_UNAVAILABLE,
            FailureKind::AuthorizationDenied => codes::authorization::ACCESS_DENIED,
            FailureKind::MalformedCache => codes::cache::MALFORMED_ENTRY,
            FailureKind::Configuration => codes::system::CONFIGURATION,
            FailureKind::Internal => codes::system::INTERNAL,
        }
    }

    /// Whether the end user should see a message for this failure.
    ///
    /// Cache problems and transient failures are handled silently.
    pub fn is_user_visible(self) -> bool {
        matches!(
            self,
            FailureKind::InvalidCredentials
                | FailureKind::SessionInvalidated
                | FailureKind::AuthorizationDenied
        )
    }

    /// Whether the failure destroys the local session
    pub fn ends_session(self) -> bool {
        matches!(self, FailureKind::SessionInvalidated)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::InvalidCredentials => "invalid_credentials",
            FailureKind::SessionInvalidated => "session_invalidated",
            FailureKind::TransientFailure => "transient_failure",
            FailureKind::AuthorizationDenied => "authorization_denied",
            FailureKind::MalformedCache => "malformed_cache",
            FailureKind::Configuration => "configuration",
            FailureKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Implemented by every error type of the core so boundaries can classify it
pub trait Classified {
    fn kind(&self) -> FailureKind;
}

/// Process-level error for the portal binary
#[derive(Error, Debug)]
pub enum PortalError {
    /// Network communication errors
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server runtime errors
    #[error("Server error: {0}")]
    ServerError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Classified for PortalError {
    fn kind(&self) -> FailureKind {
        match self {
            PortalError::ConfigError(_) => FailureKind::Configuration,
            PortalError::NetworkError(_) => FailureKind::TransientFailure,
            PortalError::ServerError(_) | PortalError::InternalError(_) | PortalError::Other(_) => {
                FailureKind::Internal
            }
        }
    }
}

/// Result type alias for portal operations
pub type Result<T> = std::result::Result<T, PortalError>;

/// Log a classified error with its code
pub fn log_error<E>(context: &str, error: &E)
where
    E: Classified + fmt::Display,
{
    let kind = error.kind();
    tracing::error!(
        context = context,
        error_code = kind.code(),
        error_type = %kind,
        error = %error,
        "Portal error occurred"
    );
}
