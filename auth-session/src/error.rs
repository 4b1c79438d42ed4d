use auth_identity::AuthServiceError;
use error_common::{Classified, FailureKind};
use thiserror::Error;

/// Failures of session operations that the caller must act on.
///
/// Expected negative outcomes (not logged in, explicitly invalidated during
/// verify) are returned as `Ok(None)` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Session is no longer valid")]
    SessionInvalidated,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Authentication service unavailable: {0}")]
    Transient(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::Transient(_))
    }
}

impl Classified for SessionError {
    fn kind(&self) -> FailureKind {
        match self {
            SessionError::InvalidCredentials => FailureKind::InvalidCredentials,
            SessionError::SessionInvalidated | SessionError::NotAuthenticated => {
                FailureKind::SessionInvalidated
            }
            SessionError::Transient(_) => FailureKind::TransientFailure,
            SessionError::Rejected(_) | SessionError::Internal(_) => FailureKind::Internal,
        }
    }
}

impl From<AuthServiceError> for SessionError {
    fn from(error: AuthServiceError) -> Self {
        match error {
            AuthServiceError::InvalidCredentials => SessionError::InvalidCredentials,
            AuthServiceError::Unauthorized => SessionError::SessionInvalidated,
            AuthServiceError::Rejected { message, .. } => SessionError::Rejected(message),
            AuthServiceError::Configuration(message) => SessionError::Internal(message),
            transient @ (AuthServiceError::Unavailable { .. }
            | AuthServiceError::Transport(_)
            | AuthServiceError::MalformedResponse(_)) => SessionError::Transient(transient.to_string()),
        }
    }
}

/// Session cache failures; callers treat every one of them as a miss
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Malformed cache entry: {0}")]
    Malformed(String),

    #[error("Cache storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl Classified for CacheError {
    fn kind(&self) -> FailureKind {
        match self {
            CacheError::Malformed(_) => FailureKind::MalformedCache,
            CacheError::Io(_) => FailureKind::Internal,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        CacheError::Malformed(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
