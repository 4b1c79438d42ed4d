use error_common::{Classified, FailureKind};
use thiserror::Error;

/// Failures reported by the authentication service client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthServiceError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Explicit 401: the credential is invalid or expired
    #[error("Credential rejected by authentication service")]
    Unauthorized,

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Authentication service unavailable (status {status})")]
    Unavailable { status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl AuthServiceError {
    /// "Could not check" as opposed to "proven invalid"
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AuthServiceError::Unavailable { .. }
                | AuthServiceError::Transport(_)
                | AuthServiceError::MalformedResponse(_)
        )
    }
}

impl Classified for AuthServiceError {
    fn kind(&self) -> FailureKind {
        match self {
            AuthServiceError::InvalidCredentials => FailureKind::InvalidCredentials,
            AuthServiceError::Unauthorized => FailureKind::SessionInvalidated,
            AuthServiceError::Rejected { .. } => FailureKind::Internal,
            AuthServiceError::Configuration(_) => FailureKind::Configuration,
            AuthServiceError::Unavailable { .. }
            | AuthServiceError::Transport(_)
            | AuthServiceError::MalformedResponse(_) => FailureKind::TransientFailure,
        }
    }
}

impl From<reqwest::Error> for AuthServiceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            AuthServiceError::MalformedResponse(error.to_string())
        } else {
            AuthServiceError::Transport(error.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthServiceError>;
