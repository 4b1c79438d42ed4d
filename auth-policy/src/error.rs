use error_common::{Classified, FailureKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),
}

impl Classified for PolicyError {
    fn kind(&self) -> FailureKind {
        match self {
            PolicyError::UnknownCapability(_) => FailureKind::AuthorizationDenied,
        }
    }
}

pub type Result<T> = std::result::Result<T, PolicyError>;
