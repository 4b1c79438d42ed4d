use auth_session::SessionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use error_common::{Classified, FailureKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

/// JSON body of every API error
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Failure kind, e.g. `invalid_credentials`
    pub error_type: String,
    /// Stable error code, e.g. `AUTH_2001`
    pub error_code: String,
    /// Human-readable error message
    pub message: String,
    /// Timestamp when error occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Errors of the portal's JSON endpoints
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authorization error: {message}")]
    Authorization { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication { message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            ApiError::InvalidCredentials | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authorization { .. } => StatusCode::FORBIDDEN,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Classified for ApiError {
    fn kind(&self) -> FailureKind {
        match self {
            ApiError::Authentication { .. } => FailureKind::SessionInvalidated,
            ApiError::InvalidCredentials => FailureKind::InvalidCredentials,
            ApiError::Authorization { .. } => FailureKind::AuthorizationDenied,
            ApiError::ServiceUnavailable { .. } => FailureKind::TransientFailure,
            ApiError::BadRequest { .. } | ApiError::Internal { .. } => FailureKind::Internal,
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::InvalidCredentials => ApiError::InvalidCredentials,
            SessionError::SessionInvalidated | SessionError::NotAuthenticated => {
                ApiError::authentication(error.to_string())
            }
            SessionError::Transient(message) => ApiError::ServiceUnavailable { message },
            SessionError::Rejected(message) => ApiError::BadRequest { message },
            SessionError::Internal(message) => ApiError::Internal { message },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();
        let kind = self.kind();

        if status_code.is_server_error() {
            error!(
                error_id = %error_id,
                error_code = kind.code(),
                status_code = status_code.as_u16(),
                error = %self,
                "API error occurred"
            );
        } else {
            warn!(
                error_id = %error_id,
                error_code = kind.code(),
                status_code = status_code.as_u16(),
                error = %self,
                "API request rejected"
            );
        }

        let error_response = ApiErrorResponse {
            error_id,
            error_type: kind.to_string(),
            error_code: kind.code().to_string(),
            message: self.to_string(),
            timestamp: chrono::Utc::now(),
        };

        (status_code, Json(error_response)).into_response()
    }
}
