use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use error_common::{Classified, FailureKind};
use serde_json::json;
use thiserror::Error;

/// Rejection of the guard extractors.
///
/// Only reachable for handlers mounted outside the guard middleware.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Access denied")]
    Forbidden,
}

impl Classified for GuardRejection {
    fn kind(&self) -> FailureKind {
        match self {
            GuardRejection::Unauthenticated => FailureKind::SessionInvalidated,
            GuardRejection::Forbidden => FailureKind::AuthorizationDenied,
        }
    }
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        let status = match self {
            GuardRejection::Unauthenticated => StatusCode::UNAUTHORIZED,
            GuardRejection::Forbidden => StatusCode::FORBIDDEN,
        };
        let body = json!({
            "error_type": self.kind(),
            "error_code": self.kind().code(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
