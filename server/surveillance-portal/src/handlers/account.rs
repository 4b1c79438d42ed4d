use crate::error::ApiError;
use auth_gateway::{CurrentIdentity, CurrentSession};
use auth_identity::{Identity, PasswordChange};
use auth_policy::{granted_capabilities, Capability};
use auth_session::SessionStatus;
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current identity and what the UI may offer it.
///
/// Advisory only; every protected route is checked again by the guard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub identity: Identity,
    pub role: Option<&'static str>,
    pub capabilities: &'static [Capability],
    pub status: SessionStatus,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub last_activity_at: Option<DateTime<Utc>>,
}

/// Password change request body
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub async fn current_session(
    CurrentSession(manager): CurrentSession,
    CurrentIdentity(identity): CurrentIdentity,
) -> Json<SessionView> {
    Json(SessionView {
        role: identity.role().map(|role| role.name()),
        capabilities: granted_capabilities(identity.role_id),
        status: manager.status(),
        last_verified_at: manager.last_verified_at(),
        last_activity_at: manager.last_activity_at(),
        identity,
    })
}

/// Change the signed-in user's password.
///
/// # Errors
///
/// Rejections from the authentication service, or an empty new password.
pub async fn change_password(
    CurrentSession(manager): CurrentSession,
    Json(request): Json<PasswordChangeRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if request.new_password.trim().is_empty() {
        return Err(ApiError::bad_request("New password is required"));
    }
    if request.new_password == request.current_password {
        return Err(ApiError::bad_request("New password must differ from the current password"));
    }

    let change = PasswordChange::new(request.current_password, request.new_password);
    manager.change_password(&change).await?;
    Ok(Json(SuccessResponse { success: true }))
}
