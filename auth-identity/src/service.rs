use crate::{error::Result, models::*};
use async_trait::async_trait;

/// The remote authentication service.
///
/// Credentials travel as cookies held by the implementation; callers never
/// see or forward them.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait AuthenticationService: Send + Sync {
    /// Exchange username and password for a session. Wrong credentials yield
    /// [`AuthServiceError::InvalidCredentials`](crate::AuthServiceError::InvalidCredentials).
    async fn login(&self, credentials: &Credentials) -> Result<Identity>;

    /// End the remote session. Idempotent.
    async fn logout(&self) -> Result<()>;

    /// Renew the session credential; `Unauthorized` when the refresh
    /// credential itself is gone.
    async fn refresh(&self) -> Result<Identity>;

    /// Check the current credential and return the identity it belongs to.
    async fn verify(&self) -> Result<Identity>;

    /// Full profile of the current identity.
    async fn profile(&self) -> Result<Identity>;

    async fn change_password(&self, change: &PasswordChange) -> Result<()>;
}
