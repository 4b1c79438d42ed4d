use auth_identity::IdentityId;
use serde::Serialize;

/// Published on every change of session epoch or verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    LoggedIn { user_id: IdentityId, role_id: i64 },
    Verified { user_id: IdentityId },
    /// The authentication service rejected the session
    Invalidated { user_id: IdentityId },
    LoggedOut { user_id: IdentityId },
    IdleExpired { user_id: IdentityId },
}

impl SessionEvent {
    pub fn user_id(&self) -> &IdentityId {
        match self {
            SessionEvent::LoggedIn { user_id, .. }
            | SessionEvent::Verified { user_id }
            | SessionEvent::Invalidated { user_id }
            | SessionEvent::LoggedOut { user_id }
            | SessionEvent::IdleExpired { user_id } => user_id,
        }
    }

    /// Whether the session ended with this event
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            SessionEvent::Invalidated { .. } | SessionEvent::LoggedOut { .. } | SessionEvent::IdleExpired { .. }
        )
    }
}

/// Observable state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No identity
    Anonymous,
    /// Identity hydrated from the cache, not yet confirmed by the service
    Unverified,
    /// Verified within the verification interval
    Fresh,
    /// Verified, but longer ago than the verification interval
    Stale,
    /// Identity present but the user has been inactive too long
    IdleExpired,
}

impl SessionStatus {
    pub fn is_authenticated(self) -> bool {
        matches!(self, SessionStatus::Unverified | SessionStatus::Fresh | SessionStatus::Stale)
    }
}
