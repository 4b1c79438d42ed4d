//! Route guard middleware for Axum
//!
//! Locates the session of the calling browser, runs the [`RouteGuard`] and
//! either redirects or forwards the request with the resolved identity and
//! its session manager in the request extensions.

use crate::error::GuardRejection;
use crate::guard::{GuardOutcome, GuardRedirect, RouteGuard};
use async_trait::async_trait;
use auth_identity::Identity;
use auth_session::SessionManager;
use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Finds the session manager belonging to a request
pub trait SessionLocator: Send + Sync {
    fn locate(&self, headers: &HeaderMap) -> Option<Arc<SessionManager>>;
}

/// Shared state of the guard middleware
#[derive(Clone)]
pub struct GuardState {
    pub guard: Arc<RouteGuard>,
    pub sessions: Arc<dyn SessionLocator>,
}

impl GuardState {
    pub fn new(guard: RouteGuard, sessions: Arc<dyn SessionLocator>) -> Self {
        Self { guard: Arc::new(guard), sessions }
    }
}

/// Guard every request before it reaches a handler.
///
/// Allowed requests carry the [`Identity`] and the `Arc<SessionManager>` as
/// extensions; activity is recorded for them.
pub async fn route_guard(
    State(state): State<GuardState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let manager = state.sessions.locate(request.headers());

    match state.guard.evaluate(manager.as_ref(), request.uri()).await {
        GuardOutcome::Public => {
            if let Some(manager) = manager {
                request.extensions_mut().insert(manager);
            }
            next.run(request).await
        }
        GuardOutcome::Allow(identity) => {
            if let Some(manager) = manager {
                manager.touch_activity();
                request.extensions_mut().insert(manager);
            }
            tracing::debug!(
                user_id = %identity.id,
                role_id = identity.role_id,
                path = %request.uri().path(),
                "Request authorized"
            );
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        GuardOutcome::Redirect(redirect) => redirect.into_response(),
    }
}

/// Identity of the current request or a login redirect preserving `target`.
///
/// # Errors
///
/// The login redirect when there is no session or it resolves to nobody.
pub async fn require_authentication(
    guard: &RouteGuard,
    session: Option<&Arc<SessionManager>>,
    target: &axum::http::Uri,
) -> Result<Identity, GuardRedirect> {
    let identity = match session {
        Some(manager) => manager.resolve().await.unwrap_or_else(|error| {
            tracing::debug!(error = %error, "Session could not be resolved");
            None
        }),
        None => None,
    };
    identity.ok_or_else(|| guard.login_redirect(target))
}

/// Extractor for the identity the guard attached to the request
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentIdentity)
            .ok_or(GuardRejection::Unauthenticated)
    }
}

/// Extractor for the session manager of the calling browser
#[derive(Clone)]
pub struct CurrentSession(pub Arc<SessionManager>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<SessionManager>>()
            .cloned()
            .map(CurrentSession)
            .ok_or(GuardRejection::Unauthenticated)
    }
}
