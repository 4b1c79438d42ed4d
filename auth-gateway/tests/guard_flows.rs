//! Route guard flows through an Axum router
//!
//! Scenarios:
//! 1. Anonymous request to a protected page redirects to login with the return path
//! 2. Staff on a superadmin-only page is sent to the unauthorized page
//! 3. Authenticated user on the login page lands on the role's page
//! 4. Public paths pass without a session
//! 5. Allowed requests carry the identity to the handler
//! 6. A session that cannot be verified degrades to anonymous

use auth_gateway::*;
use auth_identity::*;
use auth_session::{MemorySessionCache, SessionConfig, SessionManager};
use axum::{
    body::Body,
    http::{header::LOCATION, HeaderMap, Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

/// Hands every request the same session, if any
struct FixedSession(Option<Arc<SessionManager>>);

impl SessionLocator for FixedSession {
    fn locate(&self, _headers: &HeaderMap) -> Option<Arc<SessionManager>> {
        self.0.clone()
    }
}

async fn whoami(CurrentIdentity(identity): CurrentIdentity) -> String {
    format!("{}:{}", identity.id, identity.role_id)
}

fn app(session: Option<Arc<SessionManager>>) -> Router {
    let state = GuardState::new(RouteGuard::default(), Arc::new(FixedSession(session)));
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/login", get(|| async { "login form" }))
        .route("/patients", get(whoami))
        .route("/admin/hospitals", get(whoami))
        .route("/hospitals/:code", get(whoami))
        .layer(middleware::from_fn_with_state(state, route_guard))
}

async fn logged_in(identity: Identity) -> Arc<SessionManager> {
    let mut service = MockAuthenticationService::new();
    service.expect_login().returning(move |_| Ok(identity.clone()));
    let manager = Arc::new(SessionManager::new(
        Arc::new(service),
        Arc::new(MemorySessionCache::new()),
        SessionConfig::default(),
    ));
    manager.login(&Credentials::new("user", "secret")).await.unwrap();
    manager
}

async fn get_path(app: Router, path: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response.headers().get(LOCATION).unwrap().to_str().unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_anonymous_request_redirects_to_login() {
    let response = get_path(app(None), "/patients").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?redirect=/patients");
}

#[tokio::test]
async fn test_staff_denied_hospital_administration() {
    let manager = logged_in(Identity::new("7", 3, Some("H001"))).await;
    let response = get_path(app(Some(manager)), "/admin/hospitals").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/unauthorized");
}

#[tokio::test]
async fn test_authenticated_user_on_login_goes_to_landing() {
    let manager = logged_in(Identity::new("2", 2, Some("H001"))).await;
    let response = get_path(app(Some(manager)), "/login").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_anonymous_user_sees_login_page() {
    let response = get_path(app(None), "/login?redirect=/patients").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "login form");
}

#[tokio::test]
async fn test_public_path_needs_no_session() {
    let response = get_path(app(None), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_allowed_request_carries_identity() {
    let manager = logged_in(Identity::new("7", 3, Some("H001"))).await;
    let response = get_path(app(Some(manager)), "/patients").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "7:3");
}

#[tokio::test]
async fn test_superadmin_reaches_hospital_administration() {
    let manager = logged_in(Identity::new("1", 1, None)).await;
    let response = get_path(app(Some(manager)), "/admin/hospitals").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_staff_scoped_to_own_hospital() {
    let manager = logged_in(Identity::new("7", 3, Some("H001"))).await;

    let own = get_path(app(Some(manager.clone())), "/hospitals/H001").await;
    assert_eq!(own.status(), StatusCode::OK);

    let other = get_path(app(Some(manager)), "/hospitals/H002").await;
    assert_eq!(location(&other), "/unauthorized");
}

#[tokio::test]
async fn test_unknown_role_fails_closed() {
    let manager = logged_in(Identity::new("9", 42, Some("H001"))).await;
    let response = get_path(app(Some(manager)), "/patients").await;
    assert_eq!(location(&response), "/unauthorized");
}

#[tokio::test]
async fn test_unverifiable_session_is_treated_as_anonymous() {
    let entry = auth_session::CacheEntry {
        identity: Identity::new("7", 3, Some("H001")),
        timestamp: chrono::Utc::now(),
        last_activity_at: Some(chrono::Utc::now()),
    };
    let mut service = MockAuthenticationService::new();
    service
        .expect_verify()
        .returning(|| Err(AuthServiceError::Unavailable { status: 503 }));
    let manager = Arc::new(SessionManager::new(
        Arc::new(service),
        Arc::new(MemorySessionCache::with_entry(&entry).unwrap()),
        SessionConfig::default(),
    ));

    let response = get_path(app(Some(manager.clone())), "/patients?page=2").await;

    assert_eq!(location(&response), "/login?redirect=/patients%3Fpage%3D2");
    // The session itself survives a transient failure
    assert!(manager.is_authenticated());
}

#[tokio::test]
async fn test_require_authentication_helper() {
    let guard = RouteGuard::default();
    let target = "/reports".parse().unwrap();

    let redirect = require_authentication(&guard, None, &target).await.unwrap_err();
    assert_eq!(redirect.reason, RedirectReason::Login);
    assert_eq!(redirect.location, "/login?redirect=/reports");

    let manager = logged_in(Identity::new("7", 3, Some("H001"))).await;
    let identity = require_authentication(&guard, Some(&manager), &target).await.unwrap();
    assert_eq!(identity.id.as_str(), "7");
}
