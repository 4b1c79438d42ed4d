//! Portal flows through the full router
//!
//! Scenarios:
//! 1. Login sets the portal cookie and lands on the role's page or the requested path
//! 2. Failed logins re-render the form without creating a portal session
//! 3. Pages, the session endpoint and denials with a logged-in cookie
//! 4. Logout removes the portal session and the cookie, even when the session is gone
//! 5. A new login replaces a dead portal session

use auth_identity::*;
use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Request, StatusCode,
    },
    response::Response,
    Router,
};
use std::sync::Arc;
use surveillance_portal::*;
use tower::ServiceExt;

fn factory() -> ServiceFactory {
    Arc::new(|| {
        let mut service = MockAuthenticationService::new();
        service
            .expect_login()
            .returning(|credentials| match credentials.username.as_str() {
                "staff" => Ok(Identity::new("7", 3, Some("H001")).with_full_name("Nurse Joy")),
                "admin" => Ok(Identity::new("2", 2, Some("H001")).with_full_name("Dr. Admin")),
                "down" => Err(AuthServiceError::Unavailable { status: 503 }),
                _ => Err(AuthServiceError::InvalidCredentials),
            });
        service.expect_logout().returning(|| Ok(()));
        service.expect_change_password().returning(|_| Ok(()));
        Ok(Arc::new(service) as Arc<dyn AuthenticationService>)
    })
}

fn portal() -> (Router, Arc<PortalRegistry>) {
    let config = PortalConfig::default();
    let registry = Arc::new(PortalRegistry::new(config.session.clone(), factory()));
    let state = PortalState::new(&config, Arc::clone(&registry));
    (create_app(state, &config.server), registry)
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn login_request(form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/login")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

fn get(path: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

/// `portal_sid=<id>` from the response's Set-Cookie header
fn portal_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&format!("{PORTAL_COOKIE}=")))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

fn location(response: &Response) -> &str {
    response.headers().get(LOCATION).unwrap().to_str().unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn login_as(app: &Router, username: &str) -> String {
    let response = send(app, login_request(&format!("username={username}&password=secret"), None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    portal_cookie(&response).unwrap()
}

#[tokio::test]
async fn test_login_lands_on_role_page() {
    let (app, registry) = portal();

    let response = send(&app, login_request("username=staff&password=secret", None)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/patients");
    let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_login_returns_to_requested_path() {
    let (app, _registry) = portal();

    let response = send(
        &app,
        login_request("username=staff&password=secret&redirect=%2Freports%3Fyear%3D2024", None),
    )
    .await;

    assert_eq!(location(&response), "/reports?year=2024");
}

#[tokio::test]
async fn test_login_ignores_external_redirect() {
    let (app, _registry) = portal();

    for target in ["https%3A%2F%2Fevil.example%2F", "%2F%2Fevil.example%2F", "%2Flogin"] {
        let form = format!("username=admin&password=secret&redirect={target}");
        let response = send(&app, login_request(&form, None)).await;
        assert_eq!(location(&response), "/dashboard", "redirect target {target}");
    }
}

#[tokio::test]
async fn test_invalid_credentials_rerender_form() {
    let (app, registry) = portal();

    let response = send(
        &app,
        login_request("username=staff-typo&password=wrong&redirect=%2Fvisits", None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(portal_cookie(&response).is_none());
    assert!(registry.is_empty());
    let page = body_text(response).await;
    assert!(page.contains("Invalid username or password."));
    assert!(page.contains("value=\"/visits\""));
}

#[tokio::test]
async fn test_unavailable_service_is_reported() {
    let (app, registry) = portal();

    let response = send(&app, login_request("username=down&password=secret", None)).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(body_text(response).await.contains("unavailable"));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_pages_after_login() {
    let (app, _registry) = portal();
    let cookie = login_as(&app, "staff").await;

    let response = send(&app, get("/patients", &cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Patients - Nurse Joy");

    let response = send(&app, get("/hospitals/H001", &cookie)).await;
    assert_eq!(body_text(response).await, "Hospital H001 - Nurse Joy");

    let response = send(&app, get("/hospitals/H002", &cookie)).await;
    assert_eq!(location(&response), "/unauthorized");

    let response = send(&app, get("/admin/users", &cookie)).await;
    assert_eq!(location(&response), "/unauthorized");

    let response = send(&app, get("/login", &cookie)).await;
    assert_eq!(location(&response), "/patients");
}

#[tokio::test]
async fn test_root_goes_to_landing() {
    let (app, _registry) = portal();
    let cookie = login_as(&app, "admin").await;

    let response = send(&app, get("/", &cookie)).await;
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_session_endpoint() {
    let (app, _registry) = portal();
    let cookie = login_as(&app, "staff").await;

    let response = send(&app, get("/api/session", &cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["identity"]["id"], "7");
    assert_eq!(body["identity"]["organizationCode"], "H001");
    assert_eq!(body["role"], "staff");
    assert_eq!(body["status"], "fresh");
    let capabilities = body["capabilities"].as_array().unwrap();
    assert!(capabilities.contains(&serde_json::json!("record_visits")));
    assert!(!capabilities.contains(&serde_json::json!("manage_users")));
}

#[tokio::test]
async fn test_anonymous_requests() {
    let (app, _registry) = portal();

    let response = send(&app, get("/reports", "theme=dark")).await;
    assert_eq!(location(&response), "/login?redirect=/reports");

    let response = send(&app, get("/health", "")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, get("/unauthorized", "")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, get("/login?redirect=/reports", "")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("value=\"/reports\""));
}

#[tokio::test]
async fn test_logout_ends_portal_session() {
    let (app, registry) = portal();
    let cookie = login_as(&app, "staff").await;

    let request = Request::builder()
        .method("POST")
        .uri("/logout")
        .header(COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let removal = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(removal.starts_with(&format!("{PORTAL_COOKIE}=;")));
    assert!(registry.is_empty());

    let response = send(&app, get("/patients", &cookie)).await;
    assert_eq!(location(&response), "/login?redirect=/patients");
}

#[tokio::test]
async fn test_logout_without_live_session_clears_cookie() {
    let (app, _registry) = portal();

    let request = Request::builder()
        .method("POST")
        .uri("/logout")
        .header(COOKIE, format!("{PORTAL_COOKIE}=gone"))
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let removal = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(removal.starts_with(&format!("{PORTAL_COOKIE}=;")));

    let response = send(&app, login_request("username=staff&password=secret&redirect=%2Flogout", None)).await;
    assert_eq!(location(&response), "/patients");
}

#[tokio::test]
async fn test_login_replaces_dead_portal_session() {
    let (app, registry) = portal();
    let old_cookie = login_as(&app, "staff").await;
    let old_sid = old_cookie.trim_start_matches(&format!("{PORTAL_COOKIE}=")).to_string();
    registry.get(&old_sid).unwrap().logout().await;

    let response = send(&app, login_request("username=staff&password=secret", Some(&old_cookie))).await;

    let new_cookie = portal_cookie(&response).unwrap();
    assert_ne!(new_cookie, old_cookie);
    assert!(registry.get(&old_sid).is_none());
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_change_password() {
    let (app, _registry) = portal();
    let cookie = login_as(&app, "staff").await;

    let change = |body: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/account/password")
            .header(COOKIE, &cookie)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let response = send(&app, change(r#"{"currentPassword":"old","newPassword":"n3w-Secret"}"#)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, r#"{"success":true}"#);

    let response = send(&app, change(r#"{"currentPassword":"same","newPassword":"same"}"#)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(body["error_id"].is_string());
}
