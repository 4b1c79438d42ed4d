use crate::registry::PORTAL_COOKIE;
use crate::PortalState;
use auth_identity::Credentials;
use auth_session::SessionError;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use error_common::log_error;
use serde::Deserialize;

/// Query of the login page
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub redirect: Option<String>,
}

/// Submitted login form
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub redirect: Option<String>,
}

/// Login page handler
pub async fn login_page(Query(query): Query<LoginQuery>) -> Html<String> {
    render_login(None, query.redirect.as_deref())
}

/// Login form handler.
///
/// A successful login always starts a new portal session under a new id;
/// the browser's previous portal session, if any, is logged out.
pub async fn login(State(state): State<PortalState>, jar: CookieJar, Form(form): Form<LoginForm>) -> Response {
    let LoginForm { username, password, redirect } = form;

    let pending = match state.registry.open() {
        Ok(pending) => pending,
        Err(error) => {
            log_error("portal login", &error);
            return login_failure(StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_MESSAGE, redirect.as_deref());
        }
    };

    let credentials = Credentials::new(username, password);
    match pending.manager.login(&credentials).await {
        Ok(identity) => {
            if let Some(previous) = jar.get(PORTAL_COOKIE).map(|cookie| cookie.value().to_string()) {
                state.registry.remove(&previous).await;
            }
            let sid = state.registry.register(pending);
            let location = state.guard.post_login_location(&identity, redirect.as_deref());
            let jar = jar.add(session_cookie(sid, state.secure_cookies));
            (jar, Redirect::to(&location)).into_response()
        }
        Err(SessionError::InvalidCredentials) => login_failure(
            StatusCode::UNAUTHORIZED,
            "Invalid username or password.",
            redirect.as_deref(),
        ),
        Err(error) if error.is_transient() => {
            login_failure(StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_MESSAGE, redirect.as_deref())
        }
        Err(error) => {
            log_error("portal login", &error);
            login_failure(StatusCode::BAD_REQUEST, "Login failed.", redirect.as_deref())
        }
    }
}

/// Logout handler. Always ends at the login page with the cookie removed.
pub async fn logout(State(state): State<PortalState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(sid) = jar.get(PORTAL_COOKIE).map(|cookie| cookie.value().to_string()) {
        state.registry.remove(&sid).await;
    }
    let jar = jar.remove(Cookie::build(PORTAL_COOKIE).path("/"));
    (jar, Redirect::to(&state.guard.config().login_path))
}

/// Denial page handler
pub async fn unauthorized_page() -> (StatusCode, Html<&'static str>) {
    (
        StatusCode::FORBIDDEN,
        Html(
            "<!doctype html><html><head><title>Access denied</title></head><body>\
             <h1>Access denied</h1><p>Your account does not have access to this page.</p>\
             <form method=\"post\" action=\"/logout\"><button type=\"submit\">Sign out</button></form>\
             </body></html>",
        ),
    )
}

const UNAVAILABLE_MESSAGE: &str = "The authentication service is unavailable. Please try again.";

fn session_cookie(sid: String, secure: bool) -> Cookie<'static> {
    Cookie::build((PORTAL_COOKIE, sid))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn login_failure(status: StatusCode, message: &str, redirect: Option<&str>) -> Response {
    (status, render_login(Some(message), redirect)).into_response()
}

fn render_login(message: Option<&str>, redirect: Option<&str>) -> Html<String> {
    let message = message
        .map(|message| format!("<p class=\"error\">{}</p>", escape_html(message)))
        .unwrap_or_default();
    let redirect = redirect
        .map(|target| format!("<input type=\"hidden\" name=\"redirect\" value=\"{}\">", escape_html(target)))
        .unwrap_or_default();

    Html(format!(
        "<!doctype html><html><head><title>Sign in</title></head><body>\
         <h1>Disease Surveillance Portal</h1>{message}\
         <form method=\"post\" action=\"/login\">{redirect}\
         <label>Username <input name=\"username\" autocomplete=\"username\" required></label>\
         <label>Password <input name=\"password\" type=\"password\" autocomplete=\"current-password\" required></label>\
         <button type=\"submit\">Sign in</button></form></body></html>"
    ))
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
