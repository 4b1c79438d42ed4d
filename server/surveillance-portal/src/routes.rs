pub mod paths;

use crate::{
    handlers::{account, auth, health, pages},
    PortalState,
};
use axum::{
    routing::{get, post},
    Router,
};

/// Create health check routes
pub fn health_routes() -> Router<PortalState> {
    Router::new()
        .route(paths::health::HEALTH, get(health::health_check))
        .route(paths::health::STATUS, get(health::system_status))
}

/// Create login, logout and denial routes
pub fn auth_routes() -> Router<PortalState> {
    Router::new()
        .route(paths::auth::LOGIN, get(auth::login_page).post(auth::login))
        .route(paths::auth::LOGOUT, post(auth::logout))
        .route(paths::auth::UNAUTHORIZED, get(auth::unauthorized_page))
}

/// Create session and account JSON routes
pub fn api_routes() -> Router<PortalState> {
    Router::new()
        .route(paths::api::SESSION, get(account::current_session))
        .route(paths::api::CHANGE_PASSWORD, post(account::change_password))
}

/// Create application page routes
pub fn page_routes() -> Router<PortalState> {
    use paths::pages::*;

    let mut router = Router::new();
    for path in [
        DASHBOARD,
        PATIENTS,
        VISITS,
        POPULATIONS,
        REPORTS,
        REPORTS_EXPORT,
        ADMIN,
        ADMIN_HOSPITALS,
        ADMIN_DISEASES,
        ADMIN_USERS,
        ADMIN_SUPERADMINS,
        ADMIN_ADMINS,
    ] {
        router = router.route(path, get(pages::page));
    }
    router
        .route(HOME, get(pages::home))
        .route(HOSPITAL, get(pages::hospital))
}

/// Create all routes
pub fn create_routes() -> Router<PortalState> {
    Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .merge(api_routes())
        .merge(page_routes())
}
