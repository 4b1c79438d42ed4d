//! Surveillance Portal - session-backed web front end
//!
//! Each browser gets a portal session behind an opaque `portal_sid` cookie,
//! owning one session manager and one credential store. Every request passes
//! the route guard before it reaches a handler.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod registry;
pub mod routes;

pub use crate::config::{ConfigError, PortalConfig, ServerConfig};
pub use error::*;
pub use registry::{PortalRegistry, ServiceFactory, PORTAL_COOKIE};

use auth_gateway::{route_guard, GuardState, RouteGuard, SessionLocator};
use axum::{middleware::from_fn_with_state, Router};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Shared state of the portal handlers
#[derive(Clone)]
pub struct PortalState {
    pub registry: Arc<PortalRegistry>,
    pub guard: Arc<RouteGuard>,
    pub secure_cookies: bool,
    pub auth_base_url: Arc<str>,
    pub started_at: DateTime<Utc>,
}

impl PortalState {
    pub fn new(config: &PortalConfig, registry: Arc<PortalRegistry>) -> Self {
        Self {
            registry,
            guard: Arc::new(RouteGuard::new(config.guard.clone())),
            secure_cookies: config.server.secure_cookies,
            auth_base_url: Arc::from(config.auth.base_url.as_str()),
            started_at: Utc::now(),
        }
    }

    /// State whose portal sessions talk to the configured authentication service
    pub fn from_config(config: &PortalConfig) -> Self {
        let registry = PortalRegistry::http(&config.auth, config.session.clone());
        Self::new(config, Arc::new(registry))
    }

    pub fn guard_state(&self) -> GuardState {
        let sessions: Arc<dyn SessionLocator> = self.registry.clone();
        GuardState {
            guard: Arc::clone(&self.guard),
            sessions,
        }
    }
}

/// Create the main application router with all routes and middleware
pub fn create_app(state: PortalState, server: &ServerConfig) -> Router {
    routes::create_routes()
        .layer(from_fn_with_state(state.guard_state(), route_guard))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer(server)),
        )
        .with_state(state)
}
