//! Route guard for the surveillance portal
//!
//! Every request passes the guard before any protected handler:
//!
//! - Public paths (health, static assets, the unauthorized page) pass untouched
//! - Anonymous requests to protected paths are redirected to the login page,
//!   preserving where they were going
//! - Authenticated users on guest-only pages go to their role's landing page
//! - Paths with elevated rules (capability, user management, hospital scope)
//!   redirect to the unauthorized page when the rule denies
//!
//! # Example
//!
//! ```rust,ignore
//! use auth_gateway::{route_guard, GuardConfig, GuardState, RouteGuard};
//! use axum::{middleware, routing::get, Router};
//!
//! let state = GuardState::new(RouteGuard::new(GuardConfig::default()), sessions);
//! let app = Router::new()
//!     .route("/patients", get(patients))
//!     .layer(middleware::from_fn_with_state(state, route_guard));
//! ```

pub mod config;
pub mod error;
pub mod guard;
pub mod middleware;

pub use config::*;
pub use error::*;
pub use guard::*;
pub use middleware::*;
