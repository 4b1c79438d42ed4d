//! Placeholder pages
//!
//! The guard has already decided access by the time these run; they only
//! acknowledge the page and who is looking at it.

use crate::routes::paths;
use crate::PortalState;
use auth_gateway::CurrentIdentity;
use axum::{
    extract::{Path, State},
    http::Uri,
    response::Redirect,
};

/// The site root sends everyone to their role's landing page
pub async fn home(State(state): State<PortalState>, CurrentIdentity(identity): CurrentIdentity) -> Redirect {
    Redirect::to(state.guard.config().landing.for_role(identity.role_id))
}

pub async fn page(uri: Uri, CurrentIdentity(identity): CurrentIdentity) -> String {
    format!("{} - {}", paths::pages::title(uri.path()), identity.display_name())
}

pub async fn hospital(Path(code): Path<String>, CurrentIdentity(identity): CurrentIdentity) -> String {
    format!("Hospital {code} - {}", identity.display_name())
}
