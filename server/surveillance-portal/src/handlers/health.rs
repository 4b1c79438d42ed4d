use crate::registry::RegistryStats;
use crate::PortalState;
use axum::{extract::State, response::Json};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
}

/// System status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub server_name: String,
    pub version: String,
    pub uptime_seconds: i64,
    pub auth_service: String,
    pub portal_sessions: RegistryStats,
}

/// Health check handler
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// System status handler
pub async fn system_status(State(state): State<PortalState>) -> Json<StatusResponse> {
    let uptime = chrono::Utc::now().signed_duration_since(state.started_at);

    Json(StatusResponse {
        server_name: "Surveillance Portal".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime.num_seconds().max(0),
        auth_service: state.auth_base_url.to_string(),
        portal_sessions: state.registry.stats(),
    })
}
