use clap::Parser;
use error_common::{PortalError, Result};
use std::path::PathBuf;
use surveillance_portal::{create_app, PortalConfig, PortalState};
use tracing::{info, warn};

/// Disease Surveillance Portal server
#[derive(Parser, Debug)]
#[command(name = "surveillance-portal")]
#[command(about = "Session-backed web front end of the disease-surveillance portal")]
struct Args {
    /// Configuration file path (default: surveillance-portal.toml, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server bind address
    #[arg(long)]
    host: Option<String>,

    /// Server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let dotenv = dotenvy::dotenv();

    let mut config = PortalConfig::load(args.config.as_deref())
        .map_err(|e| PortalError::ConfigError(e.to_string()))?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.verbose {
        config.logging.log_level = "debug".to_string();
    }
    if args.json_logs {
        config.logging.json = true;
    }

    logger_redacted::init(&config.logging)
        .map_err(|e| PortalError::ConfigError(e.to_string()))?;

    if let Err(error) = dotenv {
        if !error.not_found() {
            warn!(error = %error, "Failed to read .env file");
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Surveillance Portal");
    info!(
        auth_service = %config.auth.base_url,
        idle_timeout_minutes = config.session.idle_timeout_minutes,
        verify_interval_secs = config.session.verify_interval_secs,
        "Session settings"
    );

    let state = PortalState::from_config(&config);
    let pruner = state.registry.spawn_pruner(config.server.prune_interval());
    let app = create_app(state, &config.server);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PortalError::NetworkError(format!("Failed to bind to {addr}: {e}")))?;

    info!("Surveillance Portal running on http://{addr}");
    info!("Health check available at: http://{addr}/health");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| PortalError::ServerError(format!("HTTP server error: {e}")));

    pruner.abort();
    info!("Surveillance Portal stopped");
    result
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
