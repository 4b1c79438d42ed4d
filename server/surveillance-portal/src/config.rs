use ::config::{Config, Environment, File};
use auth_gateway::{matches_prefix, GuardConfig};
use auth_identity::AuthServiceConfig;
use auth_session::SessionConfig;
use error_common::{Classified, FailureKind};
use logger_redacted::LoggerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "surveillance-portal.toml";

/// Prefix of environment overrides, e.g. `SURVEILLANCE__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "SURVEILLANCE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl Classified for ConfigError {
    fn kind(&self) -> FailureKind {
        FailureKind::Configuration
    }
}

/// Complete portal configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PortalConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Authentication service client
    #[serde(default)]
    pub auth: AuthServiceConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub guard: GuardConfig,

    #[serde(default)]
    pub logging: LoggerConfig,
}

/// HTTP listener and portal session settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Mark the portal session cookie `Secure` (default: false for local use)
    #[serde(default)]
    pub secure_cookies: bool,

    /// Seconds between sweeps of logged-out and idle portal sessions (default: 60)
    #[serde(default = "default_prune_interval")]
    pub prune_interval_secs: u64,

    /// Origins allowed to call the JSON endpoints with credentials
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_prune_interval() -> u64 { 60 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            secure_cookies: false,
            prune_interval_secs: default_prune_interval(),
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn prune_interval(&self) -> Duration {
        Duration::from_secs(self.prune_interval_secs.max(1))
    }
}

impl PortalConfig {
    /// Load the file (when present) and apply environment overrides.
    ///
    /// An explicitly given file must exist; the default file is optional.
    ///
    /// # Errors
    ///
    /// Unreadable or undeserializable sources, or a configuration that fails
    /// [`PortalConfig::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: PortalConfig = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would lock users out or loop redirects.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let guard = &self.guard;

        for (name, path) in [
            ("guard.login_path", &guard.login_path),
            ("guard.unauthorized_path", &guard.unauthorized_path),
            ("guard.logout_path", &guard.logout_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!("{name} must start with '/': {path}")));
            }
        }

        if !guard.guest_only.iter().any(|p| p == &guard.login_path) {
            return Err(ConfigError::Invalid(format!(
                "guard.login_path {} must be listed in guard.guest_only",
                guard.login_path
            )));
        }

        // Both must stay reachable without a live session
        for (name, path) in [
            ("guard.unauthorized_path", &guard.unauthorized_path),
            ("guard.logout_path", &guard.logout_path),
        ] {
            let public = guard.public_paths.iter().any(|p| p == path)
                || guard.public_prefixes.iter().any(|prefix| matches_prefix(path, prefix));
            if !public {
                return Err(ConfigError::Invalid(format!("{name} {path} must be public")));
            }
        }

        if self.session.idle_timeout_minutes == 0 {
            return Err(ConfigError::Invalid(
                "session.idle_timeout_minutes must be positive".to_string(),
            ));
        }

        if self.auth.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.base_url is required".to_string()));
        }

        Ok(())
    }
}
