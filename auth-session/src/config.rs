use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Fixed storage key of the session cache entry
pub const SESSION_CACHE_KEY: &str = "surveillance.session";

/// Session lifecycle configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Minimum seconds between two verifications (default: 300 = 5 minutes)
    #[serde(default = "default_verify_interval")]
    pub verify_interval_secs: u64,

    /// Silent refresh period in seconds (default: 300 = 5 minutes)
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Activity pings closer together than this are coalesced (default: 60)
    #[serde(default = "default_activity_coalesce")]
    pub activity_coalesce_secs: u64,

    /// Idle timeout in minutes (default: 15 minutes)
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_minutes: u64,

    /// Session cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Session cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Storage key of the single cache entry
    #[serde(default = "default_cache_key")]
    pub key: String,

    /// Entries older than this are discarded unread (default: 24 hours)
    #[serde(default = "default_cache_max_age")]
    pub max_age_hours: u64,

    /// Directory for file-backed caches; in-memory when absent
    pub directory: Option<PathBuf>,
}

fn default_verify_interval() -> u64 { 300 }
fn default_refresh_interval() -> u64 { 300 }
fn default_activity_coalesce() -> u64 { 60 }
fn default_idle_timeout() -> u64 { 15 }
fn default_cache_key() -> String { SESSION_CACHE_KEY.to_string() }
fn default_cache_max_age() -> u64 { 24 }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            verify_interval_secs: default_verify_interval(),
            refresh_interval_secs: default_refresh_interval(),
            activity_coalesce_secs: default_activity_coalesce(),
            idle_timeout_minutes: default_idle_timeout(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key: default_cache_key(),
            max_age_hours: default_cache_max_age(),
            directory: None,
        }
    }
}

impl SessionConfig {
    pub fn verify_interval(&self) -> Duration {
        Duration::from_secs(self.verify_interval_secs)
    }

    /// Never zero; a zero period would spin the refresh task
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn activity_coalesce(&self) -> Duration {
        Duration::from_secs(self.activity_coalesce_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_minutes.saturating_mul(60))
    }
}

impl CacheConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_hours.saturating_mul(3600))
    }
}
