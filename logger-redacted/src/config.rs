// Logger configuration
use serde::{Deserialize, Serialize};

use crate::RedactionConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Default level when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,

    /// Mask credentials in every emitted line
    #[serde(default = "default_true")]
    pub redaction_enabled: bool,

    /// Replace emails with a stable hash instead of a partial mask
    #[serde(default = "default_true")]
    pub hash_for_correlation: bool,
}

fn default_log_level() -> String { "info".to_string() }
fn default_true() -> bool { true }

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
            redaction_enabled: true,
            hash_for_correlation: true,
        }
    }
}

impl LoggerConfig {
    pub fn redaction(&self) -> RedactionConfig {
        RedactionConfig {
            enabled: self.redaction_enabled,
            hash_for_correlation: self.hash_for_correlation,
            ..Default::default()
        }
    }

    /// Filter directive used when `RUST_LOG` is absent
    pub fn default_directive(&self) -> String {
        format!(
            "{level},tower_http=info,hyper=warn,reqwest=warn",
            level = self.log_level
        )
    }
}
