use serde::{Deserialize, Serialize};

use super::defaults;

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter used when the env var is unset.
    pub log_level: String,
    /// Env var read for the filter directive.
    pub log_env_var: String,
    /// Emit JSON lines instead of the human-readable format.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::DEFAULT_LOG_LEVEL.to_string(),
            log_env_var: defaults::DEFAULT_LOG_ENV_VAR.to_string(),
            json: true,
        }
    }
}
