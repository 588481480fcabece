//! Binary configuration: a TOML file wrapping the engine configuration,
//! overlaid with operator settings persisted in the record store.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shutterpost_delivery::EngineConfig;
use shutterpost_store::AutomationSettings;
use tracing::info;

/// Top-level configuration file shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Load the configuration file, falling back to defaults when no file
    /// exists anywhere in the search path.
    ///
    /// # Errors
    /// Fails if `SHUTTERPOST_CONFIG` points at a missing file, or if a
    /// found file cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        let Some(path) = find_config_file()? else {
            info!("No configuration file found, using defaults");
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config from {}: {e}", path.display())
        })?;
        let config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Overlay the store-persisted operator settings onto the file config.
    ///
    /// Settings rows win over the file for the values an operator can tune
    /// at runtime; the file keeps the rest (cycle interval, backoff
    /// schedule, cleanup hour).
    pub fn apply_settings(&mut self, settings: &AutomationSettings) {
        self.engine.automation.max_attempts = settings.retry_attempts;
        self.engine.automation.rate_limit_per_minute = settings.rate_limit_per_minute;
        self.engine.maintenance.log_retention_days = settings.log_retention_days;
    }
}

/// Find the configuration file using the following precedence:
/// 1. `SHUTTERPOST_CONFIG` environment variable
/// 2. ./shutterpost.toml (current working directory)
/// 3. /etc/shutterpost/shutterpost.toml (system-wide config)
fn find_config_file() -> anyhow::Result<Option<PathBuf>> {
    if let Ok(env_path) = std::env::var("SHUTTERPOST_CONFIG") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(Some(path));
        }
        anyhow::bail!(
            "SHUTTERPOST_CONFIG points to non-existent file: {}",
            path.display()
        );
    }

    let default_paths = [
        PathBuf::from("./shutterpost.toml"),
        PathBuf::from("/etc/shutterpost/shutterpost.toml"),
    ];

    Ok(default_paths.into_iter().find(|path| path.exists()))
}
