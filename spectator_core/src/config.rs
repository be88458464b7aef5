//! Spectator configuration.
//!
//! Loaded from a JSON file when one is given, otherwise from the builtin
//! `data/spectator_config.json`. Every section falls back to its defaults field by field.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BUILTIN_SPECTATOR_CONFIG: &str = include_str!("data/spectator_config.json");

/// Root configuration for the spectator client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectatorConfig {
    pub server: ServerConfig,
    pub sync: SyncConfig,
    pub display: DisplayConfig,
}

impl SpectatorConfig {
    pub fn builtin() -> Result<Self, ConfigError> {
        Ok(Self::from_json_str(BUILTIN_SPECTATOR_CONFIG)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = SpectatorConfig::from_json_str(&contents)?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.server.base_url = base_url.into();
        self
    }
}

/// Where the game server lives and how long a single request may take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout_ms: 2_000,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub poll_interval_ms: u64,
    /// Fetch `/state` once at start-up so the board shows before the first update.
    pub prime_on_start: bool,
    /// Drop completions that were requested before the snapshot already applied.
    pub discard_stale: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            prime_on_start: true,
            discard_stale: false,
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub frame_interval_ms: u64,
    pub max_logs: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 100,
            max_logs: 8,
        }
    }
}

impl DisplayConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse spectator config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read spectator config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Builtin,
    Defaults,
}

/// Load configuration from `path`, falling back to the builtin file and then to defaults.
pub fn load_config(path: Option<&Path>) -> (SpectatorConfig, ConfigSource) {
    if let Some(path) = path {
        match SpectatorConfig::from_file(path) {
            Ok(config) => {
                tracing::info!(
                    target: "beast_spectator::config",
                    path = %path.display(),
                    "spectator_config.loaded=file"
                );
                return (config, ConfigSource::File(path.to_path_buf()));
            }
            Err(err) => {
                tracing::warn!(
                    target: "beast_spectator::config",
                    path = %path.display(),
                    error = %err,
                    "spectator_config.load_failed"
                );
            }
        }
    }

    match SpectatorConfig::builtin() {
        Ok(config) => {
            tracing::info!(
                target: "beast_spectator::config",
                "spectator_config.loaded=builtin"
            );
            (config, ConfigSource::Builtin)
        }
        Err(err) => {
            tracing::warn!(
                target: "beast_spectator::config",
                error = %err,
                "spectator_config.builtin_invalid"
            );
            (SpectatorConfig::default(), ConfigSource::Defaults)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_matches_defaults() {
        let config = SpectatorConfig::builtin().expect("builtin config should parse");
        assert_eq!(config, SpectatorConfig::default());
        assert_eq!(config.sync.poll_interval(), Duration::from_millis(500));
        assert!(!config.sync.discard_stale);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config =
            SpectatorConfig::from_json_str(r#"{"sync": {"discard_stale": true}}"#).unwrap();
        assert!(config.sync.discard_stale);
        assert_eq!(config.sync.poll_interval_ms, 500);
        assert_eq!(config.server.base_url, "http://localhost:5000");
        assert_eq!(config.display.max_logs, 8);
    }

    #[test]
    fn zero_intervals_are_clamped() {
        let config = SpectatorConfig::from_json_str(
            r#"{"sync": {"poll_interval_ms": 0}, "display": {"frame_interval_ms": 0}}"#,
        )
        .unwrap();
        assert_eq!(config.sync.poll_interval(), Duration::from_millis(1));
        assert_eq!(config.display.frame_interval(), Duration::from_millis(1));
    }

    #[test]
    fn missing_file_falls_back_to_builtin() {
        let (config, source) = load_config(Some(Path::new("/nonexistent/spectator.json")));
        assert_eq!(source, ConfigSource::Builtin);
        assert_eq!(config, SpectatorConfig::default());
    }

    #[test]
    fn base_url_override() {
        let config = SpectatorConfig::default().with_base_url("http://10.0.0.2:5000");
        assert_eq!(config.server.base_url, "http://10.0.0.2:5000");
    }
}
