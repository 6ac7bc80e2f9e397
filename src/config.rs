use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::classify::DEFAULT_EMERGENCY_KEYWORDS;

/// Environment variable overriding `server.url`.
pub const API_URL_ENV: &str = "ALERT_RELAY_API_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub server: ServerConfig,
  #[serde(default)]
  pub offline: OfflineConfig,
  #[serde(default)]
  pub connectivity: ConnectivityConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  /// API base URL; endpoints are appended to it
  #[serde(default = "default_url")]
  pub url: String,
  /// Per-request transport timeout
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      url: default_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

fn default_url() -> String {
  "http://127.0.0.1:8000".to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfflineConfig {
  /// Endpoint substrings that mark a write as emergency-class
  #[serde(default = "default_keywords")]
  pub emergency_keywords: Vec<String>,
  /// Keep entries that failed to sync instead of dropping them after a drain
  #[serde(default)]
  pub retain_failed_entries: bool,
  /// Store successful reads for offline use
  #[serde(default = "default_true")]
  pub cache_enabled: bool,
  /// Database path (defaults to $XDG_DATA_HOME/alert-relay/offline.db)
  pub database: Option<PathBuf>,
}

impl Default for OfflineConfig {
  fn default() -> Self {
    Self {
      emergency_keywords: default_keywords(),
      retain_failed_entries: false,
      cache_enabled: true,
      database: None,
    }
  }
}

fn default_keywords() -> Vec<String> {
  DEFAULT_EMERGENCY_KEYWORDS
    .iter()
    .map(|k| k.to_string())
    .collect()
}

fn default_true() -> bool {
  true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectivityConfig {
  #[serde(default = "default_probe_interval_secs")]
  pub probe_interval_secs: u64,
  #[serde(default = "default_probe_timeout_ms")]
  pub probe_timeout_ms: u64,
}

impl Default for ConnectivityConfig {
  fn default() -> Self {
    Self {
      probe_interval_secs: default_probe_interval_secs(),
      probe_timeout_ms: default_probe_timeout_ms(),
    }
  }
}

fn default_probe_interval_secs() -> u64 {
  5
}

fn default_probe_timeout_ms() -> u64 {
  2000
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
  /// Also write logs to this file
  pub file: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./alert-relay.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/alert-relay/config.yaml
  ///
  /// Falls back to defaults when no file is found. `ALERT_RELAY_API_URL`
  /// overrides the server URL either way.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(url) = std::env::var(API_URL_ENV) {
      config.server.url = url;
    }

    config.base_url()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("alert-relay.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("alert-relay").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  /// The parsed API base URL.
  pub fn base_url(&self) -> Result<Url> {
    Url::parse(&self.server.url)
      .map_err(|e| eyre!("Invalid server url '{}': {}", self.server.url, e))
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.server.timeout_secs)
  }

  pub fn probe_interval(&self) -> Duration {
    Duration::from_secs(self.connectivity.probe_interval_secs.max(1))
  }

  pub fn probe_timeout(&self) -> Duration {
    Duration::from_millis(self.connectivity.probe_timeout_ms)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_yaml_uses_defaults() {
    let config = Config::from_yaml("{}").unwrap();
    assert_eq!(config.server.url, "http://127.0.0.1:8000");
    assert_eq!(config.offline.emergency_keywords, vec!["accident", "emergency"]);
    assert!(!config.offline.retain_failed_entries);
    assert!(config.offline.cache_enabled);
    assert_eq!(config.probe_interval(), Duration::from_secs(5));
  }

  #[test]
  fn test_partial_yaml() {
    let config = Config::from_yaml(
      r#"
server:
  url: https://alerts.example.org/api
offline:
  emergency_keywords: [sos, accident]
  retain_failed_entries: true
logging:
  file: /tmp/alert-relay.log
"#,
    )
    .unwrap();

    assert_eq!(config.base_url().unwrap().host_str(), Some("alerts.example.org"));
    assert_eq!(config.offline.emergency_keywords, vec!["sos", "accident"]);
    assert!(config.offline.retain_failed_entries);
    assert!(config.offline.cache_enabled);
    assert_eq!(config.server.timeout_secs, 30);
    assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/alert-relay.log")));
  }

  #[test]
  fn test_invalid_url_is_rejected() {
    let mut config = Config::default();
    config.server.url = "not a url".to_string();
    assert!(config.base_url().is_err());
  }

  #[test]
  fn test_missing_explicit_path() {
    assert!(Config::load(Some(Path::new("/nonexistent/alert-relay.yaml"))).is_err());
  }

  #[test]
  fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "connectivity:\n  probe_timeout_ms: 500\n").unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.probe_timeout(), Duration::from_millis(500));
  }
}
