use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Backing file name used when no path is configured
pub const DEFAULT_DB_FILE: &str = ".db.json";

/// Log configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LogConfig {
  /// Log file path, if not set, logs will be printed to stderr
  pub file: Option<String>,
  /// Log level, default is "info"
  #[serde(default = "default_log_level")]
  pub level: String,
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      file: None,
      level: default_log_level(),
    }
  }
}

/// What `update` does when the id is not stored
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePolicy {
  /// Store the patch as a new record under that id
  #[default]
  Upsert,
  /// Fail with `NotFound` and leave the store untouched
  Reject,
}

/// ShelfDB configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
  /// Backing JSON file
  #[serde(default = "default_db_path")]
  pub db_path: PathBuf,

  /// Handling of updates to unknown ids
  #[serde(default)]
  pub update_policy: UpdatePolicy,

  /// Log configuration
  #[serde(default)]
  pub log: LogConfig,
}

/// `.db.json` next to the running executable, or in the working directory
/// when the executable location is unknown.
pub fn default_db_path() -> PathBuf {
  std::env::current_exe()
    .ok()
    .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_DB_FILE)))
    .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
}

impl Default for Config {
  fn default() -> Self {
    Self {
      db_path: default_db_path(),
      update_policy: UpdatePolicy::default(),
      log: LogConfig::default(),
    }
  }
}

/// Errors loading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read config file '{path}': {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to parse config file '{path}': {source}")]
  Parse {
    path: String,
    #[source]
    source: toml::de::Error,
  },
}

impl Config {
  /// Config for a given backing file, everything else default
  pub fn with_db_path(db_path: impl Into<PathBuf>) -> Self {
    Self {
      db_path: db_path.into(),
      ..Self::default()
    }
  }

  /// Load configuration from TOML file
  pub fn from_file(path: &str) -> Result<Self, ConfigError> {
    let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_string(),
      source,
    })?;

    toml::from_str(&config_str).map_err(|source| ConfigError::Parse {
      path: path.to_string(),
      source,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_config() {
    let config = Config::default();
    assert!(config.db_path.ends_with(DEFAULT_DB_FILE));
    assert_eq!(config.update_policy, UpdatePolicy::Upsert);
    assert_eq!(config.log, LogConfig::default());
  }

  #[test]
  fn test_parse_config() {
    let config_str = r#"
db_path = "/tmp/shelfdb/.db.json"
update_policy = "reject"

[log]
level = "debug"
file = "/tmp/shelfdb/shelfdb.log"
"#;

    let config: Config = toml::from_str(config_str).unwrap();
    assert_eq!(config.db_path, PathBuf::from("/tmp/shelfdb/.db.json"));
    assert_eq!(config.update_policy, UpdatePolicy::Reject);
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.log.file.as_deref(), Some("/tmp/shelfdb/shelfdb.log"));
  }

  #[test]
  fn test_parse_empty_config_uses_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.db_path, default_db_path());
    assert_eq!(config.update_policy, UpdatePolicy::Upsert);
    assert_eq!(config.log.level, "info");
    assert!(config.log.file.is_none());
  }

  #[test]
  fn test_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shelfdb.toml");
    fs::write(&path, "update_policy = \"reject\"\n").unwrap();

    let config = Config::from_file(path.to_str().unwrap()).unwrap();
    assert_eq!(config.update_policy, UpdatePolicy::Reject);
  }

  #[test]
  fn test_from_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.toml");
    assert!(matches!(
      Config::from_file(missing.to_str().unwrap()),
      Err(ConfigError::Read { .. })
    ));

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "update_policy = \"sometimes\"\n").unwrap();
    assert!(matches!(
      Config::from_file(bad.to_str().unwrap()),
      Err(ConfigError::Parse { .. })
    ));
  }
}
