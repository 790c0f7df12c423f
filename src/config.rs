use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "currency-cache";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub cache: CacheConfig,
  pub shell: ShellConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Base URL of the converter API; `/currencies` and `/convert` hang off it
  pub base_url: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "https://free.currencyconverterapi.com/api/v5".to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Set to false to run without a local cache
  pub enabled: bool,
  /// Database file (defaults to the user data directory)
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
  /// Origin the page assets are served from
  pub origin: String,
  /// Bucket name prefix, e.g. "BrightsCurrencyConverter"
  pub app_id: String,
  /// Bump to roll out a new set of assets
  pub version: u32,
  /// Paths cached on install, relative to the origin
  pub assets: Vec<String>,
  /// Asset database file (defaults to the user data directory)
  pub path: Option<PathBuf>,
}

impl Default for ShellConfig {
  fn default() -> Self {
    Self {
      origin: "http://localhost:8080".to_string(),
      app_id: "BrightsCurrencyConverter".to_string(),
      version: 4,
      assets: vec![
        "/".to_string(),
        "/index.html".to_string(),
        "/assets/js/appcontroller.js".to_string(),
        "/assets/css/ux.css".to_string(),
      ],
      path: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./currency-cache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/currency-cache/config.yaml
  ///
  /// With no file found, defaults are used.
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

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from(format!("{}.yaml", APP_DIR));
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join(APP_DIR).join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file is a valid "all defaults" config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Directory for the cache databases and the log file.
  pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .map(|d| d.join(APP_DIR))
  }

  /// Rate/currency cache location, or `None` when caching is off or there is
  /// nowhere to put it.
  pub fn cache_path(&self) -> Option<PathBuf> {
    if !self.cache.enabled {
      return None;
    }
    self
      .cache
      .path
      .clone()
      .or_else(|| Self::data_dir().map(|d| d.join("cache.db")))
  }

  /// Asset cache location.
  pub fn shell_path(&self) -> Option<PathBuf> {
    self
      .shell
      .path
      .clone()
      .or_else(|| Self::data_dir().map(|d| d.join("assets.db")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(
      config.api.base_url,
      "https://free.currencyconverterapi.com/api/v5"
    );
    assert!(config.cache.enabled);
    assert_eq!(config.shell.version, 4);
    assert_eq!(config.shell.assets.len(), 4);
  }

  #[test]
  fn test_partial_config() {
    let yaml = r#"
api:
  base_url: http://rates.internal/api
shell:
  version: 7
"#;
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.api.base_url, "http://rates.internal/api");
    assert_eq!(config.shell.version, 7);
    assert_eq!(config.shell.app_id, "BrightsCurrencyConverter");
  }

  #[test]
  fn test_disabled_cache_has_no_path() {
    let config = Config::parse("cache:\n  enabled: false\n  path: /tmp/x.db\n").unwrap();
    assert!(config.cache_path().is_none());
  }

  #[test]
  fn test_explicit_cache_path() {
    let config = Config::parse("cache:\n  path: /tmp/x.db\n").unwrap();
    assert_eq!(config.cache_path(), Some(PathBuf::from("/tmp/x.db")));
  }

  #[test]
  fn test_missing_explicit_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(Some(&dir.path().join("nope.yaml"))).is_err());
  }

  #[test]
  fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "shell:\n  origin: https://fx.example.com\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.shell.origin, "https://fx.example.com");
  }
}
