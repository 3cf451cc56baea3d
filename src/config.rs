use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.thecatapi.com/v1";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Breeds per page for `list` when --limit is not given
  #[serde(default = "default_page_size")]
  pub page_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// Per-request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api: ApiConfig::default(),
      cache: CacheConfig::default(),
      page_size: default_page_size(),
    }
  }
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// Cache database location (defaults to the user data directory)
  pub path: Option<PathBuf>,
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
  15
}

fn default_page_size() -> u32 {
  10
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./cats.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/cats/config.yaml
  ///
  /// Without any file the defaults are used.
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
    let local = PathBuf::from("cats.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("cats").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file deserializes as null
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    let config: Config = serde_yaml::from_str(contents)?;
    if config.page_size == 0 {
      return Err(eyre!("page_size must be at least 1"));
    }
    Ok(config)
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.api.timeout_secs)
  }

  /// Directory for the cache database and log file.
  pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("cats"))
  }

  pub fn cache_path(&self) -> Result<PathBuf> {
    match &self.cache.path {
      Some(path) => Ok(path.clone()),
      None => Ok(Self::data_dir()?.join("cache.db")),
    }
  }

  /// Get the catalog API key from the environment, if any.
  ///
  /// The public catalog works without a key, with stricter rate limits.
  /// Directory for the log file: next to a configured cache, else the data dir.
  ///
  /// None when neither is known; callers log to stderr instead.
  pub fn log_dir(&self) -> Option<PathBuf> {
    self
      .cache
      .path
      .as_deref()
      .and_then(Path::parent)
      .filter(|dir| !dir.as_os_str().is_empty())
      .map(Path::to_path_buf)
      .or_else(|| Self::data_dir().ok())
  }

  pub fn get_api_key() -> Option<String> {
    std::env::var("CATS_API_KEY")
      .ok()
      .filter(|key| !key.trim().is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.api.timeout_secs, 15);
    assert_eq!(config.page_size, 10);
    assert!(config.cache.path.is_none());
  }

  #[test]
  fn test_partial_config() {
    let config = Config::parse(
      "api:\n  base_url: http://localhost:8080/v1\ncache:\n  path: /tmp/cats.db\n",
    )
    .unwrap();
    assert_eq!(config.api.base_url, "http://localhost:8080/v1");
    assert_eq!(config.api.timeout_secs, 15);
    assert_eq!(config.page_size, 10);
    assert_eq!(config.cache_path().unwrap(), PathBuf::from("/tmp/cats.db"));
    assert_eq!(config.timeout(), Duration::from_secs(15));
  }

  #[test]
  fn test_log_dir_follows_configured_cache() {
    let config = Config::parse("cache:\n  path: /tmp/cats-test/cache.db\n").unwrap();
    assert_eq!(config.log_dir(), Some(PathBuf::from("/tmp/cats-test")));

    // A bare file name has no directory of its own.
    let config = Config::parse("cache:\n  path: cache.db\n").unwrap();
    assert_eq!(config.log_dir(), Config::data_dir().ok());
  }

  #[test]
  fn test_zero_page_size_rejected() {
    assert!(Config::parse("page_size: 0\n").is_err());
  }

  #[test]
  fn test_missing_explicit_path_is_error() {
    assert!(Config::load(Some(Path::new("/nonexistent/cats.yaml"))).is_err());
  }
}
