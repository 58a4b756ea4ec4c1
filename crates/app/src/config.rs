//! Application configuration
//!
//! Read from `stayspot.toml` in the platform config directory. Every field
//! is optional; a missing file means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use stayspot_core::{Error, Result};
use stayspot_net::DEFAULT_API_URL;
use tracing::debug;

use crate::viewmodel::SyncConfig;

pub const CONFIG_FILE: &str = "stayspot.toml";

/// Overrides `api_base_url`
pub const API_URL_ENV: &str = "STAYSPOT_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Where the session database lives; platform data dir when unset
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            poll_interval_secs: 10,
            request_timeout_secs: 8,
            data_dir: None,
        }
    }
}

impl AppConfig {
    /// Load from the platform config dir, then apply the environment
    pub fn load() -> Result<Self> {
        let path = project_dirs()?.config_dir().join(CONFIG_FILE);
        let mut config = Self::load_from(&path)?;
        config.apply_env(std::env::var(API_URL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load one file; defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    fn apply_env(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(Error::Config("poll_interval_secs must be positive".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be positive".into()));
        }
        if self.request_timeout_secs > self.poll_interval_secs {
            return Err(Error::Config(format!(
                "request_timeout_secs ({}) must not exceed poll_interval_secs ({})",
                self.request_timeout_secs, self.poll_interval_secs
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::new(self.poll_interval(), self.request_timeout())
    }

    /// Directory for the session database
    pub fn data_path(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.data_dir().to_path_buf()),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "stayspot", "stayspot").ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine config directory",
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, "https://stayspot.onrender.com");
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.request_timeout(), Duration::from_secs(8));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml("poll_interval_secs = 20\n").unwrap();
        assert_eq!(config.poll_interval_secs, 20);
        assert_eq!(config.request_timeout_secs, 8);
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "api_base_url = \"http://localhost:5000\"\ndata_dir = \"/tmp/stayspot\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert_eq!(config.data_path().unwrap(), PathBuf::from("/tmp/stayspot"));
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        assert!(matches!(
            AppConfig::from_toml("poll_interval_secs = \"often\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_env_override() {
        let mut config = AppConfig::default();
        config.apply_env(Some("http://127.0.0.1:8080".into()));
        assert_eq!(config.api_base_url, "http://127.0.0.1:8080");

        config.apply_env(Some("  ".into()));
        assert_eq!(config.api_base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_validation() {
        let zero_interval = AppConfig {
            poll_interval_secs: 0,
            ..AppConfig::default()
        };
        assert!(zero_interval.validate().is_err());

        let zero_timeout = AppConfig {
            request_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert!(zero_timeout.validate().is_err());

        let slow = AppConfig {
            poll_interval_secs: 5,
            request_timeout_secs: 6,
            ..AppConfig::default()
        };
        assert!(matches!(slow.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_sync_config() {
        let sync = AppConfig::default().sync_config();
        assert_eq!(sync.poll_interval, Duration::from_secs(10));
        assert_eq!(sync.fetch_timeout, Duration::from_secs(8));
    }
}
