//! Configuration management for ghload

pub mod schema;

pub use schema::Config;

use crate::error::{LoaderError, LoaderResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ghload")
            .join("config.toml")
    }

    /// Get the default script cache directory
    pub fn default_cache_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ghload")
            .join("cache")
    }

    /// Cache directory honoring the `[cache] dir` override
    pub fn cache_dir(config: &Config) -> PathBuf {
        config
            .cache
            .dir
            .clone()
            .unwrap_or_else(Self::default_cache_dir)
    }

    /// Load configuration, falling back to defaults if the file is absent
    pub async fn load(&self) -> LoaderResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> LoaderResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| LoaderError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| LoaderError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> LoaderResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            LoaderError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    async fn ensure_config_dir(&self) -> LoaderResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| LoaderError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.executor.interpreter, "node");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.source.owner = Some("acme".to_string());

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.source.owner.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn invalid_toml_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[source\nowner = 1").unwrap();

        let err = ConfigManager::with_path(path.clone()).load().await.unwrap_err();
        assert!(matches!(err, LoaderError::ConfigFile { path: p, .. } if p == path));
    }

    #[test]
    fn cache_dir_override() {
        let mut config = Config::default();
        config.cache.dir = Some(PathBuf::from("/tmp/ghload-test"));
        assert_eq!(
            ConfigManager::cache_dir(&config),
            PathBuf::from("/tmp/ghload-test")
        );
    }
}
