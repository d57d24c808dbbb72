//! Configuration management for thumbvault.
//!
//! Configuration is loaded from a TOML file in the platform config directory
//! with sensible defaults. All config structs implement `Default`.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `store.database`.
pub const DATABASE_ENV: &str = "THUMBVAULT_DATABASE";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker pool settings
    pub pipeline: PipelineConfig,

    /// Thumbnail settings
    pub resize: ResizeConfig,

    /// HTTP settings
    pub fetch: FetchConfig,

    /// Database settings
    pub store: StoreConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist. Environment
    /// overrides are applied in both cases.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Falls back to ~/.thumbvault/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "thumbvault", "thumbvault")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".thumbvault").join("config.toml")
            })
    }

    /// Apply `THUMBVAULT_DATABASE` if set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(database) = std::env::var(DATABASE_ENV) {
            if !database.trim().is_empty() {
                tracing::debug!("Using database from {DATABASE_ENV}: {database}");
                self.store.database = PathBuf::from(database);
            }
        }
    }

    /// Resolved raw download directory (with ~ expansion).
    pub fn work_dir(&self) -> PathBuf {
        expand(&self.pipeline.work_dir)
    }

    /// Resolved thumbnail output directory (with ~ expansion).
    pub fn output_dir(&self) -> PathBuf {
        expand(&self.pipeline.output_dir)
    }

    /// Resolved database path (with ~ expansion).
    pub fn database_path(&self) -> PathBuf {
        expand(&self.store.database)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pipeline.parallelism, 5);
        assert_eq!(config.resize.width, 100);
        assert_eq!(config.resize.height, 100);
        assert!(config.pipeline.cleanup_raw);
        assert!(config.fetch.timeout_ms.is_none());
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[pipeline]"));
        assert!(toml.contains("[resize]"));
        assert!(toml.contains("[store]"));
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pipeline]\nparallelism = 2\n\n[resize]\nwidth = 64\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.pipeline.parallelism, 2);
        assert_eq!(config.resize.width, 64);
        assert_eq!(config.resize.height, 100);
        assert_eq!(config.store.pool_size, 8);
    }

    #[test]
    fn test_load_rejects_negative_parallelism() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pipeline]\nparallelism = -1\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_rejects_zero_parallelism() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pipeline]\nparallelism = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("parallelism"));
    }

    #[test]
    fn test_tilde_expansion() {
        let mut config = Config::default();
        config.pipeline.work_dir = PathBuf::from("~/thumbs/raw");
        let resolved = config.work_dir();
        assert!(resolved.ends_with("thumbs/raw"));
    }
}
