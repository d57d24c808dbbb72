//! Configuration validation with range checks.

use crate::codec::ResizeFilter;
use crate::error::ConfigError;

use super::{Config, LoggingConfig, PipelineConfig, ResizeConfig};

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pipeline.validate()?;
        self.resize.validate()?;
        if self.fetch.max_download_mb == 0 {
            return Err(ConfigError::ValidationError(
                "fetch.max_download_mb must be > 0".into(),
            ));
        }
        if self.store.pool_size == 0 {
            return Err(ConfigError::ValidationError(
                "store.pool_size must be > 0".into(),
            ));
        }
        self.logging.validate()?;
        Ok(())
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        const LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];
        if !LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level '{}' is not one of {}",
                self.level,
                LEVELS.join(", ")
            )));
        }
        if !matches!(self.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "logging.format '{}' must be \"pretty\" or \"json\"",
                self.format
            )));
        }
        Ok(())
    }
}

impl PipelineConfig {
    /// Checks the worker pool settings; the dispatcher calls this before
    /// creating its queue.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parallelism == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.parallelism must be > 0".into(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.queue_capacity must be > 0".into(),
            ));
        }
        Ok(())
    }
}

impl ResizeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ValidationError(format!(
                "resize.width and resize.height must be > 0 (got {}x{})",
                self.width, self.height
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::ValidationError(
                "resize.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        self.filter.parse::<ResizeFilter>()?;
        Ok(())
    }
}
