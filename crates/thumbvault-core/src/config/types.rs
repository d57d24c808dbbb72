//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Worker pool and working-directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of concurrent pipeline workers
    pub parallelism: usize,

    /// Max work items buffered in the queue before the producer waits
    pub queue_capacity: usize,

    /// Directory raw downloads are written to
    pub work_dir: PathBuf,

    /// Directory resized thumbnails are written to before being stored
    pub output_dir: PathBuf,

    /// Remove the raw download once its item has finished
    pub cleanup_raw: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallelism: 5,
            queue_capacity: 100,
            work_dir: PathBuf::from("./images"),
            output_dir: PathBuf::from("./resized_images"),
            cleanup_raw: true,
        }
    }
}

/// Thumbnail geometry and encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    /// Target width in pixels (taken literally, aspect ratio is not kept)
    pub width: u32,

    /// Target height in pixels
    pub height: u32,

    /// Resampling filter: "lanczos3" or "catmullrom"
    pub filter: String,

    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            filter: "lanczos3".to_string(),
            jpeg_quality: 75,
        }
    }
}

/// HTTP fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Largest response body accepted, in megabytes
    pub max_download_mb: u64,

    /// Whole-request timeout in milliseconds. Unset means no timeout.
    pub timeout_ms: Option<u64>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("thumbvault/{}", env!("CARGO_PKG_VERSION")),
            max_download_mb: 50,
            timeout_ms: None,
        }
    }
}

/// Relational store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file
    pub database: PathBuf,

    /// Max pooled connections shared by the workers
    pub pool_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("thumbvault.db"),
            pool_size: 8,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: off, error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
