//! Error types for the thumbvault pipeline.
//!
//! Per-item errors (`PipelineError`) carry the URL, path, or name of the item
//! they belong to so a single log line is enough to diagnose a failure.
//! Everything else is a precondition error and aborts the whole run.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for thumbvault operations.
#[derive(Error, Debug)]
pub enum ThumbvaultError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Store could not be opened or initialized
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A run precondition failed (e.g. working directory not creatable)
    #[error("Cannot create {path}: {source}")]
    Precondition {
        path: PathBuf,
        source: std::io::Error,
    },

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON deserialization errors (search input files)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Per-item pipeline errors, organized by what went wrong.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Network or HTTP failure while fetching the source image
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Creating, writing, reading or deleting a file failed
    #[error("Filesystem error at {path}: {message}")]
    Filesystem { path: PathBuf, message: String },

    /// The downloaded bytes are not a decodable image
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Resizing or re-encoding failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Persisting the thumbnail failed
    #[error("Store error for {name}: {source}")]
    Store { name: String, source: StoreError },
}

impl PipelineError {
    /// Build a `Filesystem` error from an I/O error at `path`.
    pub fn filesystem(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Errors raised by the relational store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Could not build the pool or check out a connection
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// SQL execution failed
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The blocking task running the statement did not complete
    #[error("Store task failed: {0}")]
    Task(String),
}

/// Errors raised by the image codec.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Bytes could not be decoded as any supported image format
    #[error("{0}")]
    Decode(String),

    /// Image could not be re-encoded
    #[error("{0}")]
    Encode(String),

    /// Target dimensions must both be at least 1
    #[error("Invalid target dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Convenience type alias for thumbvault results.
pub type Result<T> = std::result::Result<T, ThumbvaultError>;

/// Convenience type alias for per-item pipeline results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
