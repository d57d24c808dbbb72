//! HTTP retrieval of source images.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::{ConfigError, PipelineError};

/// Retrieves the raw bytes behind a URL.
///
/// Uses `async_trait` so the dispatcher can hold an `Arc<dyn Fetcher>` and
/// tests can substitute an in-memory implementation.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the full body of `url`.
    ///
    /// Transport failures and non-2xx statuses are `PipelineError::Fetch`.
    /// No retries are attempted.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError>;
}

/// `Fetcher` backed by a shared `reqwest::Client`.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::ValidationError(format!("Cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_bytes: config.max_download_mb.saturating_mul(1024 * 1024),
        })
    }

    fn error(url: &str, message: impl Into<String>) -> PipelineError {
        PipelineError::Fetch {
            url: url.to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::error(url, e.to_string()))?
            .error_for_status()
            .map_err(|e| Self::error(url, e.to_string()))?;

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(Self::error(
                    url,
                    format!("Body of {len} bytes exceeds limit of {} bytes", self.max_bytes),
                ));
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Self::error(url, e.to_string()))?;
            if body.len() as u64 + chunk.len() as u64 > self.max_bytes {
                return Err(Self::error(
                    url,
                    format!("Body exceeds limit of {} bytes", self.max_bytes),
                ));
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
