//! Thumbvault Core - download, thumbnail and store images in bulk.
//!
//! Given a list of image URLs, thumbvault fetches each one, resizes it to a
//! fixed thumbnail size, stores the JPEG bytes in a relational table, and
//! removes its temporary files.
//!
//! # Architecture
//!
//! ```text
//! URLs → queue → N workers: Fetch → Write raw → Decode/Resize/Encode → Store → Cleanup
//! ```
//!
//! A failure at any step abandons only that image; the worker moves on to
//! the next queue item.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use thumbvault_core::{Config, Dispatcher, HttpFetcher, ImageStore, NameAllocator, SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> thumbvault_core::Result<()> {
//!     let config = Config::load()?;
//!     let store = SqliteStore::from_config(&config.database_path(), &config.store)?;
//!     store.ensure_schema().await?;
//!
//!     let fetcher = HttpFetcher::new(&config.fetch)?;
//!     let dispatcher = Dispatcher::new(&config, Arc::new(fetcher), Arc::new(store))?;
//!
//!     let names = NameAllocator::new("cats");
//!     let items = names.items(["https://example.com/cat.png"], &config.work_dir());
//!     let report = dispatcher.run(items).await?;
//!     println!("{} stored, {} failed", report.succeeded, report.failed_total());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod codec;
pub mod config;
pub mod error;
pub mod fetch;
pub mod inputs;
pub mod pipeline;
pub mod store;

// Re-exports for convenient access
pub use codec::{ImageCodec, ResizeFilter};
pub use config::Config;
pub use error::{
    CodecError, ConfigError, PipelineError, PipelineResult, Result, StoreError, ThumbvaultError,
};
pub use fetch::{Fetcher, HttpFetcher};
pub use inputs::{load_inputs, SearchInput};
pub use pipeline::{Dispatcher, ItemOutcome, NameAllocator, RunReport, Stage, WorkItem};
pub use store::{ImageStore, SqliteStore, StoredImage};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
