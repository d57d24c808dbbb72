//! The download → resize → store pipeline.
//!
//! - **item**: work items and unique destination names
//! - **channel**: bounded multi-consumer work queue
//! - **worker**: per-item steps with failure isolation
//! - **dispatcher**: owns the worker pool and waits for it to drain
//! - **report**: per-item outcomes and run totals

pub mod channel;
pub mod dispatcher;
pub mod item;
pub mod report;
pub mod worker;

// Re-exports for convenient access
pub use dispatcher::Dispatcher;
pub use item::{NameAllocator, WorkItem};
pub use report::{ItemFailure, ItemOutcome, RunReport, Stage, StageCounts};
pub use worker::{OutcomeCallback, PipelineWorker};
