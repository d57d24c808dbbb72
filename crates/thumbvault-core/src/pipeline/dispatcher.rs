//! Owns the bounded worker pool and drains one batch of work items.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::codec::ImageCodec;
use crate::config::Config;
use crate::error::{ConfigError, ThumbvaultError};
use crate::fetch::Fetcher;
use crate::store::ImageStore;

use super::channel::work_queue;
use super::item::WorkItem;
use super::report::{ItemOutcome, RunReport};
use super::worker::{OutcomeCallback, PipelineWorker, WorkerContext};

/// Runs batches of work items through a fixed pool of `parallelism` workers.
pub struct Dispatcher {
    parallelism: usize,
    queue_capacity: usize,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn ImageStore>,
    codec: ImageCodec,
    width: u32,
    height: u32,
    output_dir: PathBuf,
    cleanup_raw: bool,
    on_outcome: Option<OutcomeCallback>,
}

impl Dispatcher {
    /// Validate the pipeline settings and capture everything workers share.
    ///
    /// Fails with a configuration error before any queue exists if
    /// parallelism, queue capacity or the resize target are invalid.
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn ImageStore>,
    ) -> Result<Self, ConfigError> {
        config.pipeline.validate()?;
        config.resize.validate()?;

        Ok(Self {
            parallelism: config.pipeline.parallelism,
            queue_capacity: config.pipeline.queue_capacity,
            fetcher,
            store,
            codec: ImageCodec::from_config(&config.resize)?,
            width: config.resize.width,
            height: config.resize.height,
            output_dir: config.output_dir(),
            cleanup_raw: config.pipeline.cleanup_raw,
            on_outcome: None,
        })
    }

    /// Call `f` with every item outcome as soon as it finishes.
    ///
    /// Calls come from worker tasks, in completion order.
    pub fn on_outcome<F>(mut self, f: F) -> Self
    where
        F: Fn(&ItemOutcome) + Send + Sync + 'static,
    {
        self.on_outcome = Some(Arc::new(f));
        self
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Attempt every item exactly once and wait for the pool to drain.
    ///
    /// An empty batch returns immediately. Directory creation failures are
    /// fatal and happen before any worker starts; per-item failures only
    /// show up in the returned report.
    pub async fn run(&self, items: Vec<WorkItem>) -> Result<RunReport, ThumbvaultError> {
        let start = Instant::now();
        if items.is_empty() {
            tracing::debug!("No work items, nothing to do");
            return Ok(RunReport::default());
        }

        self.prepare_dirs(&items)?;

        let total = items.len();
        let ctx = Arc::new(WorkerContext {
            fetcher: self.fetcher.clone(),
            store: self.store.clone(),
            codec: self.codec.clone(),
            width: self.width,
            height: self.height,
            output_dir: self.output_dir.clone(),
            cleanup_raw: self.cleanup_raw,
            on_outcome: self.on_outcome.clone(),
        });
        let (tx, rx) = work_queue::<WorkItem>(self.queue_capacity);

        let handles: Vec<_> = (0..self.parallelism)
            .map(|id| {
                let worker = PipelineWorker::new(id, ctx.clone());
                tokio::spawn(worker.run(rx.clone()))
            })
            .collect();
        drop(rx);
        tracing::info!(
            "Processing {} image(s) with {} worker(s)",
            total,
            self.parallelism
        );

        for item in items {
            if tx.send(item).await.is_err() {
                // Only possible if every worker has died.
                tracing::error!("All workers exited early; remaining items dropped");
                break;
            }
        }
        drop(tx);

        let mut report = RunReport::default();
        for handle in handles {
            match handle.await {
                Ok(worker_report) => report.merge(&worker_report),
                Err(e) => {
                    tracing::error!("Pipeline worker panicked: {e}");
                    report.worker_panics += 1;
                }
            }
        }
        report.elapsed = start.elapsed();

        tracing::info!(
            "Run finished in {:?}: {} succeeded, {} failed",
            report.elapsed,
            report.succeeded,
            report.failed_total()
        );
        Ok(report)
    }

    fn prepare_dirs(&self, items: &[WorkItem]) -> Result<(), ThumbvaultError> {
        let dirs: BTreeSet<PathBuf> = items
            .iter()
            .map(|item| item.work_dir.clone())
            .chain(std::iter::once(self.output_dir.clone()))
            .collect();

        for dir in dirs {
            std::fs::create_dir_all(&dir)
                .map_err(|source| ThumbvaultError::Precondition { path: dir, source })?;
        }
        Ok(())
    }
}
