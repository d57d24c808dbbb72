//! A single pipeline worker: fetch, write raw, resize, store, clean up.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::FutureExt;
use std::time::Instant;

use crate::codec::ImageCodec;
use crate::error::{CodecError, PipelineError};
use crate::fetch::Fetcher;
use crate::store::{ImageStore, StoredImage};

use super::channel::SharedReceiver;
use super::item::WorkItem;
use super::report::{ItemFailure, ItemOutcome, RunReport, Stage};

/// Callback invoked with every finished item.
pub type OutcomeCallback = Arc<dyn Fn(&ItemOutcome) + Send + Sync>;

/// Everything a worker needs, shared read-only by the whole pool.
pub(crate) struct WorkerContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub store: Arc<dyn ImageStore>,
    pub codec: ImageCodec,
    pub width: u32,
    pub height: u32,
    pub output_dir: PathBuf,
    pub cleanup_raw: bool,
    pub on_outcome: Option<OutcomeCallback>,
}

/// Consumes work items until the queue is closed and drained.
pub struct PipelineWorker {
    id: usize,
    ctx: Arc<WorkerContext>,
}

impl PipelineWorker {
    pub(crate) fn new(id: usize, ctx: Arc<WorkerContext>) -> Self {
        Self { id, ctx }
    }

    /// Process items from `queue` one at a time. Returns this worker's tally.
    pub async fn run(self, queue: SharedReceiver<WorkItem>) -> RunReport {
        let mut report = RunReport::default();
        tracing::debug!("Worker {} started", self.id);

        while let Some(item) = queue.recv().await {
            let outcome = match AssertUnwindSafe(self.process(&item)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => {
                    tracing::error!(
                        "Worker {}: panicked on {} ({}): {}",
                        self.id,
                        item.name,
                        item.url,
                        panic_message(panic.as_ref())
                    );
                    report.attempted += 1;
                    report.worker_panics += 1;
                    continue;
                }
            };
            report.record(&outcome);
            if let Some(callback) = &self.ctx.on_outcome {
                callback(&outcome);
            }
        }

        tracing::debug!(
            "Worker {} finished after {} item(s)",
            self.id,
            report.attempted
        );
        report
    }

    /// Run one item through every step. Never fails; failures are folded into
    /// the returned outcome.
    pub async fn process(&self, item: &WorkItem) -> ItemOutcome {
        let start = Instant::now();
        let raw_path = item.raw_path();
        let resized_path = self.ctx.output_dir.join(&item.name);
        let mut cleanup_failures = 0;

        let result = match self.fetch_and_write(item, &raw_path).await {
            Ok(()) => {
                let result = self.resize_and_store(item, &raw_path, &resized_path).await;
                if self.ctx.cleanup_raw && !remove_file(&raw_path).await {
                    cleanup_failures += 1;
                }
                match result {
                    Ok((id, cleaned)) => {
                        if !cleaned {
                            cleanup_failures += 1;
                        }
                        Ok(id)
                    }
                    Err((failure, cleaned)) => {
                        if !cleaned {
                            cleanup_failures += 1;
                        }
                        Err(failure)
                    }
                }
            }
            Err(failure) => Err(failure),
        };

        match &result {
            Ok(id) => tracing::debug!(
                "Worker {}: {} done in {:?} (row {})",
                self.id,
                item.name,
                start.elapsed(),
                id
            ),
            Err(failure) => tracing::error!(
                "Worker {}: {} failed for {} ({}): {}",
                self.id,
                failure.stage,
                item.name,
                item.url,
                failure.error
            ),
        }

        ItemOutcome {
            name: item.name.clone(),
            url: item.url.clone(),
            result,
            cleanup_failures,
        }
    }

    /// Steps 1 and 2. Nothing touches the disk unless the fetch succeeded.
    async fn fetch_and_write(&self, item: &WorkItem, raw_path: &Path) -> Result<(), ItemFailure> {
        let bytes = self
            .ctx
            .fetcher
            .fetch(&item.url)
            .await
            .map_err(|error| ItemFailure {
                stage: Stage::Fetch,
                error,
            })?;

        if let Err(e) = tokio::fs::write(raw_path, &bytes).await {
            remove_file(raw_path).await;
            return Err(ItemFailure {
                stage: Stage::Write,
                error: PipelineError::filesystem(raw_path, e),
            });
        }

        tracing::info!("Downloaded: {}", item.url);
        Ok(())
    }

    /// Steps 3 to 5. The second tuple field reports whether the resized file
    /// was cleaned up.
    async fn resize_and_store(
        &self,
        item: &WorkItem,
        raw_path: &Path,
        resized_path: &Path,
    ) -> Result<(i64, bool), (ItemFailure, bool)> {
        if let Err(error) = self.resize(raw_path, resized_path).await {
            let cleaned = remove_file(resized_path).await;
            return Err((
                ItemFailure {
                    stage: Stage::Resize,
                    error,
                },
                cleaned,
            ));
        }
        tracing::info!("Resized and saved: {:?}", resized_path);

        let stored = self.store(item, resized_path).await;
        let cleaned = remove_file(resized_path).await;

        match stored {
            Ok(id) => Ok((id, cleaned)),
            Err(error) => Err((
                ItemFailure {
                    stage: Stage::Store,
                    error,
                },
                cleaned,
            )),
        }
    }

    async fn resize(&self, raw_path: &Path, resized_path: &Path) -> Result<(), PipelineError> {
        let raw = tokio::fs::read(raw_path)
            .await
            .map_err(|e| PipelineError::filesystem(raw_path, e))?;

        let codec = self.ctx.codec.clone();
        let (width, height) = (self.ctx.width, self.ctx.height);
        let encoded = tokio::task::spawn_blocking(move || codec.thumbnail(&raw, width, height))
            .await
            .map_err(|e| PipelineError::Encode {
                path: resized_path.to_path_buf(),
                message: format!("Task join error: {e}"),
            })?
            .map_err(|e| match e {
                CodecError::Decode(message) => PipelineError::Decode {
                    path: raw_path.to_path_buf(),
                    message,
                },
                other => PipelineError::Encode {
                    path: resized_path.to_path_buf(),
                    message: other.to_string(),
                },
            })?;

        tokio::fs::write(resized_path, &encoded)
            .await
            .map_err(|e| PipelineError::filesystem(resized_path, e))
    }

    async fn store(&self, item: &WorkItem, resized_path: &Path) -> Result<i64, PipelineError> {
        let bytes = tokio::fs::read(resized_path)
            .await
            .map_err(|e| PipelineError::filesystem(resized_path, e))?;

        let id = self
            .ctx
            .store
            .put(StoredImage {
                name: item.name.clone(),
                bytes,
            })
            .await
            .map_err(|source| PipelineError::Store {
                name: item.name.clone(),
                source,
            })?;

        tracing::info!("Stored: {}", item.name);
        Ok(id)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Best-effort delete. A missing file counts as removed; other failures are
/// logged and reported as `false`.
async fn remove_file(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            tracing::warn!("Error deleting {:?}: {}", path, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use async_trait::async_trait;
    use image::{DynamicImage, GenericImageView, ImageFormat};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;

    struct MapFetcher(HashMap<String, Vec<u8>>);

    #[async_trait]
    impl Fetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
            self.0.get(url).cloned().ok_or_else(|| PipelineError::Fetch {
                url: url.to_string(),
                message: "404 Not Found".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct VecStore {
        rows: Mutex<Vec<StoredImage>>,
        fail: bool,
    }

    #[async_trait]
    impl ImageStore for VecStore {
        async fn ensure_schema(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn put(&self, image: StoredImage) -> Result<i64, StoreError> {
            if self.fail {
                return Err(StoreError::Task("disk full".to_string()));
            }
            let mut rows = self.rows.lock().unwrap();
            rows.push(image);
            Ok(rows.len() as i64)
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    struct Harness {
        _dir: tempfile::TempDir,
        work_dir: PathBuf,
        output_dir: PathBuf,
        store: Arc<VecStore>,
        worker: PipelineWorker,
    }

    fn harness(cleanup_raw: bool, store: VecStore) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let work_dir = dir.path().join("raw");
        let output_dir = dir.path().join("out");
        std::fs::create_dir_all(&work_dir).unwrap();
        std::fs::create_dir_all(&output_dir).unwrap();

        let mut sources = HashMap::new();
        sources.insert("http://example/a.png".to_string(), png(50, 50));
        sources.insert("http://example/bad.png".to_string(), b"not an image".to_vec());

        let store = Arc::new(store);
        let ctx = Arc::new(WorkerContext {
            fetcher: Arc::new(MapFetcher(sources)),
            store: store.clone(),
            codec: ImageCodec::default(),
            width: 100,
            height: 100,
            output_dir: output_dir.clone(),
            cleanup_raw,
            on_outcome: None,
        });

        Harness {
            _dir: dir,
            work_dir,
            output_dir,
            store,
            worker: PipelineWorker::new(0, ctx),
        }
    }

    #[tokio::test]
    async fn test_process_success_keeps_raw_when_configured() {
        let h = harness(false, VecStore::default());
        let item = WorkItem::new("http://example/a.png", "x.jpg", &h.work_dir);

        let outcome = h.worker.process(&item).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.cleanup_failures, 0);

        assert!(!h.output_dir.join("x.jpg").exists());
        assert!(item.raw_path().exists());

        let rows = h.store.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "x.jpg");
        let decoded = image::load_from_memory(&rows[0].bytes).unwrap();
        assert_eq!(decoded.dimensions(), (100, 100));
    }

    #[tokio::test]
    async fn test_process_success_removes_raw_by_default() {
        let h = harness(true, VecStore::default());
        let item = WorkItem::new("http://example/a.png", "x.jpg", &h.work_dir);

        assert!(h.worker.process(&item).await.is_success());
        assert!(!item.raw_path().exists());
        assert!(!h.output_dir.join("x.jpg").exists());
    }

    #[tokio::test]
    async fn test_fetch_failure_writes_nothing() {
        let h = harness(false, VecStore::default());
        let item = WorkItem::new("http://example/missing.png", "m.jpg", &h.work_dir);

        let outcome = h.worker.process(&item).await;
        let failure = outcome.result.unwrap_err();
        assert_eq!(failure.stage, Stage::Fetch);
        assert!(!item.raw_path().exists());
        assert!(h.store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_image_is_resize_failure() {
        let h = harness(false, VecStore::default());
        let item = WorkItem::new("http://example/bad.png", "b.jpg", &h.work_dir);

        let outcome = h.worker.process(&item).await;
        let failure = outcome.result.unwrap_err();
        assert_eq!(failure.stage, Stage::Resize);
        assert!(matches!(failure.error, PipelineError::Decode { .. }));
        // Raw file stays for inspection when raw cleanup is off.
        assert!(item.raw_path().exists());
        assert!(!h.output_dir.join("b.jpg").exists());
    }

    #[tokio::test]
    async fn test_missing_work_dir_is_write_failure() {
        let h = harness(false, VecStore::default());
        let item = WorkItem::new("http://example/a.png", "w.jpg", h.work_dir.join("nope"));

        let failure = h.worker.process(&item).await.result.unwrap_err();
        assert_eq!(failure.stage, Stage::Write);
        assert!(matches!(failure.error, PipelineError::Filesystem { .. }));
    }

    #[tokio::test]
    async fn test_store_failure_still_cleans_resized_file() {
        let h = harness(
            false,
            VecStore {
                fail: true,
                ..VecStore::default()
            },
        );
        let item = WorkItem::new("http://example/a.png", "s.jpg", &h.work_dir);

        let outcome = h.worker.process(&item).await;
        let failure = outcome.result.unwrap_err();
        assert_eq!(failure.stage, Stage::Store);
        assert!(matches!(failure.error, PipelineError::Store { .. }));
        assert!(!h.output_dir.join("s.jpg").exists());
    }
}
