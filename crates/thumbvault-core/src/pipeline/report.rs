//! Per-item outcomes and the aggregate run report.

use std::fmt;
use std::time::Duration;

use crate::error::PipelineError;

/// The pipeline step an item failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Write,
    Resize,
    Store,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Write => write!(f, "write"),
            Stage::Resize => write!(f, "resize"),
            Stage::Store => write!(f, "store"),
        }
    }
}

/// Why an item was abandoned.
#[derive(Debug)]
pub struct ItemFailure {
    pub stage: Stage,
    pub error: PipelineError,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.error)
    }
}

/// Result of running one work item through the pipeline.
#[derive(Debug)]
pub struct ItemOutcome {
    pub name: String,
    pub url: String,
    /// Row id of the stored thumbnail, or the failing step
    pub result: Result<i64, ItemFailure>,
    /// Temp files that could not be deleted afterwards
    pub cleanup_failures: usize,
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Failure counts per step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub fetch: u64,
    pub write: u64,
    pub resize: u64,
    pub store: u64,
}

impl StageCounts {
    pub fn total(&self) -> u64 {
        self.fetch + self.write + self.resize + self.store
    }

    fn bump(&mut self, stage: Stage) {
        match stage {
            Stage::Fetch => self.fetch += 1,
            Stage::Write => self.write += 1,
            Stage::Resize => self.resize += 1,
            Stage::Store => self.store += 1,
        }
    }
}

/// Aggregate of every outcome in a run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Items taken off the queue
    pub attempted: u64,
    /// Items whose thumbnail reached the store
    pub succeeded: u64,
    /// Abandoned items, by failing step
    pub failed: StageCounts,
    /// Temp-file deletions that failed (never fatal)
    pub cleanup_failures: u64,
    /// Items (or whole workers) whose processing panicked. Counted in
    /// `attempted` but in neither `succeeded` nor `failed`.
    pub worker_panics: u64,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        self.attempted += 1;
        self.cleanup_failures += outcome.cleanup_failures as u64;
        match &outcome.result {
            Ok(_) => self.succeeded += 1,
            Err(failure) => self.failed.bump(failure.stage),
        }
    }

    /// Fold another report's counts into this one. `elapsed` is left alone.
    pub fn merge(&mut self, other: &RunReport) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        self.failed.fetch += other.failed.fetch;
        self.failed.write += other.failed.write;
        self.failed.resize += other.failed.resize;
        self.failed.store += other.failed.store;
        self.cleanup_failures += other.cleanup_failures;
        self.worker_panics += other.worker_panics;
    }

    pub fn failed_total(&self) -> u64 {
        self.failed.total()
    }
}
