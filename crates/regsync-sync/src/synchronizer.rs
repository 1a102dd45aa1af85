//! Synchronizer - bounded worker pool over walker output
//!
//! ```text
//! Walker (blocking thread) ──→ mpsc (queue_depth) ──→ N workers ──→ HierarchyEnsurer
//!                                                         │
//!                               aggregator ←── CompletionSignal (one per task)
//! ```
//!
//! Discovery runs on a blocking thread and feeds a bounded queue, so it never
//! waits for uploads to finish and memory stays bounded however large the
//! tree is. Workers share the queue receiver. Each dispatched task produces
//! exactly one [`CompletionSignal`], including failed and cancelled tasks,
//! and the aggregator stops after collecting as many signals as the walker
//! dispatched.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use regsync_core::config::UploadConfig;
use regsync_core::domain::{SourceKind, Style};
use regsync_core::ports::{IRegistryClient, ResourceBody};
use regsync_core::usecases::{BoxError, HierarchyEnsurer};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::encoder;
use crate::task::{CompletionSignal, SyncTarget, SyncTask, TaskOutcome};
use crate::walker::Walker;
use crate::SyncError;

// ============================================================================
// SyncReport
// ============================================================================

/// Summary of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Tasks handed to the worker pool
    pub dispatched: usize,
    /// Tasks that created at least one resource
    pub created: usize,
    /// Total API, Version and Spec resources created
    pub resources_created: u32,
    /// Tasks whose whole hierarchy already existed
    pub unchanged: usize,
    /// Tasks that failed
    pub failed: usize,
    /// Tasks skipped because the run was cancelled
    pub cancelled: usize,
    /// Entries rejected during discovery, before any upload
    pub rejected: usize,
    /// Failure and rejection messages (non-fatal)
    pub errors: Vec<String>,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

impl SyncReport {
    /// Whether any task failed or any entry was rejected
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.rejected > 0
    }

    /// Number of completion signals accounted for
    pub fn completed(&self) -> usize {
        self.created + self.unchanged + self.failed + self.cancelled
    }

    fn record(&mut self, signal: CompletionSignal) {
        match signal.outcome {
            TaskOutcome::Created(count) => {
                self.created += 1;
                self.resources_created += count;
            }
            TaskOutcome::Unchanged => self.unchanged += 1,
            TaskOutcome::Failed(message) => {
                self.failed += 1;
                self.errors
                    .push(format!("{}: {message}", signal.path.display()));
            }
            TaskOutcome::Cancelled => self.cancelled += 1,
        }
    }
}

// ============================================================================
// Synchronizer
// ============================================================================

/// Drives the hierarchy ensure for every task a [`Walker`] discovers
pub struct Synchronizer {
    ensurer: HierarchyEnsurer,
    workers: usize,
    queue_depth: usize,
    cancel: CancellationToken,
}

impl Synchronizer {
    /// Creates a synchronizer with the default upload settings
    pub fn new(client: Arc<dyn IRegistryClient>) -> Self {
        Self::from_config(client, &UploadConfig::default())
    }

    /// Creates a synchronizer sized from the `upload` config section
    pub fn from_config(client: Arc<dyn IRegistryClient>, config: &UploadConfig) -> Self {
        Self {
            ensurer: HierarchyEnsurer::new(client),
            workers: config.workers.max(1),
            queue_depth: config.queue_depth.max(1),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_queue_depth(mut self, queue_depth: usize) -> Self {
        self.queue_depth = queue_depth.max(1);
        self
    }

    /// Replaces the cancellation token, e.g. with one tied to Ctrl-C
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops discovery and marks pending tasks as cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Walks `walker`, uploads every task and waits for all of them.
    ///
    /// Per-task failures are collected in the report; only a failure of the
    /// discovery thread itself is returned as an error.
    pub async fn run(&self, walker: Walker) -> Result<SyncReport, SyncError> {
        let start = Instant::now();
        info!(workers = self.workers, queue_depth = self.queue_depth, "Starting upload");

        let (task_tx, task_rx) = mpsc::channel::<SyncTask>(self.queue_depth);
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<CompletionSignal>();
        let task_rx = Arc::new(Mutex::new(task_rx));

        let handles: Vec<JoinHandle<()>> = (0..self.workers)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    self.ensurer.clone(),
                    Arc::clone(&task_rx),
                    done_tx.clone(),
                    self.cancel.clone(),
                ))
            })
            .collect();
        drop(done_tx);

        let cancel = self.cancel.clone();
        let stats = tokio::task::spawn_blocking(move || {
            walker.walk(|task| !cancel.is_cancelled() && task_tx.blocking_send(task).is_ok())
        })
        .await
        .map_err(|e| SyncError::Traversal(e.to_string()))?;

        if self.cancel.is_cancelled() {
            warn!(dispatched = stats.dispatched, "Discovery stopped by cancellation");
        }

        let mut report = SyncReport {
            dispatched: stats.dispatched,
            rejected: stats.rejected.len(),
            errors: stats.rejected,
            ..SyncReport::default()
        };

        while report.completed() < report.dispatched {
            match done_rx.recv().await {
                Some(signal) => report.record(signal),
                None => {
                    let missing = report.dispatched - report.completed();
                    error!(missing, "Workers exited without reporting every task");
                    report.failed += missing;
                    report
                        .errors
                        .push(format!("{missing} task(s) lost by exited workers"));
                }
            }
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Worker terminated abnormally");
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            dispatched = report.dispatched,
            created = report.created,
            unchanged = report.unchanged,
            failed = report.failed,
            cancelled = report.cancelled,
            rejected = report.rejected,
            duration_ms = report.duration_ms,
            "Upload finished"
        );
        Ok(report)
    }

    /// Runs a single task outside the pool
    pub async fn process(&self, task: &SyncTask) -> TaskOutcome {
        process_task(&self.ensurer, task).await
    }
}

async fn worker_loop(
    worker_id: usize,
    ensurer: HierarchyEnsurer,
    task_rx: Arc<Mutex<mpsc::Receiver<SyncTask>>>,
    done_tx: mpsc::UnboundedSender<CompletionSignal>,
    cancel: CancellationToken,
) {
    debug!(worker_id, "Worker started");
    loop {
        let next = task_rx.lock().await.recv().await;
        let Some(task) = next else {
            break;
        };

        let outcome = if cancel.is_cancelled() {
            TaskOutcome::Cancelled
        } else {
            tokio::select! {
                _ = cancel.cancelled() => TaskOutcome::Cancelled,
                outcome = process_task(&ensurer, &task) => outcome,
            }
        };

        if done_tx
            .send(CompletionSignal {
                path: task.path,
                outcome,
            })
            .is_err()
        {
            break;
        }
    }
    debug!(worker_id, "Worker stopped");
}

async fn process_task(ensurer: &HierarchyEnsurer, task: &SyncTask) -> TaskOutcome {
    let make_body = || encode_blocking(task.path.clone(), task.kind, task.style);

    let result = match &task.target {
        SyncTarget::Hierarchy(address) => ensurer
            .ensure_hierarchy(address, make_body)
            .await
            .map(|outcome| outcome.created_count()),
        SyncTarget::Version { version, spec_id } => ensurer
            .ensure_spec(version, spec_id, make_body)
            .await
            .map(|outcome| u32::from(outcome.is_created())),
    };

    match result {
        Ok(0) => TaskOutcome::Unchanged,
        Ok(count) => TaskOutcome::Created(count),
        Err(e) => {
            error!(
                path = %task.path.display(),
                target = %task.spec_name(),
                error = %e,
                "Upload failed"
            );
            TaskOutcome::Failed(e.to_string())
        }
    }
}

async fn encode_blocking(
    path: PathBuf,
    kind: SourceKind,
    style: Style,
) -> Result<ResourceBody, BoxError> {
    let payload = tokio::task::spawn_blocking(move || encoder::encode(&path, kind, style)).await??;
    Ok(payload.into_body())
}

// ============================================================================
// Unit tests
// ============================================================================
