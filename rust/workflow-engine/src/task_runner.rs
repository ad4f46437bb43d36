//! Per-document task scheduling (§4.2).
//!
//! Stages chain by submitting the next job, not by nested suspension:
//! a stage finishing dispatches the next `StageJob` rather than
//! recursing into it directly. [`InProcessTaskRunner`] serializes jobs
//! per document (a second job for the same document waits for the
//! first to finish) and exposes cooperative cancellation for `stop`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::types::NodeType;

/// One unit of dispatch: run `stage` for `document_id`, recording the
/// result on a Node created with `retry_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageJob {
    pub document_id: String,
    pub stage: NodeType,
    pub retry_count: u32,
}

/// A handle to a submitted job. Currently informational only; kept
/// distinct from `StageJob` because future callers (status polling,
/// metrics) should not need to know submission-time fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    pub document_id: String,
    pub stage: NodeType,
}

/// Cooperative cancellation signal, checked at each stage boundary
/// rather than preempting mid-stage (§5: stopping a running document
/// lets the in-flight stage finish before the pipeline halts).
#[derive(Clone)]
pub struct CancellationToken {
    rx: watch::Receiver<bool>,
}

impl CancellationToken {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Executes a single stage job. Implemented by the workflow engine
/// itself; kept as a trait so the runner doesn't depend on the
/// engine's internals.
#[async_trait]
pub trait StageExecutor: Send + Sync {
    async fn run_stage(&self, job: StageJob, cancellation: CancellationToken);
}

/// Schedules stage jobs, serializing execution per document.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// Submit the next stage job of a pipeline that is already
    /// running — internal stage-to-stage chaining. Any cancellation
    /// pending for `job.document_id` carries over, so a `stop` issued
    /// mid-stage is still observed once the next stage's executor
    /// checks its token.
    async fn submit(&self, job: StageJob, executor: Arc<dyn StageExecutor>) -> TaskHandle;

    /// Submit the first stage job of a fresh run (`start`, or a manual
    /// `rollback_to`). Clears any cancellation left over from a prior
    /// run of this document before dispatching.
    async fn start(&self, job: StageJob, executor: Arc<dyn StageExecutor>) -> TaskHandle;

    /// Signal cancellation to whatever job is running or queued for
    /// `document_id`. A no-op if nothing has ever run for it.
    async fn cancel(&self, document_id: &str);
}

/// A single-process [`TaskRunner`] built on `tokio::spawn` plus a
/// per-document `tokio::sync::Mutex` for serialization and a
/// `watch` channel per document for cancellation.
#[derive(Default)]
pub struct InProcessTaskRunner {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    cancellations: Mutex<HashMap<String, watch::Sender<bool>>>,
}

impl InProcessTaskRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, document_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        locks
            .entry(document_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Subscribe to the current cancellation signal for `document_id`,
    /// creating an un-cancelled one if this is the first job ever seen
    /// for it. Does not clear a signal a prior `cancel` already set —
    /// only [`Self::reset_cancellation_for`] does that, for a fresh
    /// entry point.
    fn cancellation_for(&self, document_id: &str) -> CancellationToken {
        let mut cancellations = self.cancellations.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let sender = cancellations
            .entry(document_id.to_string())
            .or_insert_with(|| watch::channel(false).0);
        CancellationToken { rx: sender.subscribe() }
    }

    /// Like [`Self::cancellation_for`], but also resets the underlying
    /// signal to `false` — used when a fresh run begins, so a document
    /// stopped in a prior run starts un-cancelled.
    fn reset_cancellation_for(&self, document_id: &str) -> CancellationToken {
        let mut cancellations = self.cancellations.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let sender = cancellations
            .entry(document_id.to_string())
            .or_insert_with(|| watch::channel(false).0);
        let _ = sender.send(false);
        CancellationToken { rx: sender.subscribe() }
    }

    async fn dispatch(&self, job: StageJob, executor: Arc<dyn StageExecutor>, cancellation: CancellationToken) -> TaskHandle {
        let handle = TaskHandle { document_id: job.document_id.clone(), stage: job.stage };
        let doc_lock = self.lock_for(&job.document_id);

        tokio::spawn(async move {
            let _permit = doc_lock.lock().await;
            executor.run_stage(job, cancellation).await;
        });

        handle
    }
}

#[async_trait]
impl TaskRunner for InProcessTaskRunner {
    async fn submit(&self, job: StageJob, executor: Arc<dyn StageExecutor>) -> TaskHandle {
        let cancellation = self.cancellation_for(&job.document_id);
        self.dispatch(job, executor, cancellation).await
    }

    async fn start(&self, job: StageJob, executor: Arc<dyn StageExecutor>) -> TaskHandle {
        let cancellation = self.reset_cancellation_for(&job.document_id);
        self.dispatch(job, executor, cancellation).await
    }

    async fn cancel(&self, document_id: &str) {
        let cancellations = self.cancellations.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(sender) = cancellations.get(document_id) {
            let _ = sender.send(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingExecutor {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl StageExecutor for CountingExecutor {
        async fn run_stage(&self, _job: StageJob, _cancellation: CancellationToken) {
            self.runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn submit_runs_the_executor() {
        let runner = InProcessTaskRunner::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let executor = Arc::new(CountingExecutor { runs: runs.clone() });

        let job = StageJob { document_id: "doc-1".to_string(), stage: NodeType::Plan, retry_count: 0 };
        runner.submit(job, executor).await;

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_survives_a_chained_submit() {
        let runner = InProcessTaskRunner::new();
        let token = runner.cancellation_for("doc-1");
        assert!(!token.is_cancelled());

        runner.cancel("doc-1").await;
        assert!(token.is_cancelled());

        let chained = runner.cancellation_for("doc-1");
        assert!(chained.is_cancelled());
    }

    #[tokio::test]
    async fn a_fresh_start_clears_a_prior_cancellation() {
        let runner = InProcessTaskRunner::new();
        let token = runner.cancellation_for("doc-1");
        runner.cancel("doc-1").await;
        assert!(token.is_cancelled());

        let fresh = runner.reset_cancellation_for("doc-1");
        assert!(!fresh.is_cancelled());
    }
}
