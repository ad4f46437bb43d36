//! The workflow engine: wires the five stages into the Plan → Draft →
//! Citation → Grammar → Readability pipeline (§3, §4.1), handling
//! rollback-to-Draft on gate failure, infrastructure retry, event
//! publishing, and the public `start`/`stop`/`status`/`rollback_to`
//! operations.
//!
//! A stage finishing enqueues the next job on the
//! [`crate::task_runner::TaskRunner`] rather than recursing into it —
//! [`WorkflowEngine`] keeps a `Weak` reference to itself (built with
//! `Arc::new_cyclic`) so it can hand the runner an `Arc<dyn
//! StageExecutor>` for each job it dispatches to itself.

use std::sync::{Arc, Weak};

use async_trait::async_trait;

use scripta_citation_validator::CitationValidator;
use scripta_event_bus::{EventBus, EventKind, NodeSnapshot};
use scripta_llm_gateway::LlmGateway;
use scripta_readability_analyzer::ReadabilityAnalyzer;

use crate::error::{WorkflowError, WorkflowResult};
use crate::retry::{with_infra_retry, BackoffConfig};
use crate::stage::{Stage, StageInput};
use crate::stages::{CitationStage, DraftStage, GrammarStage, PlanStage, ReadabilityStage};
use crate::store::DocumentStore;
use crate::task_runner::{CancellationToken, StageExecutor, StageJob, TaskHandle, TaskRunner};
use crate::types::{Config, Document, Node, NodeStatus, NodeType, WorkflowStatus};

/// The five dispatchable stage implementations, bundled for
/// injection into [`WorkflowEngine::new`].
pub struct StageSet {
    plan: Arc<dyn Stage>,
    draft: Arc<dyn Stage>,
    citation: Arc<dyn Stage>,
    grammar: Arc<dyn Stage>,
    readability: Arc<dyn Stage>,
}

impl StageSet {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        citation_validator: Arc<CitationValidator>,
        readability_analyzer: Arc<ReadabilityAnalyzer>,
    ) -> Self {
        Self {
            plan: Arc::new(PlanStage::new(gateway.clone())),
            draft: Arc::new(DraftStage::new(gateway.clone())),
            citation: Arc::new(CitationStage::new(citation_validator)),
            grammar: Arc::new(GrammarStage::new(gateway)),
            readability: Arc::new(ReadabilityStage::new(readability_analyzer)),
        }
    }

    /// Build a `StageSet` from hand-picked stage implementations,
    /// useful in tests that need deterministic or failing stages.
    #[must_use]
    pub fn from_stages(
        plan: Arc<dyn Stage>,
        draft: Arc<dyn Stage>,
        citation: Arc<dyn Stage>,
        grammar: Arc<dyn Stage>,
        readability: Arc<dyn Stage>,
    ) -> Self {
        Self { plan, draft, citation, grammar, readability }
    }

    fn get(&self, stage: NodeType) -> Option<Arc<dyn Stage>> {
        match stage {
            NodeType::Plan => Some(self.plan.clone()),
            NodeType::Draft => Some(self.draft.clone()),
            NodeType::Citation => Some(self.citation.clone()),
            NodeType::Grammar => Some(self.grammar.clone()),
            NodeType::Readability => Some(self.readability.clone()),
            NodeType::UserEdit | NodeType::Plugin => None,
        }
    }
}

/// Result of `start`: whether the pipeline was accepted for
/// execution (it always is, once `start` returns `Ok`), plus a handle
/// to the Plan job it enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOutcome {
    pub accepted: bool,
    pub task_handle: TaskHandle,
}

/// Result of `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopOutcome {
    pub stopped: bool,
}

/// Result of `status`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub status: WorkflowStatus,
    pub progress: f64,
    pub nodes: Vec<Node>,
}

/// `progress = passed_gates / 5 * 100`: the percentage of the five
/// stages (Plan, Draft, Citation, Grammar, Readability) that have
/// *passed* as of a document entering `status`. A status names the
/// stage about to run, so it always reflects one fewer pass than its
/// ordinal position; `Done` is the only status with all five passed.
/// `Failed` carries no stage-position information on its own, so it
/// reports `0.0` rather than guessing which gate it failed at.
#[must_use]
fn progress_for(status: WorkflowStatus) -> f64 {
    match status {
        WorkflowStatus::Idle | WorkflowStatus::Planning | WorkflowStatus::Failed => 0.0,
        WorkflowStatus::Drafting => 20.0,
        WorkflowStatus::CitationCheck => 40.0,
        WorkflowStatus::GrammarCheck => 60.0,
        WorkflowStatus::ReadabilityCheck => 80.0,
        WorkflowStatus::Done => 100.0,
    }
}

/// Orchestrates the pipeline for any number of documents concurrently,
/// serializing stage jobs per document through a [`TaskRunner`].
pub struct WorkflowEngine {
    store: Arc<dyn DocumentStore>,
    events: Arc<EventBus>,
    runner: Arc<dyn TaskRunner>,
    stages: StageSet,
    backoff: BackoffConfig,
    self_ref: Weak<WorkflowEngine>,
}

impl WorkflowEngine {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, events: Arc<EventBus>, runner: Arc<dyn TaskRunner>, stages: StageSet) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            store,
            events,
            runner,
            stages,
            backoff: BackoffConfig::default(),
            self_ref: weak.clone(),
        })
    }

    /// Begin (or restart, from a terminal state) the pipeline for
    /// `document_id` with a fresh user prompt. Fails with `NotFound`
    /// if the document doesn't exist, `Conflict` if it's already
    /// mid-pipeline (§4.2).
    pub async fn start(self: &Arc<Self>, document_id: &str, user_prompt: &str) -> WorkflowResult<StartOutcome> {
        let document = self.store.get_document(document_id).await?;
        if !document.status.is_terminal() {
            return Err(WorkflowError::Conflict {
                message: format!("document {document_id} is already {}", document.status.as_str()),
            });
        }

        self.store.set_document_prompt(document_id, user_prompt).await?;
        let task_handle = self.enqueue_fresh(document_id, NodeType::Plan, 0).await;
        Ok(StartOutcome { accepted: true, task_handle })
    }

    /// Signal cancellation for `document_id` and transition it back
    /// to `Idle` once the in-flight stage notices. A no-op (returns
    /// `stopped: false`) if the document is already terminal.
    pub async fn stop(&self, document_id: &str) -> WorkflowResult<StopOutcome> {
        let document = self.store.get_document(document_id).await?;
        if document.status.is_terminal() {
            return Ok(StopOutcome { stopped: false });
        }
        self.runner.cancel(document_id).await;
        Ok(StopOutcome { stopped: true })
    }

    /// The document's current status, progress estimate, and full
    /// Node history.
    pub async fn status(&self, document_id: &str) -> WorkflowResult<StatusSnapshot> {
        let document = self.store.get_document(document_id).await?;
        let nodes = self.store.list_nodes(document_id).await?;
        Ok(StatusSnapshot { status: document.status, progress: progress_for(document.status), nodes })
    }

    /// Manually re-enter the pipeline at a Plan or Draft Node,
    /// discarding (logically — the store never deletes) everything
    /// after it. Other node types aren't valid manual rollback
    /// targets; automatic rollback on gate failure always targets
    /// Draft regardless of which gate failed.
    pub async fn rollback_to(self: &Arc<Self>, document_id: &str, node_id: &str) -> WorkflowResult<()> {
        let target = self.store.get_node(node_id).await?;
        if target.document_id != document_id {
            return Err(WorkflowError::NotFound {
                message: format!("node {node_id} does not belong to document {document_id}"),
            });
        }
        if !matches!(target.node_type, NodeType::Plan | NodeType::Draft) {
            return Err(WorkflowError::Validation {
                message: format!("rollback_to only supports Plan or Draft targets, got {}", target.node_type),
            });
        }

        let in_flight = WorkflowStatus::for_stage(target.node_type);
        self.store.set_document_status(document_id, in_flight).await?;
        self.publish_status(document_id, in_flight, Some(target.node_type)).await;
        self.enqueue_fresh(document_id, target.node_type, 0).await;
        Ok(())
    }

    /// Chain to the next stage of a pipeline already running. Leaves
    /// any pending cancellation in place, so a `stop` issued mid-stage
    /// is still observed once this job's executor checks its token.
    async fn enqueue(self: &Arc<Self>, document_id: &str, stage: NodeType, retry_count: u32) -> TaskHandle {
        let job = StageJob { document_id: document_id.to_string(), stage, retry_count };
        self.runner.submit(job, self.clone()).await
    }

    /// Enter the pipeline at a fresh entry point (`start`,
    /// `rollback_to`). Clears any cancellation left over from a prior
    /// run before dispatching.
    async fn enqueue_fresh(self: &Arc<Self>, document_id: &str, stage: NodeType, retry_count: u32) -> TaskHandle {
        let job = StageJob { document_id: document_id.to_string(), stage, retry_count };
        self.runner.start(job, self.clone()).await
    }

    /// The input artifact for `stage`: Plan has none (it reads the
    /// persisted prompt instead), Draft reads the latest accepted
    /// outline, and the three gates all read the document's current
    /// tentative content (set by Draft-Pass, advanced by
    /// Grammar-Pass).
    async fn artifact_for(&self, stage: NodeType, document: &Document) -> WorkflowResult<String> {
        match stage {
            NodeType::Plan => Ok(String::new()),
            NodeType::Draft => self
                .store
                .latest_pass(&document.id, NodeType::Plan)
                .await?
                .map(|node| node.content)
                .ok_or_else(|| WorkflowError::NotFound {
                    message: format!("no accepted Plan for document {}", document.id),
                }),
            NodeType::Citation | NodeType::Grammar | NodeType::Readability => Ok(document.content.clone()),
            NodeType::UserEdit | NodeType::Plugin => Err(WorkflowError::Validation {
                message: format!("{stage} is not a dispatchable stage"),
            }),
        }
    }

    async fn parent_id_for(&self, stage: NodeType, document: &Document) -> Option<String> {
        let preceding = match stage {
            NodeType::Draft => NodeType::Plan,
            NodeType::Citation => NodeType::Draft,
            NodeType::Grammar => NodeType::Citation,
            NodeType::Readability => NodeType::Grammar,
            NodeType::Plan | NodeType::UserEdit | NodeType::Plugin => return None,
        };
        self.store.latest_pass(&document.id, preceding).await.ok().flatten().map(|node| node.id)
    }

    /// The retry_count a fresh Node of `node_type` should carry: zero
    /// unless the most recent Node of that type failed its gate, in
    /// which case one more than its own retry_count. A Pass resets
    /// the streak, since it represents a fresh evaluation of new
    /// content rather than a retry of the prior failure.
    async fn next_retry_count(&self, document_id: &str, node_type: NodeType) -> u32 {
        let nodes = self.store.list_nodes(document_id).await.unwrap_or_default();
        match nodes.iter().filter(|node| node.node_type == node_type).next_back() {
            Some(node) if node.status == NodeStatus::Fail => node.retry_count + 1,
            _ => 0,
        }
    }

    async fn on_pass(self: &Arc<Self>, stage: NodeType, document_id: &str, content: &str) {
        match stage {
            NodeType::Plan => self.enqueue(document_id, NodeType::Draft, 0).await,
            NodeType::Draft => {
                let _ = self.store.set_document_content(document_id, content).await;
                self.publish_content(document_id, content, true).await;
                let retry_count = self.next_retry_count(document_id, NodeType::Citation).await;
                self.enqueue(document_id, NodeType::Citation, retry_count).await;
            }
            NodeType::Citation => {
                let retry_count = self.next_retry_count(document_id, NodeType::Grammar).await;
                self.enqueue(document_id, NodeType::Grammar, retry_count).await;
            }
            NodeType::Grammar => {
                let _ = self.store.set_document_content(document_id, content).await;
                self.publish_content(document_id, content, true).await;
                let retry_count = self.next_retry_count(document_id, NodeType::Readability).await;
                self.enqueue(document_id, NodeType::Readability, retry_count).await;
            }
            NodeType::Readability => {
                let _ = self.store.set_document_content(document_id, content).await;
                let _ = self.store.set_document_status(document_id, WorkflowStatus::Done).await;
                self.publish_content(document_id, content, false).await;
                self.publish_status(document_id, WorkflowStatus::Done, None).await;
            }
            NodeType::UserEdit | NodeType::Plugin => {}
        }
    }

    async fn on_gate_fail(self: &Arc<Self>, stage: NodeType, document_id: &str, retry_count: u32, config: &Config) {
        let next_retry = retry_count + 1;
        if next_retry > config.max_retries {
            self.fail_document(
                document_id,
                stage,
                &format!("{stage} gate failed after {} attempt(s); retry budget of {} exhausted", retry_count + 1, config.max_retries),
            )
            .await;
            return;
        }
        self.enqueue(document_id, NodeType::Draft, 0).await;
    }

    async fn fail_document(&self, document_id: &str, stage: NodeType, reason: &str) {
        let _ = self.store.set_document_status(document_id, WorkflowStatus::Failed).await;
        self.publish_status(document_id, WorkflowStatus::Failed, Some(stage)).await;
        self.publish_error(document_id, reason, Some(stage)).await;
    }

    async fn handle_cancellation(&self, document_id: &str) {
        let _ = self.store.set_document_status(document_id, WorkflowStatus::Idle).await;
        self.publish_status(document_id, WorkflowStatus::Idle, None).await;
    }

    async fn publish_status(&self, document_id: &str, status: WorkflowStatus, current_node: Option<NodeType>) {
        self.events.publish(
            document_id,
            EventKind::WorkflowStatusUpdate {
                status: status.as_str().to_string(),
                current_node: current_node.map(|node_type| node_type.as_str().to_string()),
                progress: progress_for(status),
            },
        );
    }

    async fn publish_node_event(&self, document_id: &str, node_id: &str, node_type: NodeType, status: NodeStatus, content: Option<&str>) {
        self.events.publish(
            document_id,
            EventKind::NodeStatusUpdate {
                node: NodeSnapshot {
                    id: node_id.to_string(),
                    node_type: node_type.as_str().to_string(),
                    status: status.as_str().to_string(),
                    content: content.map(str::to_string),
                },
            },
        );
    }

    async fn publish_content(&self, document_id: &str, content: &str, preview: bool) {
        self.events.publish(document_id, EventKind::ContentUpdate { content: content.to_string(), preview });
    }

    async fn publish_metrics(&self, document_id: &str, metrics: crate::types::NodeMetrics) {
        let value = serde_json::to_value(metrics).unwrap_or(serde_json::Value::Null);
        self.events.publish(document_id, EventKind::MetricsUpdate { metrics: value });
    }

    async fn publish_error(&self, document_id: &str, error: &str, node_type: Option<NodeType>) {
        self.events.publish(
            document_id,
            EventKind::Error { error: error.to_string(), node_type: node_type.map(|node_type| node_type.as_str().to_string()) },
        );
    }
}

#[async_trait]
impl StageExecutor for WorkflowEngine {
    async fn run_stage(&self, job: StageJob, cancellation: CancellationToken) {
        if cancellation.is_cancelled() {
            self.handle_cancellation(&job.document_id).await;
            return;
        }

        let document = match self.store.get_document(&job.document_id).await {
            Ok(document) => document,
            Err(err) => {
                tracing::error!(document_id = %job.document_id, error = %err, "document missing when stage job ran");
                return;
            }
        };

        let Some(self_arc) = self.self_ref.upgrade() else {
            tracing::error!("workflow engine dropped while a job was still queued");
            return;
        };

        let in_flight = WorkflowStatus::for_stage(job.stage);
        if let Err(err) = self.store.set_document_status(&job.document_id, in_flight).await {
            tracing::error!(document_id = %job.document_id, error = %err, "failed to record in-flight status");
            return;
        }
        self.publish_status(&job.document_id, in_flight, Some(job.stage)).await;

        let artifact = match self.artifact_for(job.stage, &document).await {
            Ok(artifact) => artifact,
            Err(err) => {
                self.fail_document(&job.document_id, job.stage, &err.to_string()).await;
                return;
            }
        };

        let Some(stage) = self.stages.get(job.stage) else {
            self.fail_document(&job.document_id, job.stage, &format!("{} is not a dispatchable stage", job.stage)).await;
            return;
        };

        let parent_id = self.parent_id_for(job.stage, &document).await;
        let mut node = Node::new(job.document_id.clone(), job.stage, parent_id);
        node.retry_count = job.retry_count;
        if let Err(err) = self.store.append_node(node.clone()).await {
            tracing::error!(document_id = %job.document_id, error = %err, "failed to append node");
            return;
        }
        self.publish_node_event(&job.document_id, &node.id, job.stage, NodeStatus::Running, None).await;

        let input = StageInput { artifact, user_prompt: document.last_prompt.clone(), config: document.config.clone() };
        let max_attempts = document.config.max_infra_retries.max(1);
        let backoff = self.backoff.clone();
        let outcome = with_infra_retry(max_attempts, &backoff, || stage.execute(&input)).await;

        match outcome {
            Err(err) => {
                let _ = self.store.set_node_status(&node.id, NodeStatus::Fail).await;
                self.publish_node_event(&job.document_id, &node.id, job.stage, NodeStatus::Fail, None).await;
                self.fail_document(&job.document_id, job.stage, &err.to_string()).await;
            }
            Ok(result) => {
                let _ = self.store.set_node_metrics(&node.id, result.metrics).await;
                self.publish_metrics(&job.document_id, result.metrics).await;

                if result.passed {
                    let _ = self.store.set_node_status(&node.id, NodeStatus::Pass).await;
                    self.publish_node_event(&job.document_id, &node.id, job.stage, NodeStatus::Pass, Some(&result.content)).await;
                    self_arc.on_pass(job.stage, &job.document_id, &result.content).await;
                } else {
                    let _ = self.store.set_node_status(&node.id, NodeStatus::Fail).await;
                    self.publish_node_event(&job.document_id, &node.id, job.stage, NodeStatus::Fail, None).await;
                    self_arc.on_gate_fail(job.stage, &job.document_id, job.retry_count, &document.config).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use scripta_event_bus::EventBus;

    use super::*;
    use crate::store::InMemoryStore;
    use crate::task_runner::InProcessTaskRunner;
    use crate::types::{Config, NodeMetrics, StageOutcome};

    /// Always passes the content straight through.
    struct PassThroughStage {
        name: &'static str,
    }

    #[async_trait]
    impl Stage for PassThroughStage {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn execute(&self, input: &StageInput) -> WorkflowResult<StageOutcome> {
            let content = if input.artifact.is_empty() { self.name.to_string() } else { input.artifact.clone() };
            Ok(StageOutcome::pass(content, NodeMetrics::default()))
        }
    }

    /// Passes through but only after `delay`, so tests can race a
    /// `stop` against an in-flight stage.
    struct SlowPassStage {
        name: &'static str,
        delay: Duration,
    }

    #[async_trait]
    impl Stage for SlowPassStage {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn execute(&self, input: &StageInput) -> WorkflowResult<StageOutcome> {
            tokio::time::sleep(self.delay).await;
            Ok(StageOutcome::pass(input.artifact.clone(), NodeMetrics::default()))
        }
    }

    /// A gate that fails its first `fails` calls, then passes.
    struct FlakyGate {
        name: &'static str,
        fails_remaining: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Stage for FlakyGate {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn execute(&self, input: &StageInput) -> WorkflowResult<StageOutcome> {
            let remaining = self.fails_remaining.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fails_remaining.fetch_sub(1, Ordering::SeqCst);
                return Ok(StageOutcome::fail(input.artifact.clone(), NodeMetrics::default(), format!("{} gate not satisfied", self.name)));
            }
            Ok(StageOutcome::pass(input.artifact.clone(), NodeMetrics::default()))
        }
    }

    fn passthrough_stages() -> StageSet {
        StageSet::from_stages(
            Arc::new(PassThroughStage { name: "plan" }),
            Arc::new(PassThroughStage { name: "draft" }),
            Arc::new(PassThroughStage { name: "citation" }),
            Arc::new(PassThroughStage { name: "grammar" }),
            Arc::new(PassThroughStage { name: "readability" }),
        )
    }

    fn harness(stages: StageSet) -> (Arc<WorkflowEngine>, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let events = Arc::new(EventBus::new());
        let runner = Arc::new(InProcessTaskRunner::new());
        let engine = WorkflowEngine::new(store.clone(), events, runner, stages);
        (engine, store)
    }

    async fn wait_until(engine: &Arc<WorkflowEngine>, document_id: &str, predicate: impl Fn(WorkflowStatus) -> bool) -> StatusSnapshot {
        for _ in 0..200 {
            let snapshot = engine.status(document_id).await.unwrap();
            if predicate(snapshot.status) {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("timed out waiting for a matching status");
    }

    #[tokio::test]
    async fn a_clean_pipeline_runs_plan_through_readability_to_done() {
        let (engine, store) = harness(passthrough_stages());
        let document = Document::new("user-1", "title", Config::default());
        store.insert_document(document.clone()).await.unwrap();

        engine.start(&document.id, "write about rust").await.unwrap();
        let snapshot = wait_until(&engine, &document.id, |status| status.is_terminal()).await;

        assert_eq!(snapshot.status, WorkflowStatus::Done);
        let kinds: Vec<NodeType> = snapshot.nodes.iter().map(|node| node.node_type).collect();
        assert_eq!(kinds, vec![NodeType::Plan, NodeType::Draft, NodeType::Citation, NodeType::Grammar, NodeType::Readability]);
        assert!(snapshot.nodes.iter().all(|node| node.status == NodeStatus::Pass));
    }

    #[tokio::test]
    async fn a_gate_failure_rolls_back_to_draft_and_recovers() {
        let stages = StageSet::from_stages(
            Arc::new(PassThroughStage { name: "plan" }),
            Arc::new(PassThroughStage { name: "draft" }),
            Arc::new(FlakyGate { name: "citation", fails_remaining: Arc::new(AtomicU32::new(1)) }),
            Arc::new(PassThroughStage { name: "grammar" }),
            Arc::new(PassThroughStage { name: "readability" }),
        );
        let (engine, store) = harness(stages);
        let document = Document::new("user-1", "title", Config::default());
        store.insert_document(document.clone()).await.unwrap();

        engine.start(&document.id, "prompt").await.unwrap();
        let snapshot = wait_until(&engine, &document.id, |status| status.is_terminal()).await;

        assert_eq!(snapshot.status, WorkflowStatus::Done);
        let draft_count = snapshot.nodes.iter().filter(|node| node.node_type == NodeType::Draft).count();
        let citation_nodes: Vec<_> = snapshot.nodes.iter().filter(|node| node.node_type == NodeType::Citation).collect();
        assert_eq!(draft_count, 2, "the first citation failure should roll back to a fresh Draft");
        assert_eq!(citation_nodes.len(), 2);
        assert_eq!(citation_nodes[0].status, NodeStatus::Fail);
        assert_eq!(citation_nodes[0].retry_count, 0);
        assert_eq!(citation_nodes[1].status, NodeStatus::Pass);
        assert_eq!(citation_nodes[1].retry_count, 1);
    }

    #[tokio::test]
    async fn exhausting_the_retry_budget_fails_the_document() {
        let config = Config { max_retries: 2, ..Config::default() };
        let stages = StageSet::from_stages(
            Arc::new(PassThroughStage { name: "plan" }),
            Arc::new(PassThroughStage { name: "draft" }),
            Arc::new(FlakyGate { name: "citation", fails_remaining: Arc::new(AtomicU32::new(u32::MAX)) }),
            Arc::new(PassThroughStage { name: "grammar" }),
            Arc::new(PassThroughStage { name: "readability" }),
        );
        let (engine, store) = harness(stages);
        let document = Document::new("user-1", "title", config);
        store.insert_document(document.clone()).await.unwrap();

        engine.start(&document.id, "prompt").await.unwrap();
        let snapshot = wait_until(&engine, &document.id, |status| status.is_terminal()).await;

        assert_eq!(snapshot.status, WorkflowStatus::Failed);
        let citation_fails: Vec<_> = snapshot.nodes.iter().filter(|node| node.node_type == NodeType::Citation).collect();
        assert_eq!(citation_fails.len(), 3, "max_retries=2 allows attempts at retry_count 0, 1, 2");
        assert!(citation_fails.iter().all(|node| node.status == NodeStatus::Fail));
        assert_eq!(citation_fails.iter().map(|node| node.retry_count).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn stop_is_observed_before_the_next_stage_dispatches() {
        let stages = StageSet::from_stages(
            Arc::new(PassThroughStage { name: "plan" }),
            Arc::new(PassThroughStage { name: "draft" }),
            Arc::new(SlowPassStage { name: "citation", delay: Duration::from_millis(40) }),
            Arc::new(PassThroughStage { name: "grammar" }),
            Arc::new(PassThroughStage { name: "readability" }),
        );
        let (engine, store) = harness(stages);
        let document = Document::new("user-1", "title", Config::default());
        store.insert_document(document.clone()).await.unwrap();

        engine.start(&document.id, "prompt").await.unwrap();
        wait_until(&engine, &document.id, |status| status == WorkflowStatus::CitationCheck).await;
        engine.stop(&document.id).await.unwrap();

        let snapshot = wait_until(&engine, &document.id, |status| status.is_terminal()).await;
        assert_eq!(snapshot.status, WorkflowStatus::Idle);
        assert!(snapshot.nodes.iter().all(|node| node.node_type != NodeType::Grammar));
    }

    #[tokio::test]
    async fn stop_on_a_terminal_document_is_a_no_op() {
        let (engine, store) = harness(passthrough_stages());
        let document = Document::new("user-1", "title", Config::default());
        store.insert_document(document.clone()).await.unwrap();

        let outcome = engine.stop(&document.id).await.unwrap();
        assert!(!outcome.stopped);
    }

    #[tokio::test]
    async fn start_on_a_non_terminal_document_is_a_conflict() {
        let (engine, store) = harness(passthrough_stages());
        let document = Document::new("user-1", "title", Config::default());
        store.insert_document(document.clone()).await.unwrap();
        store.set_document_status(&document.id, WorkflowStatus::Drafting).await.unwrap();

        let err = engine.start(&document.id, "prompt").await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn rollback_to_a_draft_node_reruns_the_remaining_pipeline() {
        let (engine, store) = harness(passthrough_stages());
        let document = Document::new("user-1", "title", Config::default());
        store.insert_document(document.clone()).await.unwrap();

        engine.start(&document.id, "prompt").await.unwrap();
        let first = wait_until(&engine, &document.id, |status| status.is_terminal()).await;
        let draft_node = first.nodes.iter().find(|node| node.node_type == NodeType::Draft).unwrap().clone();

        engine.rollback_to(&document.id, &draft_node.id).await.unwrap();
        for _ in 0..200 {
            let snapshot = engine.status(&document.id).await.unwrap();
            let draft_count = snapshot.nodes.iter().filter(|node| node.node_type == NodeType::Draft).count();
            if snapshot.status == WorkflowStatus::Done && draft_count > 1 {
                assert_eq!(draft_count, 2);
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("rollback never reran the pipeline to completion");
    }

    #[tokio::test]
    async fn rollback_to_a_non_draft_or_plan_node_is_rejected() {
        let (engine, store) = harness(passthrough_stages());
        let document = Document::new("user-1", "title", Config::default());
        store.insert_document(document.clone()).await.unwrap();

        engine.start(&document.id, "prompt").await.unwrap();
        let snapshot = wait_until(&engine, &document.id, |status| status.is_terminal()).await;
        let citation_node = snapshot.nodes.iter().find(|node| node.node_type == NodeType::Citation).unwrap().clone();

        let err = engine.rollback_to(&document.id, &citation_node.id).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
    }

    #[tokio::test]
    async fn rollback_to_a_node_from_another_document_is_not_found() {
        let (engine, store) = harness(passthrough_stages());
        let document_a = Document::new("user-1", "title-a", Config::default());
        let document_b = Document::new("user-1", "title-b", Config::default());
        store.insert_document(document_a.clone()).await.unwrap();
        store.insert_document(document_b.clone()).await.unwrap();

        engine.start(&document_a.id, "prompt").await.unwrap();
        let snapshot = wait_until(&engine, &document_a.id, |status| status.is_terminal()).await;
        let plan_node = snapshot.nodes.iter().find(|node| node.node_type == NodeType::Plan).unwrap().clone();

        let err = engine.rollback_to(&document_b.id, &plan_node.id).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
