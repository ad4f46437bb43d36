//! Core data model: `Document`, `Config`, `Node`, `NodeMetrics`, and the
//! closed enums that drive the stage state machine (§3).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the five pipeline stages, plus the two non-gated node kinds
/// that may appear in a document's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Plan,
    Draft,
    Citation,
    Grammar,
    Readability,
    UserEdit,
    Plugin,
}

impl NodeType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Draft => "draft",
            Self::Citation => "citation",
            Self::Grammar => "grammar",
            Self::Readability => "readability",
            Self::UserEdit => "user_edit",
            Self::Plugin => "plugin",
        }
    }

    /// Whether this node type evaluates an acceptance gate.
    #[must_use]
    pub fn is_gate(&self) -> bool {
        matches!(self, Self::Citation | Self::Grammar | Self::Readability)
    }

    /// The stage that follows a Pass of this node type, if any.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Plan => Some(Self::Draft),
            Self::Draft => Some(Self::Citation),
            Self::Citation => Some(Self::Grammar),
            Self::Grammar => Some(Self::Readability),
            Self::Readability | Self::UserEdit | Self::Plugin => None,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-node execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Pending,
    Running,
    Pass,
    Fail,
}

impl NodeStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

/// Document-level workflow status (§3, the state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Idle,
    Planning,
    Drafting,
    CitationCheck,
    GrammarCheck,
    ReadabilityCheck,
    Done,
    Failed,
}

impl WorkflowStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Planning => "planning",
            Self::Drafting => "drafting",
            Self::CitationCheck => "citation_check",
            Self::GrammarCheck => "grammar_check",
            Self::ReadabilityCheck => "readability_check",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Terminal states admit a fresh `start`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Idle | Self::Done | Self::Failed)
    }

    /// The in-flight status associated with a stage about to run.
    #[must_use]
    pub fn for_stage(stage: NodeType) -> Self {
        match stage {
            NodeType::Plan => Self::Planning,
            NodeType::Draft => Self::Drafting,
            NodeType::Citation => Self::CitationCheck,
            NodeType::Grammar => Self::GrammarCheck,
            NodeType::Readability => Self::ReadabilityCheck,
            NodeType::UserEdit | NodeType::Plugin => Self::Idle,
        }
    }
}

/// Writing-mode configuration field (§9: a configuration value, not a
/// separate agent type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingMode {
    Academic,
    Blog,
    Social,
}

impl Default for WritingMode {
    fn default() -> Self {
        Self::Academic
    }
}

/// Per-document configuration (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub readability_threshold: f64,
    pub max_retries: u32,
    pub auto_run: bool,
    pub timeout_seconds: u64,
    pub writing_mode: WritingMode,
    pub target_word_count: u32,
    /// Citation gate threshold, surfaced as a config field per §9's
    /// open-question resolution (the source hard-coded 0.8).
    pub citation_validity_threshold: f64,
    /// Grammar gate threshold (the source hard-coded 5).
    pub max_grammar_errors: u32,
    /// Infrastructure retry cap, separate from `max_retries` (§4.1).
    pub max_infra_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            readability_threshold: 70.0,
            max_retries: 3,
            auto_run: true,
            timeout_seconds: 300,
            writing_mode: WritingMode::default(),
            target_word_count: 1000,
            citation_validity_threshold: 0.8,
            max_grammar_errors: 5,
            max_infra_retries: 3,
        }
    }
}

/// A document moving through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// Current accepted text; only updated on a Pass node (invariant 4).
    pub content: String,
    pub status: WorkflowStatus,
    pub config: Config,
    /// The prompt passed to the most recent `start`, persisted so Plan
    /// can be re-run by a manual `rollback_to` without the caller
    /// having to resupply it.
    #[serde(default)]
    pub last_prompt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    #[must_use]
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, config: Config) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: title.into(),
            content: String::new(),
            status: WorkflowStatus::Idle,
            config,
            last_prompt: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single stage execution record. Rollback never mutates existing
/// Nodes; it appends a new one (invariant 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub document_id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub status: NodeStatus,
    pub content: String,
    pub parent_id: Option<String>,
    pub branch: Option<String>,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Node {
    #[must_use]
    pub fn new(document_id: impl Into<String>, node_type: NodeType, parent_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document_id: document_id.into(),
            node_type,
            status: NodeStatus::Running,
            content: String::new(),
            parent_id,
            branch: None,
            retry_count: 0,
            created_at: Utc::now(),
        }
    }
}

/// Metrics attached 1:1 to a Node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct NodeMetrics {
    pub readability_score: Option<f64>,
    pub grammar_errors: Option<u32>,
    pub citation_count: Option<u32>,
    pub word_count: Option<u32>,
    pub token_usage: Option<u32>,
    pub processing_time_ms: Option<u64>,
}

/// The outcome of running a single stage, before it is committed as a
/// Node + Metrics pair.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome {
    pub passed: bool,
    pub content: String,
    pub metrics: NodeMetrics,
    pub failure_reason: Option<String>,
}

impl StageOutcome {
    #[must_use]
    pub fn pass(content: impl Into<String>, metrics: NodeMetrics) -> Self {
        Self {
            passed: true,
            content: content.into(),
            metrics,
            failure_reason: None,
        }
    }

    #[must_use]
    pub fn fail(content: impl Into<String>, metrics: NodeMetrics, reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            content: content.into(),
            metrics,
            failure_reason: Some(reason.into()),
        }
    }
}
