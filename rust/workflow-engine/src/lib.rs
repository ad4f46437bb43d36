//! Iterative, quality-gated document generation.
//!
//! A document moves through five stages — Plan, Draft, Citation,
//! Grammar, Readability — each recorded as an append-only [`types::Node`]
//! on the document's history. Plan and Draft always pass; Citation,
//! Grammar, and Readability evaluate an acceptance gate and, on
//! failure, roll the document back to Draft for another attempt, up to
//! a configured retry budget.
//!
//! [`engine::WorkflowEngine`] is the orchestrator: it dispatches stage
//! jobs through a [`task_runner::TaskRunner`], persists state through a
//! [`store::DocumentStore`], and publishes progress through a
//! `scripta_event_bus::EventBus`.

#![warn(clippy::pedantic)]
#![allow(clippy::result_large_err)]

pub mod engine;
pub mod error;
pub mod retry;
#[cfg(feature = "sqlite")]
pub mod sqlite_store;
pub mod stage;
pub mod stages;
pub mod store;
pub mod task_runner;
pub mod types;

pub use engine::{StageSet, StartOutcome, StatusSnapshot, StopOutcome, WorkflowEngine};
pub use error::{WorkflowError, WorkflowResult};
pub use retry::BackoffConfig;
#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteStore;
pub use stage::{Stage, StageInput};
pub use store::{DocumentStore, InMemoryStore};
pub use task_runner::{CancellationToken, InProcessTaskRunner, StageExecutor, StageJob, TaskHandle, TaskRunner};
pub use types::{Config, Document, Node, NodeMetrics, NodeStatus, NodeType, StageOutcome, WorkflowStatus, WritingMode};
