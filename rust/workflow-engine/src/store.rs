//! Document/Node/Metrics persistence (§3, §6 "Persisted state").
//!
//! [`DocumentStore`] is the persistence seam: [`InMemoryStore`] is the
//! default, backed by a `RwLock`-protected map following the same
//! poison-recovery convention the engine's context backend used. The
//! `sqlite` feature provides [`crate::sqlite_backend::SqliteStore`] as
//! a pluggable alternative.
//!
//! Rollback never mutates a Node; it appends. The store reflects that
//! directly: there is no `update_node` that replaces content, only
//! `append_node` and `set_node_status`.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::{WorkflowError, WorkflowResult};
use crate::types::{Document, Node, NodeMetrics, NodeStatus, WorkflowStatus};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_document(&self, document: Document) -> WorkflowResult<()>;
    async fn get_document(&self, document_id: &str) -> WorkflowResult<Document>;
    async fn set_document_status(&self, document_id: &str, status: WorkflowStatus) -> WorkflowResult<()>;
    async fn set_document_content(&self, document_id: &str, content: &str) -> WorkflowResult<()>;
    async fn set_document_prompt(&self, document_id: &str, prompt: &str) -> WorkflowResult<()>;

    async fn append_node(&self, node: Node) -> WorkflowResult<()>;
    async fn set_node_status(&self, node_id: &str, status: NodeStatus) -> WorkflowResult<()>;
    async fn set_node_metrics(&self, node_id: &str, metrics: NodeMetrics) -> WorkflowResult<()>;
    async fn list_nodes(&self, document_id: &str) -> WorkflowResult<Vec<Node>>;
    async fn get_node(&self, node_id: &str) -> WorkflowResult<Node>;
    async fn get_metrics(&self, node_id: &str) -> WorkflowResult<Option<NodeMetrics>>;

    /// Most recent Node of `node_type` with status `Pass`, if any.
    async fn latest_pass(&self, document_id: &str, node_type: crate::types::NodeType) -> WorkflowResult<Option<Node>>;
}

struct Inner {
    documents: HashMap<String, Document>,
    /// Nodes across every document, keyed by id but iterated in
    /// insertion order — `created_at` alone can tie on fast clocks, so
    /// `list_nodes` filters this map by `document_id` rather than
    /// sorting by timestamp.
    nodes: IndexMap<String, Node>,
    metrics: HashMap<String, NodeMetrics>,
}

/// Default in-process store. Poisoned locks are recovered rather than
/// propagated, matching the convention used throughout this codebase
/// for in-memory backends: a panicking writer should not wedge every
/// subsequent reader.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                documents: HashMap::new(),
                nodes: IndexMap::new(),
                metrics: HashMap::new(),
            }),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(kind: &str, id: &str) -> WorkflowError {
    WorkflowError::NotFound {
        message: format!("{kind} {id} not found"),
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert_document(&self, document: Document) -> WorkflowResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.documents.insert(document.id.clone(), document);
        Ok(())
    }

    async fn get_document(&self, document_id: &str) -> WorkflowResult<Document> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner
            .documents
            .get(document_id)
            .cloned()
            .ok_or_else(|| not_found("document", document_id))
    }

    async fn set_document_status(&self, document_id: &str, status: WorkflowStatus) -> WorkflowResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let document = inner
            .documents
            .get_mut(document_id)
            .ok_or_else(|| not_found("document", document_id))?;
        document.status = status;
        document.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn set_document_content(&self, document_id: &str, content: &str) -> WorkflowResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let document = inner
            .documents
            .get_mut(document_id)
            .ok_or_else(|| not_found("document", document_id))?;
        document.content = content.to_string();
        document.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn set_document_prompt(&self, document_id: &str, prompt: &str) -> WorkflowResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let document = inner
            .documents
            .get_mut(document_id)
            .ok_or_else(|| not_found("document", document_id))?;
        document.last_prompt = prompt.to_string();
        document.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn append_node(&self, node: Node) -> WorkflowResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    async fn set_node_status(&self, node_id: &str, status: NodeStatus) -> WorkflowResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let node = inner.nodes.get_mut(node_id).ok_or_else(|| not_found("node", node_id))?;
        node.status = status;
        Ok(())
    }

    async fn set_node_metrics(&self, node_id: &str, metrics: NodeMetrics) -> WorkflowResult<()> {
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        if !inner.nodes.contains_key(node_id) {
            return Err(not_found("node", node_id));
        }
        inner.metrics.insert(node_id.to_string(), metrics);
        Ok(())
    }

    async fn list_nodes(&self, document_id: &str) -> WorkflowResult<Vec<Node>> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(inner
            .nodes
            .values()
            .filter(|node| node.document_id == document_id)
            .cloned()
            .collect())
    }

    async fn get_node(&self, node_id: &str) -> WorkflowResult<Node> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.nodes.get(node_id).cloned().ok_or_else(|| not_found("node", node_id))
    }

    async fn get_metrics(&self, node_id: &str) -> WorkflowResult<Option<NodeMetrics>> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(inner.metrics.get(node_id).copied())
    }

    async fn latest_pass(&self, document_id: &str, node_type: crate::types::NodeType) -> WorkflowResult<Option<Node>> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(inner
            .nodes
            .values()
            .rev()
            .find(|node| node.document_id == document_id && node.node_type == node_type && node.status == NodeStatus::Pass)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Config, NodeType};

    #[tokio::test]
    async fn append_is_additive_not_mutating() {
        let store = InMemoryStore::new();
        let document = Document::new("user-1", "title", Config::default());
        store.insert_document(document.clone()).await.unwrap();

        let plan = Node::new(document.id.clone(), NodeType::Plan, None);
        store.append_node(plan.clone()).await.unwrap();
        let rollback = Node::new(document.id.clone(), NodeType::Plan, Some(plan.id.clone()));
        store.append_node(rollback).await.unwrap();

        let nodes = store.list_nodes(&document.id).await.unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id, plan.id);
    }

    #[tokio::test]
    async fn latest_pass_finds_most_recent() {
        let store = InMemoryStore::new();
        let document = Document::new("user-1", "title", Config::default());
        store.insert_document(document.clone()).await.unwrap();

        let mut first = Node::new(document.id.clone(), NodeType::Plan, None);
        first.status = NodeStatus::Pass;
        first.content = "outline v1".into();
        store.append_node(first).await.unwrap();

        let mut second = Node::new(document.id.clone(), NodeType::Plan, None);
        second.status = NodeStatus::Pass;
        second.content = "outline v2".into();
        store.append_node(second.clone()).await.unwrap();

        let latest = store.latest_pass(&document.id, NodeType::Plan).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.content, "outline v2");
    }
}
