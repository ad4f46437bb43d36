use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A snapshot of a Node as carried in a `node_status_update` event.
///
/// Kept independent of `scripta-workflow-engine`'s own `Node` type so
/// this crate has no dependency on the engine — callers convert their
/// own node representation into this shape at the publish boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub status: String,
    pub content: Option<String>,
}

/// The seven event kinds a document's subscribers may receive (§4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    ConnectionEstablished {
        connection_id: String,
    },
    WorkflowStatusUpdate {
        status: String,
        current_node: Option<String>,
        progress: f64,
    },
    NodeStatusUpdate {
        node: NodeSnapshot,
    },
    ContentUpdate {
        content: String,
        preview: bool,
    },
    MetricsUpdate {
        metrics: serde_json::Value,
    },
    Error {
        error: String,
        node_type: Option<String>,
    },
    Pong,
}

/// A fully-formed event ready for delivery. Every kind carries a
/// `document_id` and `timestamp` regardless of payload (§4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub document_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    #[must_use]
    pub fn new(document_id: impl Into<String>, kind: EventKind) -> Self {
        Self {
            document_id: document_id.into(),
            timestamp: Utc::now(),
            kind,
        }
    }
}
