//! SQLite-backed [`DocumentStore`], built on [`scripta_db::WorkspaceDb`]
//! (§6 "Persisted state"). Gated behind the `sqlite` feature; most
//! callers use [`crate::store::InMemoryStore`] instead.
//!
//! Text content is zstd-compressed before it hits the blob columns —
//! drafts run tens of kilobytes and this is the same convention
//! `scripta_db::compress_blob` exists for.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use scripta_db::migration::Migration;
use scripta_db::{compress_blob, decompress_blob, WorkspaceDb};

use crate::error::{WorkflowError, WorkflowResult};
use crate::store::DocumentStore;
use crate::types::{Document, Node, NodeMetrics, NodeStatus, NodeType, WorkflowStatus};

const DOMAIN: &str = "workflow";

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: "
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            content BLOB NOT NULL,
            status TEXT NOT NULL,
            config TEXT NOT NULL,
            last_prompt TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS nodes (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            document_id TEXT NOT NULL REFERENCES documents(id),
            node_type TEXT NOT NULL,
            status TEXT NOT NULL,
            content BLOB NOT NULL,
            parent_id TEXT,
            branch TEXT,
            retry_count INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_nodes_document ON nodes(document_id, seq);

        CREATE TABLE IF NOT EXISTS node_metrics (
            node_id TEXT PRIMARY KEY REFERENCES nodes(id),
            metrics TEXT NOT NULL
        );
    ",
}];

/// A [`DocumentStore`] backed by a single SQLite file (or an
/// in-memory database for tests), via [`WorkspaceDb`].
pub struct SqliteStore {
    db: WorkspaceDb,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<std::path::Path>) -> WorkflowResult<Self> {
        let db = WorkspaceDb::open(path).map_err(db_err)?;
        db.migrate(DOMAIN, MIGRATIONS).map_err(db_err)?;
        Ok(Self { db })
    }

    pub fn open_in_memory() -> WorkflowResult<Self> {
        let db = WorkspaceDb::open_in_memory().map_err(db_err)?;
        db.migrate(DOMAIN, MIGRATIONS).map_err(db_err)?;
        Ok(Self { db })
    }

    /// Run a blocking rusqlite closure on a dedicated thread, since
    /// `WorkspaceDb`'s connection is a plain synchronous `Mutex`.
    async fn with_conn<F, T>(&self, f: F) -> WorkflowResult<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = Arc::clone(self.db.connection());
        tokio::task::spawn_blocking(move || {
            let conn = connection.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            f(&conn)
        })
        .await
        .map_err(|err| WorkflowError::Infrastructure { message: format!("sqlite task panicked: {err}") })?
        .map_err(|err| WorkflowError::Infrastructure { message: err.to_string() })
    }
}

fn db_err(err: eyre::Error) -> WorkflowError {
    WorkflowError::Infrastructure { message: err.to_string() }
}

fn not_found(kind: &str, id: &str) -> WorkflowError {
    WorkflowError::NotFound { message: format!("{kind} {id} not found") }
}

/// `rusqlite` isn't built with the `chrono` feature here, so timestamps
/// are stored as RFC 3339 text and parsed back by hand.
fn parse_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err)))
}

fn document_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    let compressed: Vec<u8> = row.get("content")?;
    let content = decompress_blob(&compressed).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Blob, Box::new(std::io::Error::other(err.to_string())))
    })?;
    let config_json: String = row.get("config")?;
    let config = serde_json::from_str(&config_json).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
    })?;
    let status_str: String = row.get("status")?;

    Ok(Document {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        content: String::from_utf8_lossy(&content).into_owned(),
        status: parse_workflow_status(&status_str),
        config,
        last_prompt: row.get("last_prompt")?,
        created_at: parse_timestamp(&row.get::<_, String>("created_at")?)?,
        updated_at: parse_timestamp(&row.get::<_, String>("updated_at")?)?,
    })
}

fn node_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Node> {
    let compressed: Vec<u8> = row.get("content")?;
    let content = decompress_blob(&compressed).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Blob, Box::new(std::io::Error::other(err.to_string())))
    })?;
    let node_type_str: String = row.get("node_type")?;
    let status_str: String = row.get("status")?;
    let retry_count: i64 = row.get("retry_count")?;

    Ok(Node {
        id: row.get("id")?,
        document_id: row.get("document_id")?,
        node_type: parse_node_type(&node_type_str),
        status: parse_node_status(&status_str),
        content: String::from_utf8_lossy(&content).into_owned(),
        parent_id: row.get("parent_id")?,
        branch: row.get("branch")?,
        retry_count: u32::try_from(retry_count).unwrap_or(0),
        created_at: parse_timestamp(&row.get::<_, String>("created_at")?)?,
    })
}

fn parse_workflow_status(raw: &str) -> WorkflowStatus {
    match raw {
        "planning" => WorkflowStatus::Planning,
        "drafting" => WorkflowStatus::Drafting,
        "citation_check" => WorkflowStatus::CitationCheck,
        "grammar_check" => WorkflowStatus::GrammarCheck,
        "readability_check" => WorkflowStatus::ReadabilityCheck,
        "done" => WorkflowStatus::Done,
        "failed" => WorkflowStatus::Failed,
        _ => WorkflowStatus::Idle,
    }
}

fn parse_node_type(raw: &str) -> NodeType {
    match raw {
        "draft" => NodeType::Draft,
        "citation" => NodeType::Citation,
        "grammar" => NodeType::Grammar,
        "readability" => NodeType::Readability,
        "user_edit" => NodeType::UserEdit,
        "plugin" => NodeType::Plugin,
        _ => NodeType::Plan,
    }
}

fn parse_node_status(raw: &str) -> NodeStatus {
    match raw {
        "running" => NodeStatus::Running,
        "pass" => NodeStatus::Pass,
        "fail" => NodeStatus::Fail,
        _ => NodeStatus::Pending,
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert_document(&self, document: Document) -> WorkflowResult<()> {
        let config_json = serde_json::to_string(&document.config)?;
        let compressed = compress_blob(document.content.as_bytes()).map_err(db_err)?;

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO documents (id, user_id, title, content, status, config, last_prompt, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    document.id,
                    document.user_id,
                    document.title,
                    compressed,
                    document.status.as_str(),
                    config_json,
                    document.last_prompt,
                    document.created_at.to_rfc3339(),
                    document.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_document(&self, document_id: &str) -> WorkflowResult<Document> {
        let id = document_id.to_string();
        let found = self
            .with_conn({
                let id = id.clone();
                move |conn| conn.query_row("SELECT * FROM documents WHERE id = ?1", params![id], document_from_row).optional()
            })
            .await?;
        found.ok_or_else(|| not_found("document", &id))
    }

    async fn set_document_status(&self, document_id: &str, status: WorkflowStatus) -> WorkflowResult<()> {
        let id = document_id.to_string();
        let affected = self
            .with_conn({
                let id = id.clone();
                move |conn| {
                    conn.execute("UPDATE documents SET status = ?1, updated_at = ?2 WHERE id = ?3", params![status.as_str(), Utc::now().to_rfc3339(), id])
                }
            })
            .await?;
        if affected == 0 {
            return Err(not_found("document", &id));
        }
        Ok(())
    }

    async fn set_document_content(&self, document_id: &str, content: &str) -> WorkflowResult<()> {
        let id = document_id.to_string();
        let compressed = compress_blob(content.as_bytes()).map_err(db_err)?;
        let affected = self
            .with_conn({
                let id = id.clone();
                move |conn| conn.execute("UPDATE documents SET content = ?1, updated_at = ?2 WHERE id = ?3", params![compressed, Utc::now().to_rfc3339(), id])
            })
            .await?;
        if affected == 0 {
            return Err(not_found("document", &id));
        }
        Ok(())
    }

    async fn set_document_prompt(&self, document_id: &str, prompt: &str) -> WorkflowResult<()> {
        let id = document_id.to_string();
        let prompt = prompt.to_string();
        let affected = self
            .with_conn({
                let id = id.clone();
                move |conn| conn.execute("UPDATE documents SET last_prompt = ?1, updated_at = ?2 WHERE id = ?3", params![prompt, Utc::now().to_rfc3339(), id])
            })
            .await?;
        if affected == 0 {
            return Err(not_found("document", &id));
        }
        Ok(())
    }

    async fn append_node(&self, node: Node) -> WorkflowResult<()> {
        let compressed = compress_blob(node.content.as_bytes()).map_err(db_err)?;
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO nodes (id, document_id, node_type, status, content, parent_id, branch, retry_count, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    node.id,
                    node.document_id,
                    node.node_type.as_str(),
                    node.status.as_str(),
                    compressed,
                    node.parent_id,
                    node.branch,
                    i64::from(node.retry_count),
                    node.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn set_node_status(&self, node_id: &str, status: NodeStatus) -> WorkflowResult<()> {
        let id = node_id.to_string();
        let affected = self
            .with_conn({
                let id = id.clone();
                move |conn| conn.execute("UPDATE nodes SET status = ?1 WHERE id = ?2", params![status.as_str(), id])
            })
            .await?;
        if affected == 0 {
            return Err(not_found("node", &id));
        }
        Ok(())
    }

    async fn set_node_metrics(&self, node_id: &str, metrics: NodeMetrics) -> WorkflowResult<()> {
        let node_id = node_id.to_string();
        let metrics_json = serde_json::to_string(&metrics)?;
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO node_metrics (node_id, metrics) VALUES (?1, ?2)
                 ON CONFLICT(node_id) DO UPDATE SET metrics = excluded.metrics",
                params![node_id, metrics_json],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_nodes(&self, document_id: &str) -> WorkflowResult<Vec<Node>> {
        let document_id = document_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT * FROM nodes WHERE document_id = ?1 ORDER BY seq ASC")?;
            let rows = stmt.query_map(params![document_id], node_from_row)?;
            rows.collect()
        })
        .await
    }

    async fn get_node(&self, node_id: &str) -> WorkflowResult<Node> {
        let id = node_id.to_string();
        let found = self
            .with_conn({
                let id = id.clone();
                move |conn| conn.query_row("SELECT * FROM nodes WHERE id = ?1", params![id], node_from_row).optional()
            })
            .await?;
        found.ok_or_else(|| not_found("node", &id))
    }

    async fn get_metrics(&self, node_id: &str) -> WorkflowResult<Option<NodeMetrics>> {
        let node_id = node_id.to_string();
        let json: Option<String> = self
            .with_conn(move |conn| {
                conn.query_row("SELECT metrics FROM node_metrics WHERE node_id = ?1", params![node_id], |row| row.get(0)).optional()
            })
            .await?;
        Ok(match json {
            Some(text) => Some(serde_json::from_str(&text)?),
            None => None,
        })
    }

    async fn latest_pass(&self, document_id: &str, node_type: NodeType) -> WorkflowResult<Option<Node>> {
        let document_id = document_id.to_string();
        let node_type_str = node_type.as_str();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT * FROM nodes WHERE document_id = ?1 AND node_type = ?2 AND status = 'pass' ORDER BY seq DESC LIMIT 1",
                params![document_id, node_type_str],
                node_from_row,
            )
            .optional()
        })
        .await
    }
}
