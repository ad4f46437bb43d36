//! SQLite-backed persistence shared by the workflow engine and its
//! collaborators.
//!
//! [`WorkspaceDb`] owns a single SQLite connection and a
//! domain-scoped migration runner: each caller (the workflow engine's
//! document/node store, the citation validator's bibliographic cache,
//! ...) registers its own ordered [`migration::Migration`] list under a
//! domain name, and `migrate` only ever applies the versions that
//! domain hasn't seen yet. Domains don't share a version counter.

pub mod migration;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use eyre::{Result, WrapErr};
use rusqlite::Connection;

pub use rusqlite;

use migration::Migration;

/// A single SQLite-backed workspace, shared across domains via `Arc`.
#[derive(Clone)]
pub struct WorkspaceDb {
    connection: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

impl WorkspaceDb {
    /// Open (or create) the database at `path`, enabling WAL mode and
    /// foreign keys, and ensuring the `_migrations` bookkeeping table
    /// exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let conn = Connection::open(&db_path)
            .wrap_err_with(|| format!("opening database at {}", db_path.display()))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", true)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                domain TEXT NOT NULL,
                version INTEGER NOT NULL,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (domain, version)
            );",
        )
        .wrap_err("creating _migrations table")?;

        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
            db_path,
        })
    }

    /// Open an in-memory database, useful for tests that don't need a
    /// file on disk.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().wrap_err("opening in-memory database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                domain TEXT NOT NULL,
                version INTEGER NOT NULL,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (domain, version)
            );",
        )?;
        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
            db_path: PathBuf::from(":memory:"),
        })
    }

    #[must_use]
    pub fn connection(&self) -> &Arc<Mutex<Connection>> {
        &self.connection
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.db_path.clone()
    }

    /// Apply every migration in `migrations` for `domain` whose
    /// version has not already been recorded, in ascending version
    /// order, each inside its own transaction.
    pub fn migrate(&self, domain: &str, migrations: &[Migration]) -> Result<()> {
        let mut conn = self
            .connection
            .lock()
            .map_err(|_| eyre::eyre!("database connection lock poisoned"))?;

        let applied: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM _migrations WHERE domain = ?1",
                [domain],
                |row| row.get(0),
            )
            .wrap_err("reading applied migration watermark")?;

        let mut pending: Vec<&Migration> = migrations
            .iter()
            .filter(|m| m.version > applied)
            .collect();
        pending.sort_by_key(|m| m.version);

        for migration in pending {
            tracing::info!(domain, version = migration.version, name = migration.name, "applying migration");
            let tx = conn.transaction()?;
            tx.execute_batch(migration.sql).wrap_err_with(|| {
                format!(
                    "applying migration {}:{} ({})",
                    domain, migration.version, migration.name
                )
            })?;
            tx.execute(
                "INSERT INTO _migrations (domain, version, name) VALUES (?1, ?2, ?3)",
                rusqlite::params![domain, migration.version, migration.name],
            )?;
            tx.commit()?;
        }

        Ok(())
    }
}

/// Compress a content blob for storage. Draft/corrected artifacts can
/// run into the tens of kilobytes; `zstd` keeps the sqlite file small
/// without requiring callers to think about it.
pub fn compress_blob(data: &[u8]) -> Result<Vec<u8>> {
    zstd::encode_all(data, 3).wrap_err("compressing blob")
}

/// Inverse of [`compress_blob`].
pub fn decompress_blob(data: &[u8]) -> Result<Vec<u8>> {
    zstd::decode_all(data).wrap_err("decompressing blob")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_compression() {
        let original = b"the quick brown fox jumps over the lazy dog".repeat(20);
        let compressed = compress_blob(&original).expect("compress");
        assert!(compressed.len() < original.len());
        let restored = decompress_blob(&compressed).expect("decompress");
        assert_eq!(restored, original);
    }
}
