//! Durable per-view settings storage.
//!
//! Each list view persists its column-visibility map under a stable view key.
//! Storage is a small SQLite database (origin-scoped in the deployed console);
//! writes are last-write-wins per key and survive reloads.

mod migrations;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrefError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("migration failed: {0}")]
    Migration(String),
    #[error("corrupt preference value for '{view_key}': {message}")]
    Corrupt { view_key: String, message: String },
}

/// Key-scoped store for per-view settings.
pub struct PrefStore {
    conn: Mutex<Connection>,
}

impl PrefStore {
    /// Open (or create) the store at `path` and run migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PrefError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory store for tests.
    pub fn open_in_memory() -> Result<Self, PrefError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, PrefError> {
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("preference store mutex poisoned")
    }

    /// Fetch the persisted column-visibility map for a view, if any.
    pub fn get(&self, view_key: &str) -> Result<Option<BTreeMap<String, bool>>, PrefError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT columns_json FROM view_prefs WHERE view_key = ?1")?;
        let mut rows = stmt.query_map(params![view_key], |row| row.get::<_, String>(0))?;
        match rows.next() {
            Some(raw) => {
                let raw = raw?;
                let map = serde_json::from_str(&raw).map_err(|e| PrefError::Corrupt {
                    view_key: view_key.to_string(),
                    message: e.to_string(),
                })?;
                Ok(Some(map))
            }
            None => Ok(None),
        }
    }

    /// Persist the column-visibility map for a view, replacing any prior value.
    pub fn set(&self, view_key: &str, map: &BTreeMap<String, bool>) -> Result<(), PrefError> {
        let columns_json = serde_json::to_string(map).map_err(|e| PrefError::Corrupt {
            view_key: view_key.to_string(),
            message: e.to_string(),
        })?;
        let conn = self.conn();
        conn.execute(
            "INSERT INTO view_prefs (view_key, columns_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(view_key)
             DO UPDATE SET columns_json = excluded.columns_json, updated_at = excluded.updated_at",
            params![view_key, columns_json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Resolve the effective visibility map for a view's current columns.
    ///
    /// Starts from all-visible and overlays whatever snapshot was persisted, so
    /// a column introduced after the snapshot was taken defaults to visible.
    /// Read failures fall back to the defaults; the store is advisory.
    pub fn load_visibility(&self, view_key: &str, columns: &[String]) -> BTreeMap<String, bool> {
        let mut effective: BTreeMap<String, bool> =
            columns.iter().map(|c| (c.clone(), true)).collect();

        match self.get(view_key) {
            Ok(Some(persisted)) => {
                for (column, visible) in persisted {
                    if effective.contains_key(&column) {
                        effective.insert(column, visible);
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("failed to load column prefs for '{view_key}': {e}");
            }
        }

        effective
    }
}
