//! API key storage.
//!
//! SQLite-backed store for the keys clients present in `X-API-Key`:
//! - Key generation with an optional remark
//! - Lookup and verification with usage counting
//! - Activation toggling and revocation

use crate::error::GatewayError;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result as SqlResult, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Prefix of every generated key.
pub const KEY_PREFIX: &str = "sk-";

/// A stored API key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiKey {
    pub key: String,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub active: bool,
    pub used_requests: u64,
}

/// Generate a fresh key: `sk-` followed by 64 hex characters.
pub fn generate_key() -> String {
    format!(
        "{}{}{}",
        KEY_PREFIX,
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}

/// API key database operations.
pub struct ApiKeyStore {
    conn: Connection,
}

impl ApiKeyStore {
    /// Open or create a key database, creating parent directories.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GatewayError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    GatewayError::Storage(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> SqlResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> SqlResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS api_keys (
                key TEXT PRIMARY KEY,
                remark TEXT,
                created_at TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                used_requests INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_api_keys_created ON api_keys(created_at);
            "#,
        )
    }

    fn row_to_key(row: &Row<'_>) -> SqlResult<ApiKey> {
        let created_str: String = row.get(2)?;
        let used: i64 = row.get(4)?;

        Ok(ApiKey {
            key: row.get(0)?,
            remark: row.get(1)?,
            created_at: DateTime::parse_from_rfc3339(&created_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            active: row.get(3)?,
            used_requests: used.max(0) as u64,
        })
    }

    /// Generate and store a new key.
    pub fn generate(&self, remark: Option<&str>) -> SqlResult<ApiKey> {
        self.insert(&generate_key(), remark)
    }

    /// Store a caller-chosen key.
    pub fn insert(&self, key: &str, remark: Option<&str>) -> SqlResult<ApiKey> {
        let now = Utc::now();

        self.conn.execute(
            "INSERT INTO api_keys (key, remark, created_at, active, used_requests) VALUES (?1, ?2, ?3, 1, 0)",
            rusqlite::params![key, remark, now.to_rfc3339()],
        )?;

        Ok(ApiKey {
            key: key.to_string(),
            remark: remark.map(str::to_string),
            created_at: now,
            active: true,
            used_requests: 0,
        })
    }

    /// List all keys, oldest first.
    pub fn list(&self) -> SqlResult<Vec<ApiKey>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, remark, created_at, active, used_requests FROM api_keys ORDER BY created_at ASC, rowid ASC",
        )?;

        let keys = stmt.query_map([], Self::row_to_key)?;
        keys.collect()
    }

    /// Get a key by value.
    pub fn get(&self, key: &str) -> SqlResult<Option<ApiKey>> {
        self.conn
            .query_row(
                "SELECT key, remark, created_at, active, used_requests FROM api_keys WHERE key = ?1",
                [key],
                Self::row_to_key,
            )
            .optional()
    }

    /// Check a presented key. Active keys have their usage counter bumped.
    pub fn verify(&self, key: &str) -> SqlResult<bool> {
        let rows = self.conn.execute(
            "UPDATE api_keys SET used_requests = used_requests + 1 WHERE key = ?1 AND active = 1",
            [key],
        )?;
        Ok(rows > 0)
    }

    /// Delete a key.
    pub fn revoke(&self, key: &str) -> SqlResult<bool> {
        let rows = self.conn.execute("DELETE FROM api_keys WHERE key = ?1", [key])?;
        Ok(rows > 0)
    }

    /// Activate or deactivate a key without deleting it.
    pub fn set_active(&self, key: &str, active: bool) -> SqlResult<bool> {
        let rows = self.conn.execute(
            "UPDATE api_keys SET active = ?1 WHERE key = ?2",
            rusqlite::params![active, key],
        )?;
        Ok(rows > 0)
    }
}
