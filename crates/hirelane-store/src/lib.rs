//! Persistent key-value cache used as the table resolver's second cache
//! tier.
//!
//! Values are JSON strings. The SQLite implementation keeps everything in
//! one `kv_store` table on local disk; validity is strictly single-process,
//! single-host — a distributed deployment needs an external shared cache
//! behind the same trait.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not create store directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

/// A small string-to-string store with last-write-wins semantics.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the stored value, or `None` if the key was never set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store is unavailable.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores or replaces the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store is unavailable.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// SQLite-backed store, one row per key.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the store file and its `kv_store` table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the parent directory cannot be created or
    /// the database cannot be opened.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv_store (\
                 key TEXT PRIMARY KEY, \
                 value TEXT NOT NULL, \
                 updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP\
             )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at) \
             VALUES (?, ?, CURRENT_TIMESTAMP) \
             ON CONFLICT(key) DO UPDATE SET \
                 value = excluded.value, \
                 updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// In-memory store for tests and for deployments without a writable disk.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
