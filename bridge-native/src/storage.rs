//! Key-Value Storage Implementations
//!
//! [`SqliteKeyValueStore`] is the durable production store;
//! [`MemoryKeyValueStore`] backs tests and short-lived tooling.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::KeyValueStore,
};
use bytes::Bytes;
use sqlx::{sqlite::SqlitePool, Row};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

/// SQLite-backed key-value store
///
/// Single `kv` table with blob values and upsert writes. Every operation is
/// an individual statement, so per-operation atomicity comes from SQLite.
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    /// Create a new store backed by a database file, creating parent
    /// directories and the table as needed.
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        let path_str = db_path.to_string_lossy().replace('\\', "/");
        let db_url = format!("sqlite://{}?mode=rwc", path_str);

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to connect to DB: {}", e)))?;

        let store = Self { pool };
        store.create_table().await?;

        debug!(path = ?db_path, "Initialized key-value store");
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to connect to DB: {}", e)))?;

        let store = Self { pool };
        store.create_table().await?;
        Ok(store)
    }

    async fn create_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::Storage(format!("Failed to create table: {}", e)))?;

        Ok(())
    }

    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }

    /// SQL LIKE pattern matching everything under a prefix, with `%` and `_`
    /// in the prefix escaped so they match literally.
    fn like_pattern(prefix: &str) -> String {
        let escaped = prefix
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("{}%", escaped)
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to read key: {}", e)))?;

        Ok(row.map(|r| Bytes::from(r.get::<Vec<u8>, _>("value"))))
    }

    async fn put(&self, key: &str, value: Bytes) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value.as_ref())
        .bind(Self::now())
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::Storage(format!("Failed to write key: {}", e)))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to delete key: {}", e)))?;

        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM kv WHERE key LIKE ? ESCAPE '\\' ORDER BY key")
            .bind(Self::like_pattern(prefix))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to list keys: {}", e)))?;

        Ok(rows.iter().map(|r| r.get::<String, _>("key")).collect())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM kv WHERE key LIKE ? ESCAPE '\\'")
            .bind(Self::like_pattern(prefix))
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to delete prefix: {}", e)))?;

        Ok(result.rows_affected())
    }
}

/// In-memory key-value store
///
/// Keys are held in a `BTreeMap` so prefix listing comes back sorted, matching
/// the SQLite implementation.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, Bytes>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Bytes) -> Result<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .entries
            .lock()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64> {
        let mut entries = self.entries.lock().await;
        let doomed: Vec<String> = entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        for key in &doomed {
            entries.remove(key);
        }
        Ok(doomed.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryKeyValueStore::new();
        store.put("a", Bytes::from("1")).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), Some(Bytes::from("1")));
        assert_eq!(store.get("b").await.unwrap(), None);

        store.delete("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_prefix_ops() {
        let store = MemoryKeyValueStore::new();
        store.put("cache:api:/x", Bytes::from("1")).await.unwrap();
        store.put("cache:api:/y", Bytes::from("2")).await.unwrap();
        store.put("cache:image:/z", Bytes::from("3")).await.unwrap();

        let keys = store.keys("cache:api:").await.unwrap();
        assert_eq!(keys, vec!["cache:api:/x", "cache:api:/y"]);

        let deleted = store.delete_prefix("cache:api:").await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_sqlite_store_roundtrip() {
        let store = SqliteKeyValueStore::in_memory().await.unwrap();

        store.put("outbox:pending", Bytes::from("[]")).await.unwrap();
        assert_eq!(
            store.get("outbox:pending").await.unwrap(),
            Some(Bytes::from("[]"))
        );

        // Overwrite wins
        store.put("outbox:pending", Bytes::from("[1]")).await.unwrap();
        assert_eq!(
            store.get("outbox:pending").await.unwrap(),
            Some(Bytes::from("[1]"))
        );

        store.delete("outbox:pending").await.unwrap();
        assert_eq!(store.get("outbox:pending").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sqlite_store_prefix_ops() {
        let store = SqliteKeyValueStore::in_memory().await.unwrap();
        store.put("cache:static:/", Bytes::from("a")).await.unwrap();
        store
            .put("cache:static:/manifest.json", Bytes::from("b"))
            .await
            .unwrap();
        store.put("cache:api:/api/doa", Bytes::from("c")).await.unwrap();

        let keys = store.keys("cache:static:").await.unwrap();
        assert_eq!(keys.len(), 2);

        let deleted = store.delete_prefix("cache:static:").await.unwrap();
        assert_eq!(deleted, 2);
        assert!(store.contains("cache:api:/api/doa").await.unwrap());
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(SqliteKeyValueStore::like_pattern("a_b%"), "a\\_b\\%%");
    }
}
