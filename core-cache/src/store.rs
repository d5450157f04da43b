//! Cache entry model and partitioned storage
//!
//! Entries live in the injected [`KeyValueStore`] under
//! `cache:{partition}:{url}` keys and are serialized as JSON. Staleness is
//! never swept; it is checked lazily on read by whoever holds the max-age
//! policy.

use bridge_traits::http::HttpResponse;
use bridge_traits::storage::KeyValueStore;
use bridge_traits::time::Clock;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::Result;
use crate::partition::Partition;

const KEY_PREFIX: &str = "cache:";

/// A stored response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Original request URL, unique within its partition
    pub url: String,
    /// HTTP status of the stored response
    pub status: u16,
    /// Content type of the stored response
    pub content_type: Option<String>,
    /// Response body bytes
    pub body: Vec<u8>,
    /// Write timestamp used for staleness checks
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Capture a network response at the given instant.
    pub fn from_response(url: &str, response: &HttpResponse, stored_at: DateTime<Utc>) -> Self {
        Self {
            url: url.to_string(),
            status: response.status,
            content_type: response.header("content-type").map(str::to_string),
            body: response.body.to_vec(),
            stored_at,
        }
    }

    /// Whether the entry is older than `max_age` at instant `now`.
    ///
    /// `None` means the partition has no expiry and entries never go stale.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Option<Duration>) -> bool {
        let Some(max_age) = max_age else {
            return false;
        };
        let age = now.signed_duration_since(self.stored_at);
        age.to_std().map(|age| age > max_age).unwrap_or(false)
    }
}

/// Partition-aware view over the injected key-value store.
///
/// Cheap to clone; the underlying store and clock are shared.
#[derive(Clone)]
pub struct PartitionStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl PartitionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Current instant from the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn key(partition: Partition, url: &str) -> String {
        format!("{}{}:{}", KEY_PREFIX, partition.as_str(), url)
    }

    fn partition_prefix(partition: Partition) -> String {
        format!("{}{}:", KEY_PREFIX, partition.as_str())
    }

    /// Read the entry for a URL.
    ///
    /// An entry that fails to deserialize (interrupted or corrupt write) is
    /// deleted and reported as a miss so the caller re-fetches.
    pub async fn read(&self, partition: Partition, url: &str) -> Result<Option<CacheEntry>> {
        let key = Self::key(partition, url);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_slice::<CacheEntry>(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!(partition = %partition, url, error = %e, "Dropping unreadable cache entry");
                self.store.delete(&key).await.ok();
                Ok(None)
            }
        }
    }

    /// Store a response for a URL, stamping `stored_at` with the current
    /// clock. Last writer wins per key.
    ///
    /// Write failures (storage quota and friends) are logged and swallowed;
    /// the next read simply re-fetches.
    pub async fn write(&self, partition: Partition, url: &str, response: &HttpResponse) {
        let entry = CacheEntry::from_response(url, response, self.clock.now());
        let bytes = match serde_json::to_vec(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(partition = %partition, url, error = %e, "Failed to encode cache entry");
                return;
            }
        };

        let key = Self::key(partition, url);
        if let Err(e) = self.store.put(&key, Bytes::from(bytes)).await {
            warn!(partition = %partition, url, error = %e, "Cache write failed");
        } else {
            debug!(partition = %partition, url, "Cached response");
        }
    }

    /// Delete one entry.
    pub async fn delete(&self, partition: Partition, url: &str) -> Result<()> {
        self.store.delete(&Self::key(partition, url)).await?;
        Ok(())
    }

    /// Clear a whole partition, returning the number of removed entries.
    pub async fn clear(&self, partition: Partition) -> Result<u64> {
        let removed = self
            .store
            .delete_prefix(&Self::partition_prefix(partition))
            .await?;
        debug!(partition = %partition, removed, "Cleared partition");
        Ok(removed)
    }

    /// Clear all partitions.
    pub async fn clear_all(&self) -> Result<u64> {
        let mut removed = 0;
        for partition in Partition::ALL {
            removed += self.clear(partition).await?;
        }
        Ok(removed)
    }

    /// Map of partition name to stored URLs, for introspection.
    pub async fn contents(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut map = BTreeMap::new();
        for partition in Partition::ALL {
            let prefix = Self::partition_prefix(partition);
            let urls = self
                .store
                .keys(&prefix)
                .await?
                .into_iter()
                .map(|key| key[prefix.len()..].to_string())
                .collect();
            map.insert(partition.as_str().to_string(), urls);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::time::ManualClock;
    use std::collections::HashMap;

    fn response(body: &str) -> HttpResponse {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        HttpResponse {
            status: 200,
            headers,
            body: Bytes::from(body.to_string()),
        }
    }

    fn store() -> (PartitionStore, Arc<ManualClock>, Arc<dyn KeyValueStore>) {
        let kv: Arc<dyn KeyValueStore> = Arc::new(bridge_native::MemoryKeyValueStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (
            PartitionStore::new(Arc::clone(&kv), clock.clone()),
            clock,
            kv,
        )
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (store, _, _) = store();
        store.write(Partition::Api, "/api/doa", &response("{}")).await;

        let entry = store.read(Partition::Api, "/api/doa").await.unwrap().unwrap();
        assert_eq!(entry.url, "/api/doa");
        assert_eq!(entry.status, 200);
        assert_eq!(entry.content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_overwrite_updates_stored_at() {
        let (store, clock, _) = store();
        store.write(Partition::Api, "/api/doa", &response("v1")).await;
        let first = store.read(Partition::Api, "/api/doa").await.unwrap().unwrap();

        clock.advance(chrono::Duration::hours(1));
        store.write(Partition::Api, "/api/doa", &response("v2")).await;
        let second = store.read(Partition::Api, "/api/doa").await.unwrap().unwrap();

        assert_eq!(second.body, b"v2");
        assert!(second.stored_at > first.stored_at);
    }

    #[tokio::test]
    async fn test_corrupt_entry_reads_as_miss() {
        let (store, _, kv) = store();
        // Simulate an interrupted write leaving garbage behind
        kv.put("cache:image:/uploads/a.png", Bytes::from_static(b"{trunc"))
            .await
            .unwrap();

        let entry = store.read(Partition::Image, "/uploads/a.png").await.unwrap();
        assert!(entry.is_none());
        // The garbage was dropped
        assert!(!kv.contains("cache:image:/uploads/a.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_partitions_are_isolated() {
        let (store, _, _) = store();
        store.write(Partition::Api, "/shared", &response("api")).await;
        store.write(Partition::Image, "/shared", &response("img")).await;

        store.clear(Partition::Api).await.unwrap();
        assert!(store.read(Partition::Api, "/shared").await.unwrap().is_none());
        assert!(store.read(Partition::Image, "/shared").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_contents_lists_urls_per_partition() {
        let (store, _, _) = store();
        store.write(Partition::Static, "/manifest.json", &response("m")).await;
        store.write(Partition::Api, "/api/doa", &response("d")).await;

        let contents = store.contents().await.unwrap();
        assert_eq!(contents["static"], vec!["/manifest.json"]);
        assert_eq!(contents["api"], vec!["/api/doa"]);
        assert!(contents["image"].is_empty());
    }

    #[test]
    fn test_staleness() {
        let now = Utc::now();
        let entry = CacheEntry {
            url: "/x".to_string(),
            status: 200,
            content_type: None,
            body: Vec::new(),
            stored_at: now - chrono::Duration::days(8),
        };

        // 8 days old against a 7-day policy
        assert!(entry.is_stale(now, Some(Duration::from_secs(7 * 86_400))));
        // No policy: never stale
        assert!(!entry.is_stale(now, None));
        // Entry from the future is not stale
        let fresh = CacheEntry {
            stored_at: now + chrono::Duration::hours(1),
            ..entry
        };
        assert!(!fresh.is_stale(now, Some(Duration::from_secs(1))));
    }
}
