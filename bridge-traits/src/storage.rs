//! Durable Key-Value Storage Abstraction
//!
//! Both the cache partitions and the offline action queue persist through
//! this single byte-oriented interface. The underlying store must make each
//! individual operation atomic; no transactional semantics are layered across
//! multiple operations (a crash between a fetch and its cache write simply
//! means the next read re-fetches).

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Durable key-value storage trait
///
/// Keys are flat strings; namespacing is by key prefix (the cache router uses
/// `cache:{partition}:` prefixes, the outbox a single well-known key).
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::KeyValueStore;
///
/// async fn remember(store: &dyn KeyValueStore) -> Result<()> {
///     store.put("greeting", b"salam".as_ref().into()).await?;
///     Ok(())
/// }
/// ```
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Retrieve the value for a key
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Store a value, overwriting any previous value for the key
    async fn put(&self, key: &str, value: Bytes) -> Result<()>;

    /// Delete a key
    ///
    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List all keys starting with the given prefix
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Delete all keys starting with the given prefix, returning the count
    async fn delete_prefix(&self, prefix: &str) -> Result<u64>;

    /// Check if a key exists without retrieving it
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
