//! Router configuration and partition policies

use std::time::Duration;
use url::Url;

use crate::error::{CacheError, Result};
use crate::partition::Partition;

/// Configuration for the cache router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Origin used to resolve root-relative URLs (default: `http://localhost`)
    pub origin: String,

    /// Timeout applied to every network fetch (default: 3s)
    pub fetch_timeout: Duration,

    /// Max age for `api` partition entries (default: 24h)
    pub api_max_age: Duration,

    /// Max age for `image` partition entries (default: 7d)
    pub image_max_age: Duration,

    /// Max age for `dynamic` partition entries (default: 30d)
    pub dynamic_max_age: Duration,

    /// Path prefixes classified as static assets
    pub static_prefixes: Vec<String>,

    /// Exact paths classified as static assets (manifest and friends)
    pub static_paths: Vec<String>,

    /// Path prefixes classified as API routes
    pub api_prefixes: Vec<String>,

    /// External hosts whose responses belong to the `api` partition
    pub api_hosts: Vec<String>,

    /// File extensions classified as images
    pub image_extensions: Vec<String>,

    /// Path prefixes classified as images
    pub image_prefixes: Vec<String>,

    /// Reserved path served when a navigation fails both cache and network
    pub offline_page_path: String,

    /// Root-relative paths fetched into the `static` partition at install time
    pub precache_paths: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost".to_string(),
            fetch_timeout: Duration::from_secs(3),
            api_max_age: Duration::from_secs(24 * 60 * 60),
            image_max_age: Duration::from_secs(7 * 24 * 60 * 60),
            dynamic_max_age: Duration::from_secs(30 * 24 * 60 * 60),
            static_prefixes: vec!["/assets/".to_string(), "/icons/".to_string()],
            static_paths: vec!["/manifest.json".to_string(), "/favicon.ico".to_string()],
            api_prefixes: vec!["/api/".to_string()],
            api_hosts: Vec::new(),
            image_extensions: vec![
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "gif".to_string(),
                "webp".to_string(),
                "svg".to_string(),
                "avif".to_string(),
            ],
            image_prefixes: vec!["/images/".to_string(), "/gallery/".to_string()],
            offline_page_path: "/offline".to_string(),
            precache_paths: vec![
                "/".to_string(),
                "/offline".to_string(),
                "/manifest.json".to_string(),
            ],
        }
    }
}

impl RouterConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the origin used to resolve root-relative URLs.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Set the network fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the max age for a partition with an expiry policy.
    ///
    /// The `static` partition has no expiry; setting it is a no-op.
    pub fn with_max_age(mut self, partition: Partition, max_age: Duration) -> Self {
        match partition {
            Partition::Api => self.api_max_age = max_age,
            Partition::Image => self.image_max_age = max_age,
            Partition::Dynamic => self.dynamic_max_age = max_age,
            Partition::Static => {}
        }
        self
    }

    /// Add an external host routed to the `api` partition.
    pub fn with_api_host(mut self, host: impl Into<String>) -> Self {
        self.api_hosts.push(host.into());
        self
    }

    /// Set the offline fallback page path.
    pub fn with_offline_page(mut self, path: impl Into<String>) -> Self {
        self.offline_page_path = path.into();
        self
    }

    /// Set the install-time precache list.
    pub fn with_precache_paths(mut self, paths: Vec<String>) -> Self {
        self.precache_paths = paths;
        self
    }

    /// Max age for a partition; `None` means entries never go stale.
    pub fn max_age(&self, partition: Partition) -> Option<Duration> {
        match partition {
            Partition::Static => None,
            Partition::Api => Some(self.api_max_age),
            Partition::Image => Some(self.image_max_age),
            Partition::Dynamic => Some(self.dynamic_max_age),
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.fetch_timeout.is_zero() {
            return Err(CacheError::Config(
                "fetch_timeout must be greater than zero".to_string(),
            ));
        }

        if Url::parse(&self.origin).is_err() {
            return Err(CacheError::Config(format!(
                "origin is not a valid URL: {}",
                self.origin
            )));
        }

        if !self.offline_page_path.starts_with('/') {
            return Err(CacheError::Config(
                "offline_page_path must be root-relative".to_string(),
            ));
        }

        Ok(())
    }
}
