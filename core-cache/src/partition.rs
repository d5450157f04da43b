//! Partitions, strategies, and URL classification

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::RouterConfig;
use crate::error::{CacheError, Result};
use crate::types::FetchRequest;

/// Named cache partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    /// Bundled assets; replaced by version, never by age
    Static,
    /// Pages and everything unclassified
    Dynamic,
    /// Internal API routes and known external data APIs
    Api,
    /// Image files
    Image,
}

impl Partition {
    pub const ALL: [Partition; 4] = [
        Partition::Static,
        Partition::Dynamic,
        Partition::Api,
        Partition::Image,
    ];

    /// Storage name of the partition
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
            Self::Api => "api",
            Self::Image => "image",
        }
    }
}

impl std::str::FromStr for Partition {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "static" => Ok(Self::Static),
            "dynamic" => Ok(Self::Dynamic),
            "api" => Ok(Self::Api),
            "image" => Ok(Self::Image),
            _ => Err(CacheError::InvalidPartition(s.to_string())),
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caching strategy applied to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Prefer a fresh cached entry; network on miss or staleness
    CacheFirst,
    /// Prefer the network; cache as fallback
    NetworkFirst,
    /// Return cached bytes immediately, refresh in the background
    StaleWhileRevalidate,
    /// Network-first with the offline page as final fallback
    Navigation,
}

/// Deterministic URL-shape classifier.
///
/// Rules are evaluated in a fixed order and depend only on the URL and the
/// navigation flag, never on runtime state, so a URL always lands in the same
/// partition.
#[derive(Debug, Clone)]
pub struct Classifier {
    origin: Url,
    static_prefixes: Vec<String>,
    static_paths: Vec<String>,
    api_prefixes: Vec<String>,
    api_hosts: Vec<String>,
    image_extensions: Vec<String>,
    image_prefixes: Vec<String>,
}

impl Classifier {
    /// Build a classifier from router configuration.
    ///
    /// The configuration must have been validated; an unparseable origin is a
    /// configuration error.
    pub fn from_config(config: &RouterConfig) -> Result<Self> {
        let origin = Url::parse(&config.origin)
            .map_err(|e| CacheError::Config(format!("origin is not a valid URL: {}", e)))?;

        Ok(Self {
            origin,
            static_prefixes: config.static_prefixes.clone(),
            static_paths: config.static_paths.clone(),
            api_prefixes: config.api_prefixes.clone(),
            api_hosts: config.api_hosts.clone(),
            image_extensions: config.image_extensions.clone(),
            image_prefixes: config.image_prefixes.clone(),
        })
    }

    /// Resolve a possibly root-relative URL against the configured origin.
    pub fn resolve(&self, raw: &str) -> Option<Url> {
        Url::parse(raw).ok().or_else(|| self.origin.join(raw).ok())
    }

    /// Classify a request into (strategy, partition). First match wins.
    pub fn classify(&self, request: &FetchRequest) -> (Strategy, Partition) {
        let Some(url) = self.resolve(&request.url) else {
            // Unclassifiable URLs take the safest general-purpose path
            return (Strategy::StaleWhileRevalidate, Partition::Dynamic);
        };

        let path = url.path();

        if self.is_static_shape(path) {
            return (Strategy::CacheFirst, Partition::Static);
        }

        if self.is_api_shape(&url, path) {
            return (Strategy::NetworkFirst, Partition::Api);
        }

        if self.is_image_shape(path) {
            return (Strategy::CacheFirst, Partition::Image);
        }

        if request.navigation {
            return (Strategy::Navigation, Partition::Dynamic);
        }

        (Strategy::StaleWhileRevalidate, Partition::Dynamic)
    }

    fn is_static_shape(&self, path: &str) -> bool {
        self.static_paths.iter().any(|p| p == path)
            || self.static_prefixes.iter().any(|p| path.starts_with(p))
    }

    fn is_api_shape(&self, url: &Url, path: &str) -> bool {
        if self.api_prefixes.iter().any(|p| path.starts_with(p)) {
            return true;
        }
        match url.host_str() {
            Some(host) => self.api_hosts.iter().any(|h| h == host),
            None => false,
        }
    }

    fn is_image_shape(&self, path: &str) -> bool {
        if self.image_prefixes.iter().any(|p| path.starts_with(p)) {
            return true;
        }
        match extension(path) {
            Some(ext) => self
                .image_extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}

/// File extension of the last path segment, if any.
fn extension(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next()?;
    match segment.rsplit_once('.') {
        Some((name, ext)) if !name.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        let config = RouterConfig::default()
            .with_origin("https://app.example")
            .with_api_host("quran-api.example");
        Classifier::from_config(&config).unwrap()
    }

    #[test]
    fn test_partition_names_roundtrip() {
        for partition in Partition::ALL {
            assert_eq!(partition.as_str().parse::<Partition>().unwrap(), partition);
        }
        assert!("bogus".parse::<Partition>().is_err());
    }

    #[test]
    fn test_static_shapes() {
        let c = classifier();
        for url in ["/assets/main.js", "/icons/icon-192.png", "/manifest.json"] {
            let (strategy, partition) = c.classify(&FetchRequest::get(url));
            assert_eq!(strategy, Strategy::CacheFirst, "{url}");
            assert_eq!(partition, Partition::Static, "{url}");
        }
    }

    #[test]
    fn test_api_shapes() {
        let c = classifier();
        let (strategy, partition) = c.classify(&FetchRequest::get("/api/doa"));
        assert_eq!((strategy, partition), (Strategy::NetworkFirst, Partition::Api));

        // Known external data-API host
        let (strategy, partition) =
            c.classify(&FetchRequest::get("https://quran-api.example/v1/surah/1"));
        assert_eq!((strategy, partition), (Strategy::NetworkFirst, Partition::Api));
    }

    #[test]
    fn test_image_shapes() {
        let c = classifier();
        let (strategy, partition) = c.classify(&FetchRequest::get("/uploads/kajian.jpg"));
        assert_eq!((strategy, partition), (Strategy::CacheFirst, Partition::Image));

        let (strategy, partition) = c.classify(&FetchRequest::get("/gallery/foto"));
        assert_eq!((strategy, partition), (Strategy::CacheFirst, Partition::Image));
    }

    #[test]
    fn test_navigation_and_fallback() {
        let c = classifier();
        let (strategy, partition) = c.classify(&FetchRequest::navigation("/tajwid/idgham"));
        assert_eq!((strategy, partition), (Strategy::Navigation, Partition::Dynamic));

        let (strategy, partition) = c.classify(&FetchRequest::get("/tajwid/idgham"));
        assert_eq!(
            (strategy, partition),
            (Strategy::StaleWhileRevalidate, Partition::Dynamic)
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let c = classifier();
        let request = FetchRequest::get("https://app.example/api/kajian?limit=10");
        let first = c.classify(&request);
        for _ in 0..10 {
            assert_eq!(c.classify(&request), first);
        }
    }

    #[test]
    fn test_api_prefix_beats_image_extension() {
        // First match wins: API shape is checked before image shape
        let c = classifier();
        let (strategy, partition) = c.classify(&FetchRequest::get("/api/gallery/thumb.png"));
        assert_eq!((strategy, partition), (Strategy::NetworkFirst, Partition::Api));
    }

    #[test]
    fn test_extension_helper() {
        assert_eq!(extension("/a/b.png"), Some("png"));
        assert_eq!(extension("/a/b"), None);
        assert_eq!(extension("/a/.hidden"), None);
        assert_eq!(extension("/"), None);
    }
}
