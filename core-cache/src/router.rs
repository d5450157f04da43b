//! # Cache Router
//!
//! Strategy dispatch for intercepted requests. Every fetch is bounded by the
//! configured timeout; expiry of that timeout is treated as a network failure
//! and triggers the active strategy's fallback path.
//!
//! Nothing in this module propagates an error to the caller: an uncaught
//! failure inside the interception path would take down the host's network
//! access entirely, so every operation degrades to a cached entry, the
//! offline page, or a synthetic error response.

use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::KeyValueStore;
use bridge_traits::time::Clock;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::config::RouterConfig;
use crate::control::{ControlMessage, ControlResponse};
use crate::error::Result;
use crate::partition::{Classifier, Partition, Strategy};
use crate::store::{CacheEntry, PartitionStore};
use crate::types::{FetchRequest, FetchResponse, ResponseSource};

/// Request router over the four cache partitions.
///
/// Constructed once at process start with injected storage, HTTP, and clock
/// dependencies.
pub struct CacheRouter {
    config: RouterConfig,
    classifier: Classifier,
    store: PartitionStore,
    http: Arc<dyn HttpClient>,
    activated: AtomicBool,
}

impl CacheRouter {
    /// Create a new router.
    ///
    /// Fails only on invalid configuration.
    pub fn new(
        config: RouterConfig,
        store: Arc<dyn KeyValueStore>,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let classifier = Classifier::from_config(&config)?;

        Ok(Self {
            config,
            classifier,
            store: PartitionStore::new(store, clock),
            http,
            activated: AtomicBool::new(false),
        })
    }

    /// Classify a request without handling it.
    pub fn classify(&self, request: &FetchRequest) -> (Strategy, Partition) {
        self.classifier.classify(request)
    }

    /// Whether an `Activate` control message has been received.
    pub fn is_activated(&self) -> bool {
        self.activated.load(Ordering::Relaxed)
    }

    /// Resolve a request to a response. Never fails.
    #[instrument(skip(self), fields(url = %request.url, method = ?request.method))]
    pub async fn handle(&self, request: FetchRequest) -> FetchResponse {
        // Mutations are never cached; pass them straight to the network.
        if !request.method.is_cacheable() {
            return self.pass_through(&request).await;
        }

        let (strategy, partition) = self.classifier.classify(&request);
        debug!(strategy = ?strategy, partition = %partition, "Classified request");

        match strategy {
            Strategy::CacheFirst => self.cache_first(partition, &request.url).await,
            Strategy::NetworkFirst => self.network_first(partition, &request.url, false).await,
            Strategy::StaleWhileRevalidate => {
                self.stale_while_revalidate(partition, &request.url).await
            }
            Strategy::Navigation => self.network_first(partition, &request.url, true).await,
        }
    }

    /// Fetch every configured precache path into the `static` partition.
    ///
    /// Failures are logged per URL and do not abort the rest of the list.
    /// Returns the number of successfully stored paths.
    #[instrument(skip(self))]
    pub async fn precache(&self, paths: &[String]) -> usize {
        let mut stored = 0;
        for path in paths {
            let url = self.absolute_url(path);
            match self.fetch(&url).await {
                Some(response) if response.is_success() => {
                    self.store.write(Partition::Static, path, &response).await;
                    stored += 1;
                }
                Some(response) => {
                    warn!(url = %url, status = response.status, "Precache fetch rejected");
                }
                None => {
                    warn!(url = %url, "Precache fetch failed");
                }
            }
        }
        info!(requested = paths.len(), stored, "Precache complete");
        stored
    }

    /// Handle a control message from the host page.
    pub async fn handle_message(&self, message: ControlMessage) -> ControlResponse {
        match message {
            ControlMessage::Activate => {
                self.activated.store(true, Ordering::Relaxed);
                info!("Router activated");
                ControlResponse::Ack
            }
            ControlMessage::Precache(paths) => {
                let succeeded = self.precache(&paths).await;
                ControlResponse::Precached {
                    succeeded,
                    failed: paths.len() - succeeded,
                }
            }
            ControlMessage::ClearPartition(partition) => {
                let entries = self.store.clear(partition).await.unwrap_or_else(|e| {
                    warn!(partition = %partition, error = %e, "Clear failed");
                    0
                });
                ControlResponse::Cleared { entries }
            }
            ControlMessage::ClearAll => {
                let entries = self.store.clear_all().await.unwrap_or_else(|e| {
                    warn!(error = %e, "Clear-all failed");
                    0
                });
                ControlResponse::Cleared { entries }
            }
            ControlMessage::ReportContents => {
                let contents = self.store.contents().await.unwrap_or_default();
                ControlResponse::Contents(contents)
            }
        }
    }

    // --- strategies ---

    /// Return a fresh cached entry, else fetch-store-return, else synthetic
    /// error. A stale hit counts as a miss.
    async fn cache_first(&self, partition: Partition, url: &str) -> FetchResponse {
        if let Some(entry) = self.read_entry(partition, url).await {
            if !entry.is_stale(self.store_now(), self.config.max_age(partition)) {
                return Self::from_entry(entry);
            }
            debug!(partition = %partition, url, "Cached entry stale, re-fetching");
        }

        match self.fetch_and_store(partition, url).await {
            Some(response) => response,
            None => FetchResponse::offline_error(),
        }
    }

    /// Prefer the network; fall back to any cached entry regardless of age,
    /// then to the offline page (navigations) or the synthetic error.
    async fn network_first(
        &self,
        partition: Partition,
        url: &str,
        navigation: bool,
    ) -> FetchResponse {
        if let Some(response) = self.fetch_and_store(partition, url).await {
            return response;
        }

        if let Some(entry) = self.read_entry(partition, url).await {
            debug!(partition = %partition, url, "Network failed, serving cached entry");
            return Self::from_entry(entry);
        }

        if navigation {
            self.offline_page().await
        } else {
            FetchResponse::offline_error()
        }
    }

    /// Return cached bytes immediately (stale or not) and refresh in the
    /// background; on a cold miss, behave like network-first without the
    /// cache fallback.
    async fn stale_while_revalidate(&self, partition: Partition, url: &str) -> FetchResponse {
        if let Some(entry) = self.read_entry(partition, url).await {
            self.spawn_revalidate(partition, url.to_string());
            return Self::from_entry(entry);
        }

        match self.fetch_and_store(partition, url).await {
            Some(response) => response,
            None => FetchResponse::offline_error(),
        }
    }

    /// Non-GET requests bypass every partition in both directions.
    async fn pass_through(&self, request: &FetchRequest) -> FetchResponse {
        let http_request = HttpRequest::new(request.method, request.url.clone());
        match self.bounded(http_request).await {
            Some(response) => FetchResponse::from_network(&response),
            None => FetchResponse::offline_error(),
        }
    }

    /// The reserved offline page, from the static partition if precached.
    async fn offline_page(&self) -> FetchResponse {
        if let Some(entry) = self
            .read_entry(Partition::Static, &self.config.offline_page_path)
            .await
        {
            let mut response = Self::from_entry(entry);
            response.source = ResponseSource::OfflinePage;
            return response;
        }
        FetchResponse::builtin_offline_page()
    }

    // --- plumbing ---

    /// Fetch with the configured timeout. `None` covers both transport
    /// errors and timeout expiry.
    async fn fetch(&self, url: &str) -> Option<HttpResponse> {
        self.bounded(HttpRequest::get(url)).await
    }

    async fn bounded(&self, request: HttpRequest) -> Option<HttpResponse> {
        let url = request.url.clone();
        match timeout(self.config.fetch_timeout, self.http.execute(request)).await {
            Ok(Ok(response)) => Some(response),
            Ok(Err(e)) => {
                debug!(url = %url, error = %e, "Fetch failed");
                None
            }
            Err(_) => {
                debug!(url = %url, timeout = ?self.config.fetch_timeout, "Fetch timed out");
                None
            }
        }
    }

    /// Fetch a URL and, when the response is 2xx, store it in the partition.
    async fn fetch_and_store(&self, partition: Partition, url: &str) -> Option<FetchResponse> {
        let response = self.fetch(&self.absolute_url(url)).await?;
        if response.is_success() {
            self.store.write(partition, url, &response).await;
        }
        Some(FetchResponse::from_network(&response))
    }

    /// Background refresh for stale-while-revalidate. The caller already has
    /// its response; this task only updates the cache for next time.
    fn spawn_revalidate(&self, partition: Partition, url: String) {
        let http = Arc::clone(&self.http);
        let store = self.store.clone();
        let fetch_timeout = self.config.fetch_timeout;
        let absolute = self.absolute_url(&url);

        tokio::spawn(async move {
            match timeout(fetch_timeout, http.execute(HttpRequest::get(&absolute))).await {
                Ok(Ok(response)) if response.is_success() => {
                    store.write(partition, &url, &response).await;
                    debug!(partition = %partition, url, "Revalidated cache entry");
                }
                Ok(Ok(response)) => {
                    debug!(partition = %partition, url, status = response.status, "Revalidation rejected");
                }
                Ok(Err(e)) => {
                    debug!(partition = %partition, url, error = %e, "Revalidation failed");
                }
                Err(_) => {
                    debug!(partition = %partition, url, "Revalidation timed out");
                }
            }
        });
    }

    async fn read_entry(&self, partition: Partition, url: &str) -> Option<CacheEntry> {
        match self.store.read(partition, url).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(partition = %partition, url, error = %e, "Cache read failed");
                None
            }
        }
    }

    fn from_entry(entry: CacheEntry) -> FetchResponse {
        FetchResponse {
            status: entry.status,
            content_type: entry.content_type,
            body: Bytes::from(entry.body),
            source: ResponseSource::Cache,
        }
    }

    fn store_now(&self) -> chrono::DateTime<chrono::Utc> {
        self.store.now()
    }

    /// Resolve root-relative paths against the configured origin.
    fn absolute_url(&self, url: &str) -> String {
        match self.classifier.resolve(url) {
            Some(resolved) => resolved.to_string(),
            None => url.to_string(),
        }
    }
}
