//! Offline service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, key-value
//! storage, network monitoring, clock) into the offline core: the cache
//! router, the action queue, and the connectivity observer that drains the
//! queue on reconnect. Hosts with no special requirements can enable the
//! `native-bridges` feature and use [`ServiceDependencies::native`].

pub mod error;
pub mod logging;

pub use error::{CoreError, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};

use std::sync::Arc;

use bridge_traits::http::HttpClient;
use bridge_traits::network::{NetworkMonitor, NetworkStatus};
use bridge_traits::storage::KeyValueStore;
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use core_cache::{CacheRouter, ControlMessage, ControlResponse, FetchRequest, FetchResponse, RouterConfig};
use core_connectivity::{ConnectivityEvent, ConnectivityObserver};
use core_outbox::{ActionType, EnqueueReceipt, OfflineActionQueue, OutboxConfig, QueuedAction};
use tokio::sync::broadcast;
use tracing::info;

/// Aggregated handle to all bridge dependencies the offline core requires.
pub struct ServiceDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub store: Arc<dyn KeyValueStore>,
    pub network_monitor: Arc<dyn NetworkMonitor>,
    pub clock: Arc<dyn Clock>,
}

impl ServiceDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        store: Arc<dyn KeyValueStore>,
        network_monitor: Arc<dyn NetworkMonitor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http_client,
            store,
            network_monitor,
            clock,
        }
    }

    /// All-native bundle: reqwest HTTP, SQLite storage at the given path,
    /// TCP-probe network monitoring, and the system clock.
    #[cfg(feature = "native-bridges")]
    pub async fn native(db_path: std::path::PathBuf) -> Result<Self> {
        let store = bridge_native::SqliteKeyValueStore::new(db_path)
            .await
            .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;
        Ok(Self::new(
            Arc::new(bridge_native::ReqwestHttpClient::new()),
            Arc::new(store),
            Arc::new(bridge_native::ProbeNetworkMonitor::new()),
            Arc::new(bridge_traits::SystemClock),
        ))
    }
}

/// Combined configuration for the offline core.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub router: RouterConfig,
    pub outbox: OutboxConfig,
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_router(mut self, router: RouterConfig) -> Self {
        self.router = router;
        self
    }

    pub fn with_outbox(mut self, outbox: OutboxConfig) -> Self {
        self.outbox = outbox;
        self
    }
}

/// Primary façade exposed to host applications.
///
/// Owns the cache router, the action queue, and the connectivity observer
/// whose background task drains the queue whenever connectivity returns.
pub struct OfflineService {
    config: ServiceConfig,
    router: Arc<CacheRouter>,
    queue: Arc<OfflineActionQueue>,
    observer: ConnectivityObserver,
}

impl OfflineService {
    /// Wire the offline core together and start watching connectivity.
    pub async fn start(config: ServiceConfig, deps: ServiceDependencies) -> Result<Self> {
        let router = Arc::new(CacheRouter::new(
            config.router.clone(),
            Arc::clone(&deps.store),
            Arc::clone(&deps.http_client),
            Arc::clone(&deps.clock),
        )?);
        let queue = Arc::new(OfflineActionQueue::new(
            config.outbox.clone(),
            Arc::clone(&deps.store),
            Arc::clone(&deps.http_client),
            Arc::clone(&deps.clock),
        )?);
        let observer = ConnectivityObserver::start(
            Arc::clone(&deps.network_monitor),
            Arc::clone(&queue),
            Arc::clone(&deps.clock),
        )
        .await?;

        info!("Offline service started");
        Ok(Self {
            config,
            router,
            queue,
            observer,
        })
    }

    /// Install-time setup: fetch the configured precache list into the
    /// `static` partition. Returns the number of stored paths.
    pub async fn install(&self) -> usize {
        self.router.precache(&self.config.router.precache_paths).await
    }

    /// Resolve an intercepted request through the cache router.
    pub async fn handle(&self, request: FetchRequest) -> FetchResponse {
        self.router.handle(request).await
    }

    /// Handle a control message from the host page.
    pub async fn handle_message(&self, message: ControlMessage) -> ControlResponse {
        self.router.handle_message(message).await
    }

    /// Capture a user action for deferred replay.
    pub async fn enqueue(&self, action_type: ActionType, payload: serde_json::Value) -> EnqueueReceipt {
        self.queue.enqueue(action_type, payload).await
    }

    /// Pending actions in capture order.
    pub async fn pending_actions(&self) -> Result<Vec<QueuedAction>> {
        Ok(self.queue.list().await?)
    }

    /// Last observed connectivity status.
    pub async fn network_status(&self) -> NetworkStatus {
        self.observer.status().await
    }

    /// When the last replay pass completed, if one has.
    pub async fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.observer.last_sync().await
    }

    /// Subscribe to connectivity and replay events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.observer.subscribe()
    }

    /// Direct handle to the cache router.
    pub fn router(&self) -> Arc<CacheRouter> {
        Arc::clone(&self.router)
    }

    /// Direct handle to the action queue.
    pub fn queue(&self) -> Arc<OfflineActionQueue> {
        Arc::clone(&self.queue)
    }

    /// Stop the connectivity observer task.
    pub fn shutdown(&self) {
        self.observer.shutdown();
        info!("Offline service stopped");
    }
}
