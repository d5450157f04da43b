//! Minimal host wiring: native bridges, install-time precache, one cached
//! read, and an action captured for replay.
//!
//! Run with:
//!
//! ```sh
//! cargo run -p core-service --example offline_demo --features native-bridges
//! ```

use core_cache::{FetchRequest, RouterConfig};
use core_outbox::ActionType;
use core_service::{init_logging, LoggingConfig, OfflineService, ServiceConfig, ServiceDependencies};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default())?;

    let db_path = std::env::temp_dir().join("offline-demo.db");
    let deps = ServiceDependencies::native(db_path).await?;

    let config = ServiceConfig::new().with_router(
        RouterConfig::default()
            .with_origin("https://example.com")
            .with_precache_paths(vec!["/".to_string()]),
    );
    let service = OfflineService::start(config, deps).await?;

    let precached = service.install().await;
    tracing::info!(precached, "Install complete");

    let response = service
        .handle(FetchRequest::get("https://example.com/"))
        .await;
    tracing::info!(status = response.status, source = ?response.source, "First read");

    let response = service
        .handle(FetchRequest::get("https://example.com/"))
        .await;
    tracing::info!(status = response.status, source = ?response.source, "Second read");

    let receipt = service
        .enqueue(ActionType::Bookmark, serde_json::json!({"content_id": 42}))
        .await;
    tracing::info!(id = %receipt.id, persisted = receipt.persisted, "Captured bookmark");
    tracing::info!(pending = service.pending_actions().await?.len(), "Queue state");

    service.shutdown();
    Ok(())
}
